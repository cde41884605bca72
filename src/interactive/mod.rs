pub mod app_state;
pub mod commands;
pub mod constants;
pub mod events;
pub mod input;
pub mod navigation;

#[cfg(test)]
mod app_state_test;

use anyhow::{Context, Result};
use colored::Colorize;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::debug;

use self::app_state::SearchPage;
use self::commands::Command;
use self::constants::{DETAILS_PREVIEW_CHARS, PROMPT};
use self::events::Message;
use self::input::{HELP, InputAction};
use self::navigation::Location;
use crate::formatters::{format_filter_tree, format_query, format_search_result};
use crate::query::{Group, SearchQuery, SearchResult, is_default};
use crate::search::{ErrorReporter, SearchBackend, SearchError, SearchRuntime, Settled, Settlement};
use crate::url_codec;

/// Ties the page, the URL and the request runtime together.
///
/// Must be created inside a tokio runtime: opening the session already
/// submits the search for the initial URL.
pub struct SearchSession<B> {
    page: SearchPage,
    location: Location,
    url_changes: watch::Receiver<String>,
    runtime: SearchRuntime<B>,
}

impl<B: SearchBackend> SearchSession<B> {
    pub fn open(
        backend: B,
        reporter: impl ErrorReporter + 'static,
        url: &str,
        history_limit: usize,
    ) -> Self {
        let location = Location::new(url_codec::query_string(url), history_limit);
        let url_changes = location.subscribe();
        let page = SearchPage::new(url_codec::decode(location.current()));
        let mut runtime = SearchRuntime::new(backend, reporter);
        runtime.submit(page.query().clone());

        Self {
            page,
            location,
            url_changes,
            runtime,
        }
    }

    /// Feeds one UI event to the page. Returns the generation of the search
    /// it started, if any.
    pub fn dispatch(&mut self, msg: Message) -> Option<u64> {
        match self.page.update(msg) {
            Command::None => None,
            Command::Commit(query) => {
                self.location.replace(url_codec::encode(&query));
                // The page wrote this URL itself; nothing to re-decode.
                self.url_changes.mark_unchanged();
                Some(self.runtime.submit(query))
            }
            Command::Submit(query) => Some(self.runtime.submit(query)),
        }
    }

    pub fn navigate(&mut self, url: &str) -> Option<u64> {
        self.location.push(url_codec::query_string(url));
        self.sync_location()
    }

    pub fn back(&mut self) -> Option<u64> {
        self.location.go_back()?;
        self.sync_location()
    }

    pub fn forward(&mut self) -> Option<u64> {
        self.location.go_forward()?;
        self.sync_location()
    }

    /// Re-decodes the URL if the location published a new one.
    fn sync_location(&mut self) -> Option<u64> {
        if !self.url_changes.has_changed().unwrap_or(false) {
            return None;
        }
        let url = self.url_changes.borrow_and_update().clone();
        debug!(%url, "location changed");
        self.dispatch(Message::LocationChanged(url))
    }

    pub async fn next_settlement(&mut self) -> Option<Settled> {
        self.runtime.next_settlement().await
    }

    pub fn try_settle(&mut self) -> Option<Settled> {
        self.runtime.try_settle()
    }

    /// Cancels the in-flight search.
    pub fn close(&mut self) {
        self.runtime.abort();
    }

    pub fn query(&self) -> &SearchQuery {
        self.page.query()
    }

    pub fn staged_term(&self) -> &str {
        self.page.staged_term()
    }

    pub fn filter_tree(&self) -> &Group {
        self.page.filter_tree()
    }

    pub fn results(&self) -> &[SearchResult] {
        self.runtime.coordinator().results()
    }

    pub fn is_loading(&self) -> bool {
        self.runtime.coordinator().is_loading()
    }

    pub fn current_url(&self) -> &str {
        self.location.current()
    }

    pub fn location(&self) -> &Location {
        &self.location
    }
}

/// Runs the line-oriented search prompt until `:quit` or end of input.
pub async fn run<B: SearchBackend>(
    backend: B,
    url: &str,
    history_limit: usize,
    use_color: bool,
) -> Result<()> {
    let reporter = move |e: &SearchError| {
        if use_color {
            eprintln!("{} {e}", "error:".red().bold());
        } else {
            eprintln!("error: {e}");
        }
    };
    let mut session = SearchSession::open(backend, reporter, url, history_limit);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", "Archive search (:help for commands)".cyan());
    print_status(&session, use_color);
    prompt()?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read input")? else {
                    break;
                };
                match input::parse_line(&line, session.query().search_mode) {
                    Ok(InputAction::Quit) => break,
                    Ok(action) => handle_action(&mut session, action, use_color),
                    Err(e) => eprintln!("{e}"),
                }
                prompt()?;
            }
            Some(settled) = session.next_settlement() => {
                if settled.settlement == Settlement::Accepted {
                    print_results(&session, use_color);
                    prompt()?;
                }
            }
        }
    }

    session.close();
    Ok(())
}

fn handle_action<B: SearchBackend>(
    session: &mut SearchSession<B>,
    action: InputAction,
    use_color: bool,
) {
    let submitted = match action {
        InputAction::Search(term) => {
            session.dispatch(Message::TermTyped(term));
            session.dispatch(Message::TermSubmitted)
        }
        InputAction::Dispatch(msg) => session.dispatch(msg),
        InputAction::Navigate(url) => session.navigate(&url),
        InputAction::Back => {
            if !session.location().can_go_back() {
                println!("{}", "Already at the oldest entry".dimmed());
            }
            session.back()
        }
        InputAction::Forward => {
            if !session.location().can_go_forward() {
                println!("{}", "Already at the newest entry".dimmed());
            }
            session.forward()
        }
        InputAction::ShowUrl => {
            println!("?{}", session.current_url());
            None
        }
        InputAction::ShowFilters => {
            if is_default(session.filter_tree(), session.query().search_mode) {
                println!("{}", "No filters".dimmed());
            } else {
                print!("{}", format_filter_tree(session.filter_tree()));
            }
            None
        }
        InputAction::Help => {
            println!("{HELP}");
            None
        }
        InputAction::Quit => None,
    };

    if submitted.is_some() {
        print_status(session, use_color);
    }
}

fn print_status<B: SearchBackend>(session: &SearchSession<B>, use_color: bool) {
    println!("{}", format_query(session.query(), use_color));
    if session.is_loading() {
        println!("{}", "Searching...".dimmed());
    }
}

fn print_results<B: SearchBackend>(session: &SearchSession<B>, use_color: bool) {
    let results = session.results();
    if results.is_empty() {
        println!("{}", "No results".dimmed());
        return;
    }

    for result in results {
        println!("{}", format_search_result(result, use_color, DETAILS_PREVIEW_CHARS));
    }
    println!(
        "{}",
        format!("page {} ({} results)", session.query().page_number, results.len()).dimmed()
    );
}

fn prompt() -> Result<()> {
    let mut stdout = std::io::stdout();
    write!(stdout, "{PROMPT}")?;
    stdout.flush()?;
    Ok(())
}
