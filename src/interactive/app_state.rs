use tracing::{debug, warn};

use super::commands::Command;
use super::events::Message;
use crate::query::{
    DEFAULT_PAGE_SIZE, FIRST_PAGE, Group, SearchQuery, empty_tree, from_logic_expression,
    sanitize, to_logic_expression, validate,
};
use crate::schema::SearchMode;
use crate::url_codec;

/// State of the search page.
///
/// `query` is what the URL and the last submitted search hold. The staged
/// term and the filter tree are edits that only take effect on commit.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    query: SearchQuery,
    staged_term: String,
    filter_tree: Group,
}

impl SearchPage {
    pub fn new(query: SearchQuery) -> Self {
        let filter_tree = from_logic_expression(query.advanced_filters.as_ref(), query.search_mode);
        Self {
            staged_term: query.search_term.clone(),
            filter_tree,
            query,
        }
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    pub fn staged_term(&self) -> &str {
        &self.staged_term
    }

    pub fn filter_tree(&self) -> &Group {
        &self.filter_tree
    }

    pub fn mode(&self) -> SearchMode {
        self.query.search_mode
    }

    pub fn update(&mut self, msg: Message) -> Command {
        match msg {
            Message::TermTyped(term) => {
                self.staged_term = term;
                Command::None
            }
            Message::TermSubmitted => {
                self.query.search_term = self.staged_term.clone();
                self.query.page_number = FIRST_PAGE;
                self.commit()
            }
            Message::ModeSelected(mode) => {
                if mode == self.query.search_mode {
                    return Command::None;
                }
                self.query.search_mode = mode;
                self.set_filters(empty_tree(mode));
                self.query.page_number = FIRST_PAGE;
                self.commit()
            }
            Message::FiltersApplied(tree) => {
                let mode = self.query.search_mode;
                let tree = match validate(&tree, mode) {
                    Ok(()) => tree,
                    Err(e) => {
                        warn!(error = %e, "applying only the valid part of the filters");
                        sanitize(&tree, mode)
                    }
                };
                self.set_filters(tree);
                self.query.page_number = FIRST_PAGE;
                self.commit()
            }
            Message::FiltersCleared => {
                self.set_filters(empty_tree(self.query.search_mode));
                self.query.page_number = FIRST_PAGE;
                self.commit()
            }
            Message::PageSelected(page) => {
                self.query.page_number = page.max(FIRST_PAGE);
                self.commit()
            }
            Message::NextPage => {
                self.query.page_number = self.query.page_number.saturating_add(1);
                self.commit()
            }
            Message::PreviousPage => {
                if self.query.page_number <= FIRST_PAGE {
                    return Command::None;
                }
                self.query.page_number -= 1;
                self.commit()
            }
            Message::PageSizeSelected(size) => {
                self.query.page_size = size.max(DEFAULT_PAGE_SIZE);
                self.commit()
            }
            Message::LocationChanged(url) => {
                let decoded = url_codec::decode(&url);
                if decoded == self.query {
                    debug!(%url, "location matches the current query");
                    return Command::None;
                }
                debug!(%url, "adopting query from location");
                *self = SearchPage::new(decoded);
                Command::Submit(self.query.clone())
            }
        }
    }

    fn set_filters(&mut self, tree: Group) {
        self.query.advanced_filters = to_logic_expression(&tree);
        self.filter_tree = tree;
    }

    fn commit(&self) -> Command {
        Command::Commit(self.query.clone())
    }
}

impl Default for SearchPage {
    fn default() -> Self {
        Self::new(SearchQuery::default())
    }
}
