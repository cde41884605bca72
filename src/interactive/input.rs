//! Turns prompt lines into page events.
//!
//! A plain line is a search term followed by Enter. Lines starting with `:`
//! are commands, e.g. `:mode posts`, `:page 3`, `:filter (and:!(...))`.

use thiserror::Error;

use super::constants::COMMAND_PREFIX;
use super::events::Message;
use crate::query::{Group, LogicExpression, from_logic_expression, rison};
use crate::schema::SearchMode;

#[derive(Debug, Clone, PartialEq)]
pub enum InputAction {
    /// Type the term and press Enter.
    Search(String),
    Dispatch(Message),
    Navigate(String),
    Back,
    Forward,
    ShowUrl,
    ShowFilters,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("unknown command ':{0}' (try :help)")]
    UnknownCommand(String),
    #[error(":{0} needs an argument")]
    MissingArgument(&'static str),
    #[error("'{0}' is not a positive number")]
    InvalidNumber(String),
    #[error("unknown mode '{0}' (expected one of accounts, posts, media, archive_sessions)")]
    UnknownMode(String),
    #[error("invalid filters: {0}")]
    InvalidFilters(String),
}

pub const HELP: &str = "\
  <text>              search for <text>
  (empty line)        submit the term typed with :type
  :type <text>        type without submitting
  :mode <mode>        switch to accounts, posts, media or archive_sessions
  :filter <rison>     apply filters written as a RISON logic expression
  :tree <json>        apply filters written as a JSON filter tree
  :clear              clear all filters
  :page <n>           go to page n
  :next / :prev       next or previous page
  :size <n>           results per page (at least 20)
  :open <url>         navigate to a search URL
  :back / :forward    move through the URL history
  :url                print the current URL
  :filters            print the current filter tree
  :help               show this help
  :quit               exit";

pub fn parse_line(line: &str, mode: SearchMode) -> Result<InputAction, InputError> {
    let line = line.trim();

    let Some(command) = line.strip_prefix(COMMAND_PREFIX) else {
        if line.is_empty() {
            return Ok(InputAction::Dispatch(Message::TermSubmitted));
        }
        return Ok(InputAction::Search(line.to_string()));
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };

    let action = match name {
        "type" => InputAction::Dispatch(Message::TermTyped(arg.to_string())),
        "mode" | "m" => {
            let key = required(arg, "mode")?;
            let mode = SearchMode::from_key(key)
                .ok_or_else(|| InputError::UnknownMode(key.to_string()))?;
            InputAction::Dispatch(Message::ModeSelected(mode))
        }
        "filter" | "f" => {
            let tree = parse_rison_filters(required(arg, "filter")?, mode)?;
            InputAction::Dispatch(Message::FiltersApplied(tree))
        }
        "tree" => {
            let tree: Group = serde_json::from_str(required(arg, "tree")?)
                .map_err(|e| InputError::InvalidFilters(e.to_string()))?;
            InputAction::Dispatch(Message::FiltersApplied(tree))
        }
        "clear" => InputAction::Dispatch(Message::FiltersCleared),
        "page" | "p" => InputAction::Dispatch(Message::PageSelected(number(required(arg, "page")?)?)),
        "next" | "n" => InputAction::Dispatch(Message::NextPage),
        "prev" => InputAction::Dispatch(Message::PreviousPage),
        "size" => InputAction::Dispatch(Message::PageSizeSelected(number(required(arg, "size")?)?)),
        "open" => InputAction::Navigate(arg.to_string()),
        "back" | "b" => InputAction::Back,
        "forward" => InputAction::Forward,
        "url" => InputAction::ShowUrl,
        "filters" => InputAction::ShowFilters,
        "help" | "h" | "?" => InputAction::Help,
        "quit" | "q" | "exit" => InputAction::Quit,
        other => return Err(InputError::UnknownCommand(other.to_string())),
    };

    Ok(action)
}

fn required<'a>(arg: &'a str, command: &'static str) -> Result<&'a str, InputError> {
    if arg.is_empty() {
        Err(InputError::MissingArgument(command))
    } else {
        Ok(arg)
    }
}

fn number(arg: &str) -> Result<u32, InputError> {
    arg.parse::<u32>()
        .map_err(|_| InputError::InvalidNumber(arg.to_string()))
}

fn parse_rison_filters(raw: &str, mode: SearchMode) -> Result<Group, InputError> {
    let value = rison::decode(raw).map_err(|e| InputError::InvalidFilters(e.to_string()))?;
    let expr =
        LogicExpression::from_value(&value).map_err(|e| InputError::InvalidFilters(e.to_string()))?;
    Ok(from_logic_expression(Some(&expr), mode))
}
