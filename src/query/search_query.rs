use serde::{Deserialize, Serialize};

use super::logic::LogicExpression;
use crate::schema::SearchMode;

/// Smallest page size the backend accepts. Larger values are passed through.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

pub const FIRST_PAGE: u32 = 1;

/// The committed search: what the URL encodes and what the backend receives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub search_mode: SearchMode,
    pub search_term: String,
    pub advanced_filters: Option<LogicExpression>,
    pub page_number: u32,
    pub page_size: u32,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            search_mode: SearchMode::default(),
            search_term: String::new(),
            advanced_filters: None,
            page_number: FIRST_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SearchQuery {
    pub fn new(search_mode: SearchMode) -> Self {
        Self {
            search_mode,
            ..Self::default()
        }
    }

    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    pub fn with_filters(mut self, filters: Option<LogicExpression>) -> Self {
        self.advanced_filters = filters;
        self
    }

    pub fn with_page(mut self, page_number: u32) -> Self {
        self.page_number = page_number.max(FIRST_PAGE);
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(DEFAULT_PAGE_SIZE);
        self
    }
}

/// One entity card as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub page: String,
    pub id: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnails: Option<Vec<String>>,
}
