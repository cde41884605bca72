use crate::query::SearchQuery;

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    None,
    /// Write the query to the URL, then search.
    Commit(SearchQuery),
    /// Search without touching the URL; it already holds this query.
    Submit(SearchQuery),
}
