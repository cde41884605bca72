use crate::query::Group;
use crate::schema::SearchMode;

#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    // Search term
    TermTyped(String),
    TermSubmitted,

    // Mode and filters
    ModeSelected(SearchMode),
    FiltersApplied(Group),
    FiltersCleared,

    // Paging
    PageSelected(u32),
    NextPage,
    PreviousPage,
    PageSizeSelected(u32),

    // The URL changed outside the page (back/forward, pasted link)
    LocationChanged(String),
}
