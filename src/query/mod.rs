pub mod filter;
pub mod logic;
pub mod rison;
mod search_query;


pub use filter::{
    Combinator, FilterError, FilterNode, Group, Rule, empty_tree, from_logic_expression,
    is_default, sanitize, to_logic_expression, validate,
};
pub use logic::{LogicError, LogicExpression, LogicOperator};
pub use search_query::{DEFAULT_PAGE_SIZE, FIRST_PAGE, SearchQuery, SearchResult};
