pub mod config;
pub mod formatters;
pub mod interactive;
pub mod logging;
pub mod query;
pub mod schema;
pub mod search;
pub mod url_codec;

pub use config::{ClientSettings, SettingsManager};
pub use interactive::SearchSession;
pub use query::{
    Combinator, FilterNode, Group, LogicExpression, Rule, SearchQuery, SearchResult, empty_tree,
    from_logic_expression, to_logic_expression,
};
pub use schema::{FieldSchema, OperatorKind, SearchMode, ValueType, schema_for};
pub use search::{HttpBackend, SearchBackend, SearchCoordinator, SearchError, SearchRuntime};
