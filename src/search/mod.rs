pub mod backend;
pub mod coordinator;
pub mod runtime;

pub use backend::{HttpBackend, SearchBackend, SearchError};
pub use coordinator::{ErrorReporter, SearchCoordinator, SearchTicket, Settlement};
pub use runtime::{SearchResponse, SearchRuntime, Settled};
