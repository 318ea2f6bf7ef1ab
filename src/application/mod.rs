// Application layer - use cases and orchestration.
// The service wraps every ledger operation in load -> apply -> save;
// reporting renders the text report the CLI writes to disk.

pub mod error;
pub mod reporting;
pub mod service;

pub use error::*;
pub use reporting::*;
pub use service::*;
