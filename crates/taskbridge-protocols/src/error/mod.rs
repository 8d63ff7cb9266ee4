//! Error types for the TaskBridge dispatcher.

mod analysis;
mod discovery;
mod dispatch;
mod metadata;
mod registry;
mod transport;

pub use analysis::*;
pub use discovery::*;
pub use dispatch::*;
pub use metadata::*;
pub use registry::*;
pub use transport::*;
