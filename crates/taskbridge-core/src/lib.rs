//! # TaskBridge Core
//!
//! The dispatcher: derives a task's routing target from its process
//! definition, resolves it against the service registry and forwards the
//! task to the backend in that backend's protocol.
//!
//! ## Core Types
//!
//! - [`Dispatcher`] - Entry point, one per process
//! - [`DispatchContext`] - Caches, registry and counters owned by a dispatcher
//! - [`Backend`] - Protocol variants a registry entry can speak
//! - [`AnalysisSink`] - Best-effort recorder of successful dispatches

mod analysis;
mod backend;
mod context;
mod dispatcher;
mod error;
mod metered;

pub use analysis::{AnalysisSink, DispatchRecord, HttpAnalysisSink, NoopAnalysisSink};
pub use backend::Backend;
pub use context::DispatchContext;
pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use error::BuildError;
pub use metered::MeteredSource;
