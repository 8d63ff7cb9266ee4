//! # TaskBridge Protocols
//!
//! Shared data model for the TaskBridge dispatcher.
//! Contains only types and interfaces - no I/O.
//!
//! ## Core Types
//!
//! - [`TaskHandle`] - Narrow view of a workflow-engine task
//! - [`RoutingProperties`] - Routing fields extracted from a process definition
//! - [`RegistryEntry`] - Resolved address of one backend service
//! - [`BackendCapabilitySet`] - Tool catalog advertised by a backend
//! - [`TaskEnvelope`] - Wire payload sent to backends

pub mod envelope;
pub mod error;
pub mod registry;
pub mod routing;
pub mod task;
pub mod tool;

pub use envelope::TaskEnvelope;
pub use error::{
    AnalysisError, DiscoveryError, DispatchError, DispatchFailure, MetadataError, RegistryError,
    TransportError,
};
pub use registry::{RegistryEntry, RegistrySource, ServiceProtocol, ServiceRegistryMap};
pub use routing::{RoutingDefaults, RoutingProperties, ServiceIdentity};
pub use task::{EngineTask, TaskHandle};
pub use tool::{BackendCapabilitySet, CapabilitySource, ToolDescriptor};
