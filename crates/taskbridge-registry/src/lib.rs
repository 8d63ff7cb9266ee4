//! # TaskBridge Registry
//!
//! Builds the `{type: {name: entry}}` map the dispatcher resolves tasks
//! against. Sources are merged by priority: live service configuration over
//! catalog discovery over the static fallback. An explicitly supplied
//! registry replaces all of them.

mod consul;
mod resolver;
mod sources;

pub use consul::{ConsulDiscovery, RegistryDiscovery, TYPE_TAG_PREFIX};
pub use resolver::ServiceRegistry;
pub use sources::{
    DEFAULT_MCP_NAME, configured_entries, explicit_entries, fallback_entries,
};
