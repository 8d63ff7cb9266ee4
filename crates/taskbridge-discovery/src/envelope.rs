//! Wire payload for capability-discovery backends.

use std::collections::BTreeMap;

use serde::Serialize;

use taskbridge_protocols::{TaskEnvelope, ToolDescriptor};

/// The plain task envelope plus the backend's tool catalog.
#[derive(Debug, Clone, Serialize)]
pub struct CapabilityEnvelope {
    #[serde(flatten)]
    pub task: TaskEnvelope,
    /// Annotations beyond the routing fields.
    pub mcp_properties: BTreeMap<String, String>,
    pub available_tools: Vec<ToolDescriptor>,
    pub requested_tool: Option<String>,
}
