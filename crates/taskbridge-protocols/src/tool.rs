//! Capability-discovery catalog types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One operation advertised by a backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// JSON Schema of the tool parameters.
    #[serde(default, alias = "inputSchema")]
    pub parameters: serde_json::Value,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: serde_json::Value::Null,
        }
    }

    pub fn with_parameters(mut self, parameters: serde_json::Value) -> Self {
        self.parameters = parameters;
        self
    }
}

/// How a capability set was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilitySource {
    Discovered,
    Fallback,
}

/// Tool catalog of one backend at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendCapabilitySet {
    pub backend_name: String,
    pub endpoint: String,
    pub tools: Vec<ToolDescriptor>,
    pub discovered_at: DateTime<Utc>,
    pub source: CapabilitySource,
}

impl BackendCapabilitySet {
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name == name)
    }

    pub fn is_fallback(&self) -> bool {
        self.source == CapabilitySource::Fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_descriptor_accepts_input_schema() {
        let tool: ToolDescriptor = serde_json::from_value(json!({
            "name": "search",
            "inputSchema": {"type": "object"}
        }))
        .unwrap();
        assert_eq!(tool.description, "");
        assert_eq!(tool.parameters, json!({"type": "object"}));
    }

    #[test]
    fn test_capability_set_lookup() {
        let set = BackendCapabilitySet {
            backend_name: "tools".to_string(),
            endpoint: "http://tools".to_string(),
            tools: vec![ToolDescriptor::new("search", "Web search")],
            discovered_at: Utc::now(),
            source: CapabilitySource::Fallback,
        };
        assert!(set.has_tool("search"));
        assert!(!set.has_tool("fetch"));
        assert_eq!(set.tool_names(), vec!["search"]);
        assert!(set.is_fallback());
    }
}
