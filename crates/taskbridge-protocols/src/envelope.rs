//! Backend wire payload.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::routing::RoutingProperties;

/// Body of `POST <endpoint>/process_task`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEnvelope {
    pub task_description: String,
    pub task_id: String,
    pub task_name: String,
    pub task_documentation: Option<String>,
    pub variables: Map<String, Value>,
    pub service_properties: BTreeMap<String, String>,
    /// Lets the backend keep conversation state across tasks of one instance.
    pub process_instance_id: Option<String>,
}

impl TaskEnvelope {
    pub fn new(
        activity_id: &str,
        process_instance_id: Option<&str>,
        variables: Map<String, Value>,
        properties: &RoutingProperties,
        documentation: Option<String>,
    ) -> Self {
        Self {
            task_description: format!("Execute workflow activity '{}'", activity_id),
            task_id: activity_id.to_string(),
            task_name: activity_id.to_string(),
            task_documentation: documentation,
            variables,
            service_properties: properties.to_map(),
            process_instance_id: process_instance_id.map(str::to_string),
        }
    }
}
