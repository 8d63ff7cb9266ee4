//! Workflow-engine task interface.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Read-only view of a task claimed from the workflow engine.
///
/// The dispatcher never acknowledges or mutates the task; completion and
/// failure reporting stay with the caller that claimed it.
pub trait TaskHandle: Send + Sync {
    /// Id of the BPMN node this task belongs to.
    fn activity_id(&self) -> Option<&str>;

    /// Id of the running process instance.
    fn process_instance_id(&self) -> Option<&str>;

    /// Process variables visible to the task.
    fn variables(&self) -> &Map<String, Value>;
}

/// Task payload as delivered by the engine's external-task API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineTask {
    #[serde(default)]
    pub activity_id: Option<String>,

    #[serde(default)]
    pub process_instance_id: Option<String>,

    #[serde(default)]
    pub variables: Map<String, Value>,
}

impl EngineTask {
    /// Create a task for the given activity and process instance.
    pub fn new(activity_id: impl Into<String>, process_instance_id: impl Into<String>) -> Self {
        Self {
            activity_id: Some(activity_id.into()),
            process_instance_id: Some(process_instance_id.into()),
            variables: Map::new(),
        }
    }

    /// Add a variable.
    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.variables.insert(name.into(), value);
        self
    }

    /// Replace engine-typed variables (`{"value": .., "type": ..}`) with their
    /// plain values.
    pub fn unwrap_typed_variables(mut self) -> Self {
        for value in self.variables.values_mut() {
            let plain = match value {
                Value::Object(obj) if obj.contains_key("value") && obj.contains_key("type") => {
                    obj.remove("value")
                }
                _ => None,
            };
            if let Some(plain) = plain {
                *value = plain;
            }
        }
        self
    }
}

impl TaskHandle for EngineTask {
    fn activity_id(&self) -> Option<&str> {
        self.activity_id.as_deref().filter(|id| !id.is_empty())
    }

    fn process_instance_id(&self) -> Option<&str> {
        self.process_instance_id.as_deref().filter(|id| !id.is_empty())
    }

    fn variables(&self) -> &Map<String, Value> {
        &self.variables
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_engine_task_from_engine_json() {
        let task: EngineTask = serde_json::from_value(json!({
            "activityId": "ReviewTask",
            "processInstanceId": "pi-1",
            "variables": {"amount": 10}
        }))
        .unwrap();

        assert_eq!(task.activity_id(), Some("ReviewTask"));
        assert_eq!(task.process_instance_id(), Some("pi-1"));
        assert_eq!(task.variables()["amount"], json!(10));
    }

    #[test]
    fn test_empty_ids_are_absent() {
        let task = EngineTask {
            activity_id: Some(String::new()),
            process_instance_id: Some(String::new()),
            variables: Map::new(),
        };
        assert!(task.activity_id().is_none());
        assert!(task.process_instance_id().is_none());
    }

    #[test]
    fn test_unwrap_typed_variables() {
        let task = EngineTask::new("A", "pi")
            .with_variable("typed", json!({"value": "x", "type": "String"}))
            .with_variable("plain", json!({"value": 1}))
            .unwrap_typed_variables();

        assert_eq!(task.variables["typed"], json!("x"));
        assert_eq!(task.variables["plain"], json!({"value": 1}));
    }
}
