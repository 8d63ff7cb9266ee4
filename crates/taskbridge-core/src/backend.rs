//! Backend protocol variants.

use serde_json::{Map, Value};
use tracing::warn;

use taskbridge_protocols::error::UNKNOWN_ACTIVITY;
use taskbridge_protocols::{
    DispatchError, RegistryEntry, RoutingProperties, ServiceProtocol, TaskEnvelope, TaskHandle,
};

use crate::context::DispatchContext;

const PROCESS_TASK_ENDPOINT: &str = "backend.process_task";

/// How a resolved registry entry is called.
#[derive(Debug, Clone, PartialEq)]
pub enum Backend {
    /// Single envelope POSTed to `{endpoint}/process_task`.
    Rest(RegistryEntry),
    /// Tool catalog discovered first, then attached to the envelope.
    CapabilityDiscovery(RegistryEntry),
}

impl Backend {
    pub fn for_entry(entry: RegistryEntry) -> Self {
        match entry.protocol {
            ServiceProtocol::Rest => Backend::Rest(entry),
            ServiceProtocol::CapabilityDiscovery => Backend::CapabilityDiscovery(entry),
        }
    }

    pub fn entry(&self) -> &RegistryEntry {
        match self {
            Backend::Rest(entry) | Backend::CapabilityDiscovery(entry) => entry,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Backend::Rest(_) => "rest",
            Backend::CapabilityDiscovery(_) => "capability_discovery",
        }
    }

    /// Send one task to this backend and return its result.
    pub async fn dispatch(
        &self,
        ctx: &DispatchContext,
        task: &dyn TaskHandle,
        variables: Map<String, Value>,
        properties: &RoutingProperties,
    ) -> Result<Value, DispatchError> {
        match self {
            Backend::Rest(entry) => call_rest(ctx, task, variables, entry, properties).await,
            Backend::CapabilityDiscovery(entry) => {
                ctx.capabilities
                    .route(task, variables, entry, properties)
                    .await
            }
        }
    }
}

async fn call_rest(
    ctx: &DispatchContext,
    task: &dyn TaskHandle,
    variables: Map<String, Value>,
    entry: &RegistryEntry,
    properties: &RoutingProperties,
) -> Result<Value, DispatchError> {
    let activity_id = task.activity_id().unwrap_or(UNKNOWN_ACTIVITY);

    let documentation = match ctx.metadata.documentation(task).await {
        Ok(documentation) => documentation,
        Err(e) => {
            warn!(activity_id, error = %e, "Task documentation unavailable");
            None
        }
    };

    let envelope = TaskEnvelope::new(
        activity_id,
        task.process_instance_id(),
        variables,
        properties,
        documentation,
    );

    ctx.metrics.record_api_call(PROCESS_TASK_ENDPOINT);
    let response = ctx
        .transport
        .post_json(&entry.url("process_task"), &envelope, Some(ctx.dispatch_timeout))
        .await
        .map_err(|source| DispatchError::Transport {
            identity: entry.identity(),
            activity_id: activity_id.to_string(),
            source,
        })?;

    if !response.is_success() {
        return Err(DispatchError::Backend {
            identity: entry.identity(),
            activity_id: activity_id.to_string(),
            status: response.status,
            message: response.message(),
        });
    }
    Ok(response.into_result())
}
