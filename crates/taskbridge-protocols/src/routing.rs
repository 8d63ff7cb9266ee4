//! Routing properties embedded in process definitions.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Property key naming the backend service type.
pub const SERVICE_TYPE_KEY: &str = "service.type";
/// Property key naming the backend service.
pub const SERVICE_NAME_KEY: &str = "service.name";
/// Property key naming the backend service version.
pub const SERVICE_VERSION_KEY: &str = "service.version";
/// Property key naming an explicitly requested tool.
pub const SERVICE_TOOL_KEY: &str = "service.tool";

pub const DEFAULT_SERVICE_TYPE: &str = "assistant";
pub const DEFAULT_SERVICE_NAME: &str = "default-assistant";
pub const DEFAULT_SERVICE_VERSION: &str = "1.0";

/// Routing target used when a task carries no usable annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingDefaults {
    pub service_type: String,
    pub service_name: String,
    pub service_version: String,
}

impl Default for RoutingDefaults {
    fn default() -> Self {
        Self {
            service_type: DEFAULT_SERVICE_TYPE.to_string(),
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            service_version: DEFAULT_SERVICE_VERSION.to_string(),
        }
    }
}

/// `{type, name}` pair a task is routed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceIdentity {
    pub service_type: String,
    pub name: String,
}

impl ServiceIdentity {
    pub fn new(service_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            service_type: service_type.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ServiceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.service_type, self.name)
    }
}

/// Routing fields for one activity.
///
/// The three `service.*` routing fields are lifted out; every other key,
/// including further `service.*` keys, is kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingProperties {
    pub service_type: String,
    pub service_name: String,
    pub service_version: String,
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl RoutingProperties {
    /// The default routing target.
    pub fn default_for(defaults: &RoutingDefaults) -> Self {
        Self {
            service_type: defaults.service_type.clone(),
            service_name: defaults.service_name.clone(),
            service_version: defaults.service_version.clone(),
            extra: BTreeMap::new(),
        }
    }

    /// Build from key/value pairs in document order. Later duplicates win.
    pub fn from_pairs<I, K, V>(pairs: I, defaults: &RoutingDefaults) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map: BTreeMap<String, String> = BTreeMap::new();
        for (key, value) in pairs {
            map.insert(key.into(), value.into());
        }

        let mut props = Self::default_for(defaults);
        if let Some(value) = map.remove(SERVICE_TYPE_KEY) {
            props.service_type = value;
        }
        if let Some(value) = map.remove(SERVICE_NAME_KEY) {
            props.service_name = value;
        }
        if let Some(value) = map.remove(SERVICE_VERSION_KEY) {
            props.service_version = value;
        }
        props.extra = map;
        props
    }

    pub fn identity(&self) -> ServiceIdentity {
        ServiceIdentity::new(&self.service_type, &self.service_name)
    }

    /// Tool explicitly requested by the workflow author, if any.
    pub fn requested_tool(&self) -> Option<&str> {
        self.extra
            .get(SERVICE_TOOL_KEY)
            .map(String::as_str)
            .filter(|tool| !tool.is_empty())
    }

    /// Look up any property by its original key.
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            SERVICE_TYPE_KEY => Some(&self.service_type),
            SERVICE_NAME_KEY => Some(&self.service_name),
            SERVICE_VERSION_KEY => Some(&self.service_version),
            _ => self.extra.get(key).map(String::as_str),
        }
    }

    /// Flatten back into the original key space.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = self.extra.clone();
        map.insert(SERVICE_TYPE_KEY.to_string(), self.service_type.clone());
        map.insert(SERVICE_NAME_KEY.to_string(), self.service_name.clone());
        map.insert(SERVICE_VERSION_KEY.to_string(), self.service_version.clone());
        map
    }
}

#[cfg(test)]
#[path = "routing_tests.rs"]
mod tests;
