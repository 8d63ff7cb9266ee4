//! Decoded HTTP response.

use serde_json::Value;

/// Status plus JSON body. Non-JSON bodies are kept as a string value.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Value,
}

impl HttpResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub(crate) fn from_bytes(status: u16, bytes: &[u8]) -> Self {
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
        };
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Backend-supplied error message, falling back to the raw body.
    pub fn message(&self) -> String {
        match &self.body {
            Value::Object(obj) => obj
                .get("message")
                .or_else(|| obj.get("error"))
                .map(|m| match m {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .unwrap_or_else(|| self.body.to_string()),
            Value::String(s) if !s.is_empty() => s.clone(),
            _ => format!("HTTP {}", self.status),
        }
    }

    /// The `result` payload of a backend reply, or the whole body when the
    /// backend did not wrap it.
    pub fn into_result(self) -> Value {
        match self.body {
            Value::Object(mut obj) if obj.contains_key("result") => {
                obj.remove("result").unwrap_or(Value::Null)
            }
            other => other,
        }
    }
}
