//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Turn the first error into a [`ConfigError`].
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(err) => Err(ConfigError::InvalidValue {
                field: err.path,
                message: err.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_engine(config, &mut result);
        Self::validate_dispatcher(config, &mut result);
        Self::validate_transport(config, &mut result);
        Self::validate_registry(config, &mut result);
        Self::validate_services(config, &mut result);

        result
    }

    fn validate_engine(config: &Config, result: &mut ValidationResult) {
        if !is_http_url(&config.engine.base_url) {
            result.add_error(ValidationError::new(
                "engine.base_url",
                "base_url must start with http:// or https://",
            ));
        }
        if config.engine.timeout_seconds == 0 {
            result.add_error(ValidationError::new(
                "engine.timeout_seconds",
                "timeout_seconds must be greater than 0",
            ));
        }
    }

    fn validate_dispatcher(config: &Config, result: &mut ValidationResult) {
        let dispatcher = &config.dispatcher;
        if dispatcher.default_service_type.is_empty() || dispatcher.default_service_name.is_empty() {
            result.add_error(ValidationError::new(
                "dispatcher",
                "default service type and name cannot be empty",
            ));
        }

        // Short timeouts plus engine-level retries duplicate backend work.
        if dispatcher.dispatch_timeout_seconds < 60 {
            result.add_warning(ValidationWarning::new(
                "dispatcher.dispatch_timeout_seconds",
                "dispatch timeout is below one minute; long-running backends may be retried",
            ));
        }

        if dispatcher.history_size == 0 {
            result.add_error(ValidationError::new(
                "dispatcher.history_size",
                "history_size must be greater than 0",
            ));
        }
    }

    fn validate_transport(config: &Config, result: &mut ValidationResult) {
        let transport = &config.transport;
        if transport.max_connections == 0 {
            result.add_error(ValidationError::new(
                "transport.max_connections",
                "max_connections must be greater than 0",
            ));
        }
        if transport.max_retries > 10 {
            result.add_warning(ValidationWarning::new(
                "transport.max_retries",
                "max_retries is very high (>10)",
            ));
        }
        if transport.base_delay_ms > transport.max_delay_ms {
            result.add_error(ValidationError::new(
                "transport.base_delay_ms",
                "base_delay_ms cannot exceed max_delay_ms",
            ));
        }
    }

    fn validate_registry(config: &Config, result: &mut ValidationResult) {
        if let Some(url) = &config.registry.discovery_url {
            if !is_http_url(url) {
                result.add_error(ValidationError::new(
                    "registry.discovery_url",
                    "discovery_url must start with http:// or https://",
                ));
            }
        }

        if let Some(explicit) = &config.registry.explicit {
            if explicit.values().all(|names| names.is_empty()) {
                result.add_warning(ValidationWarning::new(
                    "registry.explicit",
                    "explicit registry is empty; every dispatch will fail",
                ));
            }
            if !config.services.is_empty() || config.registry.discovery_url.is_some() {
                result.add_warning(ValidationWarning::new(
                    "registry.explicit",
                    "explicit registry overrides [services] and discovery",
                ));
            }
        }
    }

    fn validate_services(config: &Config, result: &mut ValidationResult) {
        for (name, service) in &config.services {
            if !is_http_url(&service.endpoint) {
                result.add_error(ValidationError::new(
                    format!("services.{}.endpoint", name),
                    "endpoint must start with http:// or https://",
                ));
            }
            if service.service_type.is_empty() {
                result.add_error(ValidationError::new(
                    format!("services.{}.type", name),
                    "service type cannot be empty",
                ));
            }
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
