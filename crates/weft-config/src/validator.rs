//! Configuration validation.

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

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_coroutine(config, &mut result);
        Self::validate_backend(config, &mut result);
        Self::validate_worker(config, &mut result);
        Self::validate_logging(config, &mut result);

        result
    }

    fn validate_coroutine(config: &Config, result: &mut ValidationResult) {
        let deadline = config.coroutine.resume_deadline_ms;
        if deadline == 0 {
            result.add_error(ValidationError::new(
                "coroutine.resume_deadline_ms",
                "resume_deadline_ms must be greater than 0",
            ));
        } else if deadline > 60_000 {
            result.add_warning(ValidationWarning::new(
                "coroutine.resume_deadline_ms",
                "resume deadline is above one minute, deadlocks will be reported late",
            ));
        }
    }

    fn validate_backend(config: &Config, result: &mut ValidationResult) {
        if config.backend.sqlite_path.trim().is_empty() {
            result.add_error(ValidationError::new(
                "backend.sqlite_path",
                "SQLite path cannot be empty",
            ));
        }

        if config.backend.lease_secs == 0 {
            result.add_error(ValidationError::new(
                "backend.lease_secs",
                "lease_secs must be greater than 0",
            ));
        }
    }

    fn validate_worker(config: &Config, result: &mut ValidationResult) {
        if config.worker.poll_interval_ms == 0 {
            result.add_error(ValidationError::new(
                "worker.poll_interval_ms",
                "poll_interval_ms must be greater than 0",
            ));
        }
    }

    fn validate_logging(config: &Config, result: &mut ValidationResult) {
        // Full filter directives ("weft_sync=debug,info") are passed through.
        let level = config.logging.level.as_str();
        if !level.contains('=') && !LOG_LEVELS.contains(&level) {
            result.add_warning(ValidationWarning::new(
                "logging.level",
                format!("Unknown log level '{}', valid values: {:?}", level, LOG_LEVELS),
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
