//! Config validation

use loglease_util::parse_duration;
use std::fmt;

use crate::{RawConfig, SinkSection};

/// A single validation failure, tied to the field that caused it.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a raw config, collecting every problem rather than stopping at
/// the first.
pub fn validate_config(raw: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    check_duration(&mut errors, "store.poll_interval", &raw.store.poll_interval);
    check_duration(&mut errors, "watch.retry_interval", &raw.watch.retry_interval);
    check_duration(
        &mut errors,
        "capture.default_guarantee",
        &raw.capture.default_guarantee,
    );

    if let SinkSection::Http { endpoint } = &raw.sink {
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            errors.push(ValidationError::new(
                "sink.endpoint",
                format!("must be an http(s) URL, got {:?}", endpoint),
            ));
        }
    }

    errors
}

fn check_duration(errors: &mut Vec<ValidationError>, field: &str, value: &Option<String>) {
    if let Some(s) = value {
        match parse_duration(s) {
            Ok(d) if d.is_zero() => {
                errors.push(ValidationError::new(field, "must be greater than zero"));
            }
            Ok(_) => {}
            Err(e) => {
                errors.push(ValidationError::new(field, format!("invalid duration: {}", e)));
            }
        }
    }
}
