//! Activity dispatch errors.

use thiserror::Error;
use weft_protocols::{ConversionError, EventType};

use crate::activity::BoxError;

/// Errors raised while resolving, binding or running an activity.
#[derive(Debug, Error)]
pub enum ActivityError {
    #[error("Activity not found: {0}")]
    NotFound(String),

    #[error("Task does not carry an activity-scheduled event (got {0})")]
    NotScheduled(EventType),

    #[error("Activity {name} expects {expected} inputs, got {actual}")]
    ArityMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Input {index} is missing")]
    MissingInput { index: usize },

    #[error("Cannot convert input {index}: {source}")]
    InputConversion {
        index: usize,
        #[source]
        source: ConversionError,
    },

    #[error("Cannot convert activity result: {0}")]
    ResultConversion(#[source] ConversionError),

    #[error("Activity already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Activity failed: {0}")]
    Failed(#[source] BoxError),
}

impl ActivityError {
    /// Whether the activity body itself ran and reported the failure.
    pub fn is_activity_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}
