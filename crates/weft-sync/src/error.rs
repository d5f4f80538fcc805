//! Error types for coroutines and channels.

use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;
use weft_protocols::ConversionError;

/// Errors raised by the coroutine protocol.
#[derive(Debug, Error)]
pub enum CoroutineError {
    /// The body neither suspended nor finished within the resume deadline.
    #[error("Coroutine {id} did not suspend or finish within {deadline:?}")]
    Deadlock { id: Uuid, deadline: Duration },

    /// A previous step deadlocked; the handle refuses further steps.
    #[error("Coroutine {id} is poisoned by an earlier deadlock")]
    Poisoned { id: Uuid },

    /// The coroutine capability was requested from a context without one.
    #[error("Not running inside a coroutine")]
    NotInCoroutine,

    /// `suspend` was called from a thread other than the coroutine's worker.
    #[error("Coroutine {id} can only be suspended from its own worker")]
    NotOnWorker { id: Uuid },

    /// The worker thread could not be started.
    #[error("Failed to spawn coroutine worker: {0}")]
    Spawn(#[from] std::io::Error),
}

impl CoroutineError {
    /// Whether the error signals a stuck body rather than API misuse.
    pub fn is_deadlock(&self) -> bool {
        matches!(self, CoroutineError::Deadlock { .. } | CoroutineError::Poisoned { .. })
    }
}

/// Errors raised by channel operations.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The channel was closed before or while the operation was pending.
    #[error("Channel closed")]
    Closed,

    /// The delivered value does not fit the destination type.
    #[error("Channel value conversion failed: {0}")]
    Conversion(#[from] ConversionError),

    /// Blocking requires the owning coroutine, which was unavailable.
    #[error(transparent)]
    Coroutine(#[from] CoroutineError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadlock_display() {
        let id = Uuid::new_v4();
        let err = CoroutineError::Deadlock {
            id,
            deadline: Duration::from_secs(2),
        };
        let display = err.to_string();
        assert!(display.contains(&id.to_string()));
        assert!(display.contains("2s"));
        assert!(err.is_deadlock());
    }

    #[test]
    fn test_misuse_is_not_deadlock() {
        assert!(!CoroutineError::NotInCoroutine.is_deadlock());
    }

    #[test]
    fn test_channel_error_wraps_coroutine_error() {
        let err: ChannelError = CoroutineError::NotInCoroutine.into();
        assert!(matches!(err, ChannelError::Coroutine(CoroutineError::NotInCoroutine)));
        assert_eq!(err.to_string(), "Not running inside a coroutine");
    }
}
