//! Coroutine configuration.

use std::time::Duration;

/// Default deadline for a single `resume` step.
pub const DEFAULT_RESUME_DEADLINE: Duration = Duration::from_secs(2);

/// Per-coroutine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoroutineConfig {
    /// How long `resume` waits for the body to suspend or finish before
    /// reporting a deadlock.
    pub resume_deadline: Duration,
}

impl CoroutineConfig {
    pub fn new(resume_deadline: Duration) -> Self {
        Self { resume_deadline }
    }
}

impl Default for CoroutineConfig {
    fn default() -> Self {
        Self {
            resume_deadline: DEFAULT_RESUME_DEADLINE,
        }
    }
}
