//! Activity execution.

use std::sync::Arc;

use tracing::{debug, info, warn};
use weft_protocols::{ActivityTask, Payload};

use crate::activity::ActivityContext;
use crate::error::ActivityError;
use crate::registry::ActivityRegistry;

/// Runs activity tasks against a registry.
#[derive(Clone)]
pub struct ActivityExecutor {
    registry: Arc<ActivityRegistry>,
}

impl ActivityExecutor {
    pub fn new(registry: Arc<ActivityRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ActivityRegistry> {
        &self.registry
    }

    /// Execute the activity named by the task's scheduled event.
    ///
    /// Returns the converted result, or `None` for activities that only
    /// report success or failure. Unknown names, arity mismatches and
    /// conversion failures come back as errors; nothing here panics.
    pub async fn execute_activity(
        &self,
        task: &ActivityTask,
    ) -> Result<Option<Payload>, ActivityError> {
        let scheduled = task
            .scheduled()
            .ok_or(ActivityError::NotScheduled(task.event.event_type))?;

        let activity = self
            .registry
            .get(&scheduled.name)
            .ok_or_else(|| ActivityError::NotFound(scheduled.name.clone()))?;

        let expected = activity.descriptor().arity();
        if scheduled.inputs.len() != expected {
            return Err(ActivityError::ArityMismatch {
                name: scheduled.name.clone(),
                expected,
                actual: scheduled.inputs.len(),
            });
        }

        debug!(
            task = %task.id,
            activity = %scheduled.name,
            inputs = scheduled.inputs.len(),
            "executing activity"
        );

        let result = activity
            .invoke(ActivityContext::from_task(task), &scheduled.inputs)
            .await;

        match &result {
            Ok(_) => info!(task = %task.id, activity = %scheduled.name, "activity completed"),
            Err(e) => warn!(task = %task.id, activity = %scheduled.name, error = %e, "activity failed"),
        }
        result
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
