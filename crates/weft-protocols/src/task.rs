//! Workflow instances and scheduled activity work.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::history::{ActivityScheduledAttributes, Event, EventAttributes};

/// Identifies one execution of a workflow instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkflowInstance {
    /// Stable instance ID chosen by the caller.
    pub instance_id: String,
    /// ID of this particular execution of the instance.
    pub execution_id: String,
}

impl WorkflowInstance {
    /// Create an instance with a fresh execution ID.
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            execution_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an instance with explicit IDs.
    pub fn with_execution(instance_id: impl Into<String>, execution_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            execution_id: execution_id.into(),
        }
    }
}

/// A scheduled activity picked up by a worker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityTask {
    /// Task ID (the ID of the scheduling event).
    pub id: Uuid,
    /// Owning workflow execution.
    pub instance: WorkflowInstance,
    /// The activity-scheduled event.
    pub event: Event,
}

impl ActivityTask {
    pub fn new(instance: WorkflowInstance, event: Event) -> Self {
        Self {
            id: event.id,
            instance,
            event,
        }
    }

    /// Scheduling attributes, if the event is an activity-scheduled event.
    pub fn scheduled(&self) -> Option<&ActivityScheduledAttributes> {
        match &self.event.attributes {
            EventAttributes::ActivityScheduled(attrs) => Some(attrs),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{ActivityFailedAttributes, Event};

    #[test]
    fn test_instance_new_generates_execution() {
        let a = WorkflowInstance::new("order-1");
        let b = WorkflowInstance::new("order-1");
        assert_eq!(a.instance_id, b.instance_id);
        assert_ne!(a.execution_id, b.execution_id);
    }

    #[test]
    fn test_task_uses_event_id() {
        let event = Event::activity_scheduled(1, "ship", vec![]);
        let task = ActivityTask::new(WorkflowInstance::new("order-1"), event.clone());
        assert_eq!(task.id, event.id);
        assert_eq!(task.scheduled().unwrap().name, "ship");
    }

    #[test]
    fn test_scheduled_on_other_event() {
        let event = Event::new(
            2,
            EventAttributes::ActivityFailed(ActivityFailedAttributes {
                reason: "boom".to_string(),
            }),
        );
        let task = ActivityTask::new(WorkflowInstance::new("order-1"), event);
        assert!(task.scheduled().is_none());
    }
}
