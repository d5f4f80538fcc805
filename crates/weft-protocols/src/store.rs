//! Durable scheduling store protocol.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreError;
use crate::history::{Event, EventType};
use crate::task::{ActivityTask, WorkflowInstance};

/// Default time a polled activity stays invisible to other pollers.
pub const DEFAULT_LEASE: Duration = Duration::from_secs(30);

/// Store for scheduled activity work.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Persist an activity-scheduled event for a workflow execution.
    async fn schedule_activity(
        &self,
        instance: &WorkflowInstance,
        event: &Event,
    ) -> Result<(), StoreError>;

    /// Lease the oldest activity that is visible and unleased at `now`.
    async fn poll_activity(&self, now: DateTime<Utc>) -> Result<Option<ActivityTask>, StoreError>;

    /// Remove a finished activity.
    async fn complete_activity(&self, id: &Uuid) -> Result<(), StoreError>;

    /// List every stored activity in scheduling order.
    async fn pending_activities(&self) -> Result<Vec<ActivityTask>, StoreError>;
}

/// Reject anything but activity-scheduled events.
pub fn ensure_scheduled(event: &Event) -> Result<(), StoreError> {
    if event.event_type != EventType::ActivityScheduled {
        return Err(StoreError::InvalidEvent(format!(
            "expected {}, got {}",
            EventType::ActivityScheduled,
            event.event_type
        )));
    }
    Ok(())
}

struct StoredActivity {
    task: ActivityTask,
    locked_until: Option<DateTime<Utc>>,
}

/// In-memory activity store for tests and single-process use.
pub struct MemoryActivityStore {
    activities: RwLock<Vec<StoredActivity>>,
    lease: Duration,
}

impl MemoryActivityStore {
    /// Create a new memory store.
    pub fn new() -> Self {
        Self::with_lease(DEFAULT_LEASE)
    }

    /// Create a memory store with a custom lease duration.
    pub fn with_lease(lease: Duration) -> Self {
        Self {
            activities: RwLock::new(Vec::new()),
            lease,
        }
    }
}

impl Default for MemoryActivityStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActivityStore for MemoryActivityStore {
    async fn schedule_activity(
        &self,
        instance: &WorkflowInstance,
        event: &Event,
    ) -> Result<(), StoreError> {
        ensure_scheduled(event)?;

        let mut activities = self.activities.write().await;
        debug!("Scheduling activity {} for {}", event.id, instance.instance_id);
        activities.push(StoredActivity {
            task: ActivityTask::new(instance.clone(), event.clone()),
            locked_until: None,
        });
        Ok(())
    }

    async fn poll_activity(&self, now: DateTime<Utc>) -> Result<Option<ActivityTask>, StoreError> {
        let mut activities = self.activities.write().await;
        let lease = chrono::Duration::from_std(self.lease)
            .map_err(|e| StoreError::InvalidEvent(e.to_string()))?;

        let ready = activities.iter_mut().find(|a| {
            a.task.event.is_visible(now) && a.locked_until.is_none_or(|until| until <= now)
        });

        Ok(ready.map(|a| {
            a.locked_until = Some(now + lease);
            a.task.clone()
        }))
    }

    async fn complete_activity(&self, id: &Uuid) -> Result<(), StoreError> {
        let mut activities = self.activities.write().await;
        let index = activities
            .iter()
            .position(|a| a.task.id == *id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        activities.remove(index);
        Ok(())
    }

    async fn pending_activities(&self) -> Result<Vec<ActivityTask>, StoreError> {
        let activities = self.activities.read().await;
        Ok(activities.iter().map(|a| a.task.clone()).collect())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
