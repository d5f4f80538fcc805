//! Activity registry.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use crate::activity::{Activity, ActivityDescriptor};
use crate::error::ActivityError;

/// Thread-safe map from activity name to implementation.
pub struct ActivityRegistry {
    activities: DashMap<String, Arc<dyn Activity>>,
}

impl ActivityRegistry {
    pub fn new() -> Self {
        Self {
            activities: DashMap::new(),
        }
    }

    /// Register an activity under its descriptor name.
    ///
    /// Returns an error if the name is already taken.
    pub fn register(&self, activity: Arc<dyn Activity>) -> Result<(), ActivityError> {
        let name = activity.descriptor().name.clone();
        match self.activities.entry(name) {
            Entry::Occupied(entry) => Err(ActivityError::AlreadyRegistered(entry.key().clone())),
            Entry::Vacant(entry) => {
                debug!(activity = %entry.key(), "registered activity");
                entry.insert(activity);
                Ok(())
            }
        }
    }

    pub fn unregister(&self, name: &str) -> Result<(), ActivityError> {
        self.activities
            .remove(name)
            .ok_or_else(|| ActivityError::NotFound(name.to_string()))?;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Activity>> {
        self.activities.get(name).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.activities.contains_key(name)
    }

    /// Descriptors of all registered activities, sorted by name.
    pub fn list(&self) -> Vec<ActivityDescriptor> {
        let mut descriptors: Vec<_> = self
            .activities
            .iter()
            .map(|entry| entry.value().descriptor().clone())
            .collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }
}

impl Default for ActivityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
