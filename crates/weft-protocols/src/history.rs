//! History events handed to the scheduling store.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;
use crate::payload::Payload;

/// Kind of a history event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// An activity was scheduled for execution.
    ActivityScheduled,
    /// An activity returned successfully.
    ActivityCompleted,
    /// An activity returned an error.
    ActivityFailed,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::ActivityScheduled => "ActivityScheduled",
            EventType::ActivityCompleted => "ActivityCompleted",
            EventType::ActivityFailed => "ActivityFailed",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ActivityScheduled" => Ok(EventType::ActivityScheduled),
            "ActivityCompleted" => Ok(EventType::ActivityCompleted),
            "ActivityFailed" => Ok(EventType::ActivityFailed),
            other => Err(StoreError::InvalidEvent(format!("unknown event type '{}'", other))),
        }
    }
}

/// Attributes of an activity-scheduled event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityScheduledAttributes {
    /// Registered activity name.
    pub name: String,
    /// Positional inputs.
    #[serde(default)]
    pub inputs: Vec<Payload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityCompletedAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Payload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityFailedAttributes {
    pub reason: String,
}

/// Type-specific event attributes.
///
/// Serialized without a tag; the event type stored next to them selects
/// the shape on the way back in (see [`deserialize_attributes`]).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventAttributes {
    ActivityScheduled(ActivityScheduledAttributes),
    ActivityCompleted(ActivityCompletedAttributes),
    ActivityFailed(ActivityFailedAttributes),
}

impl EventAttributes {
    pub fn event_type(&self) -> EventType {
        match self {
            EventAttributes::ActivityScheduled(_) => EventType::ActivityScheduled,
            EventAttributes::ActivityCompleted(_) => EventType::ActivityCompleted,
            EventAttributes::ActivityFailed(_) => EventType::ActivityFailed,
        }
    }
}

/// Serialize event attributes for storage.
pub fn serialize_attributes(attributes: &EventAttributes) -> Result<String, StoreError> {
    Ok(serde_json::to_string(attributes)?)
}

/// Deserialize stored attributes for the given event type.
pub fn deserialize_attributes(
    event_type: EventType,
    data: &str,
) -> Result<EventAttributes, StoreError> {
    let attributes = match event_type {
        EventType::ActivityScheduled => {
            EventAttributes::ActivityScheduled(serde_json::from_str(data)?)
        }
        EventType::ActivityCompleted => {
            EventAttributes::ActivityCompleted(serde_json::from_str(data)?)
        }
        EventType::ActivityFailed => EventAttributes::ActivityFailed(serde_json::from_str(data)?),
    };
    Ok(attributes)
}

/// A history event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    /// Unique event ID.
    pub id: Uuid,
    /// Event kind; always matches `attributes`.
    pub event_type: EventType,
    /// Sequence number within the workflow execution.
    pub event_id: i64,
    /// Type-specific attributes.
    pub attributes: EventAttributes,
    /// Earliest time the event may be processed (None = immediately).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible_at: Option<DateTime<Utc>>,
}

impl Event {
    /// Create a new event; the event type is derived from the attributes.
    pub fn new(event_id: i64, attributes: EventAttributes) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type: attributes.event_type(),
            event_id,
            attributes,
            visible_at: None,
        }
    }

    /// Create an activity-scheduled event.
    pub fn activity_scheduled(event_id: i64, name: impl Into<String>, inputs: Vec<Payload>) -> Self {
        Self::new(
            event_id,
            EventAttributes::ActivityScheduled(ActivityScheduledAttributes {
                name: name.into(),
                inputs,
            }),
        )
    }

    /// Set the visibility timestamp.
    pub fn with_visible_at(mut self, visible_at: DateTime<Utc>) -> Self {
        self.visible_at = Some(visible_at);
        self
    }

    /// Check whether the event may be processed at `now`.
    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        self.visible_at.is_none_or(|at| at <= now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_type_parse() {
        for ty in [
            EventType::ActivityScheduled,
            EventType::ActivityCompleted,
            EventType::ActivityFailed,
        ] {
            assert_eq!(ty.as_str().parse::<EventType>().unwrap(), ty);
        }
        assert!("TimerFired".parse::<EventType>().is_err());
    }

    #[test]
    fn test_event_type_follows_attributes() {
        let event = Event::activity_scheduled(3, "charge", vec![Payload::from(json!(10))]);
        assert_eq!(event.event_type, EventType::ActivityScheduled);
        assert_eq!(event.event_id, 3);
    }

    #[test]
    fn test_attributes_serialize_untagged() {
        let event = Event::activity_scheduled(1, "charge", vec![Payload::from(json!("card"))]);
        let data = serialize_attributes(&event.attributes).unwrap();
        assert_eq!(data, r#"{"name":"charge","inputs":["card"]}"#);

        let restored = deserialize_attributes(event.event_type, &data).unwrap();
        assert_eq!(restored, event.attributes);
    }

    #[test]
    fn test_deserialize_wrong_shape() {
        let result = deserialize_attributes(EventType::ActivityFailed, r#"{"name":"x"}"#);
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }

    #[test]
    fn test_visibility() {
        let now = Utc::now();
        let event = Event::activity_scheduled(1, "later", vec![])
            .with_visible_at(now + chrono::Duration::minutes(5));
        assert!(!event.is_visible(now));
        assert!(event.is_visible(now + chrono::Duration::minutes(5)));

        let immediate = Event::activity_scheduled(2, "now", vec![]);
        assert!(immediate.is_visible(now));
    }
}
