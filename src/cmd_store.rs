//! `schedule` and `pending` commands.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use serde_json::Value;
use tracing::info;
use weft_backend_sqlite::SqliteActivityStore;
use weft_protocols::{ActivityStore, Event, Payload, WorkflowInstance};

/// Open the SQLite store at `path` with the given lease.
pub(crate) async fn open_store(path: &Path, lease: Duration) -> anyhow::Result<SqliteActivityStore> {
    let store = SqliteActivityStore::open(path)
        .await
        .with_context(|| format!("cannot open activity store at {}", path.display()))?;
    Ok(store.with_lease(lease))
}

/// Read a CLI input as JSON, falling back to a plain string.
pub(crate) fn parse_input(raw: &str) -> Payload {
    serde_json::from_str::<Value>(raw)
        .map(Payload::new)
        .unwrap_or_else(|_| Payload::new(Value::String(raw.to_string())))
}

pub(crate) async fn schedule(
    store: &dyn ActivityStore,
    instance_id: &str,
    name: &str,
    inputs: &[String],
    delay: Option<Duration>,
) -> anyhow::Result<Event> {
    let instance = WorkflowInstance::with_execution(instance_id, instance_id);
    let next_event_id = store
        .pending_activities()
        .await?
        .iter()
        .filter(|task| task.instance.instance_id == instance_id)
        .map(|task| task.event.event_id)
        .max()
        .map_or(1, |id| id + 1);

    let mut event = Event::activity_scheduled(
        next_event_id,
        name,
        inputs.iter().map(|raw| parse_input(raw)).collect(),
    );
    if let Some(delay) = delay {
        event = event.with_visible_at(Utc::now() + chrono::Duration::from_std(delay)?);
    }

    store.schedule_activity(&instance, &event).await?;
    info!(activity = %event.id, activity_name = name, instance = instance_id, "scheduled activity");
    Ok(event)
}

pub(crate) async fn pending(store: &dyn ActivityStore) -> anyhow::Result<()> {
    let tasks = store.pending_activities().await?;
    if tasks.is_empty() {
        println!("No scheduled activities");
        return Ok(());
    }

    println!(
        "{:<36}  {:<12}  {:>5}  {:<12}  {:<24}  INPUTS",
        "ID", "INSTANCE", "EVENT", "ACTIVITY", "VISIBLE AT"
    );
    for task in tasks {
        let (name, inputs) = match task.scheduled() {
            Some(scheduled) => (
                scheduled.name.as_str(),
                scheduled
                    .inputs
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            None => ("?", String::new()),
        };
        let visible_at = task
            .event
            .visible_at
            .map(|at| at.to_rfc3339())
            .unwrap_or_else(|| "now".to_string());
        println!(
            "{:<36}  {:<12}  {:>5}  {:<12}  {:<24}  {}",
            task.id, task.instance.instance_id, task.event.event_id, name, visible_at, inputs
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;
    use weft_protocols::MemoryActivityStore;

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("42"), Payload::new(json!(42)));
        assert_eq!(parse_input("[1, 2]"), Payload::new(json!([1, 2])));
        assert_eq!(parse_input("\"quoted\""), Payload::new(json!("quoted")));
        assert_eq!(parse_input("plain text"), Payload::new(json!("plain text")));
    }

    #[tokio::test]
    async fn test_schedule_numbers_events_per_instance() {
        let store = MemoryActivityStore::new();
        let first = schedule(&store, "wf", "echo", &["1".into()], None).await.unwrap();
        let second = schedule(&store, "wf", "echo", &["2".into()], None).await.unwrap();
        let other = schedule(&store, "other", "echo", &[], None).await.unwrap();

        assert_eq!(first.event_id, 1);
        assert_eq!(second.event_id, 2);
        assert_eq!(other.event_id, 1);
        assert_eq!(store.pending_activities().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_schedule_with_delay() {
        let store = MemoryActivityStore::new();
        let event = schedule(&store, "wf", "echo", &[], Some(Duration::from_secs(60)))
            .await
            .unwrap();

        assert!(event.visible_at.is_some());
        assert!(store.poll_activity(Utc::now()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_open_store_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("weft.db");
        let store = open_store(&path, Duration::from_secs(5)).await.unwrap();

        schedule(&store, "wf", "sum", &["[1,2]".into()], None).await.unwrap();
        assert!(path.exists());
        pending(&store).await.unwrap();
    }
}
