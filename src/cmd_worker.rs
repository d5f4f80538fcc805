//! `worker` command: lease due activities, execute them, complete them.

use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};
use weft_activity::ActivityExecutor;
use weft_protocols::{
    ActivityCompletedAttributes, ActivityFailedAttributes, ActivityStore, Event, EventAttributes,
};

/// Execute the next due activity, if any.
///
/// Returns the completion or failure event recorded for it. Failed
/// activities are completed as well; the failure event carries the reason.
pub(crate) async fn process_next(
    store: &dyn ActivityStore,
    executor: &ActivityExecutor,
) -> anyhow::Result<Option<Event>> {
    let Some(task) = store.poll_activity(Utc::now()).await? else {
        return Ok(None);
    };

    let attributes = match executor.execute_activity(&task).await {
        Ok(result) => EventAttributes::ActivityCompleted(ActivityCompletedAttributes { result }),
        Err(e) => {
            warn!(task = %task.id, error = %e, "activity failed");
            EventAttributes::ActivityFailed(ActivityFailedAttributes {
                reason: e.to_string(),
            })
        }
    };
    let outcome = Event::new(task.event.event_id, attributes);

    store.complete_activity(&task.id).await?;
    info!(
        task = %task.id,
        instance = %task.instance.instance_id,
        outcome = %outcome.event_type,
        "activity processed"
    );
    Ok(Some(outcome))
}

/// Poll until interrupted, or until nothing is due when `once` is set.
pub(crate) async fn run(
    store: &dyn ActivityStore,
    executor: &ActivityExecutor,
    poll_interval: Duration,
    once: bool,
) -> anyhow::Result<usize> {
    info!(?poll_interval, once, "worker started");
    let mut processed = 0;

    loop {
        if let Some(outcome) = process_next(store, executor).await? {
            processed += 1;
            println!("{}", serde_json::to_string(&outcome)?);
            continue;
        }

        if once {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(poll_interval) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, stopping worker");
                break;
            }
        }
    }

    info!(processed, "worker stopped");
    Ok(processed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activities::builtin_registry;
    use serde_json::json;
    use weft_protocols::{EventType, MemoryActivityStore, Payload, WorkflowInstance};

    fn executor() -> ActivityExecutor {
        ActivityExecutor::new(builtin_registry().unwrap())
    }

    async fn schedule(store: &MemoryActivityStore, name: &str, inputs: Vec<serde_json::Value>) {
        let event = Event::activity_scheduled(1, name, inputs.into_iter().map(Payload::new).collect());
        store
            .schedule_activity(&WorkflowInstance::new("wf"), &event)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_process_completed_activity() {
        let store = MemoryActivityStore::new();
        schedule(&store, "sum", vec![json!([4, 5])]).await;

        let outcome = process_next(&store, &executor()).await.unwrap().unwrap();
        match outcome.attributes {
            EventAttributes::ActivityCompleted(done) => {
                assert_eq!(done.result, Some(Payload::new(json!(9))));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(store.pending_activities().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_process_unknown_activity_records_failure() {
        let store = MemoryActivityStore::new();
        schedule(&store, "missing", vec![]).await;

        let outcome = process_next(&store, &executor()).await.unwrap().unwrap();
        assert_eq!(outcome.event_type, EventType::ActivityFailed);
        assert!(store.pending_activities().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_process_nothing_due() {
        let store = MemoryActivityStore::new();
        assert!(process_next(&store, &executor()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_run_once_drains_due_work() {
        let store = MemoryActivityStore::new();
        schedule(&store, "echo", vec![json!("a")]).await;
        schedule(&store, "note", vec![json!("b")]).await;

        let processed = run(&store, &executor(), Duration::from_millis(10), true)
            .await
            .unwrap();
        assert_eq!(processed, 2);
    }
}
