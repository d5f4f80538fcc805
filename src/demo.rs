//! Producer/consumer demo workflow.
//!
//! Two coroutines share a channel: the producer sends `1..=items` and
//! closes it, the consumer collects until end-of-channel. The driver steps
//! both round-robin on a blocking thread, then hands the collected values
//! to the `sum` activity.

use std::sync::Arc;

use anyhow::{Context, bail};
use parking_lot::Mutex;
use serde_json::json;
use tracing::{debug, info};
use weft_activity::{ActivityExecutor, ActivityRegistry};
use weft_protocols::{ActivityTask, Event, Payload, WorkflowInstance};
use weft_sync::{Channel, Coroutine, CoroutineConfig, WorkflowContext};

/// Outcome of a demo run.
#[derive(Debug, PartialEq)]
pub(crate) struct DemoReport {
    pub received: Vec<i64>,
    pub rounds: usize,
    pub total: Option<Payload>,
}

pub(crate) async fn run(
    registry: Arc<ActivityRegistry>,
    coroutine: CoroutineConfig,
    capacity: usize,
    items: u32,
) -> anyhow::Result<DemoReport> {
    let instance = WorkflowInstance::new("demo");
    let ctx = WorkflowContext::new(instance.clone());

    let (received, rounds) =
        tokio::task::spawn_blocking(move || run_workflow(ctx, coroutine, capacity, items))
            .await
            .context("workflow driver thread failed")??;

    let task = ActivityTask::new(
        instance,
        Event::activity_scheduled(1, "sum", vec![Payload::new(json!(received))]),
    );
    let total = ActivityExecutor::new(registry)
        .execute_activity(&task)
        .await
        .context("sum activity failed")?;

    Ok(DemoReport {
        received,
        rounds,
        total,
    })
}

fn run_workflow(
    ctx: WorkflowContext,
    config: CoroutineConfig,
    capacity: usize,
    items: u32,
) -> anyhow::Result<(Vec<i64>, usize)> {
    let channel = Channel::buffered(capacity);
    let received = Arc::new(Mutex::new(Vec::new()));
    let failure = Arc::new(Mutex::new(None::<String>));

    let tx = channel.clone();
    let producer_failure = failure.clone();
    let producer = Coroutine::spawn_with_config(ctx.clone(), config, move |ctx| {
        for value in 1..=i64::from(items) {
            if let Err(e) = tx.send(&ctx, &value) {
                *producer_failure.lock() = Some(format!("producer: {e}"));
                return;
            }
        }
        tx.close();
    })?;

    let rx = channel.clone();
    let sink = received.clone();
    let consumer_failure = failure.clone();
    let consumer = Coroutine::spawn_with_config(ctx, config, move |ctx| {
        let mut value = 0i64;
        loop {
            match rx.receive(&ctx, &mut value) {
                Ok(true) => sink.lock().push(value),
                Ok(false) => break,
                Err(e) => {
                    *consumer_failure.lock() = Some(format!("consumer: {e}"));
                    break;
                }
            }
        }
    })?;

    let rounds = drive(&mut [producer, consumer])?;
    if let Some(message) = failure.lock().take() {
        bail!(message);
    }

    let values = std::mem::take(&mut *received.lock());
    info!(rounds, values = values.len(), capacity, "workflow finished");
    Ok((values, rounds))
}

/// Step every unfinished coroutine until all finish.
///
/// Fails when a whole round neither finishes a coroutine nor completes a
/// channel hand-off, since no further step can change anything.
fn drive(coroutines: &mut [Coroutine]) -> anyhow::Result<usize> {
    let mut rounds = 0;
    while coroutines.iter().any(|co| !co.finished()) {
        rounds += 1;
        let mut advanced = false;
        for co in coroutines.iter_mut().filter(|co| !co.finished()) {
            co.resume()?;
            if let Some(message) = co.panic_message() {
                bail!("coroutine {} panicked: {}", co.id(), message);
            }
            advanced |= co.progress() || co.finished();
        }
        debug!(round = rounds, advanced, "driver round");
        if !advanced {
            bail!("workflow stalled after {} rounds", rounds);
        }
    }
    Ok(rounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activities::builtin_registry;

    #[tokio::test]
    async fn test_demo_unbuffered() {
        let report = run(builtin_registry().unwrap(), CoroutineConfig::default(), 0, 5)
            .await
            .unwrap();
        assert_eq!(report.received, vec![1, 2, 3, 4, 5]);
        assert_eq!(report.total, Some(Payload::new(json!(15))));
    }

    #[tokio::test]
    async fn test_demo_buffered() {
        let report = run(builtin_registry().unwrap(), CoroutineConfig::default(), 3, 10)
            .await
            .unwrap();
        assert_eq!(report.received, (1..=10).collect::<Vec<_>>());
        assert_eq!(report.total, Some(Payload::new(json!(55))));
    }

    #[tokio::test]
    async fn test_demo_without_items() {
        let report = run(builtin_registry().unwrap(), CoroutineConfig::default(), 0, 0)
            .await
            .unwrap();
        assert!(report.received.is_empty());
        assert_eq!(report.total, Some(Payload::new(json!(0))));
    }

    #[test]
    fn test_stalled_workflow_is_reported() {
        let channel = Channel::new();
        let rx = channel.clone();
        let waiter = Coroutine::spawn(WorkflowContext::detached(), move |ctx| {
            let mut value = 0i64;
            let _ = rx.receive(&ctx, &mut value);
        })
        .unwrap();

        let mut coroutines = [waiter];
        let err = drive(&mut coroutines).unwrap_err();
        assert!(err.to_string().contains("stalled"));

        channel.close();
        coroutines[0].resume().unwrap();
        assert!(coroutines[0].finished());
    }
}
