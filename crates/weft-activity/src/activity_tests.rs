use super::*;
use serde_json::json;
use std::convert::Infallible;

fn ctx() -> ActivityContext {
    ActivityContext {
        task_id: Uuid::new_v4(),
        instance: WorkflowInstance::with_execution("wf-1", "exec-1"),
        event_id: 3,
    }
}

fn inputs(values: &[serde_json::Value]) -> Vec<Payload> {
    values.iter().cloned().map(Payload::new).collect()
}

#[derive(Debug, thiserror::Error)]
#[error("negative input: {0}")]
struct NegativeInput(i64);

#[test]
fn test_descriptor_for_value_activity() {
    let activity = ActivityFn::new("add", |(a, b): (i64, i64)| async move {
        Ok::<_, Infallible>(a + b)
    });

    let descriptor = activity.descriptor();
    assert_eq!(descriptor.name, "add");
    assert_eq!(descriptor.params, vec!["i64", "i64"]);
    assert_eq!(descriptor.shape, ResultShape::ValueAndError);
    assert!(!descriptor.accepts_context);
    assert_eq!(descriptor.arity(), 2);
}

#[test]
fn test_descriptor_for_unit_activity() {
    let activity = ActivityFn::with_context("touch", |_ctx, (): ()| async move {
        Ok::<_, Infallible>(())
    });

    let descriptor = activity.descriptor();
    assert_eq!(descriptor.shape, ResultShape::ErrorOnly);
    assert!(descriptor.accepts_context);
    assert_eq!(descriptor.arity(), 0);
}

#[tokio::test]
async fn test_invoke_converts_result() {
    let activity = ActivityFn::new("greet", |(name,): (String,)| async move {
        Ok::<_, Infallible>(format!("hello {name}"))
    });

    let result = activity.invoke(ctx(), &inputs(&[json!("weft")])).await.unwrap();
    assert_eq!(result, Some(Payload::new(json!("hello weft"))));
}

#[tokio::test]
async fn test_invoke_unit_result_has_no_payload() {
    let activity = ActivityFn::new("noop", |(_n,): (u8,)| async move { Ok::<_, Infallible>(()) });

    let result = activity.invoke(ctx(), &inputs(&[json!(1)])).await.unwrap();
    assert_eq!(result, None);
}

#[tokio::test]
async fn test_context_reaches_handler() {
    let activity = ActivityFn::with_context("where", |ctx: ActivityContext, (): ()| async move {
        Ok::<_, Infallible>(format!("{}/{}", ctx.instance.instance_id, ctx.event_id))
    });

    let result = activity.invoke(ctx(), &[]).await.unwrap();
    assert_eq!(result, Some(Payload::new(json!("wf-1/3"))));
}

#[tokio::test]
async fn test_handler_error_is_reported() {
    let activity = ActivityFn::new("check", |(n,): (i64,)| async move {
        if n < 0 {
            Err(NegativeInput(n))
        } else {
            Ok(n)
        }
    });

    let err = activity.invoke(ctx(), &inputs(&[json!(-4)])).await.unwrap_err();
    assert!(err.is_activity_failure());
    assert_eq!(err.to_string(), "Activity failed: negative input: -4");
}

#[tokio::test]
async fn test_string_errors_are_accepted() {
    let activity = ActivityFn::new("fail", |(): ()| async move { Err::<(), _>("nope") });

    let err = activity.invoke(ctx(), &[]).await.unwrap_err();
    assert!(matches!(err, ActivityError::Failed(_)));
}

#[tokio::test]
async fn test_input_conversion_error() {
    let activity = ActivityFn::new("double", |(n,): (i64,)| async move { Ok::<_, Infallible>(n * 2) });

    let err = activity.invoke(ctx(), &inputs(&[json!("x")])).await.unwrap_err();
    assert!(matches!(err, ActivityError::InputConversion { index: 0, .. }));
}
