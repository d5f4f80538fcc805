//! Built-in activities available to the worker and the demo.

use std::convert::Infallible;
use std::sync::Arc;

use serde_json::Value;
use tracing::info;
use weft_activity::{ActivityContext, ActivityError, ActivityFn, ActivityRegistry};

/// Registry holding `echo`, `sum` and `note`.
pub(crate) fn builtin_registry() -> Result<Arc<ActivityRegistry>, ActivityError> {
    let registry = Arc::new(ActivityRegistry::new());

    registry.register(Arc::new(ActivityFn::new("echo", |(value,): (Value,)| async move {
        Ok::<_, Infallible>(value)
    })))?;

    registry.register(Arc::new(ActivityFn::new(
        "sum",
        |(values,): (Vec<i64>,)| async move {
            values
                .iter()
                .try_fold(0i64, |acc, v| acc.checked_add(*v))
                .ok_or("sum overflows i64")
        },
    )))?;

    registry.register(Arc::new(ActivityFn::with_context(
        "note",
        |ctx: ActivityContext, (message,): (String,)| async move {
            info!(
                instance = %ctx.instance.instance_id,
                event_id = ctx.event_id,
                "note: {}",
                message
            );
            Ok::<_, Infallible>(())
        },
    )))?;

    Ok(registry)
}
