//! Activity trait, descriptors and the typed function adapter.

use std::any::TypeId;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use uuid::Uuid;
use weft_protocols::{ActivityTask, Converter, JsonConverter, Payload, WorkflowInstance};

use crate::args::ActivityArgs;
use crate::error::ActivityError;

/// Error type returned by activity bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// What an activity produces besides success or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultShape {
    /// Only an error indicator; a successful run yields no payload.
    ErrorOnly,
    /// A result value alongside the error indicator.
    ValueAndError,
}

/// Static description of a registered activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityDescriptor {
    pub name: String,
    /// Parameter type names, context excluded.
    pub params: Vec<&'static str>,
    pub shape: ResultShape,
    /// Whether the activity receives an [`ActivityContext`].
    pub accepts_context: bool,
}

impl ActivityDescriptor {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Execution context handed to context-accepting activities.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityContext {
    pub task_id: Uuid,
    pub instance: WorkflowInstance,
    pub event_id: i64,
}

impl ActivityContext {
    pub fn from_task(task: &ActivityTask) -> Self {
        Self {
            task_id: task.id,
            instance: task.instance.clone(),
            event_id: task.event.event_id,
        }
    }
}

/// A unit of work callable by name.
#[async_trait]
pub trait Activity: Send + Sync {
    fn descriptor(&self) -> &ActivityDescriptor;

    /// Run with already-validated positional inputs.
    async fn invoke(
        &self,
        ctx: ActivityContext,
        inputs: &[Payload],
    ) -> Result<Option<Payload>, ActivityError>;
}

type Handler<A, R> =
    Arc<dyn Fn(ActivityContext, A) -> BoxFuture<'static, Result<R, BoxError>> + Send + Sync>;

/// Adapts a typed async function into an [`Activity`].
///
/// Parameters are a tuple (`(i64, String)`, `()` for none). A handler
/// returning `Result<(), E>` has the [`ResultShape::ErrorOnly`] shape; any
/// other `Result<R, E>` yields a result payload.
pub struct ActivityFn<A, R, C = JsonConverter> {
    descriptor: ActivityDescriptor,
    handler: Handler<A, R>,
    converter: C,
    _marker: PhantomData<fn(A) -> R>,
}

impl<A, R> ActivityFn<A, R, JsonConverter>
where
    A: ActivityArgs,
    R: Serialize + Send + 'static,
{
    pub fn new<F, Fut, E>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        let handler: Handler<A, R> = Arc::new(move |_ctx, args| {
            let fut = f(args);
            async move { fut.await.map_err(Into::into) }.boxed()
        });
        Self::build(name.into(), false, handler)
    }

    /// Like [`ActivityFn::new`], with the handler also receiving the
    /// [`ActivityContext`] of the task being executed.
    pub fn with_context<F, Fut, E>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(ActivityContext, A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        let handler: Handler<A, R> = Arc::new(move |ctx, args| {
            let fut = f(ctx, args);
            async move { fut.await.map_err(Into::into) }.boxed()
        });
        Self::build(name.into(), true, handler)
    }

    fn build(name: String, accepts_context: bool, handler: Handler<A, R>) -> Self {
        let shape = if TypeId::of::<R>() == TypeId::of::<()>() {
            ResultShape::ErrorOnly
        } else {
            ResultShape::ValueAndError
        };

        Self {
            descriptor: ActivityDescriptor {
                name,
                params: A::param_types(),
                shape,
                accepts_context,
            },
            handler,
            converter: JsonConverter,
            _marker: PhantomData,
        }
    }
}

impl<A, R, C: Converter> ActivityFn<A, R, C> {
    /// Swap the converter used for inputs and results.
    pub fn with_converter<C2: Converter>(self, converter: C2) -> ActivityFn<A, R, C2> {
        ActivityFn {
            descriptor: self.descriptor,
            handler: self.handler,
            converter,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<A, R, C> Activity for ActivityFn<A, R, C>
where
    A: ActivityArgs,
    R: Serialize + Send + 'static,
    C: Converter,
{
    fn descriptor(&self) -> &ActivityDescriptor {
        &self.descriptor
    }

    async fn invoke(
        &self,
        ctx: ActivityContext,
        inputs: &[Payload],
    ) -> Result<Option<Payload>, ActivityError> {
        let args = A::from_inputs(&self.converter, inputs)?;
        let result = (self.handler)(ctx, args)
            .await
            .map_err(ActivityError::Failed)?;

        match self.descriptor.shape {
            ResultShape::ErrorOnly => Ok(None),
            ResultShape::ValueAndError => self
                .converter
                .to_payload(&result)
                .map(Some)
                .map_err(ActivityError::ResultConversion),
        }
    }
}

impl<A, R, C> fmt::Debug for ActivityFn<A, R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivityFn")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "activity_tests.rs"]
mod tests;
