//! Execution context handed to workflow bodies.

use std::fmt;
use std::sync::Arc;

use weft_protocols::WorkflowInstance;

use crate::coroutine::CoroutineState;
use crate::error::CoroutineError;

/// Explicit execution context threaded through every blocking call.
///
/// A body receives the context of its own coroutine; drivers and tests can
/// build a detached one that carries no coroutine. Cloning is cheap.
#[derive(Clone, Default)]
pub struct WorkflowContext {
    instance: Option<WorkflowInstance>,
    coroutine: Option<Arc<CoroutineState>>,
}

impl WorkflowContext {
    /// Context for a workflow execution.
    pub fn new(instance: WorkflowInstance) -> Self {
        Self {
            instance: Some(instance),
            coroutine: None,
        }
    }

    /// Context that belongs to no workflow and no coroutine.
    pub fn detached() -> Self {
        Self::default()
    }

    pub(crate) fn with_coroutine(mut self, state: Arc<CoroutineState>) -> Self {
        self.coroutine = Some(state);
        self
    }

    /// The workflow execution this context belongs to.
    pub fn instance(&self) -> Option<&WorkflowInstance> {
        self.instance.as_ref()
    }

    /// The coroutine running this context.
    pub fn coroutine(&self) -> Result<&Arc<CoroutineState>, CoroutineError> {
        self.coroutine.as_ref().ok_or(CoroutineError::NotInCoroutine)
    }

    pub fn in_coroutine(&self) -> bool {
        self.coroutine.is_some()
    }

    /// Suspend the owning coroutine.
    pub fn suspend(&self) -> Result<(), CoroutineError> {
        self.coroutine()?.suspend()
    }
}

impl fmt::Debug for WorkflowContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowContext")
            .field("instance", &self.instance)
            .field("coroutine", &self.coroutine.as_ref().map(|c| c.id()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detached_has_no_coroutine() {
        let ctx = WorkflowContext::detached();
        assert!(!ctx.in_coroutine());
        assert!(ctx.instance().is_none());
        assert!(matches!(ctx.coroutine(), Err(CoroutineError::NotInCoroutine)));
    }

    #[test]
    fn test_suspend_outside_coroutine() {
        let ctx = WorkflowContext::new(WorkflowInstance::new("order-1"));
        assert!(matches!(ctx.suspend(), Err(CoroutineError::NotInCoroutine)));
        assert_eq!(ctx.instance().unwrap().instance_id, "order-1");
    }
}
