//! Cooperative coroutine state machine.
//!
//! Each coroutine body runs on its own worker thread, but the worker and
//! its driver never compute at the same time: two rendezvous signals pass
//! a baton between them.
//!
//! - The capacity-0 *resume* signal is sent by the driver and received by
//!   the parked worker.
//! - The capacity-1 *parked* signal is sent by the worker when it is about
//!   to park (or has finished) and drained by the driver.
//!
//! States: `Created` (worker parked before the body) → `Running` →
//! `Blocked` (parked in `suspend`) → ... → `Finished`.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};

use parking_lot::Mutex;
use tracing::{debug, debug_span, error, warn};
use uuid::Uuid;

use crate::config::CoroutineConfig;
use crate::context::WorkflowContext;
use crate::error::CoroutineError;

/// Unwind payload that tears down a worker asked to exit.
struct ExitSignal;

/// Worker-side coroutine state, shared with the body through its
/// [`WorkflowContext`].
pub struct CoroutineState {
    id: Uuid,
    parked: SyncSender<()>,
    /// Taken when the worker finishes so a late resume fails fast.
    resume: Mutex<Option<Receiver<()>>>,
    worker: OnceLock<ThreadId>,
    blocked: AtomicBool,
    finished: AtomicBool,
    should_exit: AtomicBool,
    progress: AtomicBool,
    panic_message: Mutex<Option<String>>,
}

impl CoroutineState {
    fn new(id: Uuid, parked: SyncSender<()>, resume: Receiver<()>) -> Self {
        Self {
            id,
            parked,
            resume: Mutex::new(Some(resume)),
            worker: OnceLock::new(),
            blocked: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            should_exit: AtomicBool::new(false),
            progress: AtomicBool::new(false),
            panic_message: Mutex::new(None),
        }
    }

    /// Coroutine ID, used in log fields.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Whether the worker is parked at a suspension point.
    pub fn blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Whether the body has returned or been torn down. Never reset.
    pub fn finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    /// Whether the current step was flagged as having made progress.
    pub fn progress(&self) -> bool {
        self.progress.load(Ordering::SeqCst)
    }

    pub fn mark_progress(&self) {
        self.progress.store(true, Ordering::SeqCst);
    }

    pub fn reset_progress(&self) {
        self.progress.store(false, Ordering::SeqCst);
    }

    /// Whether the driver asked the coroutine to exit.
    pub fn exit_requested(&self) -> bool {
        self.should_exit.load(Ordering::SeqCst)
    }

    /// Message of the panic that ended the body, if any.
    pub fn panic_message(&self) -> Option<String> {
        self.panic_message.lock().clone()
    }

    /// Park the body and hand control back to the driver.
    ///
    /// Returns once the driver resumes the coroutine. If the driver
    /// aborted it instead (or dropped its handle), the worker unwinds from
    /// here and the rest of the body never runs.
    ///
    /// A body that catches that unwind with its own `catch_unwind` keeps
    /// running, but its next `suspend` unwinds again without parking.
    pub fn suspend(&self) -> Result<(), CoroutineError> {
        if self.worker.get() != Some(&thread::current().id()) {
            return Err(CoroutineError::NotOnWorker { id: self.id });
        }
        self.park(true);
        Ok(())
    }

    fn park(&self, notify_driver: bool) {
        if self.exit_requested() {
            debug!(coroutine = %self.id, "exit already requested, unwinding");
            panic::resume_unwind(Box::new(ExitSignal));
        }

        self.blocked.store(true, Ordering::SeqCst);
        if notify_driver {
            debug!(coroutine = %self.id, "suspending");
            self.signal_parked();
        }

        let resumed = match self.resume.lock().as_ref() {
            Some(resume) => resume.recv().is_ok(),
            None => false,
        };

        if !resumed || self.exit_requested() {
            debug!(coroutine = %self.id, "exit requested, unwinding");
            panic::resume_unwind(Box::new(ExitSignal));
        }

        self.blocked.store(false, Ordering::SeqCst);
        debug!(coroutine = %self.id, "resumed");
    }

    fn signal_parked(&self) {
        match self.parked.try_send(()) {
            // Disconnected: the driver handle is gone, nobody is waiting.
            Ok(()) | Err(TrySendError::Disconnected(())) => {}
            Err(TrySendError::Full(())) => {
                warn!(coroutine = %self.id, "park signal sent twice without a resume");
            }
        }
    }

    fn finish(&self) {
        self.resume.lock().take();
        self.blocked.store(false, Ordering::SeqCst);
        self.finished.store(true, Ordering::SeqCst);
        debug!(coroutine = %self.id, "finished");
        self.signal_parked();
    }
}

impl fmt::Debug for CoroutineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoroutineState")
            .field("id", &self.id)
            .field("blocked", &self.blocked())
            .field("finished", &self.finished())
            .field("should_exit", &self.exit_requested())
            .field("progress", &self.progress())
            .finish()
    }
}

/// Marks the coroutine finished however the worker leaves the body.
struct FinishGuard(Arc<CoroutineState>);

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.0.finish();
    }
}

fn run_worker<F>(state: Arc<CoroutineState>, ctx: WorkflowContext, body: F)
where
    F: FnOnce(WorkflowContext),
{
    let span = debug_span!("coroutine", id = %state.id);
    let _entered = span.enter();

    let _ = state.worker.set(thread::current().id());
    let _finish = FinishGuard(state.clone());

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        state.park(false);
        body(ctx);
    }));

    if let Err(payload) = outcome {
        if payload.is::<ExitSignal>() {
            debug!(coroutine = %state.id, "exited before completion");
        } else {
            let message = panic_message(payload.as_ref());
            error!(coroutine = %state.id, "coroutine body panicked: {}", message);
            *state.panic_message.lock() = Some(message);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Driver handle for one coroutine.
///
/// Stepping takes `&mut self`, so only one `resume`/`abort` can be in
/// flight per coroutine. Dropping the handle of an unfinished coroutine
/// tears its worker down the same way `abort` does.
pub struct Coroutine {
    state: Arc<CoroutineState>,
    resume: SyncSender<()>,
    parked: Receiver<()>,
    config: CoroutineConfig,
    poisoned: bool,
}

impl Coroutine {
    /// Spawn a coroutine with the default configuration.
    ///
    /// The body does not start running until the first [`resume`](Self::resume).
    pub fn spawn<F>(ctx: WorkflowContext, body: F) -> Result<Self, CoroutineError>
    where
        F: FnOnce(WorkflowContext) + Send + 'static,
    {
        Self::spawn_with_config(ctx, CoroutineConfig::default(), body)
    }

    /// Spawn a coroutine with a custom configuration.
    pub fn spawn_with_config<F>(
        ctx: WorkflowContext,
        config: CoroutineConfig,
        body: F,
    ) -> Result<Self, CoroutineError>
    where
        F: FnOnce(WorkflowContext) + Send + 'static,
    {
        let id = Uuid::new_v4();
        let (parked_tx, parked_rx) = mpsc::sync_channel(1);
        let (resume_tx, resume_rx) = mpsc::sync_channel(0);

        let state = Arc::new(CoroutineState::new(id, parked_tx, resume_rx));
        let body_ctx = ctx.with_coroutine(state.clone());
        let worker_state = state.clone();

        let mut name = id.simple().to_string();
        name.truncate(8);
        thread::Builder::new()
            .name(format!("weft-co-{}", name))
            .spawn(move || run_worker(worker_state, body_ctx, body))?;

        debug!(coroutine = %id, deadline = ?config.resume_deadline, "spawned");

        Ok(Self {
            state,
            resume: resume_tx,
            parked: parked_rx,
            config,
            poisoned: false,
        })
    }

    /// Advance the coroutine until it suspends again or finishes.
    ///
    /// No-op on a finished coroutine. Fails with
    /// [`CoroutineError::Deadlock`] when the body neither suspends nor
    /// finishes within the resume deadline; the handle is poisoned after
    /// that and every later step fails with [`CoroutineError::Poisoned`].
    pub fn resume(&mut self) -> Result<(), CoroutineError> {
        if self.poisoned {
            return Err(CoroutineError::Poisoned { id: self.state.id });
        }

        self.state.reset_progress();

        if self.state.finished() {
            debug!(coroutine = %self.state.id, "resume: already finished");
            return Ok(());
        }

        debug!(coroutine = %self.state.id, "resume: unblocking");
        if self.resume.send(()).is_err() {
            // The worker released its end while finishing.
            let _ = self.parked.try_recv();
            return Ok(());
        }

        match self.parked.recv_timeout(self.config.resume_deadline) {
            Ok(()) => {
                debug!(
                    coroutine = %self.state.id,
                    blocked = self.state.blocked(),
                    finished = self.state.finished(),
                    "resume: parked"
                );
                Ok(())
            }
            Err(RecvTimeoutError::Timeout) => {
                self.poisoned = true;
                error!(
                    coroutine = %self.state.id,
                    deadline = ?self.config.resume_deadline,
                    "coroutine did not suspend or finish in time"
                );
                Err(CoroutineError::Deadlock {
                    id: self.state.id,
                    deadline: self.config.resume_deadline,
                })
            }
            // The state owns the sender and we hold the state.
            Err(RecvTimeoutError::Disconnected) => Ok(()),
        }
    }

    /// Terminate a coroutine parked at a suspension point.
    ///
    /// The pending `suspend` unwinds instead of returning, so no body code
    /// after it runs. No-op on a finished coroutine.
    ///
    /// If the body catches the unwind, this returns once the body finishes
    /// or reaches its next `suspend`, which unwinds again. A body that
    /// catches it and then loops without suspending trips the resume
    /// deadline.
    pub fn abort(&mut self) -> Result<(), CoroutineError> {
        if self.state.finished() {
            return Ok(());
        }

        debug!(coroutine = %self.state.id, "aborting");
        self.state.should_exit.store(true, Ordering::SeqCst);
        self.resume()
    }

    pub fn id(&self) -> Uuid {
        self.state.id
    }

    pub fn blocked(&self) -> bool {
        self.state.blocked()
    }

    pub fn finished(&self) -> bool {
        self.state.finished()
    }

    pub fn progress(&self) -> bool {
        self.state.progress()
    }

    /// Whether an earlier step deadlocked.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub fn panic_message(&self) -> Option<String> {
        self.state.panic_message()
    }

    /// Shared worker-side state.
    pub fn state(&self) -> &Arc<CoroutineState> {
        &self.state
    }
}

impl fmt::Debug for Coroutine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coroutine")
            .field("state", &self.state)
            .field("poisoned", &self.poisoned)
            .finish()
    }
}

impl Drop for Coroutine {
    fn drop(&mut self) {
        if !self.state.finished() {
            debug!(coroutine = %self.state.id, "handle dropped, releasing worker");
        }
    }
}

#[cfg(test)]
#[path = "coroutine_tests.rs"]
mod tests;
