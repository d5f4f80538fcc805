//! # Weft Sync
//!
//! The execution core of weft: workflow bodies are written as ordinary
//! blocking code but advance in discrete steps driven from outside.
//!
//! ## Protocol
//!
//! ```text
//!   driver                           worker (one thread per coroutine)
//!   ──────                           ──────
//!   Coroutine::spawn ───────────────▶ park before running the body
//!   resume() ──── resume signal ────▶ run body until it suspends/returns
//!       ◀────── about-to-park signal ─┘
//!   resume() ──── resume signal ────▶ continue after suspend()
//!   abort()  ──── resume + exit ────▶ unwind from suspend(), never re-enter body
//! ```
//!
//! Driver and worker hand a baton back and forth; at most one of them is
//! computing at any instant. The only suspension points are explicit
//! [`CoroutineState::suspend`] calls, which bodies reach through the
//! blocking operations of [`Channel`].
//!
//! ## Key Components
//!
//! - [`Coroutine`]: Driver handle (`resume`, `abort`, status)
//! - [`CoroutineState`]: Worker-side state reachable from the body
//! - [`WorkflowContext`]: Explicit execution context passed to the body
//! - [`Channel`]: FIFO/rendezvous value passing between bodies

pub mod channel;
pub mod config;
pub mod context;
pub mod coroutine;
pub mod error;
mod waiter;

pub use channel::Channel;
pub use config::{CoroutineConfig, DEFAULT_RESUME_DEADLINE};
pub use context::WorkflowContext;
pub use coroutine::{Coroutine, CoroutineState};
pub use error::{ChannelError, CoroutineError};
