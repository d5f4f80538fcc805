//! # Weft Protocols
//!
//! Shared types and protocol traits for the weft workflow core.
//! Holds the data that crosses crate boundaries and the seams that
//! backends and executors plug into.
//!
//! ## Contents
//!
//! - [`Payload`] - Opaque transport value carried by channels and activities
//! - [`Converter`] - Adapts payloads to and from caller-requested types
//! - [`Event`] - History event persisted by the scheduling store
//! - [`ActivityTask`] - A unit of scheduled activity work
//! - [`ActivityStore`] - Trait for durable scheduling stores

pub mod converter;
pub mod error;
pub mod history;
pub mod payload;
pub mod store;
pub mod task;

pub use converter::{Converter, JsonConverter};
pub use error::{ConversionError, StoreError};
pub use history::{
    ActivityCompletedAttributes, ActivityFailedAttributes, ActivityScheduledAttributes, Event,
    EventAttributes, EventType,
};
pub use payload::Payload;
pub use store::{ActivityStore, MemoryActivityStore};
pub use task::{ActivityTask, WorkflowInstance};
