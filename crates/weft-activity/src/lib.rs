//! Activity dispatch for weft.
//!
//! Activities are registered under a name together with a descriptor of
//! their parameter list and result shape. Dispatch binds the positional
//! payload inputs of an activity-scheduled event to the typed parameters
//! and converts the result back to a payload.
//!
//! ```ignore
//! let registry = Arc::new(ActivityRegistry::new());
//! registry.register(Arc::new(ActivityFn::new("add", |(a, b): (i64, i64)| async move {
//!     Ok::<_, Infallible>(a + b)
//! })))?;
//!
//! let executor = ActivityExecutor::new(registry);
//! let result = executor.execute_activity(&task).await?;
//! ```

pub mod activity;
pub mod args;
pub mod error;
pub mod executor;
pub mod registry;

pub use activity::{Activity, ActivityContext, ActivityDescriptor, ActivityFn, BoxError, ResultShape};
pub use args::ActivityArgs;
pub use error::ActivityError;
pub use executor::ActivityExecutor;
pub use registry::ActivityRegistry;
