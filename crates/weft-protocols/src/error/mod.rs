//! Error types for the weft protocol layer.

mod conversion;
mod store;

pub use conversion::*;
pub use store::*;
