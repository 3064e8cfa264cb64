//! Dispatch log entity.

pub mod model;
pub mod status;

pub use model::{CreateDispatchLogEntry, DispatchLogEntry};
pub use status::DispatchStatus;
