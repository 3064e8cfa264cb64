//! Shared domain types.

pub mod id;
pub mod pagination;

pub use id::{DispatchLogId, SignatureId, UserId};
pub use pagination::{PageRequest, PageResponse};
