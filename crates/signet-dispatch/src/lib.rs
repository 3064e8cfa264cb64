//! # signet-dispatch
//!
//! Bulk dispatch of rendered signatures to their owners' mailboxes. A run
//! walks the submitted items strictly in order, sends each through the
//! outbound [`Courier`](transport::Courier), records every attempt in the
//! dispatch log, and reports per-item progress over an event channel that
//! doubles as the cancellation signal: when the listener goes away, the
//! run stops.

pub mod engine;
pub mod event;
pub mod transport;

pub use engine::{DispatchEngine, DispatchOutcome};
pub use event::{Progress, ProgressEvent};
pub use transport::{Courier, Delivery, HttpCourier};
