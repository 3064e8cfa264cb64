//! # signet-entity
//!
//! Domain entity models for Signet: users, sessions, signatures, export
//! jobs, and dispatch log entries. All models derive `sqlx::FromRow` for
//! direct repository mapping plus serde for API serialization.

pub mod dispatch;
pub mod job;
pub mod session;
pub mod signature;
pub mod user;

pub use dispatch::{CreateDispatchLogEntry, DispatchLogEntry, DispatchStatus};
pub use job::{ExportJob, ExportJobStatus, NewExportJob};
pub use session::Session;
pub use signature::{CreateSignature, Signature};
pub use user::{User, UserRole};
