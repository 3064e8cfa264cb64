//! Concrete repository implementations.
//!
//! Each repository owns a cloned pool handle and exposes focused query
//! methods; all sqlx errors are mapped into [`signet_core::AppError`].

pub mod dispatch_log;
pub mod export_job;
pub mod session;
pub mod signature;
pub mod user;

pub use dispatch_log::DispatchLogRepository;
pub use export_job::ExportJobRepository;
pub use session::SessionRepository;
pub use signature::SignatureRepository;
pub use user::UserRepository;
