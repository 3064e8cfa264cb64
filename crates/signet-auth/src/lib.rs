//! # signet-auth
//!
//! Session-token authentication for Signet. Login and credential handling
//! live in the surrounding platform; this crate only resolves presented
//! bearer tokens into a [`RequestContext`].

pub mod context;
pub mod session;
pub mod token;

pub use context::RequestContext;
pub use session::SessionManager;
