//! Route handlers organized by domain.

pub mod admin;
pub mod dispatch;
pub mod export;
pub mod health;
pub mod signature;
