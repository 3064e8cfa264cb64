//! Signature entity.

pub mod model;

pub use model::{CreateSignature, Signature};
