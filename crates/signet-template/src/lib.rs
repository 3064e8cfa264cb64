//! # signet-template
//!
//! The template side of signature rendering: a sandboxed store that
//! resolves template names to HTML files inside one directory, and a
//! renderer that substitutes signature fields with mandatory HTML
//! escaping.

pub mod renderer;
pub mod store;

pub use renderer::SignatureRenderer;
pub use store::TemplateStore;
