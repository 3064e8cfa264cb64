//! End-to-end tests over the full Signet HTTP surface.
//!
//! Every test builds a complete application through [`helpers::TestApp`]
//! and talks to it through the router, the same way a browser would.

mod helpers;

mod auth_test;
mod dispatch_test;
mod signature_test;
