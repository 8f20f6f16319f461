//! Domain rules for the studio booking backend.
//!
//! This crate has zero internal dependencies so the same rules can be used
//! by the repository layer, the HTTP server, and tests.

pub mod error;
pub mod loyalty;
pub mod money;
pub mod project_status;
pub mod purchase_flow;
pub mod roles;
pub mod types;
pub mod validation;
