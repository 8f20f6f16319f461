//! Business workflows that span the ledger, external gateways, and
//! notifications.
//!
//! Handlers stay thin: they extract and validate HTTP input, then call into
//! one of these engines.

pub mod chat;
pub mod loyalty;
pub mod purchase;
