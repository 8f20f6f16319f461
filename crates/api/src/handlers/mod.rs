//! Request handlers.
//!
//! Each submodule provides the async handler functions for one resource.
//! Handlers extract and validate input, delegate to `studio_db`
//! repositories or the engines, and map errors via [`AppError`](crate::error::AppError).

pub mod admin;
pub mod auth;
pub mod chat;
pub mod me;
pub mod payments;
