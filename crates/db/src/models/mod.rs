//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the database row, plus the `Deserialize` DTOs used for inserts.

pub mod conversation;
pub mod loyalty;
pub mod project;
pub mod promotion;
pub mod purchase;
pub mod user;
pub mod voucher;
