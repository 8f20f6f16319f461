//! Well-known role name constants.
//!
//! These must match the `chk_users_role` constraint in the users migration.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_CLIENT: &str = "client";
