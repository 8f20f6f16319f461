//! Authentication primitives: JWT session tokens, Argon2id password hashing,
//! and the session cookie that carries the token.

pub mod cookie;
pub mod jwt;
pub mod password;
