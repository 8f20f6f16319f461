//! Repository for the `users` table.

use sqlx::PgPool;
use studio_core::types::DbId;

use crate::models::user::{CreateUser, User};
use crate::repositories::LoyaltyRepo;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, email, name, password_hash, role, created_at, updated_at";

/// Provides account operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user together with their zeroed loyalty row.
    ///
    /// Both rows are written in one transaction so every account has exactly
    /// one loyalty record from the moment it exists. A duplicate email
    /// surfaces as a unique violation on `uq_users_email`.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO users (email, name, password_hash, role)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(&input.email)
            .bind(&input.name)
            .bind(&input.password_hash)
            .bind(&input.role)
            .fetch_one(&mut *tx)
            .await?;

        LoyaltyRepo::ensure_for_user(&mut tx, user.id).await?;

        tx.commit().await?;
        Ok(user)
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by email. Callers normalise to lowercase before lookup.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }
}
