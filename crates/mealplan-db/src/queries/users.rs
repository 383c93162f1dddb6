//! Database query functions for the `users` table.

use anyhow::{Context, Result};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::User;

/// Parameters for inserting a new user row.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub allergies: &'a [String],
}

/// Insert a new user.
///
/// Returns `None` when the email is already taken. The check happens inside
/// the insert, so concurrent inserts of one email yield exactly one row.
pub async fn insert_user<'e, E>(executor: E, new: &NewUser<'_>) -> Result<Option<User>>
where
    E: PgExecutor<'e>,
{
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (name, email, allergies) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (email) DO NOTHING \
         RETURNING *",
    )
    .bind(new.name)
    .bind(new.email)
    .bind(new.allergies)
    .fetch_optional(executor)
    .await
    .with_context(|| format!("failed to insert user {:?}", new.email))?;

    Ok(user)
}

/// Fetch a user by ID.
pub async fn get_user<'e, E>(executor: E, id: Uuid) -> Result<Option<User>>
where
    E: PgExecutor<'e>,
{
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
        .context("failed to fetch user")?;

    Ok(user)
}

/// Fetch a user by email (exact match).
pub async fn get_user_by_email<'e, E>(executor: E, email: &str) -> Result<Option<User>>
where
    E: PgExecutor<'e>,
{
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(executor)
        .await
        .with_context(|| format!("failed to fetch user by email {email:?}"))?;

    Ok(user)
}
