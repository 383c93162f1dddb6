//! Database query functions for the `buffets` and `buffet_foods` tables.

use anyhow::{Context, Result};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::{Buffet, Food};

/// Insert a new buffet.
pub async fn insert_buffet<'e, E>(
    executor: E,
    name: &str,
    description: Option<&str>,
) -> Result<Buffet>
where
    E: PgExecutor<'e>,
{
    let buffet = sqlx::query_as::<_, Buffet>(
        "INSERT INTO buffets (name, description) VALUES ($1, $2) RETURNING *",
    )
    .bind(name)
    .bind(description)
    .fetch_one(executor)
    .await
    .with_context(|| format!("failed to insert buffet {name:?}"))?;

    Ok(buffet)
}

/// Fetch a buffet by ID.
pub async fn get_buffet<'e, E>(executor: E, id: Uuid) -> Result<Option<Buffet>>
where
    E: PgExecutor<'e>,
{
    let buffet = sqlx::query_as::<_, Buffet>("SELECT * FROM buffets WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
        .context("failed to fetch buffet")?;

    Ok(buffet)
}

/// Add a food to a buffet. Idempotent (ON CONFLICT DO NOTHING).
///
/// Returns `true` when a new membership row was written.
pub async fn add_food_to_buffet<'e, E>(executor: E, buffet_id: Uuid, food_id: Uuid) -> Result<bool>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        "INSERT INTO buffet_foods (buffet_id, food_id) \
         VALUES ($1, $2) \
         ON CONFLICT DO NOTHING",
    )
    .bind(buffet_id)
    .bind(food_id)
    .execute(executor)
    .await
    .with_context(|| format!("failed to add food {food_id} to buffet {buffet_id}"))?;

    Ok(result.rows_affected() > 0)
}

/// All foods of a buffet, in the order they were added.
pub async fn list_buffet_foods<'e, E>(executor: E, buffet_id: Uuid) -> Result<Vec<Food>>
where
    E: PgExecutor<'e>,
{
    let foods = sqlx::query_as::<_, Food>(
        "SELECT f.* FROM foods f \
         JOIN buffet_foods bf ON bf.food_id = f.id \
         WHERE bf.buffet_id = $1 \
         ORDER BY bf.added_at, bf.id",
    )
    .bind(buffet_id)
    .fetch_all(executor)
    .await
    .with_context(|| format!("failed to list foods for buffet {buffet_id}"))?;

    Ok(foods)
}
