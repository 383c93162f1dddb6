//! Database query functions for the `foods` table.

use anyhow::{Context, Result};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::Food;

/// Parameters for inserting a new food row.
#[derive(Debug, Clone)]
pub struct NewFood<'a> {
    pub name: &'a str,
    pub category: &'a str,
    pub calories: i32,
    pub allergens: &'a [String],
    pub image_url: Option<&'a str>,
    pub embedding: Option<&'a [f32]>,
}

/// Column values to change on an existing food. `None` leaves the column
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct FoodChanges<'a> {
    pub name: Option<&'a str>,
    pub category: Option<&'a str>,
    pub calories: Option<i32>,
    pub allergens: Option<&'a [String]>,
    pub image_url: Option<&'a str>,
    pub embedding: Option<&'a [f32]>,
}

/// Insert a new food. Returns the row with server-generated defaults.
pub async fn insert_food<'e, E>(executor: E, new: &NewFood<'_>) -> Result<Food>
where
    E: PgExecutor<'e>,
{
    let food = sqlx::query_as::<_, Food>(
        "INSERT INTO foods (name, category, calories, allergens, image_url, embedding) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING *",
    )
    .bind(new.name)
    .bind(new.category)
    .bind(new.calories)
    .bind(new.allergens)
    .bind(new.image_url)
    .bind(new.embedding)
    .fetch_one(executor)
    .await
    .with_context(|| format!("failed to insert food {:?}", new.name))?;

    Ok(food)
}

/// Fetch a food by its ID.
pub async fn get_food<'e, E>(executor: E, id: Uuid) -> Result<Option<Food>>
where
    E: PgExecutor<'e>,
{
    let food = sqlx::query_as::<_, Food>("SELECT * FROM foods WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
        .context("failed to fetch food")?;

    Ok(food)
}

/// Fetch the first food with exactly this name.
pub async fn get_food_by_name<'e, E>(executor: E, name: &str) -> Result<Option<Food>>
where
    E: PgExecutor<'e>,
{
    let food = sqlx::query_as::<_, Food>(
        "SELECT * FROM foods WHERE name = $1 ORDER BY created_at, id LIMIT 1",
    )
    .bind(name)
    .fetch_optional(executor)
    .await
    .with_context(|| format!("failed to fetch food by name {name:?}"))?;

    Ok(food)
}

/// Fetch every food whose id is in `ids`. Unknown ids are ignored.
pub async fn get_foods_by_ids<'e, E>(executor: E, ids: &[Uuid]) -> Result<Vec<Food>>
where
    E: PgExecutor<'e>,
{
    let foods = sqlx::query_as::<_, Food>(
        "SELECT * FROM foods WHERE id = ANY($1) ORDER BY created_at, id",
    )
    .bind(ids)
    .fetch_all(executor)
    .await
    .context("failed to fetch foods by id")?;

    Ok(foods)
}

/// List the whole catalog in insertion order.
pub async fn list_foods<'e, E>(executor: E) -> Result<Vec<Food>>
where
    E: PgExecutor<'e>,
{
    let foods = sqlx::query_as::<_, Food>("SELECT * FROM foods ORDER BY created_at, id")
        .fetch_all(executor)
        .await
        .context("failed to list foods")?;

    Ok(foods)
}

/// List one page of the catalog in insertion order.
pub async fn list_foods_page<'e, E>(executor: E, offset: i64, limit: i64) -> Result<Vec<Food>>
where
    E: PgExecutor<'e>,
{
    let foods = sqlx::query_as::<_, Food>(
        "SELECT * FROM foods ORDER BY created_at, id OFFSET $1 LIMIT $2",
    )
    .bind(offset)
    .bind(limit)
    .fetch_all(executor)
    .await
    .with_context(|| format!("failed to list foods (offset {offset}, limit {limit})"))?;

    Ok(foods)
}

/// List the foods of one category (exact match).
pub async fn list_foods_by_category<'e, E>(executor: E, category: &str) -> Result<Vec<Food>>
where
    E: PgExecutor<'e>,
{
    let foods = sqlx::query_as::<_, Food>(
        "SELECT * FROM foods WHERE category = $1 ORDER BY created_at, id",
    )
    .bind(category)
    .fetch_all(executor)
    .await
    .with_context(|| format!("failed to list foods in category {category:?}"))?;

    Ok(foods)
}

/// List foods with at most `max_calories` calories.
pub async fn list_foods_max_calories<'e, E>(executor: E, max_calories: i32) -> Result<Vec<Food>>
where
    E: PgExecutor<'e>,
{
    let foods = sqlx::query_as::<_, Food>(
        "SELECT * FROM foods WHERE calories <= $1 ORDER BY created_at, id",
    )
    .bind(max_calories)
    .fetch_all(executor)
    .await
    .context("failed to list low-calorie foods")?;

    Ok(foods)
}

/// Apply `changes` to a food. Returns `None` if the food does not exist.
pub async fn update_food<'e, E>(
    executor: E,
    id: Uuid,
    changes: &FoodChanges<'_>,
) -> Result<Option<Food>>
where
    E: PgExecutor<'e>,
{
    let food = sqlx::query_as::<_, Food>(
        "UPDATE foods SET \
             name = COALESCE($2, name), \
             category = COALESCE($3, category), \
             calories = COALESCE($4, calories), \
             allergens = COALESCE($5, allergens), \
             image_url = COALESCE($6, image_url), \
             embedding = COALESCE($7, embedding) \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(id)
    .bind(changes.name)
    .bind(changes.category)
    .bind(changes.calories)
    .bind(changes.allergens)
    .bind(changes.image_url)
    .bind(changes.embedding)
    .fetch_optional(executor)
    .await
    .with_context(|| format!("failed to update food {id}"))?;

    Ok(food)
}

/// Delete a food. Returns `false` if no row matched.
///
/// Plan links and buffet memberships of the food are removed with it.
pub async fn delete_food<'e, E>(executor: E, id: Uuid) -> Result<bool>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM foods WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await
        .with_context(|| format!("failed to delete food {id}"))?;

    Ok(result.rows_affected() > 0)
}

/// Number of foods in the catalog.
pub async fn count_foods<'e, E>(executor: E) -> Result<i64>
where
    E: PgExecutor<'e>,
{
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM foods")
        .fetch_one(executor)
        .await
        .context("failed to count foods")?;

    Ok(count)
}
