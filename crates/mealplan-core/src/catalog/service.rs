//! Catalog operations backed by the database.
//!
//! Food writes compute the name embedding through an [`Embedder`]; searches
//! load the catalog and rank it in process.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use mealplan_db::models::Food;
use mealplan_db::queries::foods::{self, FoodChanges, NewFood};

use super::filter::exclude_allergens;
use super::search::{recommend_foods, search_foods};
use crate::embedding::{DistanceRanker, Embedder};

/// Errors from catalog writes.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid food: {0}")]
    InvalidFood(String),

    #[error("food {0} not found")]
    FoodNotFound(Uuid),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// A food to add to the catalog, as read from API bodies and data files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodInput {
    pub name: String,
    pub category: String,
    pub calories: i32,
    #[serde(default)]
    pub allergens: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Partial update of a food. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FoodUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub calories: Option<i32>,
    pub allergens: Option<Vec<String>>,
    pub image_url: Option<String>,
}

/// Drop empty tags and repeated tags, keeping first occurrences in order.
pub fn normalize_allergens(allergens: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(allergens.len());
    for tag in allergens {
        if !tag.is_empty() && !out.contains(tag) {
            out.push(tag.clone());
        }
    }
    out
}

fn validate_name(name: &str) -> Result<&str, CatalogError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CatalogError::InvalidFood("name must not be empty".to_owned()));
    }
    Ok(name)
}

fn validate_calories(calories: i32) -> Result<i32, CatalogError> {
    if calories < 0 {
        return Err(CatalogError::InvalidFood(format!(
            "calories must not be negative (got {calories})"
        )));
    }
    Ok(calories)
}

/// Insert a food, embedding its name.
pub async fn create_food(
    pool: &PgPool,
    embedder: &dyn Embedder,
    input: &FoodInput,
) -> Result<Food, CatalogError> {
    let name = validate_name(&input.name)?;
    let calories = validate_calories(input.calories)?;
    let allergens = normalize_allergens(&input.allergens);
    let embedding = embedder
        .embed(name)
        .await
        .with_context(|| format!("failed to embed food name {name:?}"))?;

    let food = foods::insert_food(
        pool,
        &NewFood {
            name,
            category: input.category.trim(),
            calories,
            allergens: &allergens,
            image_url: input.image_url.as_deref(),
            embedding: Some(embedding.as_slice()),
        },
    )
    .await?;

    info!(food_id = %food.id, name = %food.name, "created food");
    Ok(food)
}

/// Apply `update` to a food, re-embedding the name when it changes.
pub async fn update_food(
    pool: &PgPool,
    embedder: &dyn Embedder,
    id: Uuid,
    update: &FoodUpdate,
) -> Result<Food, CatalogError> {
    let name = update.name.as_deref().map(validate_name).transpose()?;
    let calories = update.calories.map(validate_calories).transpose()?;
    let allergens = update.allergens.as_deref().map(normalize_allergens);

    let embedding = match name {
        Some(name) => Some(
            embedder
                .embed(name)
                .await
                .with_context(|| format!("failed to embed food name {name:?}"))?,
        ),
        None => None,
    };

    let changes = FoodChanges {
        name,
        category: update.category.as_deref().map(str::trim),
        calories,
        allergens: allergens.as_deref(),
        image_url: update.image_url.as_deref(),
        embedding: embedding.as_deref(),
    };

    let food = foods::update_food(pool, id, &changes)
        .await?
        .ok_or(CatalogError::FoodNotFound(id))?;

    info!(food_id = %food.id, renamed = name.is_some(), "updated food");
    Ok(food)
}

/// Delete a food and everything linking to it.
pub async fn delete_food(pool: &PgPool, id: Uuid) -> Result<(), CatalogError> {
    if !foods::delete_food(pool, id).await? {
        return Err(CatalogError::FoodNotFound(id));
    }
    info!(food_id = %id, "deleted food");
    Ok(())
}

/// Search the stored catalog. An empty `query` lists every food free of
/// `allergens`, unranked.
pub async fn search(
    pool: &PgPool,
    embedder: &dyn Embedder,
    ranker: &dyn DistanceRanker,
    query: &str,
    allergens: &[String],
    top_k: usize,
) -> anyhow::Result<Vec<Food>> {
    let catalog = foods::list_foods(pool).await?;
    if query.trim().is_empty() {
        return Ok(exclude_allergens(catalog, allergens));
    }
    search_foods(catalog, embedder, ranker, query, allergens, top_k).await
}

/// Recommendations from the stored catalog.
pub async fn recommendations(
    pool: &PgPool,
    embedder: &dyn Embedder,
    ranker: &dyn DistanceRanker,
    query: &str,
    allergens: &[String],
    max_calories: Option<i32>,
) -> anyhow::Result<Vec<Food>> {
    let catalog = foods::list_foods(pool).await?;
    recommend_foods(catalog, embedder, ranker, query, allergens, max_calories).await
}
