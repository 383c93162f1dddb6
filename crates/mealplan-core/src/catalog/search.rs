//! Semantic search and recommendations over the food catalog.

use anyhow::{Context, Result};
use tracing::debug;

use mealplan_db::models::Food;

use super::filter::{RECOMMENDATION_LIMIT, exclude_allergens, rank_by_relevance, recommend};
use crate::embedding::{DistanceRanker, Embedder};

/// Default number of foods a search ranks.
pub const SEARCH_TOP_K: usize = 10;
/// Number of ranked candidates a recommendation is drawn from.
pub const RECOMMEND_CANDIDATES: usize = 20;

/// Rank `catalog` by relevance to `query`, keep the `top_k` closest foods,
/// then drop those containing any of `allergens`.
///
/// The allergen filter runs after truncation, so fewer than `top_k` foods
/// may come back.
pub async fn search_foods<S: AsRef<str>>(
    catalog: Vec<Food>,
    embedder: &dyn Embedder,
    ranker: &dyn DistanceRanker,
    query: &str,
    allergens: &[S],
    top_k: usize,
) -> Result<Vec<Food>> {
    let query_embedding = embedder
        .embed(query)
        .await
        .with_context(|| format!("failed to embed query {query:?} with {}", embedder.name()))?;

    let ranked = rank_by_relevance(catalog, &query_embedding, top_k, ranker);
    let foods = exclude_allergens(ranked, allergens);
    debug!(query, top_k, results = foods.len(), "searched catalog");
    Ok(foods)
}

/// Up to [`RECOMMENDATION_LIMIT`] foods relevant to `query`, free of
/// `allergens` and, when `max_calories` is given, under that ceiling.
pub async fn recommend_foods<S: AsRef<str>>(
    catalog: Vec<Food>,
    embedder: &dyn Embedder,
    ranker: &dyn DistanceRanker,
    query: &str,
    allergens: &[S],
    max_calories: Option<i32>,
) -> Result<Vec<Food>> {
    let candidates = search_foods(
        catalog,
        embedder,
        ranker,
        query,
        allergens,
        RECOMMEND_CANDIDATES,
    )
    .await?;
    Ok(recommend(candidates, allergens, max_calories, RECOMMENDATION_LIMIT))
}
