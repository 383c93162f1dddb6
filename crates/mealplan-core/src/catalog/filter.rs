//! Pure catalog filters.
//!
//! Every function here takes the candidate foods by value and returns the
//! surviving subsequence in input order. None of them can fail; an empty
//! input yields an empty output.

use std::collections::{HashMap, HashSet};

use mealplan_db::models::Food;
use uuid::Uuid;

use crate::embedding::DistanceRanker;

/// Number of foods a recommendation response carries.
pub const RECOMMENDATION_LIMIT: usize = 10;

/// Whether `food` contains any of `allergens` (case-sensitive exact match).
pub fn contains_any_allergen(food: &Food, allergens: &HashSet<&str>) -> bool {
    food.allergens.iter().any(|a| allergens.contains(a.as_str()))
}

/// Keep the foods whose allergen set is disjoint from `allergens`.
///
/// An empty `allergens` slice returns `foods` unchanged.
pub fn exclude_allergens<S: AsRef<str>>(foods: Vec<Food>, allergens: &[S]) -> Vec<Food> {
    if allergens.is_empty() {
        return foods;
    }
    let avoid: HashSet<&str> = allergens.iter().map(AsRef::as_ref).collect();
    foods
        .into_iter()
        .filter(|food| !contains_any_allergen(food, &avoid))
        .collect()
}

/// Keep the foods whose category equals `category` exactly.
pub fn filter_by_category(foods: Vec<Food>, category: &str) -> Vec<Food> {
    foods.into_iter().filter(|f| f.category == category).collect()
}

/// Keep the foods with `calories <= max_calories`.
pub fn filter_by_max_calories(foods: Vec<Food>, max_calories: i32) -> Vec<Food> {
    foods
        .into_iter()
        .filter(|f| f.calories <= max_calories)
        .collect()
}

/// Order `foods` by ascending distance to `query_embedding` and keep the
/// first `top_k`.
///
/// The distance order comes from `ranker`. Foods without an embedding, or
/// whose embedding dimension differs from the query, rank after every
/// comparable food, in input order.
pub fn rank_by_relevance(
    foods: Vec<Food>,
    query_embedding: &[f32],
    top_k: usize,
    ranker: &dyn DistanceRanker,
) -> Vec<Food> {
    if top_k == 0 || foods.is_empty() {
        return Vec::new();
    }

    let ranked_ids = {
        let corpus: Vec<(Uuid, &[f32])> = foods
            .iter()
            .filter_map(|f| {
                f.embedding
                    .as_deref()
                    .filter(|e| e.len() == query_embedding.len())
                    .map(|e| (f.id, e))
            })
            .collect();
        ranker.rank_by_distance(&corpus, query_embedding, top_k)
    };

    let position: HashMap<Uuid, usize> = foods.iter().enumerate().map(|(i, f)| (f.id, i)).collect();
    let mut slots: Vec<Option<Food>> = foods.into_iter().map(Some).collect();

    let mut ranked = Vec::with_capacity(top_k.min(slots.len()));
    for id in ranked_ids {
        if ranked.len() == top_k {
            break;
        }
        if let Some(food) = position.get(&id).and_then(|&i| slots[i].take()) {
            ranked.push(food);
        }
    }

    // Unranked foods go last, in catalog order.
    let remaining = top_k - ranked.len();
    ranked.extend(
        slots
            .into_iter()
            .flatten()
            .filter(|f| {
                f.embedding
                    .as_ref()
                    .is_none_or(|e| e.len() != query_embedding.len())
            })
            .take(remaining),
    );
    ranked
}

/// Post-filter a relevance-ranked list for a recommendation response.
///
/// Drops foods containing any of `allergens`, then foods above
/// `max_calories` when a ceiling is given, and keeps the first `limit`.
pub fn recommend<S: AsRef<str>>(
    ranked: Vec<Food>,
    allergens: &[S],
    max_calories: Option<i32>,
    limit: usize,
) -> Vec<Food> {
    let mut foods = exclude_allergens(ranked, allergens);
    if let Some(max) = max_calories {
        foods = filter_by_max_calories(foods, max);
    }
    foods.truncate(limit);
    foods
}
