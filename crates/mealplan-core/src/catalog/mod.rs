//! The food catalog: pure filters, relevance ranking, and the
//! database-backed food operations built on them.

pub mod filter;
pub mod search;
pub mod service;

pub use filter::{
    RECOMMENDATION_LIMIT, exclude_allergens, filter_by_category, filter_by_max_calories,
    rank_by_relevance, recommend,
};
pub use search::{RECOMMEND_CANDIDATES, SEARCH_TOP_K, recommend_foods, search_foods};
pub use service::{CatalogError, FoodInput, FoodUpdate};

/// Default ceiling of the low-calorie listing.
pub const LOW_CALORIE_DEFAULT: i32 = 300;
/// Default calorie ceiling of a recommendation request.
pub const RECOMMEND_MAX_CALORIES_DEFAULT: i32 = 800;
