//! Weekly meal-plan generation.
//!
//! [`generate_plan`] builds one [`MealPlanDetail`] per (user, week) request:
//! seven days, Monday through Sunday, each holding two or three distinct
//! foods drawn at random from the part of the catalog the user is not
//! allergic to. All reads and writes go through a [`PlanStore`].

pub mod generate;
pub mod store;
pub mod week;

use thiserror::Error;
use uuid::Uuid;

pub use generate::{
    DaySelection, MAX_FOODS_PER_DAY, MIN_FOODS_PER_DAY, draw_week, generate_plan,
    generate_plan_in_transaction, generate_plan_with_rng, get_plan, list_plans_for_user,
};
pub use store::{PgPlanStore, PlanStore};
pub use week::Week;
pub use mealplan_db::models::MealPlanDetail;

/// Errors surfaced by the planner.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("user {0} not found")]
    UserNotFound(Uuid),

    #[error("meal plan {0} not found")]
    PlanNotFound(Uuid),

    #[error("invalid week {value:?}: {reason}")]
    InvalidWeek { value: String, reason: String },

    /// Persistence failure, passed through unchanged.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
