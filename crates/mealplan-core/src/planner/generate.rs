//! Random weekly plan generation and plan reads.

use rand::Rng;
use rand::seq::index;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use mealplan_db::models::{Food, MealPlanDetail, Weekday};

use super::store::{PgPlanStore, PlanStore};
use super::{PlanError, Week};
use crate::catalog::filter::exclude_allergens;

/// Fewest foods drawn for one day (when the eligible catalog allows it).
pub const MIN_FOODS_PER_DAY: usize = 2;
/// Most foods drawn for one day.
pub const MAX_FOODS_PER_DAY: usize = 3;

/// Foods chosen for one weekday, in draw order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySelection {
    pub weekday: Weekday,
    pub food_ids: Vec<Uuid>,
}

/// Draw a week of foods from `eligible`.
///
/// Every weekday gets `n` distinct foods with `n` uniform in
/// `MIN_FOODS_PER_DAY..=MAX_FOODS_PER_DAY`, capped at `eligible.len()`.
/// Days are drawn independently, so a food may appear on several days.
pub fn draw_week<R: Rng + ?Sized>(eligible: &[Food], rng: &mut R) -> Vec<DaySelection> {
    Weekday::ALL
        .iter()
        .map(|&weekday| {
            let wanted = rng.random_range(MIN_FOODS_PER_DAY..=MAX_FOODS_PER_DAY);
            let amount = wanted.min(eligible.len());
            let food_ids = index::sample(rng, eligible.len(), amount)
                .into_iter()
                .map(|i| eligible[i].id)
                .collect();
            DaySelection { weekday, food_ids }
        })
        .collect()
}

/// Generate and persist a plan for `user_id` and `week` using the
/// thread-local RNG.
pub async fn generate_plan<S>(
    store: &mut S,
    user_id: Uuid,
    week: Week,
) -> Result<MealPlanDetail, PlanError>
where
    S: PlanStore + ?Sized,
{
    generate_plan_with(store, user_id, week, |eligible| {
        draw_week(eligible, &mut rand::rng())
    })
    .await
}

/// Like [`generate_plan`], drawing foods from `rng`.
pub async fn generate_plan_with_rng<S, R>(
    store: &mut S,
    user_id: Uuid,
    week: Week,
    rng: &mut R,
) -> Result<MealPlanDetail, PlanError>
where
    S: PlanStore + ?Sized,
    R: Rng + Send + ?Sized,
{
    generate_plan_with(store, user_id, week, |eligible| draw_week(eligible, rng)).await
}

async fn generate_plan_with<S, F>(
    store: &mut S,
    user_id: Uuid,
    week: Week,
    draw: F,
) -> Result<MealPlanDetail, PlanError>
where
    S: PlanStore + ?Sized,
    F: FnOnce(&[Food]) -> Vec<DaySelection>,
{
    let user = store
        .get_user(user_id)
        .await?
        .ok_or(PlanError::UserNotFound(user_id))?;

    let catalog = store.list_foods().await?;
    let catalog_len = catalog.len();
    let eligible = exclude_allergens(catalog, &user.allergies);
    debug!(
        user_id = %user_id,
        catalog = catalog_len,
        eligible = eligible.len(),
        "filtered catalog by user allergies"
    );

    let selections = draw(&eligible);

    let plan = store.create_plan(user_id, week.monday()).await?;
    let mut days = Vec::with_capacity(selections.len());
    let mut links = Vec::new();
    for selection in selections {
        let day = store.create_day_plan(plan.id, selection.weekday).await?;
        for food_id in selection.food_ids {
            links.push(store.create_day_food_link(day.id, food_id).await?);
        }
        days.push(day);
    }

    info!(
        plan_id = %plan.id,
        user_id = %user_id,
        week = %week,
        links = links.len(),
        "generated meal plan"
    );

    Ok(MealPlanDetail::assemble(plan, days, links, &eligible))
}

/// Generate a plan inside one database transaction.
///
/// The plan and all its days and links are committed together; on any
/// error nothing is written.
pub async fn generate_plan_in_transaction(
    pool: &PgPool,
    user_id: Uuid,
    week: Week,
) -> Result<MealPlanDetail, PlanError> {
    let mut store = PgPlanStore::begin(pool).await?;
    let detail = generate_plan(&mut store, user_id, week).await?;
    store.commit().await?;
    Ok(detail)
}

/// Fetch a plan with its days and foods.
pub async fn get_plan<S>(store: &mut S, plan_id: Uuid) -> Result<MealPlanDetail, PlanError>
where
    S: PlanStore + ?Sized,
{
    store
        .get_plan(plan_id)
        .await?
        .ok_or(PlanError::PlanNotFound(plan_id))
}

/// Every plan of `user_id`, newest first. Unknown users have no plans.
pub async fn list_plans_for_user<S>(
    store: &mut S,
    user_id: Uuid,
) -> Result<Vec<MealPlanDetail>, PlanError>
where
    S: PlanStore + ?Sized,
{
    Ok(store.list_plans_for_user(user_id).await?)
}
