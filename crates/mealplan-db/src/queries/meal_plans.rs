//! Database query functions for the meal-plan graph: `meal_plans`,
//! `day_plans`, and `day_food_links`.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use crate::models::{DayFoodLink, DayPlan, MealPlan, MealPlanDetail, Weekday};
use crate::queries::foods;

/// Insert a meal plan row for `user_id` and the week starting at `week`.
pub async fn insert_meal_plan<'e, E>(executor: E, user_id: Uuid, week: NaiveDate) -> Result<MealPlan>
where
    E: PgExecutor<'e>,
{
    let plan = sqlx::query_as::<_, MealPlan>(
        "INSERT INTO meal_plans (user_id, week) VALUES ($1, $2) RETURNING *",
    )
    .bind(user_id)
    .bind(week)
    .fetch_one(executor)
    .await
    .with_context(|| format!("failed to insert meal plan for user {user_id}"))?;

    Ok(plan)
}

/// Insert a day plan. Its position is derived from the weekday.
pub async fn insert_day_plan<'e, E>(executor: E, meal_plan_id: Uuid, weekday: Weekday) -> Result<DayPlan>
where
    E: PgExecutor<'e>,
{
    let day = sqlx::query_as::<_, DayPlan>(
        "INSERT INTO day_plans (meal_plan_id, weekday, position) \
         VALUES ($1, $2, $3) \
         RETURNING *",
    )
    .bind(meal_plan_id)
    .bind(weekday)
    .bind(weekday.index())
    .fetch_one(executor)
    .await
    .with_context(|| format!("failed to insert {weekday} for meal plan {meal_plan_id}"))?;

    Ok(day)
}

/// Append a food to a day plan, after any food already linked to it.
pub async fn insert_day_food_link<'e, E>(
    executor: E,
    day_plan_id: Uuid,
    food_id: Uuid,
) -> Result<DayFoodLink>
where
    E: PgExecutor<'e>,
{
    let link = sqlx::query_as::<_, DayFoodLink>(
        "INSERT INTO day_food_links (day_plan_id, food_id, position) \
         VALUES ($1, $2, ( \
             SELECT COALESCE(MAX(position) + 1, 0) \
             FROM day_food_links WHERE day_plan_id = $1 \
         )) \
         RETURNING *",
    )
    .bind(day_plan_id)
    .bind(food_id)
    .fetch_one(executor)
    .await
    .with_context(|| format!("failed to link food {food_id} to day plan {day_plan_id}"))?;

    Ok(link)
}

/// Fetch a meal plan row by ID.
pub async fn get_meal_plan<'e, E>(executor: E, id: Uuid) -> Result<Option<MealPlan>>
where
    E: PgExecutor<'e>,
{
    let plan = sqlx::query_as::<_, MealPlan>("SELECT * FROM meal_plans WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
        .context("failed to fetch meal plan")?;

    Ok(plan)
}

/// List a user's meal plans, newest first.
pub async fn list_meal_plans_for_user<'e, E>(executor: E, user_id: Uuid) -> Result<Vec<MealPlan>>
where
    E: PgExecutor<'e>,
{
    let plans = sqlx::query_as::<_, MealPlan>(
        "SELECT * FROM meal_plans WHERE user_id = $1 ORDER BY created_at DESC, id",
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
    .with_context(|| format!("failed to list meal plans for user {user_id}"))?;

    Ok(plans)
}

/// Day plans of a meal plan in weekday order.
pub async fn list_day_plans<'e, E>(executor: E, meal_plan_id: Uuid) -> Result<Vec<DayPlan>>
where
    E: PgExecutor<'e>,
{
    let days = sqlx::query_as::<_, DayPlan>(
        "SELECT * FROM day_plans WHERE meal_plan_id = $1 ORDER BY position",
    )
    .bind(meal_plan_id)
    .fetch_all(executor)
    .await
    .with_context(|| format!("failed to list day plans for meal plan {meal_plan_id}"))?;

    Ok(days)
}

/// All food links of a meal plan, across its days.
pub async fn list_day_food_links<'e, E>(executor: E, meal_plan_id: Uuid) -> Result<Vec<DayFoodLink>>
where
    E: PgExecutor<'e>,
{
    let links = sqlx::query_as::<_, DayFoodLink>(
        "SELECT l.* FROM day_food_links l \
         JOIN day_plans d ON d.id = l.day_plan_id \
         WHERE d.meal_plan_id = $1 \
         ORDER BY d.position, l.position",
    )
    .bind(meal_plan_id)
    .fetch_all(executor)
    .await
    .with_context(|| format!("failed to list food links for meal plan {meal_plan_id}"))?;

    Ok(links)
}

/// Load a meal plan together with its days and foods.
pub async fn get_meal_plan_detail(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<MealPlanDetail>> {
    let Some(plan) = get_meal_plan(&mut *conn, id).await? else {
        return Ok(None);
    };
    load_detail(conn, plan).await.map(Some)
}

/// Load every meal plan of a user with days and foods, newest first.
pub async fn list_meal_plan_details_for_user(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<Vec<MealPlanDetail>> {
    let plans = list_meal_plans_for_user(&mut *conn, user_id).await?;
    let mut details = Vec::with_capacity(plans.len());
    for plan in plans {
        details.push(load_detail(conn, plan).await?);
    }
    Ok(details)
}

async fn load_detail(conn: &mut PgConnection, plan: MealPlan) -> Result<MealPlanDetail> {
    let days = list_day_plans(&mut *conn, plan.id).await?;
    let links = list_day_food_links(&mut *conn, plan.id).await?;

    let mut food_ids: Vec<Uuid> = links.iter().map(|l| l.food_id).collect();
    food_ids.sort_unstable();
    food_ids.dedup();
    let foods = foods::get_foods_by_ids(&mut *conn, &food_ids).await?;

    Ok(MealPlanDetail::assemble(plan, days, links, &foods))
}
