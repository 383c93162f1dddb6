//! Persistence seam of the planner.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use mealplan_db::models::{DayFoodLink, DayPlan, Food, MealPlan, MealPlanDetail, User, Weekday};
use mealplan_db::queries::{foods, meal_plans, users};

/// Everything plan generation and plan reads need from storage.
#[async_trait]
pub trait PlanStore: Send {
    async fn get_user(&mut self, user_id: Uuid) -> Result<Option<User>>;

    /// The whole food catalog.
    async fn list_foods(&mut self) -> Result<Vec<Food>>;

    async fn create_plan(&mut self, user_id: Uuid, week: NaiveDate) -> Result<MealPlan>;

    async fn create_day_plan(&mut self, meal_plan_id: Uuid, weekday: Weekday) -> Result<DayPlan>;

    /// Append `food_id` to the day's foods.
    async fn create_day_food_link(&mut self, day_plan_id: Uuid, food_id: Uuid)
    -> Result<DayFoodLink>;

    async fn get_plan(&mut self, plan_id: Uuid) -> Result<Option<MealPlanDetail>>;

    /// Plans of a user, newest first.
    async fn list_plans_for_user(&mut self, user_id: Uuid) -> Result<Vec<MealPlanDetail>>;
}

/// [`PlanStore`] bound to one PostgreSQL transaction.
///
/// Nothing written through the store is visible to other connections until
/// [`commit`](Self::commit). Dropping the store rolls the transaction back.
pub struct PgPlanStore {
    tx: Transaction<'static, Postgres>,
}

impl PgPlanStore {
    pub async fn begin(pool: &PgPool) -> Result<Self> {
        let tx = pool.begin().await.context("failed to begin transaction")?;
        Ok(Self { tx })
    }

    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await.context("failed to commit transaction")
    }
}

#[async_trait]
impl PlanStore for PgPlanStore {
    async fn get_user(&mut self, user_id: Uuid) -> Result<Option<User>> {
        users::get_user(&mut *self.tx, user_id).await
    }

    async fn list_foods(&mut self) -> Result<Vec<Food>> {
        foods::list_foods(&mut *self.tx).await
    }

    async fn create_plan(&mut self, user_id: Uuid, week: NaiveDate) -> Result<MealPlan> {
        meal_plans::insert_meal_plan(&mut *self.tx, user_id, week).await
    }

    async fn create_day_plan(&mut self, meal_plan_id: Uuid, weekday: Weekday) -> Result<DayPlan> {
        meal_plans::insert_day_plan(&mut *self.tx, meal_plan_id, weekday).await
    }

    async fn create_day_food_link(
        &mut self,
        day_plan_id: Uuid,
        food_id: Uuid,
    ) -> Result<DayFoodLink> {
        meal_plans::insert_day_food_link(&mut *self.tx, day_plan_id, food_id).await
    }

    async fn get_plan(&mut self, plan_id: Uuid) -> Result<Option<MealPlanDetail>> {
        meal_plans::get_meal_plan_detail(&mut self.tx, plan_id).await
    }

    async fn list_plans_for_user(&mut self, user_id: Uuid) -> Result<Vec<MealPlanDetail>> {
        meal_plans::list_meal_plan_details_for_user(&mut self.tx, user_id).await
    }
}
