//! CLI handlers for `mealplan plan` subcommands.
//!
//! Implements:
//! - `mealplan plan generate <user-id> [--week YYYY-MM-DD]` -- generate a weekly plan
//! - `mealplan plan show <plan-id>`                         -- print one plan
//! - `mealplan plan list <user-id>`                         -- list a user's plans

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use mealplan_core::planner::{self, MealPlanDetail, PgPlanStore, Week};

use crate::PlanCommands;

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

/// Dispatch a `PlanCommands` variant to the appropriate handler.
pub async fn run_plan_command(command: PlanCommands, pool: &PgPool) -> Result<()> {
    match command {
        PlanCommands::Generate { user_id, week } => {
            cmd_generate(pool, &user_id, week.as_deref()).await
        }
        PlanCommands::Show { plan_id } => cmd_show(pool, &plan_id).await,
        PlanCommands::List { user_id } => cmd_list(pool, &user_id).await,
    }
}

fn parse_id(kind: &str, value: &str) -> Result<Uuid> {
    value
        .parse()
        .with_context(|| format!("invalid {kind} ID: {value:?}"))
}

// -----------------------------------------------------------------------
// mealplan plan generate
// -----------------------------------------------------------------------

async fn cmd_generate(pool: &PgPool, user_id_str: &str, week: Option<&str>) -> Result<()> {
    let user_id = parse_id("user", user_id_str)?;
    let week = match week {
        Some(value) => Week::parse(value)?,
        None => Week::current()?,
    };

    let plan = planner::generate_plan_in_transaction(pool, user_id, week).await?;

    println!("Meal plan generated.");
    println!();
    print!("{}", format_plan(&plan));
    Ok(())
}

// -----------------------------------------------------------------------
// mealplan plan show <plan-id>
// -----------------------------------------------------------------------

async fn cmd_show(pool: &PgPool, plan_id_str: &str) -> Result<()> {
    let plan_id = parse_id("plan", plan_id_str)?;

    let mut store = PgPlanStore::begin(pool).await?;
    let plan = planner::get_plan(&mut store, plan_id).await?;
    store.commit().await?;

    print!("{}", format_plan(&plan));
    Ok(())
}

// -----------------------------------------------------------------------
// mealplan plan list <user-id>
// -----------------------------------------------------------------------

async fn cmd_list(pool: &PgPool, user_id_str: &str) -> Result<()> {
    let user_id = parse_id("user", user_id_str)?;

    let mut store = PgPlanStore::begin(pool).await?;
    let plans = planner::list_plans_for_user(&mut store, user_id).await?;
    store.commit().await?;

    if plans.is_empty() {
        println!("No meal plans found. Use `mealplan plan generate {user_id}` to create one.");
        return Ok(());
    }
    print!("{}", format_plan_table(&plans));
    Ok(())
}

// -----------------------------------------------------------------------
// Rendering
// -----------------------------------------------------------------------

/// Plan header followed by one line per day.
pub fn format_plan(plan: &MealPlanDetail) -> String {
    let mut lines = vec![
        format!("Plan: {}", plan.plan.id),
        format!("  User:     {}", plan.plan.user_id),
        format!("  Week of:  {}", plan.plan.week),
        format!(
            "  Created:  {}",
            plan.plan.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        String::new(),
    ];

    for day in &plan.days {
        let foods = if day.foods.is_empty() {
            "(no eligible foods)".to_owned()
        } else {
            day.foods
                .iter()
                .map(|e| format!("{} ({} kcal)", e.food.name, e.food.calories))
                .collect::<Vec<_>>()
                .join(", ")
        };
        lines.push(format!("  {:<9}  {}", day.day.weekday.to_string(), foods));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// One row per plan: id, week, number of foods, creation time.
pub fn format_plan_table(plans: &[MealPlanDetail]) -> String {
    let mut out = format!("{:<36}  {:<10}  {:>5}  CREATED\n", "ID", "WEEK", "FOODS");
    for plan in plans {
        out.push_str(&format!(
            "{:<36}  {:<10}  {:>5}  {}\n",
            plan.plan.id,
            plan.plan.week.to_string(),
            plan.food_ids().count(),
            plan.plan.created_at.format("%Y-%m-%d %H:%M"),
        ));
    }
    out
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use mealplan_db::models::{DayFoodLink, DayPlan, Food, MealPlan, Weekday};

    use super::*;

    fn sample_plan() -> MealPlanDetail {
        let plan = MealPlan {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            week: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            created_at: Utc::now(),
        };
        let apple = Food {
            id: Uuid::new_v4(),
            name: "Apple".to_owned(),
            category: "Fruit".to_owned(),
            calories: 52,
            allergens: vec![],
            image_url: None,
            embedding: None,
            created_at: Utc::now(),
        };
        let days: Vec<DayPlan> = Weekday::ALL
            .iter()
            .map(|&weekday| DayPlan {
                id: Uuid::new_v4(),
                meal_plan_id: plan.id,
                weekday,
                position: weekday.index(),
            })
            .collect();
        let links = vec![DayFoodLink {
            id: Uuid::new_v4(),
            day_plan_id: days[0].id,
            food_id: apple.id,
            position: 0,
        }];
        MealPlanDetail::assemble(plan, days, links, &[apple])
    }

    #[test]
    fn parse_id_rejects_garbage() {
        let err = parse_id("plan", "not-a-uuid").unwrap_err();
        assert!(err.to_string().contains("invalid plan ID"));
        assert!(parse_id("user", "550e8400-e29b-41d4-a716-446655440000").is_ok());
    }

    #[test]
    fn format_plan_lists_every_day() {
        let plan = sample_plan();
        let text = format_plan(&plan);

        assert!(text.contains("Week of:  2024-01-01"));
        assert!(text.contains("Monday     Apple (52 kcal)"));
        assert!(text.contains("Sunday     (no eligible foods)"));
        for weekday in Weekday::ALL {
            assert!(text.contains(&weekday.to_string()), "missing {weekday}");
        }
    }

    #[test]
    fn format_plan_table_counts_foods() {
        let plan = sample_plan();
        let text = format_plan_table(std::slice::from_ref(&plan));
        let row = text.lines().nth(1).unwrap();
        assert!(row.starts_with(&plan.plan.id.to_string()));
        assert!(row.contains("2024-01-01"));
        assert!(row.contains("    1  "));
    }
}
