use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Day of the week a [`DayPlan`] covers.
///
/// Stored as lowercase text (`monday`), displayed and serialized as the
/// capitalized label (`Monday`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// All weekdays in plan order, Monday first.
    pub const ALL: [Weekday; 7] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];

    /// Zero-based position within the week (Monday = 0).
    pub fn index(self) -> i32 {
        match self {
            Self::Monday => 0,
            Self::Tuesday => 1,
            Self::Wednesday => 2,
            Self::Thursday => 3,
            Self::Friday => 4,
            Self::Saturday => 5,
            Self::Sunday => 6,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        };
        f.write_str(s)
    }
}

impl FromStr for Weekday {
    type Err = WeekdayParseError;

    /// Accepts both the display label and the stored lowercase form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Monday" | "monday" => Ok(Self::Monday),
            "Tuesday" | "tuesday" => Ok(Self::Tuesday),
            "Wednesday" | "wednesday" => Ok(Self::Wednesday),
            "Thursday" | "thursday" => Ok(Self::Thursday),
            "Friday" | "friday" => Ok(Self::Friday),
            "Saturday" | "saturday" => Ok(Self::Saturday),
            "Sunday" | "sunday" => Ok(Self::Sunday),
            other => Err(WeekdayParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`Weekday`] string.
#[derive(Debug, Clone)]
pub struct WeekdayParseError(pub String);

impl fmt::Display for WeekdayParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid weekday: {:?}", self.0)
    }
}

impl std::error::Error for WeekdayParseError {}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// A catalog food item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Food {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub calories: i32,
    pub allergens: Vec<String>,
    pub image_url: Option<String>,
    /// Precomputed name embedding. Not part of the API surface.
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
}

/// A user and the allergens they avoid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub allergies: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A weekly meal plan owned by a user. `week` is the Monday of the week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct MealPlan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub week: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// One day of a meal plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DayPlan {
    pub id: Uuid,
    pub meal_plan_id: Uuid,
    pub weekday: Weekday,
    pub position: i32,
}

/// Link between a day plan and one of its foods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DayFoodLink {
    pub id: Uuid,
    pub day_plan_id: Uuid,
    pub food_id: Uuid,
    pub position: i32,
}

/// A named collection of foods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Buffet {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Join row linking a buffet to a food.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct BuffetFood {
    pub id: Uuid,
    pub buffet_id: Uuid,
    pub food_id: Uuid,
    pub added_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Assembled plan graph
// ---------------------------------------------------------------------------

/// A food link together with the food it references.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayFoodEntry {
    pub link_id: Uuid,
    #[serde(flatten)]
    pub food: Food,
}

/// A day plan with its foods in link order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayPlanDetail {
    #[serde(flatten)]
    pub day: DayPlan,
    pub foods: Vec<DayFoodEntry>,
}

/// A meal plan with its days in weekday order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealPlanDetail {
    #[serde(flatten)]
    pub plan: MealPlan,
    pub days: Vec<DayPlanDetail>,
}

impl MealPlanDetail {
    /// Assemble the plan graph from its flat rows.
    ///
    /// Days are ordered by position and links by position within each day.
    /// Days or links that do not belong to `plan`, and links whose food is
    /// not in `foods`, are dropped.
    pub fn assemble(
        plan: MealPlan,
        mut days: Vec<DayPlan>,
        mut links: Vec<DayFoodLink>,
        foods: &[Food],
    ) -> Self {
        let foods_by_id: HashMap<Uuid, &Food> = foods.iter().map(|f| (f.id, f)).collect();

        days.retain(|d| d.meal_plan_id == plan.id);
        days.sort_by_key(|d| d.position);
        links.sort_by_key(|l| l.position);

        let days = days
            .into_iter()
            .map(|day| {
                let foods = links
                    .iter()
                    .filter(|l| l.day_plan_id == day.id)
                    .filter_map(|l| {
                        foods_by_id.get(&l.food_id).map(|food| DayFoodEntry {
                            link_id: l.id,
                            food: (*food).clone(),
                        })
                    })
                    .collect();
                DayPlanDetail { day, foods }
            })
            .collect();

        Self { plan, days }
    }

    /// Every food id referenced by the plan, day by day.
    pub fn food_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.days
            .iter()
            .flat_map(|d| d.foods.iter().map(|e| e.food.id))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
