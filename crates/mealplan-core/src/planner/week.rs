//! The target week of a meal plan.

use std::fmt;

use chrono::{Datelike, Days, NaiveDate, Utc};
use serde::Serialize;

use super::PlanError;

/// A calendar week, identified by its Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Week(NaiveDate);

impl Week {
    /// The week containing `date`.
    ///
    /// Fails only when the Monday of that week is not a representable date.
    pub fn containing(date: NaiveDate) -> Result<Self, PlanError> {
        let back = u64::from(date.weekday().num_days_from_monday());
        date.checked_sub_days(Days::new(back))
            .map(Self)
            .ok_or_else(|| PlanError::InvalidWeek {
                value: date.to_string(),
                reason: "the Monday of this week is out of range".to_owned(),
            })
    }

    /// Parse a `YYYY-MM-DD` date and normalize it to its week.
    pub fn parse(value: &str) -> Result<Self, PlanError> {
        let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
            PlanError::InvalidWeek {
                value: value.to_owned(),
                reason: format!("expected a YYYY-MM-DD date ({e})"),
            }
        })?;
        Self::containing(date)
    }

    /// The current week (UTC).
    pub fn current() -> Result<Self, PlanError> {
        Self::containing(Utc::now().date_naive())
    }

    /// Monday of the week.
    pub fn monday(self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for Week {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
