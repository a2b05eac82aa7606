//! Budget definitions and derived spending status.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::common::{Identifiable, OwnedRecord};
use crate::domain::frequency::shift_months;

/// A per-category spending limit with an alert threshold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Budget {
    pub budget_id: String,
    pub user_id: String,
    pub category_id: String,
    pub amount: f64,
    pub period: BudgetPeriod,
    /// Fraction of `amount` at which an alert fires, in `(0, 1]`.
    pub alert_threshold: f64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Identifiable for Budget {
    fn id(&self) -> &str {
        &self.budget_id
    }
}

impl OwnedRecord for Budget {
    fn owner_id(&self) -> &str {
        &self.user_id
    }
}

/// Budgeting cadence. Windows are anchored on calendar boundaries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl BudgetPeriod {
    /// The half-open window `[start, end)` containing `reference`.
    ///
    /// Weeks start on Monday, months on the 1st, years on Jan 1.
    pub fn window(self, reference: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            BudgetPeriod::Weekly => {
                let delta = reference.weekday().num_days_from_monday() as i64;
                let start = reference - Duration::days(delta);
                (start, start + Duration::days(7))
            }
            BudgetPeriod::Monthly => {
                let start = reference.with_day(1).unwrap();
                (start, shift_months(start, 1))
            }
            BudgetPeriod::Yearly => {
                let start = NaiveDate::from_ymd_opt(reference.year(), 1, 1).unwrap();
                let end = NaiveDate::from_ymd_opt(reference.year() + 1, 1, 1).unwrap();
                (start, end)
            }
        }
    }
}

impl fmt::Display for BudgetPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BudgetPeriod::Weekly => "weekly",
            BudgetPeriod::Monthly => "monthly",
            BudgetPeriod::Yearly => "yearly",
        };
        f.write_str(label)
    }
}

/// Spending totals for one budget inside its current period window.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetStatus {
    pub budget_id: String,
    pub category_id: String,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub budgeted: f64,
    pub spent: f64,
    pub remaining: f64,
    pub utilization: f64,
}

impl BudgetStatus {
    pub fn from_parts(budget: &Budget, window: (NaiveDate, NaiveDate), spent: f64) -> Self {
        let utilization = if budget.amount.abs() > f64::EPSILON {
            spent / budget.amount
        } else {
            0.0
        };
        Self {
            budget_id: budget.budget_id.clone(),
            category_id: budget.category_id.clone(),
            window_start: window.0,
            window_end: window.1,
            budgeted: budget.amount,
            spent,
            remaining: budget.amount - spent,
            utilization,
        }
    }

    pub fn over_threshold(&self, threshold: f64) -> bool {
        self.utilization >= threshold
    }
}
