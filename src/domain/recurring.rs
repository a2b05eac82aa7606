//! Recurring transaction templates.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::common::{Identifiable, OwnedRecord, TransactionKind};
use crate::domain::frequency::Frequency;

/// A rule describing a transaction that repeats.
///
/// `next_date` is always one period of `frequency` ahead of the anchor it was
/// last derived from (`start_date` at creation, the previous `next_date`
/// after each processing pass), unless a caller overrides it explicitly
/// through an update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecurringTemplate {
    pub recurring_id: String,
    pub user_id: String,
    pub category_id: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub description: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub next_date: Option<NaiveDateTime>,
    pub is_active: bool,
    pub auto_create: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    #[serde(default)]
    pub last_processed: Option<NaiveDateTime>,
}

impl RecurringTemplate {
    /// Whether the template should be materialized as of `now`.
    ///
    /// Due means: active, auto-creatable, `next_date` set and not in the
    /// future, and not past `end_date`.
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        if !self.is_active || !self.auto_create {
            return false;
        }
        let Some(next) = self.next_date else {
            return false;
        };
        if next > now {
            return false;
        }
        match self.end_date {
            Some(end) => end > now.date(),
            None => true,
        }
    }
}

impl Identifiable for RecurringTemplate {
    fn id(&self) -> &str {
        &self.recurring_id
    }
}

impl OwnedRecord for RecurringTemplate {
    fn owner_id(&self) -> &str {
        &self.user_id
    }
}

/// Field-by-field patch applied through [`ScheduleEngine::update`].
///
/// Every settable attribute is optional; absent fields are left untouched.
/// An explicit `next_date` wins over the recomputation triggered by a
/// `frequency` or `start_date` change.
///
/// [`ScheduleEngine::update`]: crate::core::services::ScheduleEngine::update
#[derive(Debug, Clone, Default)]
pub struct RecurringPatch {
    pub category_id: Option<String>,
    pub amount: Option<f64>,
    pub kind: Option<TransactionKind>,
    pub description: Option<String>,
    pub frequency: Option<Frequency>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<Option<NaiveDate>>,
    pub next_date: Option<NaiveDateTime>,
    pub is_active: Option<bool>,
    pub auto_create: Option<bool>,
    pub tags: Option<Vec<String>>,
}

impl RecurringPatch {
    pub fn is_empty(&self) -> bool {
        self.category_id.is_none()
            && self.amount.is_none()
            && self.kind.is_none()
            && self.description.is_none()
            && self.frequency.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.next_date.is_none()
            && self.is_active.is_none()
            && self.auto_create.is_none()
            && self.tags.is_none()
    }
}
