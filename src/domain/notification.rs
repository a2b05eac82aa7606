//! User-facing notification records.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::common::{Identifiable, OwnedRecord};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub notification_id: String,
    pub user_id: String,
    /// Machine-readable tag, e.g. `recurring_posted` or `budget_alert`.
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub priority: NotificationPriority,
    /// Free-form payload referencing related records.
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}

impl Identifiable for Notification {
    fn id(&self) -> &str {
        &self.notification_id
    }
}

impl OwnedRecord for Notification {
    fn owner_id(&self) -> &str {
        &self.user_id
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    #[default]
    Normal,
    High,
}

impl fmt::Display for NotificationPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NotificationPriority::Low => "low",
            NotificationPriority::Normal => "normal",
            NotificationPriority::High => "high",
        };
        f.write_str(label)
    }
}
