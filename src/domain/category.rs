//! Transaction categories.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::common::{Identifiable, TransactionKind};

/// Categorizes transactions for budgeting and reporting.
///
/// A category with no `owner` is a built-in visible to every user; an owned
/// category is visible only to its owner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub category_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub owner: Option<String>,
    pub created_at: NaiveDateTime,
}

impl Category {
    pub fn is_visible_to(&self, user_id: &str) -> bool {
        match &self.owner {
            None => true,
            Some(owner) => owner == user_id,
        }
    }
}

impl Identifiable for Category {
    fn id(&self) -> &str {
        &self.category_id
    }
}
