//! Ledger transaction records.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::common::{Identifiable, OwnedRecord, TransactionKind};

/// One realized movement of money, categorized and dated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub transaction_id: String,
    pub user_id: String,
    pub category_id: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub description: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: NaiveDateTime,
}

impl Identifiable for Transaction {
    fn id(&self) -> &str {
        &self.transaction_id
    }
}

impl OwnedRecord for Transaction {
    fn owner_id(&self) -> &str {
        &self.user_id
    }
}
