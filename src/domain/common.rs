//! Shared traits and enums for the persisted data model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::EngineError;

/// Exposes the stable string identifier of a stored record.
pub trait Identifiable {
    fn id(&self) -> &str;
}

/// Associates a record with the user that owns it.
pub trait OwnedRecord {
    fn owner_id(&self) -> &str;
}

/// Direction of money movement for transactions, categories, and templates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        };
        f.write_str(label)
    }
}

impl FromStr for TransactionKind {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(EngineError::InvalidInput(format!(
                "transaction type must be `income` or `expense`, got `{other}`"
            ))),
        }
    }
}
