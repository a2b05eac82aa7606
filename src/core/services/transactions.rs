//! The transaction ledger.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::core::services::categories::CategoryService;
use crate::core::services::users::UserDirectory;
use crate::core::time::Clock;
use crate::domain::{Transaction, TransactionKind};
use crate::errors::{EngineError, Result};
use crate::storage::{collections, CollectionStore};
use crate::utils::next_record_id;

/// Append-oriented ledger over the `transactions` collection.
pub struct TransactionLedger<S> {
    store: S,
    clock: Arc<dyn Clock>,
    users: UserDirectory<S>,
    categories: CategoryService<S>,
}

impl<S: CollectionStore + Clone> TransactionLedger<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        let users = UserDirectory::new(store.clone(), Arc::clone(&clock));
        let categories = CategoryService::new(store.clone(), Arc::clone(&clock));
        Self {
            store,
            clock,
            users,
            categories,
        }
    }

    /// Validates and appends one transaction, returning the stored record.
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &self,
        user_id: &str,
        category_id: &str,
        amount: f64,
        kind: TransactionKind,
        description: &str,
        date: NaiveDate,
        tags: Vec<String>,
    ) -> Result<Transaction> {
        if !self.users.user_exists(user_id)? {
            return Err(EngineError::NotFound(format!("user `{user_id}`")));
        }
        let category = self
            .categories
            .get_visible(user_id, category_id)?
            .ok_or_else(|| EngineError::NotFound(format!("category `{category_id}`")))?;
        if category.kind != kind {
            return Err(EngineError::InvalidInput(format!(
                "category `{}` is {}, transaction is {}",
                category.name, category.kind, kind
            )));
        }
        if !amount.is_finite() || amount <= 0.0 {
            return Err(EngineError::InvalidInput(
                "amount must be a positive number".into(),
            ));
        }

        let mut transactions: Vec<Transaction> = self.store.load(collections::TRANSACTIONS)?;
        let transaction = Transaction {
            transaction_id: next_record_id(
                "txn",
                transactions.iter().map(|t| t.transaction_id.as_str()),
            ),
            user_id: user_id.to_string(),
            category_id: category_id.to_string(),
            amount,
            kind,
            description: description.to_string(),
            date,
            tags,
            created_at: self.clock.now(),
        };
        transactions.push(transaction.clone());
        self.store.save(collections::TRANSACTIONS, &transactions)?;
        tracing::debug!(
            transaction_id = %transaction.transaction_id,
            user_id,
            amount,
            "recorded transaction"
        );
        Ok(transaction)
    }

    pub fn list_for_user(&self, user_id: &str) -> Result<Vec<Transaction>> {
        let transactions: Vec<Transaction> = self.store.load(collections::TRANSACTIONS)?;
        Ok(transactions
            .into_iter()
            .filter(|txn| txn.user_id == user_id)
            .collect())
    }
}
