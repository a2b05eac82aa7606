//! Budgets with alert thresholds.

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;

use crate::core::services::categories::CategoryService;
use crate::core::services::notifications::NotificationService;
use crate::core::services::users::UserDirectory;
use crate::core::time::Clock;
use crate::domain::{
    Budget, BudgetPeriod, BudgetStatus, NotificationPriority, Transaction, TransactionKind,
};
use crate::errors::{EngineError, Result};
use crate::storage::{collections, CollectionStore};
use crate::utils::next_record_id;

/// Spending limits per category, with threshold-crossing alerts.
pub struct BudgetService<S> {
    store: S,
    clock: Arc<dyn Clock>,
    users: UserDirectory<S>,
    categories: CategoryService<S>,
    notifications: NotificationService<S>,
}

impl<S: CollectionStore + Clone> BudgetService<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        let users = UserDirectory::new(store.clone(), Arc::clone(&clock));
        let categories = CategoryService::new(store.clone(), Arc::clone(&clock));
        let notifications = NotificationService::new(store.clone(), Arc::clone(&clock));
        Self {
            store,
            clock,
            users,
            categories,
            notifications,
        }
    }

    pub fn add(
        &self,
        user_id: &str,
        category_id: &str,
        amount: f64,
        period: BudgetPeriod,
        alert_threshold: f64,
    ) -> Result<Budget> {
        if !self.users.user_exists(user_id)? {
            return Err(EngineError::NotFound(format!("user `{user_id}`")));
        }
        let category = self
            .categories
            .get_visible(user_id, category_id)?
            .ok_or_else(|| EngineError::NotFound(format!("category `{category_id}`")))?;
        if category.kind != TransactionKind::Expense {
            return Err(EngineError::InvalidInput(
                "budgets can only target expense categories".into(),
            ));
        }
        if !amount.is_finite() || amount <= 0.0 {
            return Err(EngineError::InvalidInput(
                "amount must be a positive number".into(),
            ));
        }
        if !(0.0..=1.0).contains(&alert_threshold) || alert_threshold == 0.0 {
            return Err(EngineError::InvalidInput(
                "alert threshold must be a fraction in (0, 1]".into(),
            ));
        }
        let mut budgets: Vec<Budget> = self.store.load(collections::BUDGETS)?;
        if budgets
            .iter()
            .any(|budget| budget.user_id == user_id && budget.category_id == category_id)
        {
            return Err(EngineError::InvalidInput(format!(
                "a budget for category `{category_id}` already exists"
            )));
        }
        let now = self.clock.now();
        let budget = Budget {
            budget_id: next_record_id("bud", budgets.iter().map(|b| b.budget_id.as_str())),
            user_id: user_id.to_string(),
            category_id: category_id.to_string(),
            amount,
            period,
            alert_threshold,
            created_at: now,
            updated_at: now,
        };
        budgets.push(budget.clone());
        self.store.save(collections::BUDGETS, &budgets)?;
        Ok(budget)
    }

    pub fn remove(&self, user_id: &str, budget_id: &str) -> Result<()> {
        let mut budgets: Vec<Budget> = self.store.load(collections::BUDGETS)?;
        let budget = budgets
            .iter()
            .find(|budget| budget.budget_id == budget_id)
            .ok_or_else(|| EngineError::NotFound(format!("budget `{budget_id}`")))?;
        if budget.user_id != user_id && !self.users.is_admin(user_id)? {
            return Err(EngineError::PermissionDenied(format!(
                "user `{user_id}` cannot remove budget `{budget_id}`"
            )));
        }
        budgets.retain(|budget| budget.budget_id != budget_id);
        self.store.save(collections::BUDGETS, &budgets)?;
        Ok(())
    }

    /// Spending status for each of the user's budgets in the period window
    /// containing `reference`.
    pub fn status_for_user(&self, user_id: &str, reference: NaiveDate) -> Result<Vec<BudgetStatus>> {
        let budgets: Vec<Budget> = self.store.load(collections::BUDGETS)?;
        let transactions: Vec<Transaction> = self.store.load(collections::TRANSACTIONS)?;
        Ok(budgets
            .iter()
            .filter(|budget| budget.user_id == user_id)
            .map(|budget| Self::status_of(budget, &transactions, reference))
            .collect())
    }

    /// System-wide sweep: emits one `budget_alert` notification for every
    /// budget at or past its alert threshold.
    pub fn sweep_alerts(&self) -> Result<usize> {
        let reference = self.clock.today();
        let budgets: Vec<Budget> = self.store.load(collections::BUDGETS)?;
        let transactions: Vec<Transaction> = self.store.load(collections::TRANSACTIONS)?;
        let mut alerted = 0usize;
        for budget in &budgets {
            let status = Self::status_of(budget, &transactions, reference);
            if !status.over_threshold(budget.alert_threshold) {
                continue;
            }
            let percent = (status.utilization * 100.0).round();
            self.notifications.create(
                &budget.user_id,
                "budget_alert",
                "Budget threshold reached",
                &format!(
                    "Spending for category `{}` is at {percent}% of its {} budget",
                    budget.category_id, budget.period
                ),
                NotificationPriority::High,
                json!({
                    "budget_id": budget.budget_id,
                    "category_id": budget.category_id,
                    "spent": status.spent,
                    "budgeted": status.budgeted,
                }),
            )?;
            tracing::info!(
                budget_id = %budget.budget_id,
                utilization = status.utilization,
                "budget alert emitted"
            );
            alerted += 1;
        }
        Ok(alerted)
    }

    fn status_of(
        budget: &Budget,
        transactions: &[Transaction],
        reference: NaiveDate,
    ) -> BudgetStatus {
        let window = budget.period.window(reference);
        let spent = transactions
            .iter()
            .filter(|txn| {
                txn.user_id == budget.user_id
                    && txn.category_id == budget.category_id
                    && txn.kind == TransactionKind::Expense
                    && txn.date >= window.0
                    && txn.date < window.1
            })
            .map(|txn| txn.amount)
            .sum();
        BudgetStatus::from_parts(budget, window, spent)
    }
}
