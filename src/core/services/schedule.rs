//! The recurring schedule engine.
//!
//! Owns the `recurring_transactions` collection: computes next-occurrence
//! dates, classifies templates as due or upcoming, and materializes due
//! occurrences into the transaction ledger with a companion notification.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde_json::json;

use crate::core::services::categories::CategoryService;
use crate::core::services::notifications::NotificationService;
use crate::core::services::transactions::TransactionLedger;
use crate::core::services::users::UserDirectory;
use crate::core::time::Clock;
use crate::domain::{
    Frequency, NotificationPriority, RecurringPatch, RecurringTemplate, TransactionKind,
};
use crate::errors::{EngineError, Result};
use crate::storage::{collections, CollectionStore};
use crate::utils::next_record_id;

/// Tag stamped on every materialized occurrence.
const RECURRING_TAG: &str = "recurring";
/// Suffix marking a transaction as automatically created.
const AUTO_SUFFIX: &str = "(auto)";

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(EngineError::InvalidInput(
            "amount must be a positive number".into(),
        ));
    }
    Ok(())
}

pub struct ScheduleEngine<S> {
    store: S,
    clock: Arc<dyn Clock>,
    users: UserDirectory<S>,
    categories: CategoryService<S>,
    ledger: TransactionLedger<S>,
    notifications: NotificationService<S>,
}

impl<S: CollectionStore + Clone> ScheduleEngine<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        let users = UserDirectory::new(store.clone(), Arc::clone(&clock));
        let categories = CategoryService::new(store.clone(), Arc::clone(&clock));
        let ledger = TransactionLedger::new(store.clone(), Arc::clone(&clock));
        let notifications = NotificationService::new(store.clone(), Arc::clone(&clock));
        Self {
            store,
            clock,
            users,
            categories,
            ledger,
            notifications,
        }
    }

    /// Creates a recurring template.
    ///
    /// `start_date` defaults to today. `next_date` is derived by advancing
    /// `start_date` one period, so the first occurrence lands one period
    /// after the start date, never on it. Nothing is persisted when any
    /// validation fails.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        &self,
        user_id: &str,
        category_id: &str,
        amount: f64,
        kind: TransactionKind,
        description: &str,
        frequency: Frequency,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        tags: Vec<String>,
        auto_create: bool,
    ) -> Result<RecurringTemplate> {
        if !self.users.user_exists(user_id)? {
            return Err(EngineError::NotFound(format!("user `{user_id}`")));
        }
        self.validate_category(user_id, category_id, kind)?;
        validate_amount(amount)?;

        let now = self.clock.now();
        let start = start_date.unwrap_or_else(|| self.clock.today());
        let next = frequency.advance(start).and_hms_opt(0, 0, 0).unwrap();

        let mut templates: Vec<RecurringTemplate> = self.store.load(collections::RECURRING)?;
        let template = RecurringTemplate {
            recurring_id: next_record_id("rec", templates.iter().map(|t| t.recurring_id.as_str())),
            user_id: user_id.to_string(),
            category_id: category_id.to_string(),
            amount,
            kind,
            description: description.to_string(),
            frequency,
            start_date: start,
            end_date,
            next_date: Some(next),
            is_active: true,
            auto_create,
            tags,
            created_at: now,
            updated_at: now,
            last_processed: None,
        };
        templates.push(template.clone());
        self.store.save(collections::RECURRING, &templates)?;
        tracing::info!(
            recurring_id = %template.recurring_id,
            user_id,
            %frequency,
            "created recurring template"
        );
        Ok(template)
    }

    /// Applies a validated patch to a template owned by `user_id` (admins
    /// may patch anyone's).
    ///
    /// When `frequency` or `start_date` changes, `next_date` is recomputed
    /// from the effective start date; an explicit `next_date` in the patch
    /// overrides the recomputation.
    pub fn update(
        &self,
        user_id: &str,
        recurring_id: &str,
        patch: RecurringPatch,
    ) -> Result<RecurringTemplate> {
        if patch.is_empty() {
            return Err(EngineError::InvalidInput("nothing to update".into()));
        }
        let mut templates: Vec<RecurringTemplate> = self.store.load(collections::RECURRING)?;
        let index = self.find_owned(&templates, user_id, recurring_id)?;

        // Validate against effective values before mutating anything.
        let current = &templates[index];
        if let Some(amount) = patch.amount {
            validate_amount(amount)?;
        }
        let effective_kind = patch.kind.unwrap_or(current.kind);
        let effective_category = patch
            .category_id
            .as_deref()
            .unwrap_or(&current.category_id);
        if patch.kind.is_some() || patch.category_id.is_some() {
            self.validate_category(&current.user_id, effective_category, effective_kind)?;
        }

        let reschedule = patch.frequency.is_some() || patch.start_date.is_some();
        let template = &mut templates[index];
        if let Some(category_id) = patch.category_id {
            template.category_id = category_id;
        }
        if let Some(amount) = patch.amount {
            template.amount = amount;
        }
        if let Some(kind) = patch.kind {
            template.kind = kind;
        }
        if let Some(description) = patch.description {
            template.description = description;
        }
        if let Some(frequency) = patch.frequency {
            template.frequency = frequency;
        }
        if let Some(start_date) = patch.start_date {
            template.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            template.end_date = end_date;
        }
        if let Some(is_active) = patch.is_active {
            template.is_active = is_active;
        }
        if let Some(auto_create) = patch.auto_create {
            template.auto_create = auto_create;
        }
        if let Some(tags) = patch.tags {
            template.tags = tags;
        }
        if let Some(next_date) = patch.next_date {
            template.next_date = Some(next_date);
        } else if reschedule {
            template.next_date = Some(
                template
                    .frequency
                    .advance(template.start_date)
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
            );
        }
        template.updated_at = self.clock.now();

        let updated = template.clone();
        self.store.save(collections::RECURRING, &templates)?;
        Ok(updated)
    }

    /// Hard-removes a template after the ownership check.
    pub fn delete(&self, user_id: &str, recurring_id: &str) -> Result<()> {
        let mut templates: Vec<RecurringTemplate> = self.store.load(collections::RECURRING)?;
        let index = self.find_owned(&templates, user_id, recurring_id)?;
        templates.remove(index);
        self.store.save(collections::RECURRING, &templates)?;
        tracing::info!(recurring_id, "deleted recurring template");
        Ok(())
    }

    /// Soft-stops a template without removing it.
    pub fn deactivate(&self, user_id: &str, recurring_id: &str) -> Result<RecurringTemplate> {
        self.update(
            user_id,
            recurring_id,
            RecurringPatch {
                is_active: Some(false),
                ..RecurringPatch::default()
            },
        )
    }

    pub fn activate(&self, user_id: &str, recurring_id: &str) -> Result<RecurringTemplate> {
        self.update(
            user_id,
            recurring_id,
            RecurringPatch {
                is_active: Some(true),
                ..RecurringPatch::default()
            },
        )
    }

    pub fn get(&self, user_id: &str, recurring_id: &str) -> Result<Option<RecurringTemplate>> {
        let templates: Vec<RecurringTemplate> = self.store.load(collections::RECURRING)?;
        Ok(templates
            .into_iter()
            .find(|tpl| tpl.recurring_id == recurring_id && tpl.user_id == user_id))
    }

    pub fn list_for_user(&self, user_id: &str) -> Result<Vec<RecurringTemplate>> {
        let templates: Vec<RecurringTemplate> = self.store.load(collections::RECURRING)?;
        Ok(templates
            .into_iter()
            .filter(|tpl| tpl.user_id == user_id)
            .collect())
    }

    /// The user's templates that are due as of now, in insertion order.
    pub fn get_due(&self, user_id: &str) -> Result<Vec<RecurringTemplate>> {
        let now = self.clock.now();
        let templates: Vec<RecurringTemplate> = self.store.load(collections::RECURRING)?;
        Ok(templates
            .into_iter()
            .filter(|tpl| tpl.user_id == user_id && tpl.is_due(now))
            .collect())
    }

    /// The user's templates with `next_date` inside `[now, now + days]`,
    /// ascending by `next_date`.
    pub fn get_upcoming(&self, user_id: &str, days: i64) -> Result<Vec<RecurringTemplate>> {
        let now = self.clock.now();
        let horizon = now + Duration::days(days);
        let templates: Vec<RecurringTemplate> = self.store.load(collections::RECURRING)?;
        let mut upcoming: Vec<RecurringTemplate> = templates
            .into_iter()
            .filter(|tpl| {
                tpl.user_id == user_id
                    && tpl
                        .next_date
                        .map(|next| next >= now && next <= horizon)
                        .unwrap_or(false)
            })
            .collect();
        upcoming.sort_by_key(|tpl| tpl.next_date);
        Ok(upcoming)
    }

    /// System-wide sweep over every user's due templates.
    ///
    /// Each due template is materialized as one ledger transaction dated on
    /// the occurrence; the template then advances one period and the owner
    /// is notified. A failed materialization skips the template (no
    /// advance); a failed notification is logged and the occurrence still
    /// counts, since the transaction exists and the date has moved on.
    /// There is no idempotency guard beyond the advanced `next_date`.
    pub fn process_due(&self) -> Result<usize> {
        let now = self.clock.now();
        let mut templates: Vec<RecurringTemplate> = self.store.load(collections::RECURRING)?;
        let mut processed = 0usize;
        let mut dirty = false;

        for template in templates.iter_mut() {
            if !template.is_due(now) {
                continue;
            }
            let Some(next) = template.next_date else {
                continue;
            };

            let mut tags = template.tags.clone();
            if !tags.iter().any(|tag| tag == RECURRING_TAG) {
                tags.push(RECURRING_TAG.to_string());
            }
            let description = format!("{} {}", template.description, AUTO_SUFFIX);
            let transaction = match self.ledger.record(
                &template.user_id,
                &template.category_id,
                template.amount,
                template.kind,
                &description,
                next.date(),
                tags,
            ) {
                Ok(transaction) => transaction,
                Err(err) => {
                    tracing::error!(
                        recurring_id = %template.recurring_id,
                        error = %err,
                        "failed to materialize occurrence, skipping template"
                    );
                    continue;
                }
            };

            let advanced = template.frequency.advance(next.date());
            template.next_date = Some(NaiveDateTime::new(advanced, next.time()));
            template.last_processed = Some(now);
            template.updated_at = now;
            dirty = true;
            processed += 1;

            if let Err(err) = self.notifications.create(
                &template.user_id,
                "recurring_posted",
                "Recurring transaction posted",
                &format!(
                    "{} of {:.2} was recorded automatically",
                    template.description, template.amount
                ),
                NotificationPriority::Normal,
                json!({
                    "transaction_id": transaction.transaction_id,
                    "recurring_id": template.recurring_id,
                }),
            ) {
                tracing::warn!(
                    recurring_id = %template.recurring_id,
                    transaction_id = %transaction.transaction_id,
                    error = %err,
                    "notification failed, occurrence still counted"
                );
            }
        }

        if dirty {
            self.store.save(collections::RECURRING, &templates)?;
        }
        tracing::info!(processed, "due sweep finished");
        Ok(processed)
    }

    fn validate_category(
        &self,
        user_id: &str,
        category_id: &str,
        kind: TransactionKind,
    ) -> Result<()> {
        let category = self
            .categories
            .get_visible(user_id, category_id)?
            .ok_or_else(|| EngineError::NotFound(format!("category `{category_id}`")))?;
        if category.kind != kind {
            return Err(EngineError::InvalidInput(format!(
                "category `{}` is {}, template is {}",
                category.name, category.kind, kind
            )));
        }
        Ok(())
    }

    /// Locates a template and enforces the owner-or-admin rule.
    fn find_owned(
        &self,
        templates: &[RecurringTemplate],
        user_id: &str,
        recurring_id: &str,
    ) -> Result<usize> {
        let index = templates
            .iter()
            .position(|tpl| tpl.recurring_id == recurring_id)
            .ok_or_else(|| EngineError::NotFound(format!("recurring template `{recurring_id}`")))?;
        if templates[index].user_id != user_id && !self.users.is_admin(user_id)? {
            return Err(EngineError::PermissionDenied(format!(
                "user `{user_id}` does not own recurring template `{recurring_id}`"
            )));
        }
        Ok(index)
    }
}
