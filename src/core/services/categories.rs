//! Category management with per-user visibility.

use std::sync::Arc;

use crate::core::services::users::UserDirectory;
use crate::core::time::Clock;
use crate::domain::{Category, RecurringTemplate, Transaction, TransactionKind};
use crate::errors::{EngineError, Result};
use crate::storage::{collections, CollectionStore};
use crate::utils::next_record_id;

/// Validated operations over the `categories` collection.
///
/// A category owned by a user is visible only to that user; an unowned
/// category is a built-in visible to everyone.
pub struct CategoryService<S> {
    store: S,
    clock: Arc<dyn Clock>,
    users: UserDirectory<S>,
}

impl<S: CollectionStore + Clone> CategoryService<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        let users = UserDirectory::new(store.clone(), Arc::clone(&clock));
        Self { store, clock, users }
    }

    /// Adds a category, rejecting duplicate names within its visibility scope.
    pub fn add(
        &self,
        owner: Option<&str>,
        name: &str,
        kind: TransactionKind,
    ) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::InvalidInput("category name must not be empty".into()));
        }
        if let Some(owner_id) = owner {
            if !self.users.user_exists(owner_id)? {
                return Err(EngineError::NotFound(format!("user `{owner_id}`")));
            }
        }
        let mut categories: Vec<Category> = self.store.load(collections::CATEGORIES)?;
        let normalized = name.to_ascii_lowercase();
        let duplicate = categories.iter().any(|category| {
            category.name.to_ascii_lowercase() == normalized
                && category.owner.as_deref() == owner
        });
        if duplicate {
            return Err(EngineError::InvalidInput(format!(
                "category `{name}` already exists"
            )));
        }
        let category = Category {
            category_id: next_record_id("cat", categories.iter().map(|c| c.category_id.as_str())),
            name: name.to_string(),
            kind,
            owner: owner.map(str::to_string),
            created_at: self.clock.now(),
        };
        categories.push(category.clone());
        self.store.save(collections::CATEGORIES, &categories)?;
        Ok(category)
    }

    /// Resolves a category id if it exists and is visible to the user.
    pub fn get_visible(&self, user_id: &str, category_id: &str) -> Result<Option<Category>> {
        let categories: Vec<Category> = self.store.load(collections::CATEGORIES)?;
        Ok(categories
            .into_iter()
            .find(|category| category.category_id == category_id && category.is_visible_to(user_id)))
    }

    pub fn list_visible(&self, user_id: &str) -> Result<Vec<Category>> {
        let categories: Vec<Category> = self.store.load(collections::CATEGORIES)?;
        Ok(categories
            .into_iter()
            .filter(|category| category.is_visible_to(user_id))
            .collect())
    }

    /// Removes a category after ownership and referential-integrity checks.
    ///
    /// Built-in categories can only be removed by admins. Removal is refused
    /// while transactions or recurring templates still reference the
    /// category.
    pub fn remove(&self, user_id: &str, category_id: &str) -> Result<()> {
        let mut categories: Vec<Category> = self.store.load(collections::CATEGORIES)?;
        let category = categories
            .iter()
            .find(|category| category.category_id == category_id)
            .ok_or_else(|| EngineError::NotFound(format!("category `{category_id}`")))?;

        let permitted = match &category.owner {
            Some(owner) => owner == user_id || self.users.is_admin(user_id)?,
            None => self.users.is_admin(user_id)?,
        };
        if !permitted {
            return Err(EngineError::PermissionDenied(format!(
                "user `{user_id}` cannot remove category `{category_id}`"
            )));
        }

        let transactions: Vec<Transaction> = self.store.load(collections::TRANSACTIONS)?;
        if transactions.iter().any(|txn| txn.category_id == category_id) {
            return Err(EngineError::InvalidInput(
                "category has linked transactions".into(),
            ));
        }
        let templates: Vec<RecurringTemplate> = self.store.load(collections::RECURRING)?;
        if templates.iter().any(|tpl| tpl.category_id == category_id) {
            return Err(EngineError::InvalidInput(
                "category has linked recurring templates".into(),
            ));
        }

        categories.retain(|category| category.category_id != category_id);
        self.store.save(collections::CATEGORIES, &categories)?;
        Ok(())
    }
}
