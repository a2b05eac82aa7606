//! Directory of user accounts.

use std::sync::Arc;

use crate::core::time::Clock;
use crate::domain::{User, UserRole};
use crate::errors::{EngineError, Result};
use crate::storage::{collections, CollectionStore};
use crate::utils::next_record_id;

/// CRUD over the `users` collection plus the existence/role lookups the
/// other services depend on.
///
/// Authentication is out of scope: records carry no credentials.
pub struct UserDirectory<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: CollectionStore> UserDirectory<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn add(&self, username: &str, role: UserRole) -> Result<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(EngineError::InvalidInput("username must not be empty".into()));
        }
        let mut users: Vec<User> = self.store.load(collections::USERS)?;
        let normalized = username.to_ascii_lowercase();
        if users
            .iter()
            .any(|user| user.username.to_ascii_lowercase() == normalized)
        {
            return Err(EngineError::InvalidInput(format!(
                "username `{username}` already exists"
            )));
        }
        let user = User {
            user_id: next_record_id("user", users.iter().map(|u| u.user_id.as_str())),
            username: username.to_string(),
            role,
            created_at: self.clock.now(),
        };
        users.push(user.clone());
        self.store.save(collections::USERS, &users)?;
        tracing::debug!(user_id = %user.user_id, "registered user");
        Ok(user)
    }

    pub fn list(&self) -> Result<Vec<User>> {
        self.store.load(collections::USERS)
    }

    pub fn get(&self, user_id: &str) -> Result<Option<User>> {
        let users: Vec<User> = self.store.load(collections::USERS)?;
        Ok(users.into_iter().find(|user| user.user_id == user_id))
    }

    pub fn user_exists(&self, user_id: &str) -> Result<bool> {
        Ok(self.get(user_id)?.is_some())
    }

    pub fn is_admin(&self, user_id: &str) -> Result<bool> {
        Ok(self.get(user_id)?.map(|user| user.is_admin()).unwrap_or(false))
    }
}
