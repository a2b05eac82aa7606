//! Notification sink.

use std::sync::Arc;

use serde_json::Value;

use crate::core::time::Clock;
use crate::domain::{Notification, NotificationPriority};
use crate::errors::{EngineError, Result};
use crate::storage::{collections, CollectionStore};
use crate::utils::next_record_id;

/// Append-only store of user notifications.
pub struct NotificationService<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: CollectionStore> NotificationService<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn create(
        &self,
        user_id: &str,
        kind: &str,
        title: &str,
        message: &str,
        priority: NotificationPriority,
        data: Value,
    ) -> Result<Notification> {
        let mut notifications: Vec<Notification> = self.store.load(collections::NOTIFICATIONS)?;
        let notification = Notification {
            notification_id: next_record_id(
                "ntf",
                notifications.iter().map(|n| n.notification_id.as_str()),
            ),
            user_id: user_id.to_string(),
            kind: kind.to_string(),
            title: title.to_string(),
            message: message.to_string(),
            priority,
            data,
            is_read: false,
            created_at: self.clock.now(),
        };
        notifications.push(notification.clone());
        self.store.save(collections::NOTIFICATIONS, &notifications)?;
        Ok(notification)
    }

    /// Returns the user's notifications, newest first.
    pub fn list_for_user(&self, user_id: &str) -> Result<Vec<Notification>> {
        let notifications: Vec<Notification> = self.store.load(collections::NOTIFICATIONS)?;
        let mut rows: Vec<Notification> = notifications
            .into_iter()
            .filter(|ntf| ntf.user_id == user_id)
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    pub fn unread_count(&self, user_id: &str) -> Result<usize> {
        Ok(self
            .list_for_user(user_id)?
            .iter()
            .filter(|ntf| !ntf.is_read)
            .count())
    }

    pub fn mark_read(&self, user_id: &str, notification_id: &str) -> Result<()> {
        let mut notifications: Vec<Notification> = self.store.load(collections::NOTIFICATIONS)?;
        let notification = notifications
            .iter_mut()
            .find(|ntf| ntf.notification_id == notification_id)
            .ok_or_else(|| EngineError::NotFound(format!("notification `{notification_id}`")))?;
        if notification.user_id != user_id {
            return Err(EngineError::PermissionDenied(format!(
                "notification `{notification_id}` belongs to another user"
            )));
        }
        if !notification.is_read {
            notification.is_read = true;
            self.store.save(collections::NOTIFICATIONS, &notifications)?;
        }
        Ok(())
    }
}
