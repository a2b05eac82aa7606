//! Persisted data model shared by every service.
//!
//! Field names on these types are the wire contract for the flat JSON
//! collections; renames here are breaking changes for existing data files.

pub mod budget;
pub mod category;
pub mod common;
pub mod frequency;
pub mod notification;
pub mod recurring;
pub mod transaction;
pub mod user;

pub use budget::{Budget, BudgetPeriod, BudgetStatus};
pub use category::Category;
pub use common::{Identifiable, OwnedRecord, TransactionKind};
pub use frequency::Frequency;
pub use notification::{Notification, NotificationPriority};
pub use recurring::{RecurringPatch, RecurringTemplate};
pub use transaction::Transaction;
pub use user::{User, UserRole};
