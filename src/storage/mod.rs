//! Flat record store: whole-collection load/save over named collections.

pub mod json_store;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::Result;

pub use json_store::JsonStore;

/// Well-known collection names.
pub mod collections {
    pub const USERS: &str = "users";
    pub const CATEGORIES: &str = "categories";
    pub const TRANSACTIONS: &str = "transactions";
    pub const BUDGETS: &str = "budgets";
    pub const NOTIFICATIONS: &str = "notifications";
    pub const RECURRING: &str = "recurring_transactions";
}

/// Abstraction over the flat record store.
///
/// Every call reads or writes an entire collection; there are no indices,
/// no transactions, and no concurrent-access protection. The contract is
/// explicitly last-write-wins: two writers racing on the same collection
/// both load a snapshot, and whichever saves last silently overwrites the
/// other's changes.
pub trait CollectionStore {
    /// Loads all records of a collection. A collection that has never been
    /// written yields an empty vector.
    fn load<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>>;

    /// Replaces the entire contents of a collection.
    fn save<T: Serialize>(&self, collection: &str, records: &[T]) -> Result<()>;
}
