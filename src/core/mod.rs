//! Business logic: services over the flat record store.

pub mod services;
pub mod time;

pub use time::{Clock, FixedClock, SystemClock};
