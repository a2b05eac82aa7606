pub mod budgets;
pub mod categories;
pub mod notifications;
pub mod schedule;
pub mod transactions;
pub mod users;

pub use budgets::BudgetService;
pub use categories::CategoryService;
pub use notifications::NotificationService;
pub use schedule::ScheduleEngine;
pub use transactions::TransactionLedger;
pub use users::UserDirectory;
