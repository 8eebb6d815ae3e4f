//! Recurring income and expense scheduling for the budgeting ledger.
//!
//! The scheduler decides, per recurring definition, whether a realized entry
//! is due today, records it once per occurrence and moves the definition's
//! due date forward. [`batch::DueProcessor`] runs this for one user;
//! [`driver::Sweeper`] repeats it for every user on a timer.

use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;

pub mod batch;
pub mod driver;
pub mod entries;
pub mod error;
pub mod materialize;
pub mod net_worth;
pub mod recurrence;
pub mod store;

#[cfg(test)]
mod testing;

pub use batch::DueProcessor;
pub use driver::{spawn_recurring_processors, SchedulerSettings, SweepReport, Sweeper};
pub use error::{BatchError, LedgerError, Result};
pub use recurrence::{advance, is_due, start_of_day, DuePolicy, Frequency};
pub use store::{ExpenseStore, IncomeStore, UserStore};

/// Materializes the income sources of `user_id` that are due on the day of `now`.
pub async fn process_due_incomes(
    db: &DatabaseConnection,
    user_id: &str,
    now: DateTime<Utc>,
) -> std::result::Result<usize, BatchError> {
    DueProcessor::new(IncomeStore::new(db.clone())).process_due(user_id, now).await
}

/// Materializes the recurring expenses of `user_id` that are due on the day of `now`.
pub async fn process_due_expenses(
    db: &DatabaseConnection,
    user_id: &str,
    now: DateTime<Utc>,
) -> std::result::Result<usize, BatchError> {
    DueProcessor::new(ExpenseStore::new(db.clone())).process_due(user_id, now).await
}
