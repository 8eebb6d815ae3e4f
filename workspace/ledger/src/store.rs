//! Persistence seams consumed by the scheduler, with sea-orm adapters.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::materialize::Realize;

pub mod expense;
pub mod income;
pub mod users;

pub use expense::ExpenseStore;
pub use income::IncomeStore;
pub use users::UserStore;

/// A recurring template the scheduler can evaluate.
pub trait RecurringDefinition {
    fn id(&self) -> &str;
    fn user_id(&self) -> &str;
    /// Free-text label, used in logs.
    fn label(&self) -> &str;
    /// The next due date, if one is scheduled.
    fn due_date(&self) -> Option<NaiveDate>;
    /// The raw stored frequency tag.
    fn frequency_tag(&self) -> &str;
    /// False for soft-disabled sources and non-recurring expense rows.
    fn is_schedulable(&self) -> bool;
}

/// Outcome of persisting a realized entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Materialization<E> {
    Created(E),
    /// An entry for this (definition, occurrence) pair already exists.
    AlreadyRecorded,
}

impl<E> Materialization<E> {
    pub fn is_created(&self) -> bool {
        matches!(self, Materialization::Created(_))
    }
}

/// Repository operations for one kind of recurring definition.
#[async_trait]
pub trait RecurringStore: Send + Sync {
    type Definition: RecurringDefinition + Realize<Entry = Self::Entry> + Send + Sync;
    type Entry: Send + Sync + std::fmt::Debug;

    /// Short name used in logs (`income`, `expense`).
    fn kind(&self) -> &'static str;

    /// Schedulable definitions for `user_id` whose due date is on or before `on_or_before`.
    async fn list_due(&self, user_id: &str, on_or_before: NaiveDate) -> Result<Vec<Self::Definition>>;

    /// Inserts a realized entry. A second insert for the same occurrence
    /// reports [`Materialization::AlreadyRecorded`].
    async fn create_entry(&self, entry: Self::Entry) -> Result<Materialization<Self::Entry>>;

    /// Moves a definition's due date. Fails with `NotFound` when no row matches.
    async fn update_next_due(&self, user_id: &str, definition_id: &str, next: NaiveDate) -> Result<()>;
}

/// Enumerates every known user.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn list_all_user_ids(&self) -> Result<Vec<String>>;
}

pub(crate) fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
    matches!(err.sql_err(), Some(sea_orm::SqlErr::UniqueConstraintViolation(_)))
}
