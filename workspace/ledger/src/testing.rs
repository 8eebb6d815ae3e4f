//! Shared fixtures for the ledger tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use migration::{Migrator, MigratorTrait};
use model::entities::{expense, income_source, user};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, DbErr, Set};

use crate::error::{LedgerError, Result};
use crate::store::{Materialization, RecurringStore};

/// Create an in-memory SQLite database with foreign keys on and migrations applied.
pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");
    db.execute_unprepared("PRAGMA foreign_keys = ON;")
        .await
        .expect("Failed to enable foreign keys");
    Migrator::up(&db, None).await.expect("Failed to run migrations");
    db
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at_noon(day: NaiveDate) -> chrono::DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_hms_opt(12, 0, 0).unwrap())
}

pub async fn seed_user(db: &DatabaseConnection, id: &str) -> user::Model {
    user::ActiveModel {
        id: Set(id.to_string()),
        username: Set(format!("{id}-name")),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
    .expect("Failed to seed user")
}

/// A 1000 USD income source.
pub async fn seed_income_source(
    db: &DatabaseConnection,
    user_id: &str,
    source: &str,
    frequency: &str,
    next_pay_at: NaiveDate,
    active: bool,
) -> income_source::Model {
    let stamp = Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap();
    income_source::ActiveModel {
        id: Set(uuid::Uuid::new_v4().to_string()),
        user_id: Set(user_id.to_string()),
        source: Set(source.to_string()),
        amount: Set(Decimal::new(1000, 0)),
        currency: Set("USD".to_string()),
        frequency: Set(frequency.to_string()),
        next_pay_at: Set(next_pay_at),
        active: Set(active),
        notes: Set(format!("{source} notes")),
        created_at: Set(stamp),
        updated_at: Set(stamp),
    }
    .insert(db)
    .await
    .expect("Failed to seed income source")
}

/// A 50 EUR expense; a template when `recurrence` is given.
pub async fn seed_expense(
    db: &DatabaseConnection,
    user_id: &str,
    source: &str,
    recurrence: Option<(&str, NaiveDate)>,
) -> expense::Model {
    let stamp = Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap();
    expense::ActiveModel {
        id: Set(uuid::Uuid::new_v4().to_string()),
        user_id: Set(user_id.to_string()),
        source: Set(source.to_string()),
        amount: Set(Decimal::new(5000, 2)),
        currency: Set("EUR".to_string()),
        notes: Set(String::new()),
        is_recurring: Set(recurrence.is_some()),
        recurrence_frequency: Set(recurrence.map(|(tag, _)| tag.to_string()).unwrap_or_default()),
        next_occurrence_date: Set(recurrence.map(|(_, next)| next)),
        recurring_expense_id: Set(None),
        occurrence_date: Set(None),
        created_at: Set(stamp),
        updated_at: Set(stamp),
    }
    .insert(db)
    .await
    .expect("Failed to seed expense")
}

/// Wraps a store and injects failures.
pub struct FlakyStore<S> {
    inner: S,
    /// Fail the create call with this zero-based index.
    fail_create_at: Option<usize>,
    fail_updates: AtomicBool,
    creates: AtomicUsize,
    pub update_attempts: AtomicUsize,
}

impl<S> FlakyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fail_create_at: None,
            fail_updates: AtomicBool::new(false),
            creates: AtomicUsize::new(0),
            update_attempts: AtomicUsize::new(0),
        }
    }

    pub fn failing_create_at(mut self, index: usize) -> Self {
        self.fail_create_at = Some(index);
        self
    }

    pub fn failing_updates(self, fail: bool) -> Self {
        self.fail_updates.store(fail, Ordering::SeqCst);
        self
    }

    pub fn set_failing_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl<S: RecurringStore> RecurringStore for FlakyStore<S> {
    type Definition = S::Definition;
    type Entry = S::Entry;

    fn kind(&self) -> &'static str {
        self.inner.kind()
    }

    async fn list_due(&self, user_id: &str, on_or_before: NaiveDate) -> Result<Vec<Self::Definition>> {
        self.inner.list_due(user_id, on_or_before).await
    }

    async fn create_entry(&self, entry: Self::Entry) -> Result<Materialization<Self::Entry>> {
        let index = self.creates.fetch_add(1, Ordering::SeqCst);
        if self.fail_create_at == Some(index) {
            return Err(LedgerError::Database(DbErr::Custom("injected create failure".into())));
        }
        self.inner.create_entry(entry).await
    }

    async fn update_next_due(&self, user_id: &str, definition_id: &str, next: NaiveDate) -> Result<()> {
        self.update_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(LedgerError::Database(DbErr::Custom("injected update failure".into())));
        }
        self.inner.update_next_due(user_id, definition_id, next).await
    }
}
