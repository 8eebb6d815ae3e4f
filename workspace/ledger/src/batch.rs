//! One pass of due evaluation over a single user's recurring definitions.

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::error::{BatchError, LedgerError};
use crate::materialize::materialize;
use crate::recurrence::{advance, DuePolicy};
use crate::store::{Materialization, RecurringDefinition, RecurringStore};

/// Runs the due-processing batch for one kind of definition.
///
/// Definitions are handled sequentially. For each candidate returned by the
/// store's pre-filter, the processor:
///
/// 1. checks the [`DuePolicy`] against the stored due date,
/// 2. materializes the entry for that occurrence when it fires,
/// 3. writes back the next due date (advanced from the stored date, or unchanged).
///
/// A failed materialization stops the batch and reports how many entries were
/// created before it. A failed write-back is logged and the batch continues.
pub struct DueProcessor<S> {
    store: S,
    policy: DuePolicy,
}

impl<S: RecurringStore> DueProcessor<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            policy: DuePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: DuePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> DuePolicy {
        self.policy
    }

    pub async fn process_due(&self, user_id: &str, now: DateTime<Utc>) -> Result<usize, BatchError> {
        self.process_due_tracked(user_id, now, &AtomicUsize::new(0)).await
    }

    /// Same as [`process_due`](Self::process_due), also bumping `progress` for
    /// every created entry so a caller that abandons the future still knows
    /// how many were written.
    #[instrument(skip(self, now, progress), fields(kind = self.store.kind(), policy = ?self.policy))]
    pub async fn process_due_tracked(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
        progress: &AtomicUsize,
    ) -> Result<usize, BatchError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(BatchError::new(0, LedgerError::validation("user id is required")));
        }

        let today = now.date_naive();
        let candidates = self
            .store
            .list_due(user_id, today)
            .await
            .map_err(|err| BatchError::new(0, err))?;
        trace!(candidates = candidates.len(), %today, "Evaluating due candidates");

        let mut created = 0;
        for definition in &candidates {
            if !definition.is_schedulable() {
                continue;
            }
            let Some(due) = definition.due_date() else {
                continue;
            };

            let next = if self.policy.fires(now, due) {
                match materialize(&self.store, definition, due).await {
                    Ok(Materialization::Created(_)) => {
                        created += 1;
                        progress.fetch_add(1, Ordering::Relaxed);
                    }
                    Ok(Materialization::AlreadyRecorded) => {
                        debug!(definition_id = definition.id(), %due, "Occurrence already materialized, advancing only")
                    }
                    Err(err) => {
                        error!(definition_id = definition.id(), label = definition.label(), error = %err, "Failed to materialize entry");
                        return Err(BatchError::new(created, err));
                    }
                }
                advance(due, definition.frequency_tag())
            } else {
                due
            };

            if let Err(err) = self.store.update_next_due(user_id, definition.id(), next).await {
                warn!(definition_id = definition.id(), %next, error = %err, "Failed to write back next due date");
            }
        }

        if created > 0 {
            info!(created, "Processed due entries");
        } else {
            debug!("Nothing due");
        }
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use model::entities::{expense, income, income_source};
    use rust_decimal::Decimal;
    use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

    use super::*;
    use crate::store::{ExpenseStore, IncomeStore};
    use crate::testing::{at_noon, date, seed_expense, seed_income_source, seed_user, setup_db, FlakyStore};

    async fn reload_source(db: &DatabaseConnection, id: &str) -> income_source::Model {
        income_source::Entity::find_by_id(id.to_string()).one(db).await.unwrap().unwrap()
    }

    async fn incomes(db: &DatabaseConnection) -> Vec<income::Model> {
        income::Entity::find().all(db).await.unwrap()
    }

    async fn seeded() -> DatabaseConnection {
        let db = setup_db().await;
        seed_user(&db, "u1").await;
        db
    }

    #[tokio::test]
    async fn test_weekly_source_fires_on_its_day() {
        let db = seeded().await;
        let today = date(2024, 3, 4);
        let source = seed_income_source(&db, "u1", "Freelance", "weekly", today, true).await;
        let processor = DueProcessor::new(IncomeStore::new(db.clone()));

        assert_eq!(processor.process_due("u1", at_noon(today)).await.unwrap(), 1);

        let entries = incomes(&db).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].source, source.source);
        assert_eq!(entries[0].amount, source.amount);
        assert_eq!(entries[0].currency, source.currency);
        assert_eq!(entries[0].notes, source.notes);
        assert_eq!(reload_source(&db, &source.id).await.next_pay_at, date(2024, 3, 11));
    }

    #[tokio::test]
    async fn test_salary_scenario() {
        let db = seeded().await;
        let source = seed_income_source(&db, "u1", "Salary", "monthly", date(2024, 1, 1), true).await;
        let processor = DueProcessor::new(IncomeStore::new(db.clone()));

        assert_eq!(processor.process_due("u1", at_noon(date(2024, 1, 1))).await.unwrap(), 1);
        let entries = incomes(&db).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].user_id, "u1");
        assert_eq!(entries[0].source, "Salary");
        assert_eq!(entries[0].amount, Decimal::new(1000, 0));
        assert_eq!(entries[0].currency, "USD");
        assert_eq!(reload_source(&db, &source.id).await.next_pay_at, date(2024, 2, 1));

        assert_eq!(processor.process_due("u1", at_noon(date(2024, 1, 2))).await.unwrap(), 0);
        assert_eq!(incomes(&db).await.len(), 1);
        assert_eq!(reload_source(&db, &source.id).await.next_pay_at, date(2024, 2, 1));
    }

    #[tokio::test]
    async fn test_missed_day_is_not_caught_up() {
        let db = seeded().await;
        let today = date(2024, 3, 4);
        let stale = seed_income_source(&db, "u1", "Salary", "weekly", date(2024, 3, 1), true).await;
        let processor = DueProcessor::new(FlakyStore::new(IncomeStore::new(db.clone())));

        assert_eq!(processor.process_due("u1", at_noon(today)).await.unwrap(), 0);
        assert!(incomes(&db).await.is_empty());
        assert_eq!(reload_source(&db, &stale.id).await.next_pay_at, date(2024, 3, 1));
        // The unchanged date is still written back.
        assert_eq!(processor.store().update_attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_inactive_source_never_fires() {
        let db = seeded().await;
        let today = date(2024, 3, 4);
        let source = seed_income_source(&db, "u1", "Salary", "weekly", today, false).await;
        let processor = DueProcessor::new(IncomeStore::new(db.clone()));

        assert_eq!(processor.process_due("u1", at_noon(today)).await.unwrap(), 0);
        assert!(incomes(&db).await.is_empty());
        assert_eq!(reload_source(&db, &source.id).await.next_pay_at, today);
    }

    #[tokio::test]
    async fn test_second_run_same_day_creates_nothing() {
        let db = seeded().await;
        let today = date(2024, 3, 4);
        seed_income_source(&db, "u1", "Salary", "biweekly", today, true).await;
        let processor = DueProcessor::new(IncomeStore::new(db.clone()));

        assert_eq!(processor.process_due("u1", at_noon(today)).await.unwrap(), 1);
        assert_eq!(processor.process_due("u1", at_noon(today)).await.unwrap(), 0);
        assert_eq!(incomes(&db).await.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_frequency_advances_one_week() {
        let db = seeded().await;
        let today = date(2024, 3, 4);
        let source = seed_income_source(&db, "u1", "Odd", "", today, true).await;
        let processor = DueProcessor::new(IncomeStore::new(db.clone()));

        assert_eq!(processor.process_due("u1", at_noon(today)).await.unwrap(), 1);
        assert_eq!(reload_source(&db, &source.id).await.next_pay_at, date(2024, 3, 11));
    }

    #[tokio::test]
    async fn test_monthly_expense_from_january_31() {
        let db = seeded().await;
        let rent = seed_expense(&db, "u1", "Rent", Some(("monthly", date(2024, 1, 31)))).await;
        let processor = DueProcessor::new(ExpenseStore::new(db.clone()));

        assert_eq!(processor.process_due("u1", at_noon(date(2024, 1, 31))).await.unwrap(), 1);

        let template = expense::Entity::find_by_id(rent.id.clone()).one(&db).await.unwrap().unwrap();
        assert_eq!(template.next_occurrence_date, Some(date(2024, 2, 29)));

        let realized = expense::Entity::find()
            .filter(expense::Column::IsRecurring.eq(false))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(realized.len(), 1);
        assert_eq!(realized[0].source, "Rent");
        assert_eq!(realized[0].currency, "EUR");
        assert_eq!(realized[0].recurring_expense_id.as_deref(), Some(rent.id.as_str()));
        assert_eq!(realized[0].occurrence_date, Some(date(2024, 1, 31)));
    }

    #[tokio::test]
    async fn test_blank_user_id_is_rejected() {
        let db = seeded().await;
        let processor = DueProcessor::new(IncomeStore::new(db));

        for user_id in ["", "   "] {
            let err = processor.process_due(user_id, Utc::now()).await.unwrap_err();
            assert_eq!(err.created, 0);
            assert!(err.source.is_validation());
        }
    }

    #[tokio::test]
    async fn test_user_id_is_trimmed() {
        let db = seeded().await;
        let today = date(2024, 3, 4);
        seed_income_source(&db, "u1", "Salary", "weekly", today, true).await;
        let processor = DueProcessor::new(IncomeStore::new(db.clone()));

        assert_eq!(processor.process_due(" u1 ", at_noon(today)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_materialization_failure_stops_the_batch() {
        let db = seeded().await;
        let today = date(2024, 3, 4);
        for label in ["A", "B", "C"] {
            seed_income_source(&db, "u1", label, "weekly", today, true).await;
        }
        let processor = DueProcessor::new(FlakyStore::new(IncomeStore::new(db.clone())).failing_create_at(1));

        let err = processor.process_due("u1", at_noon(today)).await.unwrap_err();
        assert_eq!(err.created, 1);
        assert!(matches!(err.source, LedgerError::Database(_)));
        assert_eq!(incomes(&db).await.len(), 1);
        // Only the first definition was written back; the rest were never reached.
        assert_eq!(processor.store().update_attempts.load(Ordering::SeqCst), 1);

        let advanced = income_source::Entity::find()
            .filter(income_source::Column::NextPayAt.eq(date(2024, 3, 11)))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(advanced.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_write_back_is_repaired_by_next_run() {
        let db = seeded().await;
        let today = date(2024, 3, 4);
        let source = seed_income_source(&db, "u1", "Salary", "weekly", today, true).await;
        let processor = DueProcessor::new(FlakyStore::new(IncomeStore::new(db.clone())).failing_updates(true));

        assert_eq!(processor.process_due("u1", at_noon(today)).await.unwrap(), 1);
        assert_eq!(reload_source(&db, &source.id).await.next_pay_at, today);

        processor.store().set_failing_updates(false);
        assert_eq!(processor.process_due("u1", at_noon(today)).await.unwrap(), 0);
        assert_eq!(incomes(&db).await.len(), 1, "the occurrence must not be duplicated");
        assert_eq!(reload_source(&db, &source.id).await.next_pay_at, date(2024, 3, 11));
    }

    #[tokio::test]
    async fn test_concurrent_runs_create_one_entry() {
        let db = seeded().await;
        let today = date(2024, 3, 4);
        let source = seed_income_source(&db, "u1", "Salary", "monthly", today, true).await;
        let timer = DueProcessor::new(IncomeStore::new(db.clone()));
        let on_demand = DueProcessor::new(IncomeStore::new(db.clone()));

        let (a, b) = tokio::join!(
            timer.process_due("u1", at_noon(today)),
            on_demand.process_due("u1", at_noon(today))
        );
        assert_eq!(a.unwrap() + b.unwrap(), 1);
        assert_eq!(incomes(&db).await.len(), 1);
        assert_eq!(reload_source(&db, &source.id).await.next_pay_at, date(2024, 4, 4));
    }

    #[tokio::test]
    async fn test_catch_up_fires_one_occurrence_per_run() {
        let db = seeded().await;
        let today = date(2024, 3, 20);
        let source = seed_income_source(&db, "u1", "Salary", "weekly", date(2024, 3, 4), true).await;
        let processor = DueProcessor::new(IncomeStore::new(db.clone())).with_policy(DuePolicy::CatchUp);

        assert_eq!(processor.process_due("u1", at_noon(today)).await.unwrap(), 1);
        assert_eq!(reload_source(&db, &source.id).await.next_pay_at, date(2024, 3, 11));
        assert_eq!(processor.process_due("u1", at_noon(today)).await.unwrap(), 1);
        assert_eq!(processor.process_due("u1", at_noon(today)).await.unwrap(), 1);
        assert_eq!(processor.process_due("u1", at_noon(today)).await.unwrap(), 0);
        assert_eq!(reload_source(&db, &source.id).await.next_pay_at, date(2024, 3, 25));

        let mut occurrences: Vec<_> = incomes(&db).await.into_iter().filter_map(|i| i.occurrence_date).collect();
        occurrences.sort();
        assert_eq!(occurrences, vec![date(2024, 3, 4), date(2024, 3, 11), date(2024, 3, 18)]);
    }
}
