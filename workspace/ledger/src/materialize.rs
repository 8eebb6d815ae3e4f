//! Turning a due definition into a realized ledger entry.

use chrono::{DateTime, NaiveDate, Utc};
use model::entities::{expense, income, income_source};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::Result;
use crate::store::{Materialization, RecurringDefinition, RecurringStore};

/// Builds the realized entry for one occurrence of a definition.
pub trait Realize {
    type Entry;

    fn realize(&self, entry_id: String, occurrence: NaiveDate, stamped_at: DateTime<Utc>) -> Self::Entry;
}

impl Realize for income_source::Model {
    type Entry = income::Model;

    fn realize(&self, entry_id: String, occurrence: NaiveDate, stamped_at: DateTime<Utc>) -> income::Model {
        income::Model {
            id: entry_id,
            user_id: self.user_id.clone(),
            source: self.source.clone(),
            amount: self.amount,
            currency: self.currency.clone(),
            notes: self.notes.clone(),
            income_source_id: Some(self.id.clone()),
            occurrence_date: Some(occurrence),
            created_at: stamped_at,
            updated_at: stamped_at,
        }
    }
}

impl Realize for expense::Model {
    type Entry = expense::Model;

    /// Realized expenses are plain rows: not recurring, no frequency, no next date.
    fn realize(&self, entry_id: String, occurrence: NaiveDate, stamped_at: DateTime<Utc>) -> expense::Model {
        expense::Model {
            id: entry_id,
            user_id: self.user_id.clone(),
            source: self.source.clone(),
            amount: self.amount,
            currency: self.currency.clone(),
            notes: self.notes.clone(),
            is_recurring: false,
            recurrence_frequency: String::new(),
            next_occurrence_date: None,
            recurring_expense_id: Some(self.id.clone()),
            occurrence_date: Some(occurrence),
            created_at: stamped_at,
            updated_at: stamped_at,
        }
    }
}

/// Persists the entry for `occurrence` of `definition` with a fresh id and
/// the current UTC time.
#[instrument(skip_all, fields(kind = store.kind(), definition_id = definition.id(), %occurrence))]
pub async fn materialize<S: RecurringStore + ?Sized>(
    store: &S,
    definition: &S::Definition,
    occurrence: NaiveDate,
) -> Result<Materialization<S::Entry>> {
    let entry = definition.realize(Uuid::new_v4().to_string(), occurrence, Utc::now());
    let outcome = store.create_entry(entry).await?;
    debug!(created = outcome.is_created(), "Materialized occurrence");
    Ok(outcome)
}
