use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use model::entities::expense;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::{debug, instrument, trace};

use super::{is_unique_violation, Materialization, RecurringDefinition, RecurringStore};
use crate::error::{LedgerError, Result};

impl RecurringDefinition for expense::Model {
    fn id(&self) -> &str {
        &self.id
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn label(&self) -> &str {
        &self.source
    }

    fn due_date(&self) -> Option<NaiveDate> {
        self.next_occurrence_date
    }

    fn frequency_tag(&self) -> &str {
        &self.recurrence_frequency
    }

    fn is_schedulable(&self) -> bool {
        self.is_recurring
    }
}

/// Recurring expense templates and their realized rows, which share one table.
#[derive(Debug, Clone)]
pub struct ExpenseStore {
    db: DatabaseConnection,
}

impl ExpenseStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecurringStore for ExpenseStore {
    type Definition = expense::Model;
    type Entry = expense::Model;

    fn kind(&self) -> &'static str {
        "expense"
    }

    #[instrument(skip(self))]
    async fn list_due(&self, user_id: &str, on_or_before: NaiveDate) -> Result<Vec<expense::Model>> {
        let templates = expense::Entity::find()
            .filter(expense::Column::UserId.eq(user_id))
            .filter(expense::Column::IsRecurring.eq(true))
            .filter(expense::Column::NextOccurrenceDate.lte(on_or_before))
            .order_by_asc(expense::Column::NextOccurrenceDate)
            .order_by_asc(expense::Column::Id)
            .all(&self.db)
            .await?;
        trace!(count = templates.len(), "Loaded due recurring expenses");
        Ok(templates)
    }

    #[instrument(skip(self, entry), fields(entry_id = %entry.id))]
    async fn create_entry(&self, entry: expense::Model) -> Result<Materialization<expense::Model>> {
        if let (Some(template_id), Some(occurrence)) = (entry.recurring_expense_id.as_deref(), entry.occurrence_date) {
            let existing = expense::Entity::find()
                .filter(expense::Column::RecurringExpenseId.eq(template_id))
                .filter(expense::Column::OccurrenceDate.eq(occurrence))
                .one(&self.db)
                .await?;
            if existing.is_some() {
                debug!(template_id, %occurrence, "Occurrence already recorded");
                return Ok(Materialization::AlreadyRecorded);
            }
        }

        let model = expense::ActiveModel {
            id: Set(entry.id),
            user_id: Set(entry.user_id),
            source: Set(entry.source),
            amount: Set(entry.amount),
            currency: Set(entry.currency),
            notes: Set(entry.notes),
            is_recurring: Set(entry.is_recurring),
            recurrence_frequency: Set(entry.recurrence_frequency),
            next_occurrence_date: Set(entry.next_occurrence_date),
            recurring_expense_id: Set(entry.recurring_expense_id),
            occurrence_date: Set(entry.occurrence_date),
            created_at: Set(entry.created_at),
            updated_at: Set(entry.updated_at),
        };

        match model.insert(&self.db).await {
            Ok(created) => Ok(Materialization::Created(created)),
            Err(err) if is_unique_violation(&err) => {
                debug!("Occurrence recorded concurrently");
                Ok(Materialization::AlreadyRecorded)
            }
            Err(err) => Err(err.into()),
        }
    }

    #[instrument(skip(self))]
    async fn update_next_due(&self, user_id: &str, definition_id: &str, next: NaiveDate) -> Result<()> {
        let result = expense::Entity::update_many()
            .col_expr(expense::Column::NextOccurrenceDate, Expr::value(next))
            .col_expr(expense::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(expense::Column::Id.eq(definition_id))
            .filter(expense::Column::UserId.eq(user_id))
            .filter(expense::Column::IsRecurring.eq(true))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(LedgerError::not_found(format!("recurring expense {definition_id}")));
        }
        Ok(())
    }
}
