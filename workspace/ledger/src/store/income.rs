use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use model::entities::{income, income_source};
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use tracing::{debug, instrument, trace};

use super::{is_unique_violation, Materialization, RecurringDefinition, RecurringStore};
use crate::error::{LedgerError, Result};

impl RecurringDefinition for income_source::Model {
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
        Some(self.next_pay_at)
    }

    fn frequency_tag(&self) -> &str {
        &self.frequency
    }

    fn is_schedulable(&self) -> bool {
        self.active
    }
}

/// Income sources and realized incomes in the database.
#[derive(Debug, Clone)]
pub struct IncomeStore {
    db: DatabaseConnection,
}

impl IncomeStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_occurrence(&self, source_id: &str, occurrence: NaiveDate) -> Result<Option<income::Model>> {
        Ok(income::Entity::find()
            .filter(income::Column::IncomeSourceId.eq(source_id))
            .filter(income::Column::OccurrenceDate.eq(occurrence))
            .one(&self.db)
            .await?)
    }
}

#[async_trait]
impl RecurringStore for IncomeStore {
    type Definition = income_source::Model;
    type Entry = income::Model;

    fn kind(&self) -> &'static str {
        "income"
    }

    #[instrument(skip(self))]
    async fn list_due(&self, user_id: &str, on_or_before: NaiveDate) -> Result<Vec<income_source::Model>> {
        let sources = income_source::Entity::find()
            .filter(income_source::Column::UserId.eq(user_id))
            .filter(income_source::Column::Active.eq(true))
            .filter(income_source::Column::NextPayAt.lte(on_or_before))
            .order_by_asc(income_source::Column::NextPayAt)
            .order_by_asc(income_source::Column::Id)
            .all(&self.db)
            .await?;
        trace!(count = sources.len(), "Loaded due income sources");
        Ok(sources)
    }

    #[instrument(skip(self, entry), fields(entry_id = %entry.id))]
    async fn create_entry(&self, entry: income::Model) -> Result<Materialization<income::Model>> {
        if let (Some(source_id), Some(occurrence)) = (entry.income_source_id.as_deref(), entry.occurrence_date) {
            if self.find_occurrence(source_id, occurrence).await?.is_some() {
                debug!(source_id, %occurrence, "Occurrence already recorded");
                return Ok(Materialization::AlreadyRecorded);
            }
        }

        let model = income::ActiveModel {
            id: Set(entry.id),
            user_id: Set(entry.user_id),
            source: Set(entry.source),
            amount: Set(entry.amount),
            currency: Set(entry.currency),
            notes: Set(entry.notes),
            income_source_id: Set(entry.income_source_id),
            occurrence_date: Set(entry.occurrence_date),
            created_at: Set(entry.created_at),
            updated_at: Set(entry.updated_at),
        };

        match model.insert(&self.db).await {
            Ok(created) => Ok(Materialization::Created(created)),
            // Lost a race with a concurrent run for the same occurrence.
            Err(err) if is_unique_violation(&err) => {
                debug!("Occurrence recorded concurrently");
                Ok(Materialization::AlreadyRecorded)
            }
            Err(err) => Err(err.into()),
        }
    }

    #[instrument(skip(self))]
    async fn update_next_due(&self, user_id: &str, definition_id: &str, next: NaiveDate) -> Result<()> {
        let result = income_source::Entity::update_many()
            .col_expr(income_source::Column::NextPayAt, Expr::value(next))
            .col_expr(income_source::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(income_source::Column::Id.eq(definition_id))
            .filter(income_source::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(LedgerError::not_found(format!("income source {definition_id}")));
        }
        Ok(())
    }
}
