use chrono::{NaiveDate, Utc};
use model::entities::{income, income_source};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{clean_notes, currency_or_default, ensure_user, require_label, require_positive, require_user_id};
use crate::error::{LedgerError, Result};
use crate::recurrence::Frequency;

/// A one-off income recorded by the user.
#[derive(Debug, Clone)]
pub struct NewIncome {
    pub source: String,
    pub amount: Decimal,
    pub currency: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewIncomeSource {
    pub source: String,
    pub amount: Decimal,
    pub currency: Option<String>,
    /// `weekly`, `biweekly` or `monthly`.
    pub frequency: String,
    /// Defaults to today (UTC).
    pub next_pay_at: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[instrument(skip(db))]
pub async fn add_income(db: &DatabaseConnection, user_id: &str, input: NewIncome) -> Result<income::Model> {
    let user_id = require_user_id(user_id)?;
    let source = require_label(&input.source)?;
    let amount = require_positive(input.amount)?;
    ensure_user(db, user_id).await?;

    let now = Utc::now();
    let created = income::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        user_id: Set(user_id.to_string()),
        source: Set(source),
        amount: Set(amount),
        currency: Set(currency_or_default(input.currency)),
        notes: Set(clean_notes(input.notes)),
        income_source_id: Set(None),
        occurrence_date: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    info!(income_id = %created.id, "Income recorded");
    Ok(created)
}

/// Newest first.
#[instrument(skip(db))]
pub async fn list_incomes(db: &DatabaseConnection, user_id: &str) -> Result<Vec<income::Model>> {
    let user_id = require_user_id(user_id)?;
    Ok(income::Entity::find()
        .filter(income::Column::UserId.eq(user_id))
        .order_by_desc(income::Column::CreatedAt)
        .order_by_asc(income::Column::Id)
        .all(db)
        .await?)
}

#[instrument(skip(db))]
pub async fn get_income(db: &DatabaseConnection, user_id: &str, income_id: &str) -> Result<income::Model> {
    let user_id = require_user_id(user_id)?;
    income::Entity::find_by_id(income_id.to_string())
        .filter(income::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| LedgerError::not_found(format!("income {income_id}")))
}

/// Deletes an income. When it was generated by an income source, that source
/// is deleted as well; other sources with the same label are left alone.
#[instrument(skip(db))]
pub async fn delete_income(db: &DatabaseConnection, user_id: &str, income_id: &str) -> Result<()> {
    let income = get_income(db, user_id, income_id).await?;

    let txn = db.begin().await?;
    let source_id = income.income_source_id.clone();
    income.delete(&txn).await?;

    if let Some(source_id) = source_id {
        let removed = income_source::Entity::delete_many()
            .filter(income_source::Column::Id.eq(source_id.as_str()))
            .filter(income_source::Column::UserId.eq(user_id.trim()))
            .exec(&txn)
            .await?;
        debug!(%source_id, rows = removed.rows_affected, "Deleted linked income source");
    }
    txn.commit().await?;

    info!(%income_id, "Income deleted");
    Ok(())
}

#[instrument(skip(db))]
pub async fn add_income_source(
    db: &DatabaseConnection,
    user_id: &str,
    input: NewIncomeSource,
) -> Result<income_source::Model> {
    let user_id = require_user_id(user_id)?;
    let source = require_label(&input.source)?;
    let amount = require_positive(input.amount)?;
    let frequency: Frequency = input.frequency.parse()?;
    if !frequency.allowed_for_income() {
        return Err(LedgerError::validation(format!(
            "frequency '{frequency}' is not allowed for income sources"
        )));
    }
    ensure_user(db, user_id).await?;

    let now = Utc::now();
    let created = income_source::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        user_id: Set(user_id.to_string()),
        source: Set(source),
        amount: Set(amount),
        currency: Set(currency_or_default(input.currency)),
        frequency: Set(frequency.as_str().to_string()),
        next_pay_at: Set(input.next_pay_at.unwrap_or_else(|| now.date_naive())),
        active: Set(true),
        notes: Set(clean_notes(input.notes)),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    info!(source_id = %created.id, next_pay_at = %created.next_pay_at, "Income source added");
    Ok(created)
}

#[instrument(skip(db))]
pub async fn list_income_sources(db: &DatabaseConnection, user_id: &str) -> Result<Vec<income_source::Model>> {
    let user_id = require_user_id(user_id)?;
    Ok(income_source::Entity::find()
        .filter(income_source::Column::UserId.eq(user_id))
        .order_by_asc(income_source::Column::NextPayAt)
        .order_by_asc(income_source::Column::Id)
        .all(db)
        .await?)
}

/// Enables or soft-disables a source. Disabled sources are skipped by the scheduler.
#[instrument(skip(db))]
pub async fn set_income_source_active(
    db: &DatabaseConnection,
    user_id: &str,
    source_id: &str,
    active: bool,
) -> Result<income_source::Model> {
    let user_id = require_user_id(user_id)?;
    let existing = income_source::Entity::find_by_id(source_id.to_string())
        .filter(income_source::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| LedgerError::not_found(format!("income source {source_id}")))?;

    let mut model: income_source::ActiveModel = existing.into();
    model.active = Set(active);
    model.updated_at = Set(Utc::now());
    Ok(model.update(db).await?)
}
