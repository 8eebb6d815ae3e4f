use chrono::{NaiveDate, Utc};
use model::entities::expense;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{clean_notes, currency_or_default, ensure_user, require_label, require_positive, require_user_id};
use crate::error::{LedgerError, Result};
use crate::recurrence::Frequency;

/// Fields of an expense as submitted by the user, for both create and update.
#[derive(Debug, Clone)]
pub struct ExpenseInput {
    pub source: String,
    pub amount: Decimal,
    pub currency: Option<String>,
    pub notes: Option<String>,
    pub is_recurring: bool,
    /// Required when `is_recurring`: `weekly`, `biweekly`, `monthly` or `annually`.
    pub recurrence_frequency: Option<String>,
    /// Defaults to today (UTC) for new templates.
    pub next_occurrence_date: Option<NaiveDate>,
}

struct Validated {
    source: String,
    amount: Decimal,
    currency: String,
    notes: String,
    recurrence: Option<(Frequency, Option<NaiveDate>)>,
}

fn validate(input: ExpenseInput) -> Result<Validated> {
    let source = require_label(&input.source)?;
    let amount = require_positive(input.amount)?;
    let recurrence = if input.is_recurring {
        let tag = input
            .recurrence_frequency
            .as_deref()
            .ok_or_else(|| LedgerError::validation("recurrence frequency is required for recurring expenses"))?;
        Some((tag.parse::<Frequency>()?, input.next_occurrence_date))
    } else {
        None
    };

    Ok(Validated {
        source,
        amount,
        currency: currency_or_default(input.currency),
        notes: clean_notes(input.notes),
        recurrence,
    })
}

#[instrument(skip(db))]
pub async fn add_expense(db: &DatabaseConnection, user_id: &str, input: ExpenseInput) -> Result<expense::Model> {
    let user_id = require_user_id(user_id)?;
    let valid = validate(input)?;
    ensure_user(db, user_id).await?;

    let now = Utc::now();
    let (frequency, next) = match valid.recurrence {
        Some((frequency, next)) => (
            frequency.as_str().to_string(),
            Some(next.unwrap_or_else(|| now.date_naive())),
        ),
        None => (String::new(), None),
    };

    let created = expense::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        user_id: Set(user_id.to_string()),
        source: Set(valid.source),
        amount: Set(valid.amount),
        currency: Set(valid.currency),
        notes: Set(valid.notes),
        is_recurring: Set(next.is_some()),
        recurrence_frequency: Set(frequency),
        next_occurrence_date: Set(next),
        recurring_expense_id: Set(None),
        occurrence_date: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;

    info!(expense_id = %created.id, recurring = created.is_recurring, "Expense recorded");
    Ok(created)
}

/// Templates and realized rows, newest first.
#[instrument(skip(db))]
pub async fn list_expenses(db: &DatabaseConnection, user_id: &str) -> Result<Vec<expense::Model>> {
    let user_id = require_user_id(user_id)?;
    Ok(expense::Entity::find()
        .filter(expense::Column::UserId.eq(user_id))
        .order_by_desc(expense::Column::CreatedAt)
        .order_by_asc(expense::Column::Id)
        .all(db)
        .await?)
}

#[instrument(skip(db))]
pub async fn get_expense(db: &DatabaseConnection, user_id: &str, expense_id: &str) -> Result<expense::Model> {
    let user_id = require_user_id(user_id)?;
    expense::Entity::find_by_id(expense_id.to_string())
        .filter(expense::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| LedgerError::not_found(format!("expense {expense_id}")))
}

/// Replaces the user-editable fields of an expense.
///
/// Turning recurrence off clears the frequency and next date. A template
/// that stays recurring keeps its schedule unless a new date is given.
#[instrument(skip(db))]
pub async fn update_expense(
    db: &DatabaseConnection,
    user_id: &str,
    expense_id: &str,
    input: ExpenseInput,
) -> Result<expense::Model> {
    let valid = validate(input)?;
    let existing = get_expense(db, user_id, expense_id).await?;
    let kept_schedule = existing.next_occurrence_date.filter(|_| existing.is_recurring);

    let mut model: expense::ActiveModel = existing.into();
    model.source = Set(valid.source);
    model.amount = Set(valid.amount);
    model.currency = Set(valid.currency);
    model.notes = Set(valid.notes);
    match valid.recurrence {
        Some((frequency, next)) => {
            let next = next.or(kept_schedule).unwrap_or_else(|| Utc::now().date_naive());
            model.is_recurring = Set(true);
            model.recurrence_frequency = Set(frequency.as_str().to_string());
            model.next_occurrence_date = Set(Some(next));
        }
        None => {
            model.is_recurring = Set(false);
            model.recurrence_frequency = Set(String::new());
            model.next_occurrence_date = Set(None);
        }
    }
    model.updated_at = Set(Utc::now());

    let updated = model.update(db).await?;
    info!(%expense_id, "Expense updated");
    Ok(updated)
}

/// Deletes one expense row. Entries already generated from a template are kept.
#[instrument(skip(db))]
pub async fn delete_expense(db: &DatabaseConnection, user_id: &str, expense_id: &str) -> Result<()> {
    let existing = get_expense(db, user_id, expense_id).await?;
    existing.delete(db).await?;
    info!(%expense_id, "Expense deleted");
    Ok(())
}
