use model::entities::{expense, income};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use tracing::instrument;

use crate::entries::DEFAULT_CURRENCY;
use crate::error::{LedgerError, Result};

/// Income minus expenses for one user. Amounts are summed as-is, without
/// currency conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetWorth {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub net_worth: Decimal,
    /// Currency of the oldest income, else of the oldest expense, else USD.
    pub currency: String,
}

/// Sums every income and every expense row (recurring templates included).
#[instrument(skip(db))]
pub async fn net_worth(db: &DatabaseConnection, user_id: &str) -> Result<NetWorth> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(LedgerError::validation("user id is required"));
    }

    let incomes = income::Entity::find()
        .filter(income::Column::UserId.eq(user_id))
        .order_by_asc(income::Column::CreatedAt)
        .all(db)
        .await?;
    let expenses = expense::Entity::find()
        .filter(expense::Column::UserId.eq(user_id))
        .order_by_asc(expense::Column::CreatedAt)
        .all(db)
        .await?;

    let total_income: Decimal = incomes.iter().map(|i| i.amount).sum();
    let total_expense: Decimal = expenses.iter().map(|e| e.amount).sum();
    let currency = incomes
        .first()
        .map(|i| i.currency.clone())
        .or_else(|| expenses.first().map(|e| e.currency.clone()))
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

    Ok(NetWorth {
        total_income,
        total_expense,
        net_worth: total_income - total_expense,
        currency,
    })
}
