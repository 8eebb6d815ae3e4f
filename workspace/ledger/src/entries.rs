//! Validated create/read/update/delete services for ledger rows.
//!
//! Every operation is scoped to a user. Input is trimmed and checked before
//! any query runs; a row that belongs to another user is reported as missing.

use model::entities::user;
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, EntityTrait};

use crate::error::{LedgerError, Result};

pub mod expenses;
pub mod incomes;
pub mod users;

pub use expenses::{add_expense, delete_expense, get_expense, list_expenses, update_expense, ExpenseInput};
pub use incomes::{
    add_income, add_income_source, delete_income, get_income, list_income_sources, list_incomes,
    set_income_source_active, NewIncome, NewIncomeSource,
};
pub use users::{create_user, list_users, NewUser};

pub const DEFAULT_CURRENCY: &str = "USD";

fn require_user_id(user_id: &str) -> Result<&str> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(LedgerError::validation("user id is required"));
    }
    Ok(user_id)
}

fn require_label(source: &str) -> Result<String> {
    let source = source.trim();
    if source.is_empty() {
        return Err(LedgerError::validation("source is required"));
    }
    Ok(source.to_string())
}

fn require_positive(amount: Decimal) -> Result<Decimal> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::validation("amount must be greater than zero"));
    }
    Ok(amount)
}

fn currency_or_default(currency: Option<String>) -> String {
    currency
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string())
}

fn clean_notes(notes: Option<String>) -> String {
    notes.map(|n| n.trim().to_string()).unwrap_or_default()
}

async fn ensure_user<C: ConnectionTrait>(db: &C, user_id: &str) -> Result<()> {
    match user::Entity::find_by_id(user_id.to_string()).one(db).await? {
        Some(_) => Ok(()),
        None => Err(LedgerError::not_found(format!("user {user_id}"))),
    }
}
