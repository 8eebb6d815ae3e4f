use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use ledger::{start_of_day, DueProcessor, ExpenseStore, IncomeStore};
use tracing::{info, trace};

use crate::cli::EntryKind;
use crate::config::{connect, Settings};

/// On-demand trigger for one user, bypassing the background timer.
pub async fn process_due(settings: &Settings, user_id: &str, kind: EntryKind, date: Option<NaiveDate>) -> Result<()> {
    trace!("Entering process_due function for user_id: {}", user_id);
    let db = connect(&settings.database_url).await?;
    let now = date.map(start_of_day).unwrap_or_else(Utc::now);
    let policy = settings.scheduler.due_policy;
    info!("Processing due entries for user {} as of {}", user_id, now.date_naive());

    if kind.includes_incomes() {
        let created = DueProcessor::new(IncomeStore::new(db.clone()))
            .with_policy(policy)
            .process_due(user_id, now)
            .await
            .context("processing due incomes")?;
        println!("incomes created: {created}");
    }

    if kind.includes_expenses() {
        let created = DueProcessor::new(ExpenseStore::new(db))
            .with_policy(policy)
            .process_due(user_id, now)
            .await
            .context("processing due expenses")?;
        println!("expenses created: {created}");
    }

    Ok(())
}
