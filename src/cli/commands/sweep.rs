use anyhow::Result;
use chrono::Utc;
use ledger::{DueProcessor, ExpenseStore, IncomeStore, Sweeper, UserStore};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::cli::EntryKind;
use crate::config::{connect, Settings};

/// One synchronous pass over every user, with the scheduler's per-user timeout.
pub async fn sweep(settings: &Settings, kind: EntryKind) -> Result<()> {
    trace!("Entering sweep function");
    let db = connect(&settings.database_url).await?;
    let scheduler = &settings.scheduler;
    let now = Utc::now();

    if kind.includes_incomes() {
        let report = Sweeper::new(
            DueProcessor::new(IncomeStore::new(db.clone())).with_policy(scheduler.due_policy),
            UserStore::new(db.clone()),
            CancellationToken::new(),
        )
        .with_user_timeout(scheduler.user_timeout())
        .sweep_once(now)
        .await;
        println!("incomes: users={} created={} failed={}", report.users, report.created, report.failed);
    }

    if kind.includes_expenses() {
        let report = Sweeper::new(
            DueProcessor::new(ExpenseStore::new(db.clone())).with_policy(scheduler.due_policy),
            UserStore::new(db),
            CancellationToken::new(),
        )
        .with_user_timeout(scheduler.user_timeout())
        .sweep_once(now)
        .await;
        println!("expenses: users={} created={} failed={}", report.users, report.created, report.failed);
    }

    Ok(())
}
