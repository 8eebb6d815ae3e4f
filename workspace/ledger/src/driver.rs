//! Background sweeps that run the due-processing batch for every user.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::batch::DueProcessor;
use crate::error::LedgerError;
use crate::recurrence::DuePolicy;
use crate::store::{ExpenseStore, IncomeStore, RecurringStore, UserDirectory, UserStore};

const DEFAULT_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);
const DEFAULT_USER_TIMEOUT: Duration = Duration::from_secs(60);

/// Scheduler configuration, read from the `scheduler` config section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    pub enabled: bool,
    pub interval_secs: u64,
    pub user_timeout_secs: u64,
    /// Sweep immediately instead of waiting one interval.
    pub run_on_startup: bool,
    pub due_policy: DuePolicy,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: DEFAULT_INTERVAL.as_secs(),
            user_timeout_secs: DEFAULT_USER_TIMEOUT.as_secs(),
            run_on_startup: false,
            due_policy: DuePolicy::default(),
        }
    }
}

impl SchedulerSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn user_timeout(&self) -> Duration {
        Duration::from_secs(self.user_timeout_secs.max(1))
    }
}

/// Totals for one sweep across all users.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub users: usize,
    pub created: usize,
    pub failed: usize,
}

/// Periodically runs a [`DueProcessor`] for every user in a [`UserDirectory`].
pub struct Sweeper<S, D> {
    processor: DueProcessor<S>,
    directory: D,
    cancel: CancellationToken,
    interval: Duration,
    user_timeout: Duration,
    run_on_startup: bool,
}

impl<S, D> Sweeper<S, D>
where
    S: RecurringStore + 'static,
    D: UserDirectory + 'static,
{
    pub fn new(processor: DueProcessor<S>, directory: D, cancel: CancellationToken) -> Self {
        Self {
            processor,
            directory,
            cancel,
            interval: DEFAULT_INTERVAL,
            user_timeout: DEFAULT_USER_TIMEOUT,
            run_on_startup: false,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_user_timeout(mut self, timeout: Duration) -> Self {
        self.user_timeout = timeout;
        self
    }

    pub fn run_on_startup(mut self, enabled: bool) -> Self {
        self.run_on_startup = enabled;
        self
    }

    /// One pass over every known user. A failing user is logged and skipped.
    #[instrument(skip(self, now), fields(kind = self.processor.store().kind()))]
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> SweepReport {
        let mut report = SweepReport::default();

        let user_ids = match self.directory.list_all_user_ids().await {
            Ok(ids) => ids,
            Err(err) => {
                error!(error = %err, "Failed to list users");
                return report;
            }
        };

        for user_id in user_ids {
            if self.cancel.is_cancelled() {
                warn!(processed = report.users, "Sweep interrupted by shutdown");
                break;
            }
            report.users += 1;

            let progress = AtomicUsize::new(0);
            let batch = self.processor.process_due_tracked(&user_id, now, &progress);
            match tokio::time::timeout(self.user_timeout, batch).await {
                Ok(Ok(0)) => debug!(%user_id, "Nothing due"),
                Ok(Ok(created)) => {
                    report.created += created;
                    info!(%user_id, created, "Processed due entries for user");
                }
                Ok(Err(err)) => {
                    report.created += err.created;
                    report.failed += 1;
                    error!(%user_id, created = err.created, error = %err.source, "Due processing failed for user");
                }
                Err(_) => {
                    let created = progress.load(Ordering::Relaxed);
                    report.created += created;
                    report.failed += 1;
                    let err = LedgerError::Timeout(format!("user {user_id} after {:?}", self.user_timeout));
                    error!(%user_id, created, error = %err, "Due processing failed for user");
                }
            }
        }

        report
    }

    /// Sweeps on every interval tick until cancelled.
    pub async fn run(self) {
        let kind = self.processor.store().kind();
        let start = if self.run_on_startup {
            Instant::now()
        } else {
            Instant::now() + self.interval
        };
        let mut ticker = interval_at(start, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(kind, interval = ?self.interval, "Recurring processor started");

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!(kind, "Recurring processor cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    let report = self.sweep_once(Utc::now()).await;
                    info!(kind, users = report.users, created = report.created, failed = report.failed, "Sweep finished");
                }
            }
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

/// Starts the income and expense sweepers as independent tasks.
///
/// Returns no handles when the scheduler is disabled.
pub fn spawn_recurring_processors(
    db: DatabaseConnection,
    settings: &SchedulerSettings,
    cancel: CancellationToken,
) -> Vec<JoinHandle<()>> {
    if !settings.enabled {
        info!("Recurring processors disabled");
        return Vec::new();
    }

    let incomes = Sweeper::new(
        DueProcessor::new(IncomeStore::new(db.clone())).with_policy(settings.due_policy),
        UserStore::new(db.clone()),
        cancel.clone(),
    )
    .with_interval(settings.interval())
    .with_user_timeout(settings.user_timeout())
    .run_on_startup(settings.run_on_startup);

    let expenses = Sweeper::new(
        DueProcessor::new(ExpenseStore::new(db.clone())).with_policy(settings.due_policy),
        UserStore::new(db),
        cancel,
    )
    .with_interval(settings.interval())
    .with_user_timeout(settings.user_timeout())
    .run_on_startup(settings.run_on_startup);

    vec![incomes.spawn(), expenses.spawn()]
}
