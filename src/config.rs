use anyhow::Result;
use config::{Config, Environment, File};
use ledger::SchedulerSettings;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde::Deserialize;
use tracing::{debug, info};

use crate::schemas::AppState;

/// Application settings.
///
/// Sources, lowest precedence first: built-in defaults, an optional
/// `budgeting.{yaml,toml,json}` in the working directory, then `BUDGETING__*`
/// environment variables (`BUDGETING__SCHEDULER__INTERVAL_SECS=3600`).
/// A `.env` file is loaded into the environment beforehand.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database_url: String,
    pub bind_address: String,
    pub scheduler: SchedulerSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://budgeting.db?mode=rwc".to_string(),
            bind_address: "0.0.0.0:3000".to_string(),
            scheduler: SchedulerSettings::default(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_config(
            Config::builder()
                .add_source(File::with_name("budgeting").required(false))
                .add_source(
                    Environment::with_prefix("BUDGETING")
                        .prefix_separator("__")
                        .separator("__")
                        .try_parsing(true),
                )
                .build()?,
        )
    }

    fn from_config(config: Config) -> Result<Self> {
        let settings: Settings = config.try_deserialize()?;
        debug!(?settings, "Loaded settings");
        Ok(settings)
    }

    /// Applies command-line overrides.
    pub fn with_overrides(mut self, database_url: Option<String>, bind_address: Option<String>) -> Self {
        if let Some(url) = database_url {
            self.database_url = url;
        }
        if let Some(address) = bind_address {
            self.bind_address = address;
        }
        self
    }
}

pub async fn connect(database_url: &str) -> Result<DatabaseConnection> {
    info!("Connecting to database: {}", database_url);
    let mut options = ConnectOptions::new(database_url);
    options.sqlx_logging(false);
    Ok(Database::connect(options).await?)
}

/// Connect to the configured database and build the shared handler state.
pub async fn initialize_app_state(settings: &Settings) -> Result<AppState> {
    let db = connect(&settings.database_url).await?;
    Ok(AppState {
        db,
        due_policy: settings.scheduler.due_policy,
    })
}
