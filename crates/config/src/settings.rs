use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub scheduler: SchedulerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub name: String,
    pub max_pool_size: Option<u32>,
    pub min_pool_size: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerSettings {
    /// When false the in-process cron jobs are not started; the
    /// /api/lifecycle trigger endpoints keep working either way.
    pub enabled: bool,
    /// Six-field cron expression for the coarse daily tick (UTC).
    pub daily_cron: String,
    /// Six-field cron expression for the fine hourly tick (UTC).
    pub hourly_cron: String,
    /// Days past due_date before a Pending invoice is treated as overdue.
    pub invoice_grace_days: i64,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    .prefix("CREWHUB"),
            )
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 3000)?
            .set_default("app.cors_origins", Vec::<String>::new())?
            .set_default("database.url", "mongodb://localhost:27017")?
            .set_default("database.name", "crewhub")?
            .set_default("scheduler.enabled", true)?
            .set_default("scheduler.daily_cron", "0 0 9 * * *")?
            .set_default("scheduler.hourly_cron", "0 0 * * * *")?
            .set_default("scheduler.invoice_grace_days", 10)?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::load().expect("Failed to load default settings")
    }
}
