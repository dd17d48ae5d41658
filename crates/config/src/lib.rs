pub mod settings;

pub use settings::{AppSettings, DatabaseSettings, SchedulerSettings, Settings};
