//! Error types for droid-schedule

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Invalid cron expression '{expr}' in schedule '{name}': {source}")]
    CronParse {
        name: String,
        expr: String,
        #[source]
        source: cron::error::Error,
    },

    #[error("Failed to load schedule config: {0}")]
    ConfigLoad(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Core error: {0}")]
    Core(#[from] droid_core::Error),
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
