use std::{path::PathBuf, time::Duration};

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub directories: DirectoryConfig,
    pub logging: LoggingConfig,
    pub page: PageConfig,
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub logs_dir: String,
    pub store_path: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone)]
pub struct PageConfig {
    pub snapshot: Option<PathBuf>,
    pub scroll_debounce: Duration,
    pub store_poll_interval: Duration,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            snapshot: None,
            scroll_debounce: Duration::from_millis(100),
            store_poll_interval: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {key} must be a positive integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
}
