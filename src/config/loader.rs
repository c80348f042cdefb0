use std::{env, path::PathBuf, time::Duration};

use super::env::{AppConfig, ConfigError, DirectoryConfig, LoggingConfig, PageConfig};

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_env()
}

impl AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let directories = DirectoryConfig {
            logs_dir: env::var("LOGS_DIR").unwrap_or_else(|_| "logs".to_string()),
            store_path: env::var("BOTFILTER_STORE")
                .unwrap_or_else(|_| "data/storage.json".to_string()),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        };

        let defaults = PageConfig::default();
        let page = PageConfig {
            snapshot: env::var("PAGE_SNAPSHOT")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            scroll_debounce: parse_millis("SCROLL_DEBOUNCE_MS")?
                .unwrap_or(defaults.scroll_debounce),
            store_poll_interval: parse_millis("STORE_POLL_MS")?
                .unwrap_or(defaults.store_poll_interval),
        };

        Ok(Self {
            directories,
            logging,
            page,
        })
    }
}

fn parse_millis(key: &'static str) -> Result<Option<Duration>, ConfigError> {
    let Ok(value) = env::var(key) else {
        return Ok(None);
    };
    match value.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Some(Duration::from_millis(ms))),
        _ => Err(ConfigError::InvalidNumber { key, value }),
    }
}
