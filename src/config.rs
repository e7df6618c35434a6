/// Configuration management for the KlikJasa verification console
use crate::error::{KlikError, KlikResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Longest "last week" window accepted from configuration
pub const MAX_STATS_WINDOW_DAYS: i64 = 3650;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub console: ConsoleConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    pub version: String,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub database: PathBuf,
}

/// Verification console behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Length of the "last week" stats window, in days
    pub stats_window_days: i64,
    /// Number of months shown in the submissions chart
    pub chart_months: u32,
    /// Refresh silently when the change feed fires
    pub live_updates: bool,
    /// Quiet period used to collapse change-feed bursts
    pub live_debounce_ms: u64,
    /// Passive refresh interval; 0 disables the job
    pub background_refresh_secs: u64,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            stats_window_days: 7,
            chart_months: 6,
            live_updates: true,
            live_debounce_ms: 250,
            background_refresh_secs: 300,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> KlikResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("KLIKJASA_HOSTNAME").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("KLIKJASA_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| KlikError::Validation("Invalid port number".to_string()))?;
        let version = env::var("KLIKJASA_VERSION")
            .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string());

        let data_directory: PathBuf = env::var("KLIKJASA_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let database = env::var("KLIKJASA_DATABASE_LOCATION")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("klikjasa.sqlite"));

        let defaults = ConsoleConfig::default();
        let stats_window_days = env::var("KLIKJASA_STATS_WINDOW_DAYS")
            .unwrap_or_else(|_| defaults.stats_window_days.to_string())
            .parse()
            .map_err(|_| KlikError::Validation("Invalid stats window".to_string()))?;
        let chart_months = env::var("KLIKJASA_CHART_MONTHS")
            .unwrap_or_else(|_| defaults.chart_months.to_string())
            .parse()
            .unwrap_or(defaults.chart_months);
        let live_updates = env::var("KLIKJASA_LIVE_UPDATES_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);
        let live_debounce_ms = env::var("KLIKJASA_LIVE_DEBOUNCE_MS")
            .unwrap_or_else(|_| defaults.live_debounce_ms.to_string())
            .parse()
            .unwrap_or(defaults.live_debounce_ms);
        let background_refresh_secs = env::var("KLIKJASA_BACKGROUND_REFRESH_SECS")
            .unwrap_or_else(|_| defaults.background_refresh_secs.to_string())
            .parse()
            .unwrap_or(defaults.background_refresh_secs);

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                version,
            },
            storage: StorageConfig {
                data_directory,
                database,
            },
            console: ConsoleConfig {
                stats_window_days,
                chart_months,
                live_updates,
                live_debounce_ms,
                background_refresh_secs,
            },
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> KlikResult<()> {
        if self.service.hostname.is_empty() {
            return Err(KlikError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.console.stats_window_days <= 0
            || self.console.stats_window_days > MAX_STATS_WINDOW_DAYS
        {
            return Err(KlikError::Validation(format!(
                "Stats window must be between 1 and {} days",
                MAX_STATS_WINDOW_DAYS
            )));
        }

        if self.console.chart_months == 0 || self.console.chart_months > 24 {
            return Err(KlikError::Validation(
                "Chart months must be between 1 and 24".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ServerConfig {
        ServerConfig {
            service: ServiceConfig {
                hostname: "localhost".to_string(),
                port: 8080,
                version: "0.1.0".to_string(),
            },
            storage: StorageConfig {
                data_directory: "./data".into(),
                database: "./data/klikjasa.sqlite".into(),
            },
            console: ConsoleConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_hostname() {
        let mut config = sample();
        config.service.hostname.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_console_values() {
        let mut config = sample();
        config.console.stats_window_days = 0;
        assert!(config.validate().is_err());

        let mut config = sample();
        config.console.stats_window_days = MAX_STATS_WINDOW_DAYS;
        assert!(config.validate().is_ok());
        config.console.stats_window_days = 100_000_000;
        assert!(config.validate().is_err());

        let mut config = sample();
        config.console.chart_months = 0;
        assert!(config.validate().is_err());
    }
}
