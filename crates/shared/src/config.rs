//! Application configuration management.

use chrono_tz::Tz;
use serde::Deserialize;

use crate::error::AppError;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Budget tracker configuration.
    #[serde(default)]
    pub tracker: TrackerConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Budget tracker configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    /// IANA time zone used for period boundaries (e.g. "Europe/Berlin").
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    /// Re-resolve budget periods at every local midnight.
    #[serde(default = "default_midnight_refresh")]
    pub midnight_refresh: bool,
}

fn default_time_zone() -> String {
    "UTC".to_string()
}

fn default_midnight_refresh() -> bool {
    true
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            time_zone: default_time_zone(),
            midnight_refresh: default_midnight_refresh(),
        }
    }
}

impl TrackerConfig {
    /// Parses the configured time zone.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Configuration` if the name is not a known IANA zone.
    pub fn tz(&self) -> Result<Tz, AppError> {
        self.time_zone
            .parse::<Tz>()
            .map_err(|e| AppError::Configuration(format!("tracker.time_zone: {e}")))
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_log_filter() -> String {
    "walletwise=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("WALLETWISE")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.tracker.time_zone, "UTC");
        assert!(config.tracker.midnight_refresh);
        assert_eq!(config.logging.filter, "walletwise=info");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_tz_parses_iana_name() {
        let tracker = TrackerConfig {
            time_zone: "Asia/Jakarta".to_string(),
            midnight_refresh: false,
        };
        assert_eq!(tracker.tz().unwrap(), chrono_tz::Asia::Jakarta);
    }

    #[test]
    fn test_tz_rejects_unknown_zone() {
        let tracker = TrackerConfig {
            time_zone: "Mars/Olympus".to_string(),
            midnight_refresh: true,
        };
        assert!(matches!(tracker.tz(), Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_load_reads_environment() {
        temp_env::with_vars(
            [
                ("WALLETWISE__TRACKER__TIME_ZONE", Some("Europe/Berlin")),
                ("WALLETWISE__LOGGING__FILTER", Some("debug")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.tracker.time_zone, "Europe/Berlin");
                assert_eq!(config.logging.filter, "debug");
                assert!(config.tracker.midnight_refresh);
            },
        );
    }
}
