use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub store: StoreConfig,
    #[serde(default)]
    pub list: ListConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub database_path: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ListConfig {
    /// Token of the list to watch
    #[serde(default)]
    pub token: Option<String>,
    /// Start a new list when no token is configured
    #[serde(default)]
    pub create_if_missing: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RefreshConfig {
    #[serde(default = "default_refresh_hours")]
    pub interval_hours: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_hours: default_refresh_hours(),
        }
    }
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_hours.saturating_mul(60 * 60))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Ten years; anything longer is almost certainly a typo.
const MAX_REFRESH_HOURS: u64 = 10 * 365 * 24;

fn default_refresh_hours() -> u64 {
    24
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file and environment variables
    /// Environment variables override config file values
    pub fn load() -> Result<Self> {
        // Load .env file if it exists (doesn't error if missing)
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder()
            .set_default("store.database_path", "./shopping_list.db")?
            .set_default("list.create_if_missing", false)?
            .set_default("refresh.interval_hours", default_refresh_hours() as i64)?
            .set_default("logging.level", "info")?;

        if let Ok(config_path) = std::env::current_dir() {
            let config_file = config_path.join("config.toml");
            if config_file.exists() {
                builder = builder.add_source(config::File::from(config_file));
            }
        }

        if let Ok(db_path) = std::env::var("DATABASE_PATH") {
            builder = builder.set_override("store.database_path", db_path)?;
        }
        if let Ok(token) = std::env::var("LIST_TOKEN") {
            builder = builder.set_override("list.token", token)?;
        }
        if let Ok(create) = std::env::var("CREATE_LIST") {
            let create = matches!(create.trim(), "1" | "true" | "yes");
            builder = builder.set_override("list.create_if_missing", create)?;
        }
        if let Ok(hours) = std::env::var("REFRESH_INTERVAL_HOURS") {
            let hours: i64 = hours
                .trim()
                .parse()
                .context("REFRESH_INTERVAL_HOURS must be a whole number of hours")?;
            builder = builder.set_override("refresh.interval_hours", hours)?;
        }
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            builder = builder.set_override("logging.level", log_level)?;
        }

        let config = builder
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Validate that required fields are present
    pub fn validate(&self) -> Result<()> {
        if self.store.database_path.trim().is_empty() {
            anyhow::bail!("Database path is required");
        }
        if self.refresh.interval_hours == 0 {
            anyhow::bail!("Refresh interval must be at least one hour");
        }
        if self.refresh.interval_hours > MAX_REFRESH_HOURS {
            anyhow::bail!(
                "Refresh interval must be at most {} hours",
                MAX_REFRESH_HOURS
            );
        }
        let has_token = self
            .list
            .token
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty());
        if !has_token && !self.list.create_if_missing {
            anyhow::bail!("A list token is required unless list creation is enabled");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(token: Option<&str>, create: bool, hours: u64) -> Config {
        Config {
            store: StoreConfig {
                database_path: "./test.db".to_string(),
            },
            list: ListConfig {
                token: token.map(str::to_string),
                create_if_missing: create,
            },
            refresh: RefreshConfig {
                interval_hours: hours,
            },
            logging: LoggingConfig {
                level: default_log_level(),
            },
        }
    }

    #[test]
    fn test_default_refresh_interval() {
        assert_eq!(RefreshConfig::default().interval(), Duration::from_secs(86_400));
    }

    #[test]
    fn test_validate() {
        assert!(config(Some("maple fig radish"), false, 24).validate().is_ok());
        assert!(config(None, true, 24).validate().is_ok());
        assert!(config(None, false, 24).validate().is_err());
        assert!(config(Some("  "), false, 24).validate().is_err());
        assert!(config(Some("maple"), false, 0).validate().is_err());
    }

    #[test]
    fn test_huge_refresh_interval() {
        assert!(config(Some("maple"), false, MAX_REFRESH_HOURS).validate().is_ok());
        assert!(config(Some("maple"), false, MAX_REFRESH_HOURS + 1)
            .validate()
            .is_err());

        let interval = RefreshConfig {
            interval_hours: u64::MAX,
        }
        .interval();
        assert_eq!(interval, Duration::from_secs(u64::MAX));
    }
}
