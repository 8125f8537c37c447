//! Handles settings for the application. Configuration is read from
//! `settings.toml` in the working directory, then from `HABITS__*`
//! environment variables (e.g. `HABITS__TELEGRAM__TOKEN`).
//!
//! See `settings.example.toml` for the available keys.

use std::time::Duration;

use chrono_tz::Tz;
use config::{Config, ConfigError, Environment, File};
use engine::RetryPolicy;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub port: u16,
    pub bind: Option<String>,
    pub database: Database,
}

#[derive(Debug, Deserialize)]
pub struct Telegram {
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Scheduler {
    pub timezone: String,
    pub max_attempts: u32,
    pub backoff_secs: u64,
}

impl Default for Scheduler {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            timezone: "UTC".to_string(),
            max_attempts: policy.max_attempts,
            backoff_secs: policy.backoff.as_secs(),
        }
    }
}

impl Scheduler {
    pub fn timezone(&self) -> Result<Tz, String> {
        self.timezone
            .parse()
            .map_err(|err| format!("invalid scheduler timezone {:?}: {err}", self.timezone))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff: Duration::from_secs(self.backoff_secs),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Option<Server>,
    pub telegram: Option<Telegram>,
    #[serde(default)]
    pub scheduler: Scheduler,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("HABITS").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn parse(toml: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn defaults() {
        let settings = parse("");
        assert_eq!(settings.app.level, "info");
        assert!(settings.server.is_none());
        assert!(settings.telegram.is_none());
        assert_eq!(settings.scheduler.timezone().unwrap(), Tz::UTC);
        assert_eq!(settings.scheduler.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn full_file() {
        let settings = parse(
            r#"
            [app]
            level = "debug"

            [server]
            port = 8000
            database = { sqlite = "habits.db" }

            [telegram]
            token = "123:abc"

            [scheduler]
            timezone = "Europe/Rome"
            max_attempts = 5
            "#,
        );
        let server = settings.server.unwrap();
        assert_eq!(server.port, 8000);
        assert!(matches!(server.database, Database::Sqlite(ref path) if path == "habits.db"));
        assert_eq!(settings.telegram.unwrap().token, "123:abc");
        assert_eq!(settings.scheduler.timezone().unwrap(), Tz::Europe__Rome);
        assert_eq!(settings.scheduler.retry_policy().max_attempts, 5);
        assert_eq!(settings.scheduler.backoff_secs, 5);
    }

    #[test]
    fn memory_database() {
        let settings = parse(
            r#"
            [server]
            port = 8000
            database = "memory"
            "#,
        );
        assert!(matches!(settings.server.unwrap().database, Database::Memory));
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let scheduler = Scheduler {
            timezone: "Mars/Olympus".to_string(),
            ..Scheduler::default()
        };
        assert!(scheduler.timezone().is_err());
    }
}
