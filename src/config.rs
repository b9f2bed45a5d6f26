use std::fmt::Display;

use config::{Config as ConfigBuilder, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;

use crate::ApiError;
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub secrets: Secrets,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub log_level: LogLevel,
    pub log_directory: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// sqlite connection string, e.g. `sqlite://perms.db?mode=rwc` or `sqlite::memory:`
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Secrets {
    pub hmac: SecretString,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Trace => "trace",
                Self::Debug => "debug",
                Self::Info => "info",
                Self::Warn => "warn",
                Self::Error => "error",
            }
        )
    }
}

impl AppConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Development : "object_permissions=debug,warn"
    ///
    /// Production  : "object_permissions=info,warn"
    pub fn env_filter(&self) -> String {
        format!("{}={},warn", self.name, self.log_level)
    }
}

impl AppSettings {
    /// `config/settings.toml` first, then `APP__SECTION__KEY` environment overrides.
    pub fn load() -> Result<AppSettings, ApiError> {
        let config = ConfigBuilder::builder()
            .add_source(File::with_name("config/settings").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        let settings: AppSettings = config.try_deserialize()?;
        Ok(settings)
    }
}
