// Configuration management with layered configuration (defaults, file, env)

use crate::errors::RotationError;
use crate::models::ShiftSymbol;
use crate::rotation::{Cycle, Rotation, REFERENCE_CYCLE, REFERENCE_GROUPS};
use chrono::NaiveDate;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const DEFAULT_DATABASE_URL: &str = "sqlite://database/planning.db";
const CLOUD_DATABASE_URL: &str = "sqlite:///tmp/planning.db";

/// Main settings structure containing all configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub environment: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub rotation: RotationConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_seconds: u64,
    #[serde(default)]
    pub seed_sample_agents: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationConfig {
    /// Day index 0 of the rotation cycle
    pub anchor: NaiveDate,
    pub cycle: Vec<String>,
    /// Recognized groups; a configured table replaces the reference groups
    #[serde(default)]
    pub groups: BTreeMap<String, u32>,
    /// Offset used for unknown groups; unknown groups are rejected when unset
    #[serde(default)]
    pub fallback_offset: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Settings {
    /// Load configuration with layered precedence: defaults → file → env
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        // Maps merge key by key, so the group table stays out of the base layer
        let mut defaults = Settings::default();
        defaults.rotation.groups.clear();

        let builder = Config::builder()
            // Start with built-in defaults so every file is optional
            .add_source(Config::try_from(&defaults)?)
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add local configuration (not committed to git)
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut settings: Settings = builder.build()?.try_deserialize()?;
        if settings.rotation.groups.is_empty() {
            settings.rotation.groups = reference_groups();
        }
        settings.apply_platform_overrides();
        Ok(settings)
    }

    /// Honour the plain `PORT`/`HOST` variables set by hosting platforms
    fn apply_platform_overrides(&mut self) {
        let on_railway = std::env::var("RAILWAY_ENVIRONMENT").is_ok();
        let on_cloud = on_railway || std::env::var("PORT").is_ok();

        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Ok(host) = std::env::var("HOST") {
            self.server.host = host;
        }
        if on_railway {
            self.environment = "railway".to_string();
        }
        // Only the ephemeral filesystem is writable on the hosted platform
        if on_cloud && self.database.url == DEFAULT_DATABASE_URL {
            self.database.url = CLOUD_DATABASE_URL.to_string();
        }
    }

    /// Build the rotation rule described by the `rotation` section
    pub fn rotation(&self) -> Result<Rotation, RotationError> {
        let symbols = self
            .rotation
            .cycle
            .iter()
            .map(|code| {
                code.parse::<ShiftSymbol>()
                    .map_err(|e| RotationError::InvalidConfiguration(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Rotation::new(
            Cycle::new(symbols)?,
            self.rotation.groups.iter().map(|(code, offset)| (code, *offset)),
            self.rotation.fallback_offset,
        )
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port must be greater than 0".to_string());
        }
        if self.server.request_timeout_seconds == 0 {
            return Err("Server request_timeout_seconds must be greater than 0".to_string());
        }

        if self.database.url.is_empty() {
            return Err("Database URL cannot be empty".to_string());
        }
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }

        self.rotation()
            .map_err(|e| format!("Rotation configuration is invalid: {}", e))?;

        Ok(())
    }
}

fn reference_groups() -> BTreeMap<String, u32> {
    REFERENCE_GROUPS
        .iter()
        .map(|(code, offset)| (code.to_string(), *offset))
        .collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: "local".to_string(),
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                request_timeout_seconds: 30,
            },
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: 5,
                connect_timeout_seconds: 30,
                seed_sample_agents: true,
            },
            rotation: RotationConfig {
                anchor: NaiveDate::from_ymd_opt(2025, 11, 1).unwrap_or_default(),
                cycle: REFERENCE_CYCLE.iter().map(|s| s.code().to_string()).collect(),
                groups: reference_groups(),
                fallback_offset: None,
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                log_format: LogFormat::Json,
            },
        }
    }
}
