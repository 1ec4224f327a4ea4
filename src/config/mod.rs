//! Configuration loading and management
//!
//! Configuration comes from an optional YAML file, with environment
//! variables taking precedence:
//!
//! - `TAVOLA_BIND` — listen address
//! - `MONGODB_URI` — MongoDB connection string (in-memory storage when unset)
//! - `MONGODB_DATABASE` — database name
//! - `RECEIPT_MODE` — `console` or `disabled`

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

const DEFAULT_BIND: &str = "127.0.0.1:3000";
const DEFAULT_DATABASE: &str = "tavola";

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http: HttpConfig,
    /// MongoDB connection; `None` selects the in-memory backend.
    pub mongodb: Option<MongoConfig>,
    pub receipts: ReceiptConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

/// MongoDB connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    #[serde(default = "default_database")]
    pub database: String,
}

fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}

/// How receipt emails are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptMode {
    /// Render and log receipts (development mode).
    Console,
    /// Drop receipts entirely.
    Disabled,
}

/// Receipt dispatch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiptConfig {
    pub mode: ReceiptMode,
}

impl Default for ReceiptConfig {
    fn default() -> Self {
        Self {
            mode: ReceiptMode::Console,
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path))?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).context("Failed to parse config")?;
        Ok(config)
    }

    /// Load from an optional file path and apply environment overrides.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(bind) = std::env::var("TAVOLA_BIND") {
            self.http.bind = bind;
        }

        if let Ok(uri) = std::env::var("MONGODB_URI") {
            match &mut self.mongodb {
                Some(mongo) => mongo.uri = uri,
                None => {
                    self.mongodb = Some(MongoConfig {
                        uri,
                        database: default_database(),
                    });
                }
            }
        }
        if let Ok(database) = std::env::var("MONGODB_DATABASE")
            && let Some(mongo) = self.mongodb.as_mut()
        {
            mongo.database = database;
        }

        if let Ok(mode) = std::env::var("RECEIPT_MODE") {
            match mode.as_str() {
                "console" => self.receipts.mode = ReceiptMode::Console,
                "disabled" => self.receipts.mode = ReceiptMode::Disabled,
                other => warn!(mode = %other, "unknown RECEIPT_MODE, keeping configured value"),
            }
        }
    }
}
