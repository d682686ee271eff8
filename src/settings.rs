//! Handles settings for the application. Configuration is read from an
//! optional `settings.toml` and from `RUPEESPLIT__`-prefixed environment
//! variables (e.g. `RUPEESPLIT__SERVER__PORT=9000`).
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
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

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Server {
    pub bind: String,
    pub port: u16,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum Storage {
    #[default]
    Memory,
    Mongodb { uri: String, database: String },
}

#[derive(Clone, Debug, Deserialize)]
pub struct Gemini {
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Gemini {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_model() -> String {
    "gemini-3-flash-preview".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub server: Server,
    pub storage: Storage,
    pub gemini: Option<Gemini>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_file("settings")
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("RUPEESPLIT").separator("__"))
            .build()?
            .try_deserialize()
    }
}
