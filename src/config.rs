//! Serde configuration
//!
//! Two ways in:
//! - A Kafka-style [`ConfigMap`] of dotted keys (`auto.register.schemas`, ...)
//!   handed over by the producer/consumer setup code
//! - Layered loading from config files and environment variables (SERDE__*)
//!
//! ## Example config file (serde.toml):
//! ```toml
//! auto_register_schemas = false
//! use_schema_id = -1
//! use_latest_version = true
//! normalize_schemas = false
//! ```
//!
//! Either way the result is a [`SerdeConfig`] snapshot that a serde keeps for
//! its whole lifetime.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SerdeError};

/// Register the schema under the computed subject on every serialize
pub const AUTO_REGISTER_SCHEMAS: &str = "auto.register.schemas";
/// Pin serialization to this schema ID (negative means unset)
pub const USE_SCHEMA_ID: &str = "use.schema.id";
/// Serialize with the latest registered version of the subject
pub const USE_LATEST_VERSION: &str = "use.latest.version";
/// Normalize schemas before registering or looking them up
pub const NORMALIZE_SCHEMAS: &str = "normalize.schemas";

/// A single option value
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl ConfigValue {
    fn kind(&self) -> &'static str {
        match self {
            ConfigValue::Bool(_) => "bool",
            ConfigValue::Int(_) => "int",
            ConfigValue::Str(_) => "string",
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(b) => write!(f, "{}", b),
            ConfigValue::Int(i) => write!(f, "{}", i),
            ConfigValue::Str(s) => write!(f, "\"{}\"", s),
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Int(value)
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        ConfigValue::Int(i64::from(value))
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Str(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::Str(value)
    }
}

/// Dotted-key option map
#[derive(Debug, Clone, Default)]
pub struct ConfigMap {
    entries: HashMap<String, ConfigValue>,
}

impl ConfigMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option, replacing any previous value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> &mut Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.get(key)
    }

    /// Read a boolean option, `default` when absent.
    ///
    /// `"true"`/`"false"` strings are accepted; anything else is a config error.
    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool> {
        match self.entries.get(key) {
            None => Ok(default),
            Some(ConfigValue::Bool(b)) => Ok(*b),
            Some(ConfigValue::Str(s)) => match s.trim() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(wrong_type(key, "bool", &ConfigValue::Str(s.clone()))),
            },
            Some(other) => Err(wrong_type(key, "bool", other)),
        }
    }

    /// Read an integer option, `default` when absent. Numeric strings are accepted.
    pub fn get_int(&self, key: &str, default: i64) -> Result<i64> {
        match self.entries.get(key) {
            None => Ok(default),
            Some(ConfigValue::Int(i)) => Ok(*i),
            Some(value @ ConfigValue::Str(s)) => {
                s.trim().parse().map_err(|_| wrong_type(key, "int", value))
            }
            Some(other) => Err(wrong_type(key, "int", other)),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for ConfigMap
where
    K: Into<String>,
    V: Into<ConfigValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ConfigMap::new();
        for (key, value) in iter {
            map.set(key, value);
        }
        map
    }
}

fn wrong_type(key: &str, expected: &'static str, found: &ConfigValue) -> SerdeError {
    SerdeError::Config {
        key: key.to_string(),
        expected,
        found: format!("{} {}", found.kind(), found),
    }
}

/// Settings shared by serializers and deserializers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerdeConfig {
    /// Register the schema before serializing
    #[serde(default = "default_true")]
    pub auto_register_schemas: bool,

    /// Fixed schema ID, negative when unset
    #[serde(default = "default_schema_id")]
    pub use_schema_id: i64,

    /// Use the latest version registered under the subject
    #[serde(default)]
    pub use_latest_version: bool,

    /// Ask the registry to normalize schemas
    #[serde(default)]
    pub normalize_schemas: bool,
}

fn default_true() -> bool {
    true
}

fn default_schema_id() -> i64 {
    -1
}

impl Default for SerdeConfig {
    fn default() -> Self {
        Self {
            auto_register_schemas: true,
            use_schema_id: default_schema_id(),
            use_latest_version: false,
            normalize_schemas: false,
        }
    }
}

impl SerdeConfig {
    /// Build a snapshot from a dotted-key option map
    pub fn from_config_map(map: &ConfigMap) -> Result<Self> {
        let config = Self {
            auto_register_schemas: map.get_bool(AUTO_REGISTER_SCHEMAS, true)?,
            use_schema_id: map.get_int(USE_SCHEMA_ID, default_schema_id())?,
            use_latest_version: map.get_bool(USE_LATEST_VERSION, false)?,
            normalize_schemas: map.get_bool(NORMALIZE_SCHEMAS, false)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, with `config_path` as a required extra file
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_locations = ["serde.toml", ".serde.toml", "config/serde.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "registry-serde") {
            let xdg_config = config_dir.config_dir().join("serde.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("SERDE")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SerdeError::InvalidConfig(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// The pinned schema ID, if one is configured
    pub fn use_schema_id(&self) -> Option<u32> {
        u32::try_from(self.use_schema_id).ok()
    }

    fn validate(&self) -> Result<()> {
        if self.use_schema_id > i64::from(u32::MAX) {
            return Err(SerdeError::Config {
                key: USE_SCHEMA_ID.to_string(),
                expected: "schema id in 0..=4294967295 or negative",
                found: self.use_schema_id.to_string(),
            });
        }
        Ok(())
    }
}
