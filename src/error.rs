//! Error types for the registry serdes

use thiserror::Error;

use crate::client::RegistryError;

/// Result type for serde operations
pub type Result<T> = std::result::Result<T, SerdeError>;

/// Serde errors
#[derive(Error, Debug)]
pub enum SerdeError {
    #[error("Invalid configuration value for '{key}': expected {expected}, got {found}")]
    Config {
        key: String,
        expected: &'static str,
        found: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown magic byte: 0x{0:02x}")]
    UnknownMagicByte(u8),

    #[error("Truncated wire envelope: {len} bytes, need at least 5")]
    Truncated { len: usize },

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Cyclic schema reference: {subject} version {version}")]
    CyclicReference { subject: String, version: i32 },

    #[error("Unresolved schema reference: {name}")]
    UnresolvedReference { name: String },

    #[error("AVRO error: {0}")]
    Avro(#[from] apache_avro::Error),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Message factory error: {0}")]
    MessageFactory(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SerdeError {
    /// Missing or malformed envelope
    pub fn is_wire_format(&self) -> bool {
        matches!(self, Self::UnknownMagicByte(_) | Self::Truncated { .. })
    }

    pub fn is_registry(&self) -> bool {
        matches!(self, Self::Registry(_))
    }

    /// Reference graph could not be turned into a usable schema
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            Self::CyclicReference { .. } | Self::UnresolvedReference { .. } | Self::Avro(_)
        )
    }
}

impl From<config_crate::ConfigError> for SerdeError {
    fn from(err: config_crate::ConfigError) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}
