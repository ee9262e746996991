//! Schema registry client interface
//!
//! The serdes never talk HTTP themselves. They depend on this trait; the
//! network client (with its caching and retries) lives outside this crate.
//! [`MockSchemaRegistryClient`] is an in-memory implementation for tests and
//! local tooling.

pub mod mock;

pub use mock::MockSchemaRegistryClient;

use thiserror::Error;

use crate::schema::{SchemaInfo, SchemaMetadata};

/// Errors reported by a registry client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Subject not found: {subject}")]
    SubjectNotFound { subject: String },

    #[error("Version not found: {subject} version {version}")]
    VersionNotFound { subject: String, version: i32 },

    #[error("Schema {id} not found under subject '{subject}'")]
    SchemaNotFound { subject: String, id: u32 },

    #[error("Schema not registered under subject '{subject}'")]
    SchemaNotRegistered { subject: String },

    #[error("Registry request failed: {0}")]
    Transport(String),
}

/// Registry operations the serdes consume.
///
/// Implementations are shared across producer and consumer threads, so they
/// must be safe for concurrent use.
pub trait SchemaRegistryClient: Send + Sync {
    /// Register `schema` under `subject` and return its ID
    fn register(&self, subject: &str, schema: &SchemaInfo, normalize: bool) -> Result<u32, RegistryError>;

    /// Fetch the schema with `id`, scoped to `subject`
    fn get_by_subject_and_id(&self, subject: &str, id: u32) -> Result<SchemaInfo, RegistryError>;

    /// Look up the ID of an already registered `schema` under `subject`
    fn get_id(&self, subject: &str, schema: &SchemaInfo, normalize: bool) -> Result<u32, RegistryError>;

    fn get_latest_schema_metadata(&self, subject: &str) -> Result<SchemaMetadata, RegistryError>;

    fn get_schema_metadata(&self, subject: &str, version: i32) -> Result<SchemaMetadata, RegistryError>;
}
