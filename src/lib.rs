//! Registry Serde
//!
//! Schema-registry framing for message bus payloads. Every payload carries
//! the ID of the registered schema it was written with, so producers and
//! consumers can evolve independently.
//!
//! ## Features
//!
//! - **Wire Envelope**: magic byte `0x00` + 4-byte big-endian schema ID + body
//! - **ID Policies**: auto-register, pinned ID, latest version, exact lookup
//! - **Subject Naming**: pluggable `(topic, is_key, schema) -> subject`
//! - **Reference Resolution**: recursive, dependencies first, cycle-checked
//!
//! ## Architecture
//!
//! ```text
//! serdes/
//! ├── Serializer    message ─▶ subject ─▶ IdPolicy ─▶ registry ─▶ wire bytes
//! └── Deserializer  wire bytes ─▶ schema id ─▶ registry ─▶ factory ─▶ message
//!
//! client::SchemaRegistryClient   registry round-trips (HTTP client lives elsewhere)
//! resolve/                       references ─▶ name->source map | linked AVRO
//! ```

pub mod checksum;
pub mod client;
pub mod config;
pub mod error;
pub mod naming;
pub mod resolve;
pub mod schema;
pub mod serdes;
pub mod wire;

pub use checksum::Checksum;
pub use client::{MockSchemaRegistryClient, RegistryError, SchemaRegistryClient};
pub use config::{ConfigMap, ConfigValue, SerdeConfig};
pub use error::{Result, SerdeError};
pub use naming::{topic_name_strategy, SubjectNameStrategy};
pub use resolve::{resolve_avro_references, resolve_references, ReferenceGraph, ResolvedReferences};
pub use schema::{SchemaInfo, SchemaMetadata, SchemaReference, SchemaType};
pub use serdes::{Deserializer, IdPolicy, PayloadDecoder, PayloadEncoder, Serde, Serializer};
pub use wire::{MAGIC_BYTE, HEADER_LEN};
