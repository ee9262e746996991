//! Schema-registry serdes
//!
//! A [`Serializer`] turns a message into wire bytes:
//!
//! ```text
//! message ─▶ encoder.schema_info ─▶ subject ─▶ ID policy ─▶ registry ─▶ id
//!         ─▶ encoder.encode ─▶ wire::write_bytes(id, body)
//! ```
//!
//! A [`Deserializer`] goes the other way: envelope ─▶ schema ID ─▶ registry
//! ─▶ (reference resolution) ─▶ message factory ─▶ decoder.
//!
//! Both share a [`Serde`] base holding the registry client, an immutable
//! [`SerdeConfig`] snapshot and the subject naming strategy. Payload body
//! formats are supplied by the caller through [`PayloadEncoder`] and
//! [`PayloadDecoder`].

pub mod codec;
pub mod deserializer;
pub mod policy;
pub mod serializer;

pub use codec::{
    LinkedSchema, MessageFactory, PayloadDecoder, PayloadEncoder, ReferenceResolution,
    SchemaContext,
};
pub use deserializer::Deserializer;
pub use policy::IdPolicy;
pub use serializer::Serializer;

use std::fmt;
use std::sync::Arc;

use crate::client::SchemaRegistryClient;
use crate::config::{ConfigMap, SerdeConfig};
use crate::error::Result;
use crate::naming::{self, SubjectNameStrategy};
use crate::resolve::{resolve_avro_references, resolve_references};
use crate::schema::SchemaInfo;

/// State shared by serializers and deserializers
#[derive(Clone)]
pub struct Serde {
    client: Arc<dyn SchemaRegistryClient>,
    config: SerdeConfig,
    is_key: bool,
    subject_name_strategy: SubjectNameStrategy,
}

impl Serde {
    /// Create a serde for message keys (`is_key`) or values
    pub fn new(client: Arc<dyn SchemaRegistryClient>, config: SerdeConfig, is_key: bool) -> Self {
        Self {
            client,
            config,
            is_key,
            subject_name_strategy: naming::default_strategy(),
        }
    }

    /// Create a serde from dotted-key options
    pub fn configure(
        client: Arc<dyn SchemaRegistryClient>,
        options: &ConfigMap,
        is_key: bool,
    ) -> Result<Self> {
        let config = SerdeConfig::from_config_map(options)?;
        Ok(Self::new(client, config, is_key))
    }

    pub fn client(&self) -> &dyn SchemaRegistryClient {
        self.client.as_ref()
    }

    pub fn config(&self) -> &SerdeConfig {
        &self.config
    }

    pub fn is_key(&self) -> bool {
        self.is_key
    }

    pub fn subject_name_strategy(&self) -> &SubjectNameStrategy {
        &self.subject_name_strategy
    }

    pub fn set_subject_name_strategy(&mut self, strategy: SubjectNameStrategy) {
        self.subject_name_strategy = strategy;
    }

    /// Subject for `topic` under the configured strategy
    pub fn subject(&self, topic: &str, schema: &SchemaInfo) -> String {
        (self.subject_name_strategy)(topic, self.is_key, schema)
    }

    /// Resolve the references of `schema` the way a codec asked for
    pub fn link(&self, schema: &SchemaInfo, mode: ReferenceResolution) -> Result<LinkedSchema> {
        match mode {
            ReferenceResolution::Skip => Ok(LinkedSchema::Unresolved),
            ReferenceResolution::Sources => {
                resolve_references(self.client(), schema).map(LinkedSchema::Sources)
            }
            ReferenceResolution::Avro => {
                resolve_avro_references(self.client(), schema).map(|set| LinkedSchema::Avro(Box::new(set)))
            }
        }
    }

    /// Release the serde. The registry client is shared and stays open.
    pub fn close(&self) {}
}

impl fmt::Debug for Serde {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Serde")
            .field("config", &self.config)
            .field("is_key", &self.is_key)
            .finish_non_exhaustive()
    }
}
