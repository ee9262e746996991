//! Serializer

use std::sync::Arc;

use tracing::debug;

use super::codec::{PayloadEncoder, SchemaContext};
use super::policy::IdPolicy;
use super::Serde;
use crate::client::SchemaRegistryClient;
use crate::config::{ConfigMap, SerdeConfig};
use crate::error::Result;
use crate::naming::SubjectNameStrategy;
use crate::schema::SchemaInfo;
use crate::wire;

/// Turns messages into registry-framed wire bytes
pub struct Serializer<E> {
    serde: Serde,
    encoder: E,
}

impl<E: PayloadEncoder> Serializer<E> {
    pub fn new(
        client: Arc<dyn SchemaRegistryClient>,
        config: SerdeConfig,
        is_key: bool,
        encoder: E,
    ) -> Self {
        Self {
            serde: Serde::new(client, config, is_key),
            encoder,
        }
    }

    /// Build from dotted-key options; a mistyped option fails here
    pub fn configure(
        client: Arc<dyn SchemaRegistryClient>,
        options: &ConfigMap,
        is_key: bool,
        encoder: E,
    ) -> Result<Self> {
        Ok(Self {
            serde: Serde::configure(client, options, is_key)?,
            encoder,
        })
    }

    pub fn serde(&self) -> &Serde {
        &self.serde
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    pub fn set_subject_name_strategy(&mut self, strategy: SubjectNameStrategy) {
        self.serde.set_subject_name_strategy(strategy);
    }

    /// The policy this serializer's configuration selects
    pub fn id_policy(&self) -> IdPolicy {
        IdPolicy::select(self.serde.config())
    }

    /// Schema ID to embed for `schema` on `topic`
    pub fn get_id(&self, topic: &str, schema: &SchemaInfo) -> Result<u32> {
        let subject = self.serde.subject(topic, schema);
        self.id_policy().resolve(
            self.serde.client(),
            &subject,
            schema,
            self.serde.config().normalize_schemas,
        )
    }

    /// Serialize `message` for `topic`. Nothing is returned unless every step succeeds.
    pub fn serialize(&self, topic: &str, message: &E::Message) -> Result<Vec<u8>> {
        let info = self.encoder.schema_info(message)?;
        let subject = self.serde.subject(topic, &info);
        let policy = self.id_policy();
        let schema_id = policy.resolve(
            self.serde.client(),
            &subject,
            &info,
            self.serde.config().normalize_schemas,
        )?;
        let linked = self.serde.link(&info, self.encoder.reference_resolution())?;

        let context = SchemaContext {
            subject,
            schema_id,
            info,
            linked,
        };
        let body = self.encoder.encode(message, &context)?;
        debug!(%topic, subject = %context.subject, schema_id, bytes = body.len(), "serialized message");
        wire::write_bytes(schema_id, &body)
    }

    pub fn close(&self) {
        self.serde.close();
    }
}
