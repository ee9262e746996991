//! Deserializer

use std::sync::Arc;

use tracing::debug;

use super::codec::{MessageFactory, PayloadDecoder, SchemaContext};
use super::Serde;
use crate::client::SchemaRegistryClient;
use crate::config::{ConfigMap, SerdeConfig};
use crate::error::{Result, SerdeError};
use crate::naming::SubjectNameStrategy;
use crate::schema::SchemaInfo;
use crate::wire::{self, WireEnvelope};

/// Recovers messages from registry-framed wire bytes
pub struct Deserializer<D: PayloadDecoder> {
    serde: Serde,
    decoder: D,
    message_factory: Option<MessageFactory<D::Message>>,
}

impl<D: PayloadDecoder> Deserializer<D> {
    pub fn new(
        client: Arc<dyn SchemaRegistryClient>,
        config: SerdeConfig,
        is_key: bool,
        decoder: D,
    ) -> Self {
        Self {
            serde: Serde::new(client, config, is_key),
            decoder,
            message_factory: None,
        }
    }

    pub fn configure(
        client: Arc<dyn SchemaRegistryClient>,
        options: &ConfigMap,
        is_key: bool,
        decoder: D,
    ) -> Result<Self> {
        Ok(Self {
            serde: Serde::configure(client, options, is_key)?,
            decoder,
            message_factory: None,
        })
    }

    pub fn serde(&self) -> &Serde {
        &self.serde
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    pub fn set_subject_name_strategy(&mut self, strategy: SubjectNameStrategy) {
        self.serde.set_subject_name_strategy(strategy);
    }

    pub fn message_factory(&self) -> Option<&MessageFactory<D::Message>> {
        self.message_factory.as_ref()
    }

    pub fn set_message_factory(&mut self, factory: MessageFactory<D::Message>) {
        self.message_factory = Some(factory);
    }

    /// Schema the payload was written with.
    ///
    /// The naming strategy sees an empty schema here because the real one is
    /// what is being looked up.
    pub fn get_schema(&self, topic: &str, payload: &[u8]) -> Result<SchemaInfo> {
        let envelope = wire::parse(payload)?;
        let (_, info) = self.fetch_schema(topic, &envelope)?;
        Ok(info)
    }

    /// Decode into a new instance from the message factory
    pub fn deserialize(&self, topic: &str, payload: &[u8]) -> Result<D::Message> {
        let factory = self
            .message_factory
            .as_ref()
            .ok_or_else(|| SerdeError::MessageFactory("no message factory set".to_string()))?;

        let envelope = wire::parse(payload)?;
        let context = self.context(topic, &envelope)?;
        let mut message = factory(&context.subject, &context.info.type_name())?;
        self.decoder.decode_into(envelope.payload, &context, &mut message)?;
        Ok(message)
    }

    /// Decode into a caller-supplied instance
    pub fn deserialize_into(&self, topic: &str, payload: &[u8], target: &mut D::Message) -> Result<()> {
        let envelope = wire::parse(payload)?;
        let context = self.context(topic, &envelope)?;
        self.decoder.decode_into(envelope.payload, &context, target)
    }

    pub fn close(&self) {
        self.serde.close();
    }

    fn fetch_schema(&self, topic: &str, envelope: &WireEnvelope<'_>) -> Result<(String, SchemaInfo)> {
        let subject = self.serde.subject(topic, &SchemaInfo::default());
        debug!(%topic, %subject, schema_id = envelope.schema_id, "fetching writer schema");
        let info = self
            .serde
            .client()
            .get_by_subject_and_id(&subject, envelope.schema_id)?;
        Ok((subject, info))
    }

    fn context(&self, topic: &str, envelope: &WireEnvelope<'_>) -> Result<SchemaContext> {
        let (subject, info) = self.fetch_schema(topic, envelope)?;
        let linked = self.serde.link(&info, self.decoder.reference_resolution())?;
        Ok(SchemaContext {
            subject,
            schema_id: envelope.schema_id,
            info,
            linked,
        })
    }
}
