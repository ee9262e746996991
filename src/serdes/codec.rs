//! Payload codec seams
//!
//! The serdes own the envelope and the registry round-trips; the payload body
//! (AVRO binary, JSON, Protobuf) belongs to the codec plugged in here.

use std::sync::Arc;

use crate::error::Result;
use crate::resolve::{AvroSchemaSet, ResolvedReferences};
use crate::schema::SchemaInfo;

/// How much reference resolution a codec needs before it can use a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferenceResolution {
    /// Use the schema text as is
    #[default]
    Skip,
    /// Dependency sources by reference name
    Sources,
    /// Linked AVRO named types
    Avro,
}

/// A schema's references after resolution
#[derive(Debug, Clone)]
pub enum LinkedSchema {
    Unresolved,
    Sources(ResolvedReferences),
    Avro(Box<AvroSchemaSet>),
}

/// Everything a codec gets to see about the schema in use
#[derive(Debug, Clone)]
pub struct SchemaContext {
    pub subject: String,
    pub schema_id: u32,
    pub info: SchemaInfo,
    pub linked: LinkedSchema,
}

/// Encodes message bodies
pub trait PayloadEncoder: Send + Sync {
    type Message: ?Sized;

    /// Schema describing `message`
    fn schema_info(&self, message: &Self::Message) -> Result<SchemaInfo>;

    fn reference_resolution(&self) -> ReferenceResolution {
        ReferenceResolution::Skip
    }

    /// Encode the body only; the serializer adds the envelope
    fn encode(&self, message: &Self::Message, context: &SchemaContext) -> Result<Vec<u8>>;
}

/// Decodes message bodies
pub trait PayloadDecoder: Send + Sync {
    type Message;

    fn reference_resolution(&self) -> ReferenceResolution {
        ReferenceResolution::Skip
    }

    /// Populate `target` from the body bytes following the envelope
    fn decode_into(
        &self,
        payload: &[u8],
        context: &SchemaContext,
        target: &mut Self::Message,
    ) -> Result<()>;
}

/// Creates the instance a payload is decoded into, from `(subject, type name)`.
///
/// The type name is the AVRO full name, the Protobuf message name, or empty
/// for JSON Schema.
pub type MessageFactory<M> = Arc<dyn Fn(&str, &str) -> Result<M> + Send + Sync>;
