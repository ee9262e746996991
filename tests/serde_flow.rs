//! End-to-end serializer/deserializer tests against the in-memory registry

use std::io::Cursor;
use std::sync::Arc;

use apache_avro::types::Value as AvroValue;
use registry_serde::serdes::{LinkedSchema, MessageFactory, ReferenceResolution, SchemaContext};
use registry_serde::{
    wire, Deserializer, MockSchemaRegistryClient, PayloadDecoder, PayloadEncoder, Result,
    SchemaInfo, SchemaReference, SchemaRegistryClient, SchemaType, SerdeConfig, SerdeError,
    Serializer,
};
use serde_json::{json, Value};

// =============================================================================
// Test codecs
// =============================================================================

/// JSON bodies; requires every reference of the schema to be resolved
struct JsonCodec {
    schema: SchemaInfo,
}

impl PayloadEncoder for JsonCodec {
    type Message = Value;

    fn schema_info(&self, _message: &Value) -> Result<SchemaInfo> {
        Ok(self.schema.clone())
    }

    fn reference_resolution(&self) -> ReferenceResolution {
        ReferenceResolution::Sources
    }

    fn encode(&self, message: &Value, context: &SchemaContext) -> Result<Vec<u8>> {
        check_sources(context)?;
        Ok(serde_json::to_vec(message)?)
    }
}

impl PayloadDecoder for JsonCodec {
    type Message = Value;

    fn reference_resolution(&self) -> ReferenceResolution {
        ReferenceResolution::Sources
    }

    fn decode_into(&self, payload: &[u8], context: &SchemaContext, target: &mut Value) -> Result<()> {
        check_sources(context)?;
        *target = serde_json::from_slice(payload)?;
        Ok(())
    }
}

fn check_sources(context: &SchemaContext) -> Result<()> {
    match &context.linked {
        LinkedSchema::Sources(sources) => {
            for reference in &context.info.references {
                if !sources.contains(&reference.name) {
                    return Err(SerdeError::Codec(format!("{} not resolved", reference.name)));
                }
            }
            Ok(())
        }
        _ => Err(SerdeError::Codec("expected resolved sources".to_string())),
    }
}

/// AVRO `string` bodies written with apache-avro
struct AvroStringCodec;

const AVRO_STRING: &str = r#"{"type":"string"}"#;

fn avro_root(context: &SchemaContext) -> Result<&apache_avro::Schema> {
    match &context.linked {
        LinkedSchema::Avro(set) => Ok(&set.root),
        _ => Err(SerdeError::Codec("expected linked AVRO schema".to_string())),
    }
}

impl PayloadEncoder for AvroStringCodec {
    type Message = str;

    fn schema_info(&self, _message: &str) -> Result<SchemaInfo> {
        Ok(SchemaInfo::new(AVRO_STRING, SchemaType::Avro))
    }

    fn reference_resolution(&self) -> ReferenceResolution {
        ReferenceResolution::Avro
    }

    fn encode(&self, message: &str, context: &SchemaContext) -> Result<Vec<u8>> {
        Ok(apache_avro::to_avro_datum(avro_root(context)?, AvroValue::String(message.to_string()))?)
    }
}

impl PayloadDecoder for AvroStringCodec {
    type Message = String;

    fn reference_resolution(&self) -> ReferenceResolution {
        ReferenceResolution::Avro
    }

    fn decode_into(&self, payload: &[u8], context: &SchemaContext, target: &mut String) -> Result<()> {
        let mut reader = Cursor::new(payload);
        match apache_avro::from_avro_datum(avro_root(context)?, &mut reader, None)? {
            AvroValue::String(s) => {
                *target = s;
                Ok(())
            }
            other => Err(SerdeError::Codec(format!("expected string, got {:?}", other))),
        }
    }
}

fn json_schema(title: &str) -> SchemaInfo {
    SchemaInfo::new(
        format!(r#"{{"title":"{}","type":"object"}}"#, title),
        SchemaType::Json,
    )
}

fn value_factory() -> MessageFactory<Value> {
    Arc::new(|_subject: &str, _name: &str| Ok(Value::Null))
}

// =============================================================================
// Round trips
// =============================================================================

#[test]
fn test_json_round_trip_with_references() {
    let client = Arc::new(MockSchemaRegistryClient::new());
    client.register("address-value", &json_schema("Address"), false).unwrap();
    client
        .register(
            "customer-value",
            &json_schema("Customer").with_references(vec![SchemaReference::new(
                "address.json",
                "address-value",
                1,
            )]),
            false,
        )
        .unwrap();

    let order_schema = json_schema("Order").with_references(vec![SchemaReference::new(
        "customer.json",
        "customer-value",
        1,
    )]);

    let serializer = Serializer::new(
        client.clone(),
        SerdeConfig::default(),
        false,
        JsonCodec { schema: order_schema.clone() },
    );
    let message = json!({"id": 17, "customer": {"name": "Ada", "address": {"city": "Oslo"}}});
    let bytes = serializer.serialize("orders", &message).unwrap();
    assert_eq!(bytes[0], wire::MAGIC_BYTE);

    let mut deserializer = Deserializer::new(
        client.clone(),
        SerdeConfig::default(),
        false,
        JsonCodec { schema: order_schema.clone() },
    );
    deserializer.set_message_factory(value_factory());

    assert_eq!(deserializer.get_schema("orders", &bytes).unwrap(), order_schema);
    assert_eq!(deserializer.deserialize("orders", &bytes).unwrap(), message);
}

#[test]
fn test_avro_round_trip() {
    let client = Arc::new(MockSchemaRegistryClient::new());
    let serializer = Serializer::new(client.clone(), SerdeConfig::default(), false, AvroStringCodec);
    let bytes = serializer.serialize("greetings", "hello").unwrap();

    // AVRO strings are a zig-zag length followed by UTF-8
    assert_eq!(&bytes[wire::HEADER_LEN..], &[10u8, b'h', b'e', b'l', b'l', b'o'][..]);

    let deserializer = Deserializer::new(client, SerdeConfig::default(), false, AvroStringCodec);
    let mut decoded = String::new();
    deserializer.deserialize_into("greetings", &bytes, &mut decoded).unwrap();
    assert_eq!(decoded, "hello");
}

#[test]
fn test_wire_bytes_for_registered_id() {
    let client = Arc::new(MockSchemaRegistryClient::new());
    let id = client
        .register("t-value", &SchemaInfo::new(AVRO_STRING, SchemaType::Avro), false)
        .unwrap();
    client.clear_requests();

    let serializer = Serializer::new(client.clone(), SerdeConfig::default(), false, AvroStringCodec);
    let bytes = serializer.serialize("t", "x").unwrap();

    assert_eq!(client.call_count("register"), 1);
    assert_eq!(wire::schema_id(&bytes).unwrap(), id);
    assert_eq!(bytes.len(), wire::HEADER_LEN + 2);
}

// =============================================================================
// ID policies end to end
// =============================================================================

#[test]
fn test_latest_version_policy_embeds_latest_id() {
    let client = Arc::new(MockSchemaRegistryClient::new());
    client.register("orders-value", &json_schema("V1"), false).unwrap();
    let latest = client.register("orders-value", &json_schema("V2"), false).unwrap();

    let config = SerdeConfig {
        auto_register_schemas: false,
        use_latest_version: true,
        ..SerdeConfig::default()
    };
    let serializer = Serializer::new(
        client.clone(),
        config,
        false,
        JsonCodec {
            schema: json_schema("V1"),
        },
    );
    let bytes = serializer.serialize("orders", &json!({})).unwrap();

    assert_eq!(wire::schema_id(&bytes).unwrap(), latest);
    assert_eq!(client.call_count("register"), 2);
}

#[test]
fn test_pinned_id_policy() {
    let client = Arc::new(MockSchemaRegistryClient::new());
    let pinned = client.register("orders-value", &json_schema("V1"), false).unwrap();
    client.register("orders-value", &json_schema("V2"), false).unwrap();

    let config = SerdeConfig {
        auto_register_schemas: false,
        use_schema_id: i64::from(pinned),
        use_latest_version: true,
        ..SerdeConfig::default()
    };
    let serializer = Serializer::new(
        client.clone(),
        config,
        false,
        JsonCodec {
            schema: json_schema("V2"),
        },
    );
    let bytes = serializer.serialize("orders", &json!({})).unwrap();
    assert_eq!(wire::schema_id(&bytes).unwrap(), pinned);
    assert_eq!(client.call_count("get_latest_schema_metadata"), 0);
}

#[test]
fn test_unresolvable_reference_fails_serialize() {
    let client = Arc::new(MockSchemaRegistryClient::new());
    let schema = json_schema("Order").with_references(vec![SchemaReference::new(
        "missing.json",
        "missing-value",
        1,
    )]);
    let serializer = Serializer::new(client, SerdeConfig::default(), false, JsonCodec { schema });

    let err = serializer.serialize("orders", &json!({})).unwrap_err();
    assert!(err.is_registry());
}

// =============================================================================
// Shared use
// =============================================================================

#[test]
fn test_serializer_shared_across_threads() {
    let client = Arc::new(MockSchemaRegistryClient::new());
    let serializer = Serializer::new(client.clone(), SerdeConfig::default(), false, AvroStringCodec);

    let ids: Vec<u32> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let serializer = &serializer;
                scope.spawn(move || {
                    let bytes = serializer.serialize("shared", &format!("msg-{}", i)).unwrap();
                    wire::schema_id(&bytes).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(ids.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(client.versions("shared-value"), vec![1]);
}

#[test]
fn test_client_trait_object_is_shareable() {
    let client: Arc<dyn SchemaRegistryClient> = Arc::new(MockSchemaRegistryClient::new());
    let id = client
        .register("x-value", &SchemaInfo::new(AVRO_STRING, SchemaType::Avro), false)
        .unwrap();
    let deserializer = Deserializer::new(client, SerdeConfig::default(), false, AvroStringCodec);
    let bytes = wire::write_bytes(id, &[0]).unwrap();
    let mut decoded = String::from("stale");
    deserializer.deserialize_into("x", &bytes, &mut decoded).unwrap();
    assert_eq!(decoded, "");
}
