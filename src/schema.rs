//! Schema types and structures

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::checksum::Checksum;

/// Format of a registered schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchemaType {
    /// AVRO schemas (the registry default when no type is given)
    #[default]
    Avro,
    /// JSON Schema definitions
    Json,
    /// Protobuf `.proto` sources
    Protobuf,
}

impl SchemaType {
    /// Name used by the registry REST API
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::Avro => "AVRO",
            SchemaType::Json => "JSON",
            SchemaType::Protobuf => "PROTOBUF",
        }
    }

    /// Whether schema text of this type is a JSON document
    pub fn is_json_text(&self) -> bool {
        matches!(self, SchemaType::Avro | SchemaType::Json)
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named dependency on `subject` at `version`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaReference {
    /// Name the referencing schema uses for the dependency
    pub name: String,
    pub subject: String,
    pub version: i32,
}

impl SchemaReference {
    pub fn new(name: impl Into<String>, subject: impl Into<String>, version: i32) -> Self {
        Self {
            name: name.into(),
            subject: subject.into(),
            version,
        }
    }
}

impl fmt::Display for SchemaReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}@{})", self.name, self.subject, self.version)
    }
}

/// Schema text with its format and references
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaInfo {
    pub schema: String,
    #[serde(default)]
    pub schema_type: SchemaType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<SchemaReference>,
}

impl SchemaInfo {
    /// Create a schema without references
    pub fn new(schema: impl Into<String>, schema_type: SchemaType) -> Self {
        Self {
            schema: schema.into(),
            schema_type,
            references: Vec::new(),
        }
    }

    pub fn with_references(mut self, references: Vec<SchemaReference>) -> Self {
        self.references = references;
        self
    }

    /// Fingerprint of the exact schema text
    pub fn checksum(&self) -> Checksum {
        Checksum::of_text(&self.schema)
    }

    /// Fingerprint that ignores JSON formatting and key order.
    ///
    /// Falls back to the exact text for non-JSON formats or unparseable text.
    pub fn normalized_checksum(&self) -> Checksum {
        if self.schema_type.is_json_text() {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(&self.schema) {
                return Checksum::of_json(&value);
            }
        }
        self.checksum()
    }

    /// Fully-qualified record name declared by the schema, if any.
    ///
    /// AVRO: `namespace.name` of a named type. JSON Schema: `title`.
    /// Protobuf: first top-level `message`, prefixed by the `package`.
    pub fn record_name(&self) -> Option<String> {
        match self.schema_type {
            SchemaType::Avro => avro_full_name(&self.schema),
            SchemaType::Json => serde_json::from_str::<serde_json::Value>(&self.schema)
                .ok()?
                .get("title")?
                .as_str()
                .map(String::from),
            SchemaType::Protobuf => protobuf_message_name(&self.schema),
        }
    }

    /// Type name passed to a message factory (empty for JSON Schema)
    pub fn type_name(&self) -> String {
        match self.schema_type {
            SchemaType::Json => String::new(),
            _ => self.record_name().unwrap_or_default(),
        }
    }
}

/// Registry-assigned identity of a schema under a subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaMetadata {
    /// Registry-wide schema ID
    pub id: u32,
    pub subject: String,
    /// Subject-scoped version
    pub version: i32,
    pub schema: String,
    #[serde(default)]
    pub schema_type: SchemaType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<SchemaReference>,
}

impl SchemaMetadata {
    /// Rebuild the schema info this metadata describes
    pub fn info(&self) -> SchemaInfo {
        SchemaInfo {
            schema: self.schema.clone(),
            schema_type: self.schema_type,
            references: self.references.clone(),
        }
    }

    pub fn into_info(self) -> SchemaInfo {
        SchemaInfo {
            schema: self.schema,
            schema_type: self.schema_type,
            references: self.references,
        }
    }
}

fn avro_full_name(schema: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(schema).ok()?;
    let name = value.get("name")?.as_str()?;
    if name.contains('.') {
        return Some(name.to_string());
    }
    match value.get("namespace").and_then(|ns| ns.as_str()) {
        Some(ns) if !ns.is_empty() => Some(format!("{}.{}", ns, name)),
        _ => Some(name.to_string()),
    }
}

fn protobuf_message_name(schema: &str) -> Option<String> {
    static PACKAGE: OnceLock<Regex> = OnceLock::new();
    static MESSAGE: OnceLock<Regex> = OnceLock::new();

    let package = PACKAGE.get_or_init(|| {
        Regex::new(r"(?m)^\s*package\s+([A-Za-z_][\w.]*)\s*;").expect("valid package regex")
    });
    let message = MESSAGE.get_or_init(|| {
        Regex::new(r"(?m)^message\s+([A-Za-z_]\w*)").expect("valid message regex")
    });

    let name = message.captures(schema)?.get(1)?.as_str();
    match package.captures(schema).and_then(|c| c.get(1)) {
        Some(pkg) => Some(format!("{}.{}", pkg.as_str(), name)),
        None => Some(name.to_string()),
    }
}
