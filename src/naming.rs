//! Subject naming strategies
//!
//! A strategy maps `(topic, is_key, schema)` to the registry subject a
//! payload's schema lives under. Strategies must be deterministic and must
//! not fail.
//!
//! The deserializer only learns the schema after the subject lookup, so it
//! calls the strategy with an empty [`SchemaInfo`]. Strategies that read the
//! schema therefore produce different subjects on the two sides; only
//! [`topic_name_strategy`] is symmetric.

use std::sync::Arc;

use crate::schema::SchemaInfo;

/// Injectable subject naming strategy
pub type SubjectNameStrategy = Arc<dyn Fn(&str, bool, &SchemaInfo) -> String + Send + Sync>;

/// `<topic>-key` or `<topic>-value`
pub fn topic_name_strategy(topic: &str, is_key: bool, _schema: &SchemaInfo) -> String {
    let suffix = if is_key { "-key" } else { "-value" };
    format!("{}{}", topic, suffix)
}

/// Fully-qualified record name of the schema.
///
/// Falls back to [`topic_name_strategy`] when the schema declares no name.
pub fn record_name_strategy(topic: &str, is_key: bool, schema: &SchemaInfo) -> String {
    schema
        .record_name()
        .unwrap_or_else(|| topic_name_strategy(topic, is_key, schema))
}

/// `<topic>-<record name>`, falling back to [`topic_name_strategy`]
pub fn topic_record_name_strategy(topic: &str, is_key: bool, schema: &SchemaInfo) -> String {
    match schema.record_name() {
        Some(record) => format!("{}-{}", topic, record),
        None => topic_name_strategy(topic, is_key, schema),
    }
}

/// The default strategy as a shareable handle
pub fn default_strategy() -> SubjectNameStrategy {
    Arc::new(topic_name_strategy)
}
