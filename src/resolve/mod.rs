//! Schema Reference Resolution
//!
//! A schema may reference other registered schemas by `(subject, version)`.
//! Before a codec can use such a schema, every dependency has to be fetched,
//! recursively, dependencies before dependents.
//!
//! - [`resolve_references`] collects `name -> schema text` for formats whose
//!   codecs take the raw sources (JSON Schema, Protobuf)
//! - [`avro::resolve_avro_references`] links AVRO named types into one
//!   parsed schema set
//! - [`graph::ReferenceGraph`] exposes the whole reference graph for tooling
//!
//! Resolution keeps the `(subject, version)` keys on the current path and
//! fails with [`SerdeError::CyclicReference`] when one is entered twice.
//! Reaching the same dependency along two paths (a diamond) is fine.

pub mod avro;
pub mod graph;

pub use avro::{resolve_avro_references, AvroSchemaSet};
pub use graph::ReferenceGraph;

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::client::SchemaRegistryClient;
use crate::error::{Result, SerdeError};
use crate::schema::{SchemaInfo, SchemaMetadata, SchemaReference};

/// Key of a registered schema version
pub type ReferenceKey = (String, i32);

/// Dependency sources by reference name, in resolution order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedReferences {
    order: Vec<String>,
    sources: HashMap<String, String>,
}

impl ResolvedReferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `name -> source`. A repeated name keeps its position and takes the new source.
    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) {
        let name = name.into();
        if !self.sources.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.sources.insert(name, source.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.sources.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Names in the order they were first resolved
    pub fn names(&self) -> &[String] {
        &self.order
    }
}

/// Resolve every reference of `schema` into a fresh name -> source map.
///
/// Nothing is returned on failure; a fetch error at any depth aborts the call.
pub fn resolve_references(
    client: &dyn SchemaRegistryClient,
    schema: &SchemaInfo,
) -> Result<ResolvedReferences> {
    let mut resolved = ResolvedReferences::new();
    resolve_references_into(client, schema, &mut resolved)?;
    Ok(resolved)
}

/// Resolve into an existing map, leaving it untouched when `schema` has no references
pub fn resolve_references_into(
    client: &dyn SchemaRegistryClient,
    schema: &SchemaInfo,
    resolved: &mut ResolvedReferences,
) -> Result<()> {
    let mut path = HashSet::new();
    walk_references(client, schema, &mut path, &mut |reference, metadata| {
        resolved.insert(reference.name.clone(), metadata.schema.clone());
        Ok(())
    })
}

/// Depth-first walk calling `visit` after a reference's own dependencies
pub(crate) fn walk_references(
    client: &dyn SchemaRegistryClient,
    schema: &SchemaInfo,
    path: &mut HashSet<ReferenceKey>,
    visit: &mut dyn FnMut(&SchemaReference, &SchemaMetadata) -> Result<()>,
) -> Result<()> {
    for reference in &schema.references {
        let key = (reference.subject.clone(), reference.version);
        if path.contains(&key) {
            return Err(SerdeError::CyclicReference {
                subject: reference.subject.clone(),
                version: reference.version,
            });
        }

        debug!(name = %reference.name, subject = %reference.subject, version = reference.version, "fetching schema reference");
        let metadata = client.get_schema_metadata(&reference.subject, reference.version)?;

        path.insert(key.clone());
        walk_references(client, &metadata.info(), path, visit)?;
        path.remove(&key);

        visit(reference, &metadata)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{MockSchemaRegistryClient, RegistryError};
    use crate::schema::SchemaType;

    fn json(schema: &str) -> SchemaInfo {
        SchemaInfo::new(schema, SchemaType::Json)
    }

    /// C <- A, plus B; the root references A and B
    fn registry_with_chain() -> MockSchemaRegistryClient {
        let client = MockSchemaRegistryClient::new();
        client.register("c", &json(r#"{"title":"C"}"#), false).unwrap();
        client
            .register(
                "a",
                &json(r#"{"title":"A"}"#).with_references(vec![SchemaReference::new("C", "c", 1)]),
                false,
            )
            .unwrap();
        client.register("b", &json(r#"{"title":"B"}"#), false).unwrap();
        client.clear_requests();
        client
    }

    #[test]
    fn test_no_references_leaves_map_unchanged() {
        let client = MockSchemaRegistryClient::new();
        let mut resolved = ResolvedReferences::new();
        resolved.insert("existing", "{}");

        resolve_references_into(&client, &json("{}"), &mut resolved).unwrap();
        assert_eq!(resolved.names(), ["existing"]);
        assert!(client.requests().is_empty());

        assert!(resolve_references(&client, &json("{}")).unwrap().is_empty());
    }

    #[test]
    fn test_dependencies_before_dependents() {
        let client = registry_with_chain();
        let root = json(r#"{"title":"Root"}"#).with_references(vec![
            SchemaReference::new("A", "a", 1),
            SchemaReference::new("B", "b", 1),
        ]);

        let resolved = resolve_references(&client, &root).unwrap();
        assert_eq!(resolved.names(), ["C", "A", "B"]);
        assert_eq!(resolved.get("C"), Some(r#"{"title":"C"}"#));
        assert_eq!(resolved.len(), 3);
        assert_eq!(
            client.requests(),
            vec![
                "get_schema_metadata(a@1)",
                "get_schema_metadata(c@1)",
                "get_schema_metadata(b@1)",
            ]
        );
    }

    #[test]
    fn test_failure_at_depth_aborts() {
        let client = MockSchemaRegistryClient::new();
        client
            .register(
                "a",
                &json(r#"{"title":"A"}"#).with_references(vec![SchemaReference::new("C", "missing", 1)]),
                false,
            )
            .unwrap();
        let root = json("{}").with_references(vec![SchemaReference::new("A", "a", 1)]);

        let err = resolve_references(&client, &root).unwrap_err();
        assert!(matches!(
            err,
            SerdeError::Registry(RegistryError::SubjectNotFound { .. })
        ));
    }

    #[test]
    fn test_repeated_name_last_write_wins() {
        let client = MockSchemaRegistryClient::new();
        client.register("x", &json(r#"{"title":"X1"}"#), false).unwrap();
        client.register("x", &json(r#"{"title":"X2"}"#), false).unwrap();
        let root = json("{}").with_references(vec![
            SchemaReference::new("X", "x", 1),
            SchemaReference::new("X", "x", 2),
        ]);

        let resolved = resolve_references(&client, &root).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved.get("X"), Some(r#"{"title":"X2"}"#));
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let client = registry_with_chain();
        client
            .register(
                "d",
                &json(r#"{"title":"D"}"#).with_references(vec![SchemaReference::new("C", "c", 1)]),
                false,
            )
            .unwrap();
        let root = json("{}").with_references(vec![
            SchemaReference::new("A", "a", 1),
            SchemaReference::new("D", "d", 1),
        ]);

        let resolved = resolve_references(&client, &root).unwrap();
        assert_eq!(resolved.names(), ["C", "A", "D"]);
    }

    #[test]
    fn test_cycle_is_reported() {
        let client = MockSchemaRegistryClient::new();
        // a@1 -> b@1 -> a@1
        client
            .register(
                "a",
                &json(r#"{"title":"A"}"#).with_references(vec![SchemaReference::new("B", "b", 1)]),
                false,
            )
            .unwrap();
        client
            .register(
                "b",
                &json(r#"{"title":"B"}"#).with_references(vec![SchemaReference::new("A", "a", 1)]),
                false,
            )
            .unwrap();
        let root = json("{}").with_references(vec![SchemaReference::new("A", "a", 1)]);

        let err = resolve_references(&client, &root).unwrap_err();
        assert!(err.is_resolution());
        match err {
            SerdeError::CyclicReference { subject, version } => {
                assert_eq!(subject, "a");
                assert_eq!(version, 1);
            }
            other => panic!("Expected CyclicReference, got {:?}", other),
        }
    }
}
