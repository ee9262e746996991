//! AVRO reference resolution
//!
//! Referenced AVRO schemas are named types. Each one is added to a shared
//! namespace once, dependencies first, and the root is parsed against that
//! namespace so it can name any of them. `apache_avro` does the linking; a
//! name it cannot find surfaces as [`SerdeError::UnresolvedReference`].

use std::collections::HashSet;

use apache_avro::Schema;
use tracing::debug;

use super::{walk_references, ReferenceKey};
use crate::client::SchemaRegistryClient;
use crate::error::{Result, SerdeError};
use crate::schema::SchemaInfo;

/// A parsed AVRO schema with the named types it depends on
#[derive(Debug, Clone)]
pub struct AvroSchemaSet {
    pub root: Schema,
    /// Referenced schemas in resolution order
    pub dependencies: Vec<Schema>,
}

impl AvroSchemaSet {
    /// Every schema in the set, dependencies first
    pub fn all(&self) -> impl Iterator<Item = &Schema> {
        self.dependencies.iter().chain(std::iter::once(&self.root))
    }

    /// Full names of the referenced named types
    pub fn dependency_names(&self) -> Vec<String> {
        self.dependencies
            .iter()
            .filter_map(|schema| schema.name().map(|name| name.fullname(None)))
            .collect()
    }
}

/// Fetch and link every reference of `schema`, then parse it.
///
/// The root may be any AVRO schema (record, union, array, ...); only the
/// referenced definitions have to be named types.
pub fn resolve_avro_references(
    client: &dyn SchemaRegistryClient,
    schema: &SchemaInfo,
) -> Result<AvroSchemaSet> {
    let mut definitions: Vec<String> = Vec::new();
    let mut registered: HashSet<ReferenceKey> = HashSet::new();
    let mut path = HashSet::new();

    walk_references(client, schema, &mut path, &mut |reference, metadata| {
        if registered.insert((metadata.subject.clone(), metadata.version)) {
            debug!(name = %reference.name, subject = %metadata.subject, version = metadata.version, "registering AVRO definition");
            definitions.push(metadata.schema.clone());
        }
        Ok(())
    })?;

    let inputs: Vec<&str> = definitions.iter().map(String::as_str).collect();
    let (root, dependencies) =
        Schema::parse_str_with_list(&schema.schema, &inputs).map_err(link_error)?;
    Ok(AvroSchemaSet { root, dependencies })
}

/// apache-avro reports a name it cannot find as an unknown primitive
fn link_error(err: apache_avro::Error) -> SerdeError {
    match err {
        apache_avro::Error::ParsePrimitive(name) => SerdeError::UnresolvedReference { name },
        other => SerdeError::Avro(other),
    }
}
