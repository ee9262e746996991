//! In-memory schema registry

use std::collections::HashMap;

use parking_lot::{Mutex, RwLock};
use tracing::trace;

use super::{RegistryError, SchemaRegistryClient};
use crate::checksum::Checksum;
use crate::schema::{SchemaInfo, SchemaMetadata};

/// Registry held entirely in memory.
///
/// IDs are registry-wide: the same schema registered under two subjects gets
/// one ID and a version in each subject. Every call is appended to a request
/// log so tests can assert on what the serdes asked for.
#[derive(Default)]
pub struct MockSchemaRegistryClient {
    state: RwLock<RegistryState>,
    requests: Mutex<Vec<String>>,
}

#[derive(Default)]
struct RegistryState {
    schemas: HashMap<u32, SchemaInfo>,
    exact_ids: HashMap<Checksum, u32>,
    normalized_ids: HashMap<Checksum, u32>,
    subjects: HashMap<String, Vec<SchemaMetadata>>,
    next_id: u32,
}

impl MockSchemaRegistryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests seen so far, e.g. `register(orders-value)`
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    /// Number of calls to `method`
    pub fn call_count(&self, method: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.split('(').next() == Some(method))
            .count()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().clear();
    }

    /// All subjects, sorted
    pub fn subjects(&self) -> Vec<String> {
        let mut subjects: Vec<_> = self.state.read().subjects.keys().cloned().collect();
        subjects.sort();
        subjects
    }

    /// Versions registered under `subject`, oldest first
    pub fn versions(&self, subject: &str) -> Vec<i32> {
        self.state
            .read()
            .subjects
            .get(subject)
            .map(|versions| versions.iter().map(|m| m.version).collect())
            .unwrap_or_default()
    }

    fn record(&self, request: String) {
        trace!(%request, "mock registry request");
        self.requests.lock().push(request);
    }
}

fn schema_key(schema: &SchemaInfo, normalize: bool) -> Checksum {
    let text = if normalize {
        schema.normalized_checksum()
    } else {
        schema.checksum()
    };
    let references: Vec<String> = schema.references.iter().map(|r| r.to_string()).collect();
    Checksum::of_text(&format!(
        "{}|{:?}|{}",
        schema.schema_type,
        text,
        references.join(",")
    ))
}

impl RegistryState {
    fn lookup(&self, schema: &SchemaInfo, normalize: bool) -> Option<u32> {
        if normalize {
            self.normalized_ids.get(&schema_key(schema, true)).copied()
        } else {
            self.exact_ids.get(&schema_key(schema, false)).copied()
        }
    }

    fn subject_version(&self, subject: &str, id: u32) -> Option<&SchemaMetadata> {
        self.subjects.get(subject)?.iter().find(|m| m.id == id)
    }
}

impl SchemaRegistryClient for MockSchemaRegistryClient {
    fn register(&self, subject: &str, schema: &SchemaInfo, normalize: bool) -> Result<u32, RegistryError> {
        self.record(format!("register({})", subject));
        let mut state = self.state.write();

        let id = match state.lookup(schema, normalize) {
            Some(id) => id,
            None => {
                state.next_id += 1;
                let id = state.next_id;
                state.schemas.insert(id, schema.clone());
                state.exact_ids.insert(schema_key(schema, false), id);
                state.normalized_ids.insert(schema_key(schema, true), id);
                id
            }
        };

        if state.subject_version(subject, id).is_none() {
            let versions = state.subjects.entry(subject.to_string()).or_default();
            let version = versions.last().map_or(1, |m| m.version + 1);
            versions.push(SchemaMetadata {
                id,
                subject: subject.to_string(),
                version,
                schema: schema.schema.clone(),
                schema_type: schema.schema_type,
                references: schema.references.clone(),
            });
        }

        Ok(id)
    }

    fn get_by_subject_and_id(&self, subject: &str, id: u32) -> Result<SchemaInfo, RegistryError> {
        self.record(format!("get_by_subject_and_id({}, {})", subject, id));
        let state = self.state.read();

        let not_found = || RegistryError::SchemaNotFound {
            subject: subject.to_string(),
            id,
        };
        if !subject.is_empty() && state.subject_version(subject, id).is_none() {
            return Err(not_found());
        }
        state.schemas.get(&id).cloned().ok_or_else(not_found)
    }

    fn get_id(&self, subject: &str, schema: &SchemaInfo, normalize: bool) -> Result<u32, RegistryError> {
        self.record(format!("get_id({})", subject));
        let state = self.state.read();

        if !state.subjects.contains_key(subject) {
            return Err(RegistryError::SubjectNotFound {
                subject: subject.to_string(),
            });
        }
        state
            .lookup(schema, normalize)
            .filter(|id| state.subject_version(subject, *id).is_some())
            .ok_or_else(|| RegistryError::SchemaNotRegistered {
                subject: subject.to_string(),
            })
    }

    fn get_latest_schema_metadata(&self, subject: &str) -> Result<SchemaMetadata, RegistryError> {
        self.record(format!("get_latest_schema_metadata({})", subject));
        self.state
            .read()
            .subjects
            .get(subject)
            .and_then(|versions| versions.last().cloned())
            .ok_or_else(|| RegistryError::SubjectNotFound {
                subject: subject.to_string(),
            })
    }

    fn get_schema_metadata(&self, subject: &str, version: i32) -> Result<SchemaMetadata, RegistryError> {
        self.record(format!("get_schema_metadata({}@{})", subject, version));
        let state = self.state.read();

        let versions = state
            .subjects
            .get(subject)
            .ok_or_else(|| RegistryError::SubjectNotFound {
                subject: subject.to_string(),
            })?;
        versions
            .iter()
            .find(|m| m.version == version)
            .cloned()
            .ok_or_else(|| RegistryError::VersionNotFound {
                subject: subject.to_string(),
                version,
            })
    }
}
