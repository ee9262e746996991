//! Schema ID policies
//!
//! The serializer needs exactly one schema ID per message. Which registry
//! call produces it is decided by configuration, first match wins:
//!
//! | order | option                       | action                                   |
//! |-------|------------------------------|------------------------------------------|
//! | 1     | `auto.register.schemas=true` | register the schema, use the returned ID |
//! | 2     | `use.schema.id >= 0`         | fetch that ID under the subject, look it up |
//! | 3     | `use.latest.version=true`    | fetch the latest version, look it up     |
//! | 4     | otherwise                    | look up the given schema                 |

use std::fmt;

use tracing::debug;

use crate::client::SchemaRegistryClient;
use crate::config::SerdeConfig;
use crate::error::Result;
use crate::schema::SchemaInfo;

/// The policy that produces a schema ID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdPolicy {
    AutoRegister,
    UseSchemaId(u32),
    UseLatestVersion,
    Lookup,
}

type PolicyRule = fn(&SerdeConfig) -> Option<IdPolicy>;

/// Rules in precedence order; the last one always applies
const POLICY_RULES: [PolicyRule; 4] = [auto_register, pinned_id, latest_version, lookup];

fn auto_register(config: &SerdeConfig) -> Option<IdPolicy> {
    config.auto_register_schemas.then_some(IdPolicy::AutoRegister)
}

fn pinned_id(config: &SerdeConfig) -> Option<IdPolicy> {
    config.use_schema_id().map(IdPolicy::UseSchemaId)
}

fn latest_version(config: &SerdeConfig) -> Option<IdPolicy> {
    config.use_latest_version.then_some(IdPolicy::UseLatestVersion)
}

fn lookup(_config: &SerdeConfig) -> Option<IdPolicy> {
    Some(IdPolicy::Lookup)
}

impl IdPolicy {
    /// First policy whose rule matches `config`
    pub fn select(config: &SerdeConfig) -> Self {
        POLICY_RULES
            .iter()
            .find_map(|rule| rule(config))
            .unwrap_or(IdPolicy::Lookup)
    }

    pub fn name(&self) -> &'static str {
        match self {
            IdPolicy::AutoRegister => "auto-register",
            IdPolicy::UseSchemaId(_) => "use-schema-id",
            IdPolicy::UseLatestVersion => "use-latest-version",
            IdPolicy::Lookup => "lookup",
        }
    }

    /// Whether running this policy can create a schema version in the registry
    pub fn mutates_registry(&self) -> bool {
        matches!(self, IdPolicy::AutoRegister)
    }

    /// Run the policy against the registry.
    ///
    /// Fixed-ID and latest-version lookups never normalize; the schema they
    /// look up came from the registry already.
    pub fn resolve(
        &self,
        client: &dyn SchemaRegistryClient,
        subject: &str,
        schema: &SchemaInfo,
        normalize: bool,
    ) -> Result<u32> {
        debug!(policy = self.name(), %subject, "resolving schema id");
        let id = match *self {
            IdPolicy::AutoRegister => client.register(subject, schema, normalize)?,
            IdPolicy::UseSchemaId(pinned) => {
                let pinned_schema = client.get_by_subject_and_id(subject, pinned)?;
                client.get_id(subject, &pinned_schema, false)?
            }
            IdPolicy::UseLatestVersion => {
                let latest = client.get_latest_schema_metadata(subject)?.into_info();
                client.get_id(subject, &latest, false)?
            }
            IdPolicy::Lookup => client.get_id(subject, schema, normalize)?,
        };
        Ok(id)
    }
}

impl fmt::Display for IdPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdPolicy::UseSchemaId(id) => write!(f, "{}({})", self.name(), id),
            _ => f.write_str(self.name()),
        }
    }
}
