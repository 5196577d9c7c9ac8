//! Rewrites deprecated taxonomy strings to their current replacement
//! before any matching happens.

use agentads_core::config::TaxonomyConfig;
use agentads_core::error::{DecisionError, DecisionResult};
use std::collections::BTreeMap;

/// Result of running a requested taxonomy through the migrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub path: String,
    /// Human-readable deprecation notice, present only when `path` was rewritten.
    pub warning: Option<String>,
}

impl Migration {
    pub fn migrated(&self) -> bool {
        self.warning.is_some()
    }
}

/// Versioned mapping of deprecated taxonomy strings to current ones.
///
/// Chains (`a -> b`, `b -> c`) are collapsed at construction so every key
/// maps straight to a current path, and no value is itself a key.
#[derive(Debug, Clone)]
pub struct DeprecationTable {
    version: String,
    entries: BTreeMap<String, String>,
}

impl DeprecationTable {
    pub fn new(
        version: impl Into<String>,
        raw: BTreeMap<String, String>,
    ) -> DecisionResult<Self> {
        let mut entries = BTreeMap::new();
        for (old, new) in &raw {
            let mut current = new;
            let mut seen = vec![old.as_str()];
            while let Some(next) = raw.get(current) {
                if seen.contains(&current.as_str()) {
                    return Err(DecisionError::Config(format!(
                        "taxonomy deprecation cycle involving '{}'",
                        old
                    )));
                }
                seen.push(current.as_str());
                current = next;
            }
            entries.insert(old.clone(), current.clone());
        }
        Ok(Self {
            version: version.into(),
            entries,
        })
    }

    pub fn from_config(config: &TaxonomyConfig) -> DecisionResult<Self> {
        Self::new(config.version.clone(), config.deprecated.clone())
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn replacement(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }
}

impl Default for DeprecationTable {
    fn default() -> Self {
        let config = TaxonomyConfig::default();
        Self {
            version: config.version,
            entries: config.deprecated,
        }
    }
}

/// Pure lookup over a [`DeprecationTable`]. Unknown paths pass through untouched;
/// validating them is not this component's job.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyMigrator {
    table: DeprecationTable,
}

impl TaxonomyMigrator {
    pub fn new(table: DeprecationTable) -> Self {
        Self { table }
    }

    pub fn migrate(&self, path: &str) -> Migration {
        match self.table.replacement(path) {
            Some(current) => Migration {
                path: current.to_string(),
                warning: Some(format!(
                    "Taxonomy '{}' is deprecated (taxonomy v{}); use '{}' instead",
                    path, self.table.version, current
                )),
            },
            None => Migration {
                path: path.to_string(),
                warning: None,
            },
        }
    }
}
