//! Build environment management
//!
//! [`ShellEnv`] is the environment a phase runs with. [`BuildActions`] is the
//! callback that fills in the standard build variables right before a phase
//! starts, and [`EnvironmentSnapshot`] is the persisted form of a resolved
//! environment that a later process can re-enter.

mod actions;
mod snapshot;

pub use actions::{BuildActions, InjectorSettings};
pub use snapshot::{EnvironmentSnapshot, SnapshotLoader, SNAPSHOT_FORMAT_VERSION};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Separator used for path-list variables on this host
#[cfg(windows)]
pub const PATH_LIST_SEPARATOR: char = ';';
/// Separator used for path-list variables on this host
#[cfg(not(windows))]
pub const PATH_LIST_SEPARATOR: char = ':';

/// Environment variables for one phase, ordered by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShellEnv {
    vars: BTreeMap<String, String>,
}

impl ShellEnv {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.vars.remove(key)
    }

    /// Append an entry to a path-list variable unless it is already present
    pub fn append_path(&mut self, key: &str, entry: &str) {
        if self.path_entries(key).any(|existing| existing == entry) {
            return;
        }

        let value = match self.vars.get(key).filter(|v| !v.is_empty()) {
            Some(current) => format!("{current}{PATH_LIST_SEPARATOR}{entry}"),
            None => entry.to_string(),
        };
        self.vars.insert(key.to_string(), value);
    }

    /// Entries of a path-list variable, empty entries skipped
    pub fn path_entries<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.vars
            .get(key)
            .map(String::as_str)
            .unwrap_or_default()
            .split(PATH_LIST_SEPARATOR)
            .filter(|entry| !entry.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl FromIterator<(String, String)> for ShellEnv {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}
