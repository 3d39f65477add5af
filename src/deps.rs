//! Dependency and ignore sets
//!
//! A `DependencySet` maps a Go module path to the single version pinned for it.
//! Paths are matched by exact string equality; Go module paths are
//! case-sensitive and no normalization is applied.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IgnoreError {
    #[error("Failed to read ignore file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Module path -> version
///
/// Never holds an empty path or an empty version.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DependencySet {
    modules: BTreeMap<String, String>,
}

impl DependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a module, replacing any previous version.
    ///
    /// Returns false (and stores nothing) if either string is empty.
    pub fn insert(&mut self, path: impl Into<String>, version: impl Into<String>) -> bool {
        let path = path.into();
        let version = version.into();
        if path.is_empty() || version.is_empty() {
            return false;
        }
        self.modules.insert(path, version);
        true
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.modules.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Iterate `(path, version)` pairs in ascending path order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.modules
            .iter()
            .map(|(path, version)| (path.as_str(), version.as_str()))
    }
}

impl<P: Into<String>, V: Into<String>> FromIterator<(P, V)> for DependencySet {
    fn from_iter<I: IntoIterator<Item = (P, V)>>(iter: I) -> Self {
        let mut set = DependencySet::new();
        for (path, version) in iter {
            set.insert(path, version);
        }
        set
    }
}

/// Module paths excluded from comparison and rule generation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IgnoreSet {
    modules: HashSet<String>,
}

impl IgnoreSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse newline-delimited module paths.
    ///
    /// Each non-empty line is taken verbatim: there is no comment syntax and
    /// no whitespace trimming.
    pub fn parse(content: &str) -> Self {
        content
            .lines()
            .filter(|line| !line.is_empty())
            .collect()
    }

    /// Read an ignore file from disk.
    ///
    /// Invalid UTF-8 is replaced rather than rejected; such lines can never
    /// name a module anyway.
    pub fn load(path: &Path) -> Result<Self, IgnoreError> {
        let content = fs::read(path).map_err(|source| IgnoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&String::from_utf8_lossy(&content)))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.modules.contains(path)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for IgnoreSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        IgnoreSet {
            modules: iter.into_iter().map(Into::into).collect(),
        }
    }
}
