//! Renovate configuration output
//!
//! Emits `packageRules` pinning each module to a single allowed version:
//!
//! ```json
//! {
//!   "packageRules": [
//!     {
//!       "matchPackageNames": ["github.com/spf13/cobra"],
//!       "allowedVersions": "v1.8.1"
//!     }
//!   ]
//! }
//! ```

use crate::atomic::{self, WriteError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const PACKAGE_RULES: &str = "packageRules";

#[derive(Error, Debug)]
pub enum RenovateError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Cannot merge into {path}: top-level value is not a JSON object")]
    NotAnObject { path: PathBuf },

    #[error("Cannot merge into {path}: \"packageRules\" is not an array")]
    RulesNotArray { path: PathBuf },

    #[error("Failed to encode package rule: {0}")]
    Encode(serde_json::Error),

    #[error(transparent)]
    Write(#[from] WriteError),
}

/// A rule restricting one package to one version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRule {
    pub match_package_names: Vec<String>,
    pub allowed_versions: String,
}

impl PackageRule {
    pub fn pin(path: &str, version: &str) -> Self {
        Self {
            match_package_names: vec![path.to_string()],
            allowed_versions: version.to_string(),
        }
    }
}

/// A Renovate config holding only generated rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenovateConfig {
    pub package_rules: Vec<PackageRule>,
}

/// What `write_rules` did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    pub output: PathBuf,
    /// Rules written by this run
    pub rules: usize,
    /// Rules in the file after the write, including pre-existing ones
    pub total_rules: usize,
    pub merged: bool,
}

/// Write `rules` to `output`.
///
/// Without `merge` the file is replaced by a config holding only `rules`.
/// With `merge` the existing document is kept and `rules` are appended to its
/// `packageRules`, without removing duplicates.
pub fn write_rules(
    output: &Path,
    rules: Vec<PackageRule>,
    merge: bool,
) -> Result<WriteSummary, RenovateError> {
    let count = rules.len();

    let total_rules = if merge {
        let existing = read_document(output)?;
        let merged = merge_rules(existing, &rules, output)?;
        let total = merged[PACKAGE_RULES].as_array().map_or(0, Vec::len);
        atomic::write_json(output, &merged)?;
        total
    } else {
        atomic::write_json(
            output,
            &RenovateConfig {
                package_rules: rules,
            },
        )?;
        count
    };

    log::info!("Wrote {} package rules to {}", count, output.display());

    Ok(WriteSummary {
        output: output.to_path_buf(),
        rules: count,
        total_rules,
        merged: merge,
    })
}

fn read_document(path: &Path) -> Result<Value, RenovateError> {
    let content = fs::read_to_string(path).map_err(|source| RenovateError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| RenovateError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Append `rules` to the `packageRules` array of `document`, creating it if
/// missing. Every other key is left as it was.
fn merge_rules(
    document: Value,
    rules: &[PackageRule],
    path: &Path,
) -> Result<Value, RenovateError> {
    let Value::Object(mut map) = document else {
        return Err(RenovateError::NotAnObject {
            path: path.to_path_buf(),
        });
    };

    let entry = map
        .entry(PACKAGE_RULES)
        .or_insert_with(|| Value::Array(Vec::new()));
    let Value::Array(existing) = entry else {
        return Err(RenovateError::RulesNotArray {
            path: path.to_path_buf(),
        });
    };

    for rule in rules {
        existing.push(serde_json::to_value(rule).map_err(RenovateError::Encode)?);
    }

    Ok(Value::Object(map))
}
