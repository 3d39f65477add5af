//! Local dependency resolution
//!
//! Runs `go list -m all` in the project directory and keeps only the modules
//! the project's own go.mod requires. Modules pulled in transitively by
//! indirect dependencies never appear in go.mod, so there is nothing to pin
//! them against.

use super::ModuleInfo;
use super::modfile::{self, ModFileError};
use crate::deps::DependencySet;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocalError {
    #[error("Failed to read {path}: {source}")]
    ReadGoMod {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ModFileError),

    #[error("Failed to execute {program}: {source}")]
    Exec {
        program: String,
        source: std::io::Error,
    },

    #[error("`{program} list -m all` failed ({status}): {output}")]
    ListFailed {
        program: String,
        status: String,
        output: String,
    },
}

/// Resolve the dependencies the project in `dir` actually uses.
///
/// `go_binary` is the `go` executable to invoke.
pub fn local_dependencies(dir: &Path, go_binary: &str) -> Result<ModuleInfo, LocalError> {
    let go_mod_path = dir.join("go.mod");
    let content = fs::read_to_string(&go_mod_path).map_err(|source| LocalError::ReadGoMod {
        path: go_mod_path.clone(),
        source,
    })?;
    let file = modfile::parse(&go_mod_path.display().to_string(), &content)?;

    log::debug!("Running {} list -m all in {}", go_binary, dir.display());
    let output = Command::new(go_binary)
        .args(["list", "-m", "all"])
        .current_dir(dir)
        .output()
        .map_err(|source| LocalError::Exec {
            program: go_binary.to_string(),
            source,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let text = if stderr.trim().is_empty() {
            stdout.trim().to_string()
        } else {
            stderr.trim().to_string()
        };
        return Err(LocalError::ListFailed {
            program: go_binary.to_string(),
            status: output.status.to_string(),
            output: text,
        });
    }

    let required: HashSet<&str> = file.require.iter().map(|r| r.path.as_str()).collect();
    let listing = String::from_utf8_lossy(&output.stdout);
    let deps = parse_list_output(&listing, &required);

    log::debug!(
        "Resolved {} local dependencies for {}",
        deps.len(),
        file.module.as_deref().unwrap_or("<unnamed module>")
    );

    Ok(ModuleInfo {
        go_version: file.go,
        toolchain: file.toolchain,
        deps,
    })
}

/// Parse `go list -m all` output, keeping modules listed in `required`.
///
/// Lines that don't split into exactly `<path> <version>` are skipped: the
/// main module has no version and replaced modules carry `=> ...` fields.
fn parse_list_output(listing: &str, required: &HashSet<&str>) -> DependencySet {
    let mut deps = DependencySet::new();
    for line in listing.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [path, version] = fields[..] else {
            continue;
        };
        if !required.contains(path) {
            continue;
        }
        deps.insert(path, version);
    }
    deps
}
