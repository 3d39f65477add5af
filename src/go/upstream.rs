//! Kubernetes release dependencies
//!
//! Fetches the go.mod of a Kubernetes release and derives the set of modules
//! the release pins directly.

use super::ModuleInfo;
use super::modfile::{self, ModFile, ModFileError};
use crate::cli::K8sVersion;
use crate::deps::DependencySet;
use std::collections::HashSet;
use thiserror::Error;

/// Where release go.mod files are fetched from; `{version}` is substituted
pub const DEFAULT_UPSTREAM_URL: &str =
    "https://raw.githubusercontent.com/kubernetes/kubernetes/{version}/go.mod";

/// Libraries whose versions track the Kubernetes release they were cut from.
/// Checked in order when detecting the release automatically.
const ANCHOR_MODULES: [&str; 3] = ["k8s.io/api", "k8s.io/apimachinery", "k8s.io/client-go"];

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Failed to read response from {url}: {message}")]
    Read { url: String, message: String },

    #[error(transparent)]
    Parse(#[from] ModFileError),

    #[error(
        "Couldn't detect k8s version: none of {} found in go.mod. Pass --k8s-version explicitly.",
        ANCHOR_MODULES.join(", ")
    )]
    VersionNotDetected,
}

/// Turn a `--k8s-version` value into a concrete release tag.
///
/// `auto` looks for an anchor library in the local dependencies and maps its
/// version onto the release: the libraries are tagged `v0.X.Y` while the
/// release is `v1.X.Y`, so the first `v0` becomes `v1`.
pub fn resolve_version(
    requested: &K8sVersion,
    local: &DependencySet,
) -> Result<String, UpstreamError> {
    match requested {
        K8sVersion::Tag(tag) => Ok(tag.clone()),
        K8sVersion::Auto => ANCHOR_MODULES
            .iter()
            .find_map(|module| local.get(module))
            .map(|version| version.replacen("v0", "v1", 1))
            .ok_or(UpstreamError::VersionNotDetected),
    }
}

/// Expand the URL template for a release
pub fn manifest_url(template: &str, version: &str) -> String {
    template.replace("{version}", version)
}

/// Fetch and parse the go.mod for `version`
pub fn k8s_dependencies(template: &str, version: &str) -> Result<ModuleInfo, UpstreamError> {
    let url = manifest_url(template, version);
    log::info!("Fetching {}", url);

    let response = ureq::get(&url)
        .header("User-Agent", "kubemodcmp")
        .call()
        .map_err(|e| UpstreamError::Fetch {
            url: url.clone(),
            message: e.to_string(),
        })?;

    let body = response
        .into_body()
        .read_to_string()
        .map_err(|e| UpstreamError::Read {
            url: url.clone(),
            message: e.to_string(),
        })?;

    let file = modfile::parse(&url, &body)?;
    let deps = pinned_dependencies(&file);
    log::debug!("Upstream {} pins {} modules", version, deps.len());

    Ok(ModuleInfo {
        go_version: file.go,
        toolchain: file.toolchain,
        deps,
    })
}

/// Direct requirements of `file` that resolve to a published module.
///
/// Kubernetes replaces its staging modules with local paths:
///
/// ```text
/// require k8s.io/api v0.0.0
/// replace k8s.io/api => ./staging/src/k8s.io/api
/// ```
///
/// Those versions mean nothing outside the repository, so any required module
/// that is also replaced is dropped, as are indirect requirements.
pub fn pinned_dependencies(file: &ModFile) -> DependencySet {
    let mut replaced = HashSet::new();
    for replace in &file.replace {
        log::debug!("Not pinning replaced module: {}", replace);
        replaced.insert(replace.old_path.as_str());
    }

    file.require
        .iter()
        .filter(|r| !r.indirect)
        .filter(|r| !replaced.contains(r.path.as_str()))
        .map(|r| (r.path.as_str(), r.version.as_str()))
        .collect()
}
