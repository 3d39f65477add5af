//! Dependency reconciliation
//!
//! Both operations are driven by the upstream set. `differences` only looks
//! at modules the project already uses, while `pinning_rules` pins every
//! upstream module so Renovate can't drift a dependency the project adds later.

use crate::deps::{DependencySet, IgnoreSet};
use crate::renovate::PackageRule;
use serde::Serialize;

/// A module whose local version differs from upstream
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Difference {
    pub path: String,
    pub local_version: String,
    pub upstream_version: String,
}

/// Modules required by both sides with different versions, sorted by path.
///
/// Modules only present locally and modules in `ignored` are never reported.
pub fn differences(
    local: &DependencySet,
    upstream: &DependencySet,
    ignored: &IgnoreSet,
) -> Vec<Difference> {
    let mut diffs: Vec<Difference> = upstream
        .iter()
        .filter_map(|(path, upstream_version)| {
            let local_version = local.get(path)?;
            if ignored.contains(path) || local_version == upstream_version {
                return None;
            }
            Some(Difference {
                path: path.to_string(),
                local_version: local_version.to_string(),
                upstream_version: upstream_version.to_string(),
            })
        })
        .collect();

    diffs.sort_by(|a, b| a.path.cmp(&b.path));
    diffs
}

/// One rule per non-ignored upstream module, sorted by path
pub fn pinning_rules(upstream: &DependencySet, ignored: &IgnoreSet) -> Vec<PackageRule> {
    let mut rules: Vec<PackageRule> = upstream
        .iter()
        .filter(|(path, _)| !ignored.contains(path))
        .map(|(path, version)| {
            log::debug!("Pinning {:?} to {:?}", path, version);
            PackageRule::pin(path, version)
        })
        .collect();

    rules.sort_by(|a, b| a.match_package_names.cmp(&b.match_package_names));
    rules
}
