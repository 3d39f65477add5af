//! Go ecosystem support
//!
//! Handles:
//! - go.mod parsing (`modfile`)
//! - Local dependency listing via `go list -m all` (`local`)
//! - Kubernetes release go.mod fetching and version detection (`upstream`)

pub mod local;
pub mod modfile;
pub mod upstream;

use crate::deps::DependencySet;

/// A dependency set together with the go.mod it was derived from
#[derive(Debug, Default, Clone)]
pub struct ModuleInfo {
    /// The `go` directive, e.g. `1.22.0`
    pub go_version: Option<String>,
    /// The `toolchain` directive, e.g. `go1.22.4`
    pub toolchain: Option<String>,
    pub deps: DependencySet,
}
