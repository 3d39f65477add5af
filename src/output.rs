//! Output formatting for JSON and text modes
//!
//! Provides types for structured output that can be serialized to JSON
//! for machine-readable output, or displayed as text for human consumption.

use crate::reconcile::Difference;
use crate::renovate::WriteSummary;
use serde::Serialize;

/// Result of a check operation
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub k8s_version: String,
    pub local_go_version: Option<String>,
    pub upstream_go_version: Option<String>,
    pub pinned: bool,
    pub differences: Vec<Difference>,
}

/// Result of an update-renovate operation
#[derive(Debug, Serialize)]
pub struct UpdateReport {
    pub k8s_version: String,
    #[serde(flatten)]
    pub summary: WriteSummary,
}

impl CheckReport {
    pub fn new(
        k8s_version: &str,
        local_go_version: Option<&str>,
        upstream_go_version: Option<&str>,
        differences: Vec<Difference>,
    ) -> Self {
        Self {
            k8s_version: k8s_version.to_string(),
            local_go_version: local_go_version.map(str::to_string),
            upstream_go_version: upstream_go_version.map(str::to_string),
            pinned: differences.is_empty(),
            differences,
        }
    }
}

/// Print JSON output to stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// One line per difference, as shown by `check`
pub fn difference_line(diff: &Difference) -> String {
    format!(
        "Module {:?} is different, local={} vs upstream={}",
        diff.path, diff.local_version, diff.upstream_version
    )
}
