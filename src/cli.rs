use clap::{Parser, Subcommand};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Check Go module dependencies against an upstream Kubernetes release
#[derive(Parser, Debug)]
#[command(name = "kubemodcmp")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Print results as JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that dependencies and Go version from upstream k8s are pinned to the correct version
    Check {
        /// Go module directory (defaults to the current directory)
        directory: Option<PathBuf>,

        /// The k8s version to look for, or `auto` to detect it from go.mod
        #[arg(long, default_value = "auto")]
        k8s_version: K8sVersion,

        /// A file with one module path per line to ignore
        #[arg(long)]
        ignore_file: Option<PathBuf>,
    },
    /// Update the renovate config with pinned dependencies from k8s upstream
    UpdateRenovate {
        /// Go module directory (defaults to the current directory)
        directory: Option<PathBuf>,

        /// The k8s version to look for, or `auto` to detect it from go.mod
        #[arg(long, default_value = "auto")]
        k8s_version: K8sVersion,

        /// A file with one module path per line to ignore
        #[arg(long)]
        ignore_file: Option<PathBuf>,

        /// Path to the json output
        #[arg(long)]
        output: PathBuf,

        /// Append to the rules of an existing file instead of replacing it
        #[arg(long)]
        merge: bool,
    },
}

/// The Kubernetes release to compare against
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum K8sVersion {
    /// Derive the release from the local k8s.io library versions
    Auto,
    /// A tag or branch of kubernetes/kubernetes
    Tag(String),
}

impl fmt::Display for K8sVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            K8sVersion::Auto => write!(f, "auto"),
            K8sVersion::Tag(tag) => write!(f, "{}", tag),
        }
    }
}

impl FromStr for K8sVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Err("k8s version cannot be empty".to_string()),
            "auto" => Ok(K8sVersion::Auto),
            tag if tag.chars().any(char::is_whitespace) => {
                Err(format!("Invalid k8s version '{}'", tag))
            }
            tag => Ok(K8sVersion::Tag(tag.to_string())),
        }
    }
}
