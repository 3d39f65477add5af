mod atomic;
mod cli;
mod config;
mod deps;
mod go;
mod output;
mod reconcile;
mod renovate;

use clap::Parser;
use cli::{Cli, Command, K8sVersion};
use deps::IgnoreSet;
use go::ModuleInfo;
use output::{CheckReport, UpdateReport};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
enum CheckError {
    #[error("some dependencies are not pinned to k8s upstream's version")]
    NotPinned,
}

/// Everything both subcommands compare
struct Inputs {
    k8s_version: String,
    local: ModuleInfo,
    upstream: ModuleInfo,
    ignored: IgnoreSet,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let json_output = cli.json;

    let result = match cli.command {
        Some(Command::Check {
            directory,
            k8s_version,
            ignore_file,
        }) => run_check(directory, &k8s_version, ignore_file, json_output),
        Some(Command::UpdateRenovate {
            directory,
            k8s_version,
            ignore_file,
            output,
            merge,
        }) => run_update_renovate(
            directory,
            &k8s_version,
            ignore_file,
            &output,
            merge,
            json_output,
        ),
        None => {
            eprintln!("No command specified. Use --help for usage information.");
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn run_check(
    directory: Option<PathBuf>,
    k8s_version: &K8sVersion,
    ignore_file: Option<PathBuf>,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let inputs = resolve_inputs(directory, k8s_version, ignore_file)?;

    if inputs.local.go_version != inputs.upstream.go_version {
        log::warn!(
            "Go version is different, local={} vs upstream={}",
            display_or_none(&inputs.local.go_version),
            display_or_none(&inputs.upstream.go_version)
        );
    }
    if inputs.local.toolchain != inputs.upstream.toolchain {
        log::warn!(
            "Go toolchain is different, local={} vs upstream={}",
            display_or_none(&inputs.local.toolchain),
            display_or_none(&inputs.upstream.toolchain)
        );
    }

    let differences = reconcile::differences(
        &inputs.local.deps,
        &inputs.upstream.deps,
        &inputs.ignored,
    );
    let pinned = differences.is_empty();

    if json_output {
        output::print_json(&CheckReport::new(
            &inputs.k8s_version,
            inputs.local.go_version.as_deref(),
            inputs.upstream.go_version.as_deref(),
            differences,
        ))?;
    } else {
        for diff in &differences {
            eprintln!("{}", output::difference_line(diff));
        }
        if pinned {
            println!(
                "Dependencies are pinned to k8s {} upstream versions",
                inputs.k8s_version
            );
        }
    }

    if !pinned {
        return Err(CheckError::NotPinned.into());
    }
    Ok(())
}

fn run_update_renovate(
    directory: Option<PathBuf>,
    k8s_version: &K8sVersion,
    ignore_file: Option<PathBuf>,
    output_path: &Path,
    merge: bool,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let inputs = resolve_inputs(directory, k8s_version, ignore_file)?;

    let rules = reconcile::pinning_rules(&inputs.upstream.deps, &inputs.ignored);
    let summary = renovate::write_rules(output_path, rules, merge)?;

    if json_output {
        output::print_json(&UpdateReport {
            k8s_version: inputs.k8s_version,
            summary,
        })?;
    } else if summary.merged {
        println!(
            "Appended {} rules for k8s {} to {} ({} total)",
            summary.rules,
            inputs.k8s_version,
            summary.output.display(),
            summary.total_rules
        );
    } else {
        println!(
            "Wrote {} rules for k8s {} to {}",
            summary.rules,
            inputs.k8s_version,
            summary.output.display()
        );
    }

    Ok(())
}

/// Local deps, the upstream release and its deps, and the ignore list, in
/// that order.
fn resolve_inputs(
    directory: Option<PathBuf>,
    k8s_version: &K8sVersion,
    ignore_file: Option<PathBuf>,
) -> Result<Inputs, Box<dyn std::error::Error>> {
    let config = config::Config::load()?;
    let directory = directory.unwrap_or_else(|| PathBuf::from("."));

    let local = go::local::local_dependencies(&directory, &config.go_binary)?;
    let version = go::upstream::resolve_version(k8s_version, &local.deps)?;
    if *k8s_version == K8sVersion::Auto {
        log::info!("Detected k8s version {}", version);
    }

    let upstream = go::upstream::k8s_dependencies(&config.upstream_url, &version)?;
    if upstream.deps.is_empty() {
        log::warn!("Upstream go.mod for {} pins no modules", version);
    }

    let ignored = match ignore_file.or(config.ignore_file) {
        Some(path) => {
            IgnoreSet::load(&path).map_err(|e| format!("parsing ignore-file: {}", e))?
        }
        None => IgnoreSet::new(),
    };
    if !ignored.is_empty() {
        log::debug!("Ignoring {} modules", ignored.len());
    }

    Ok(Inputs {
        k8s_version: version,
        local,
        upstream,
        ignored,
    })
}

fn display_or_none(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("none")
}
