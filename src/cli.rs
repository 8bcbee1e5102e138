// Copyright © 2024 SiteForge. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Command-line interface for SiteForge
//!
//! Argument parsing and command execution for the `siteforge` binary.
//!
//! # Examples
//!
//! ```
//! use siteforge::cli;
//! use std::path::PathBuf;
//!
//! let matches = cli::build().get_matches_from(vec![
//!     "siteforge",
//!     "build",
//!     "--root",
//!     "my-site",
//!     "--minify",
//! ]);
//!
//! let build_cmd = matches.subcommand_matches("build").unwrap();
//! assert_eq!(
//!     build_cmd.get_one::<PathBuf>("root").unwrap(),
//!     &PathBuf::from("my-site")
//! );
//! assert!(build_cmd.get_flag("minify"));
//! ```

use std::path::{Path, PathBuf};

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use log::{debug, info, warn};
use serde::Serialize;

use crate::core::config::{BuildConfig, ConfigBuilder};
use crate::core::error::{Result, SiteForgeError};
use crate::passthrough::{PassthroughRegistry, PassthroughRule};
use crate::SiteForge;

/// The current version of SiteForge, as defined in `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prefix of the environment variables read as configuration.
pub const ENV_PREFIX: &str = "SITEFORGE_";

/// Configuration file picked up from the project root when present.
pub const DEFAULT_CONFIG_FILE: &str = "siteforge.toml";

fn root_arg() -> Arg {
    Arg::new("root")
        .short('r')
        .long("root")
        .help("Project root; directories are resolved against it")
        .value_parser(value_parser!(PathBuf))
        .default_value(".")
}

fn config_arg() -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .help("Configuration file (defaults to <root>/siteforge.toml if present)")
        .value_parser(value_parser!(PathBuf))
}

/// Builds and configures the SiteForge command-line interface.
pub fn build() -> Command {
    debug!("Building CLI command structure");

    Command::new("siteforge")
        .author("SiteForge Contributors")
        .about("Builds a static site from templates, Markdown and assets.")
        .version(VERSION)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase log verbosity (-v, -vv)")
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand(
            Command::new("build")
                .about("Build the site")
                .arg(root_arg())
                .arg(config_arg())
                .arg(
                    Arg::new("input")
                        .short('i')
                        .long("input")
                        .help("Input directory, overriding the configuration")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("Output directory, overriding the configuration")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("minify")
                        .short('m')
                        .long("minify")
                        .help("Minify HTML output")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Print the resolved configuration as JSON")
                .arg(root_arg())
                .arg(config_arg()),
        )
}

/// Executes the subcommand in `matches`.
pub fn run(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("build", sub)) => {
            let minify = sub.get_flag("minify");
            let engine = load_engine(sub)?.with_minify(minify);
            let report = engine.build()?;

            for source in &report.skipped_passthrough {
                warn!("Skipped missing passthrough source {}", source.display());
            }
            println!(
                "Wrote {} page(s) and copied {} file(s) to {} in {:.2?}",
                report.pages,
                report.copied,
                engine.output_dir().display(),
                report.duration
            );
            Ok(())
        }
        Some(("config", sub)) => {
            let engine = load_engine(sub)?;
            println!(
                "{}",
                resolved_json(engine.config(), engine.passthrough())?
            );
            Ok(())
        }
        _ => Err(SiteForgeError::internal_error("Unknown command")),
    }
}

/// Resolves the configuration for a subcommand and wraps it in an engine.
fn load_engine(matches: &ArgMatches) -> Result<SiteForge> {
    let root = matches
        .get_one::<PathBuf>("root")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."));

    let mut builder = ConfigBuilder::new().with_env_prefix(ENV_PREFIX);
    if let Some(file) = config_file(&root, matches.get_one::<PathBuf>("config"))
    {
        info!("Using configuration file {}", file.display());
        builder = builder.with_file(file);
    }

    for (id, key) in [("input", "dir.input"), ("output", "dir.output")] {
        if let Ok(Some(path)) = matches.try_get_one::<PathBuf>(id) {
            builder = builder.with_override(key, path.display().to_string());
        }
    }

    let mut registry = PassthroughRegistry::new();
    let config = builder.build(&mut registry)?;
    Ok(SiteForge::with_config(root, config, registry))
}

fn config_file(root: &Path, explicit: Option<&PathBuf>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.clone());
    }
    let default = root.join(DEFAULT_CONFIG_FILE);
    default.is_file().then_some(default)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolvedConfig {
    #[serde(flatten)]
    config: BuildConfig,
    passthrough_copy: Vec<PassthroughRule>,
}

fn resolved_json(
    config: &BuildConfig,
    registry: &PassthroughRegistry,
) -> Result<String> {
    let resolved = ResolvedConfig {
        config: config.clone(),
        passthrough_copy: registry.rules().to_vec(),
    };
    serde_json::to_string_pretty(&resolved).map_err(|e| {
        SiteForgeError::internal_error(format!(
            "Failed to serialize configuration: {}",
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn get_matches(args: Vec<&str>) -> ArgMatches {
        build().get_matches_from(args)
    }

    #[test]
    fn test_build_command() {
        let matches = get_matches(vec![
            "siteforge",
            "build",
            "--root",
            "site",
            "--output",
            "public",
            "--minify",
        ]);
        let build_cmd = matches.subcommand_matches("build").unwrap();

        assert_eq!(
            build_cmd.get_one::<PathBuf>("root").unwrap(),
            &PathBuf::from("site")
        );
        assert_eq!(
            build_cmd.get_one::<PathBuf>("output").unwrap(),
            &PathBuf::from("public")
        );
        assert!(build_cmd.get_one::<PathBuf>("input").is_none());
        assert!(build_cmd.get_flag("minify"));
    }

    #[test]
    fn test_config_command_defaults() {
        let matches = get_matches(vec!["siteforge", "-vv", "config"]);
        assert_eq!(matches.get_count("verbose"), 2);

        let config_cmd = matches.subcommand_matches("config").unwrap();
        assert_eq!(
            config_cmd.get_one::<PathBuf>("root").unwrap(),
            &PathBuf::from(".")
        );
        assert!(config_cmd.get_one::<PathBuf>("config").is_none());
    }

    #[test]
    fn test_subcommand_required() {
        assert!(build().try_get_matches_from(vec!["siteforge"]).is_err());
    }

    #[test]
    fn test_config_file_discovery() {
        let temp_dir = TempDir::new().unwrap();
        assert_eq!(config_file(temp_dir.path(), None), None);

        let default = temp_dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&default, "").unwrap();
        assert_eq!(config_file(temp_dir.path(), None), Some(default));

        let explicit = PathBuf::from("other.toml");
        assert_eq!(
            config_file(temp_dir.path(), Some(&explicit)),
            Some(explicit)
        );
    }

    #[test]
    fn test_load_engine_applies_overrides() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().to_str().unwrap();
        std::fs::write(
            temp_dir.path().join(DEFAULT_CONFIG_FILE),
            "passthroughCopy = [\"static\"]\n[dir]\ninput = \"pages\"\n",
        )
        .unwrap();

        let matches = get_matches(vec![
            "siteforge", "build", "--root", root, "--output", "public",
        ]);
        let engine =
            load_engine(matches.subcommand_matches("build").unwrap()).unwrap();

        assert_eq!(engine.config().dir.input, PathBuf::from("pages"));
        assert_eq!(engine.config().dir.output, PathBuf::from("public"));
        let sources: Vec<_> = engine
            .passthrough()
            .rules()
            .iter()
            .map(|rule| rule.source.clone())
            .collect();
        assert_eq!(
            sources,
            vec![PathBuf::from("assets"), PathBuf::from("static")]
        );
    }

    #[test]
    fn test_resolved_json_shape() {
        let mut registry = PassthroughRegistry::new();
        let config = crate::configure(&mut registry);
        let value: serde_json::Value =
            serde_json::from_str(&resolved_json(&config, &registry).unwrap())
                .unwrap();

        assert_eq!(value["passthroughFileCopy"], true);
        assert_eq!(value["dir"]["output"], "_site");
        assert_eq!(value["passthroughCopy"][0]["source"], "assets");
        assert_eq!(value["passthroughCopy"][0]["target"], "assets");
    }
}
