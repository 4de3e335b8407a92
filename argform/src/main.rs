//! Offline driver for the argument form engine.
//!
//! Loads an args spec, optionally pre-fills it from a saved parameter set, and
//! prints arg trees or validation results as JSON.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use argform::core::arg_tree::build_arg_tree;
use argform::core::types::ArgValues;
use argform::exit_codes;
use argform::io::batch::load_batch;
use argform::io::config::load_config;
use argform::io::spec_store::load_args_spec;
use argform::io::validator::CommandValidator;
use argform::{ArgsSession, SessionOptions, SessionSnapshot, ValidationReport, logging};
use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Parser)]
#[command(
    name = "argform",
    version,
    about = "Argument form and validation engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the display grouping of a spec's arguments.
    Tree {
        /// Args spec JSON file.
        #[arg(long)]
        spec: PathBuf,
    },
    /// Run one validation round and print per-argument validity.
    Validate {
        #[arg(long)]
        spec: PathBuf,
        /// Saved parameter set or run log to pre-fill the form with.
        #[arg(long)]
        args: Option<PathBuf>,
        /// Only report on this argument.
        #[arg(long)]
        limit_to: Option<String>,
        #[arg(long, default_value = "argform.toml")]
        config: PathBuf,
    },
    /// Import a parameter set into a fresh form and print the result.
    Import {
        #[arg(long)]
        spec: PathBuf,
        #[arg(long)]
        batch: PathBuf,
        #[arg(long, default_value = "argform.toml")]
        config: PathBuf,
    },
}

#[derive(Serialize)]
struct CliReport {
    report: ValidationReport,
    state: SessionSnapshot,
}

#[tokio::main]
async fn main() {
    logging::init();
    match run().await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::ERROR);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Tree { spec } => cmd_tree(&spec),
        Command::Validate {
            spec,
            args,
            limit_to,
            config,
        } => cmd_validate(&spec, args.as_deref(), limit_to.as_deref(), &config).await,
        Command::Import {
            spec,
            batch,
            config,
        } => cmd_import(&spec, &batch, &config).await,
    }
}

fn cmd_tree(spec_path: &Path) -> Result<i32> {
    let spec = load_args_spec(spec_path)?;
    print_json(&build_arg_tree(&spec))?;
    Ok(exit_codes::OK)
}

async fn cmd_validate(
    spec_path: &Path,
    args_path: Option<&Path>,
    limit_to: Option<&str>,
    config_path: &Path,
) -> Result<i32> {
    let spec = load_args_spec(spec_path)?;
    let initial = match args_path {
        Some(path) => {
            let payload = load_batch(path)?;
            if payload.module != spec.module {
                bail!(
                    "{} targets module '{}' but the spec is for '{}'",
                    path.display(),
                    payload.module,
                    spec.module
                );
            }
            payload.args
        }
        None => ArgValues::new(),
    };

    let session = open_session(spec, initial, config_path)?;
    let report = session.validate(limit_to).await?;
    finish(report, session.snapshot())
}

async fn cmd_import(spec_path: &Path, batch_path: &Path, config_path: &Path) -> Result<i32> {
    let spec = load_args_spec(spec_path)?;
    let session = open_session(spec, ArgValues::new(), config_path)?;
    let report = session.import_file(batch_path).await?;
    finish(report, session.snapshot())
}

fn open_session(
    spec: argform::ArgsSpec,
    initial: ArgValues,
    config_path: &Path,
) -> Result<ArgsSession> {
    let config = load_config(config_path).context("load config")?;
    let validator = Arc::new(CommandValidator::new(config.validator.clone()));
    Ok(ArgsSession::new(
        spec,
        initial,
        validator,
        SessionOptions::from(&config),
    ))
}

fn finish(report: ValidationReport, state: SessionSnapshot) -> Result<i32> {
    let invalid = state
        .validation
        .values()
        .any(|entry| entry.valid == Some(false));
    print_json(&CliReport { report, state })?;
    Ok(if invalid {
        exit_codes::INVALID
    } else {
        exit_codes::OK
    })
}

/// Print `value` as pretty JSON on stdout.
fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value).context("serialize json")?;
    println!("{payload}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tree() {
        let cli = Cli::parse_from(["argform", "tree", "--spec", "spec.json"]);
        assert!(matches!(cli.command, Command::Tree { spec } if spec == Path::new("spec.json")));
    }

    #[test]
    fn parse_validate_defaults_config() {
        let cli = Cli::parse_from([
            "argform",
            "validate",
            "--spec",
            "s.json",
            "--limit-to",
            "lulc",
        ]);
        match cli.command {
            Command::Validate {
                args,
                limit_to,
                config,
                ..
            } => {
                assert_eq!(args, None);
                assert_eq!(limit_to.as_deref(), Some("lulc"));
                assert_eq!(config, PathBuf::from("argform.toml"));
            }
            _ => panic!("expected validate"),
        }
    }

    #[test]
    fn parse_import_requires_batch() {
        assert!(Cli::try_parse_from(["argform", "import", "--spec", "s.json"]).is_err());
    }
}
