//! docgate: governance verification for documentation-driven repositories.
//!
//! A repository governed by docgate keeps three kinds of artifacts honest:
//!
//! - **Policy documents** (agent-hardening docs and friends) with a
//!   `## Metadata` section and a fixed set of level-2 headings
//! - **Plans** under `docs/plans/{future,active,completed}/` whose status must
//!   agree with the bucket they live in
//! - **A conformance artifact** (`capabilities.json`) whose evidence paths must
//!   stay inside the repository and exist
//!
//! `docgate verify` runs every gate, prints a transcript, writes a JSON report
//! and exits non-zero iff at least one error finding exists. Warnings
//! (staleness, pending transitions) never fail a run.
//!
//! # Usage
//!
//! ```bash
//! docgate verify
//! docgate verify --format json --no-report
//! docgate metadata set docs/plans/active/auth.md --field Status=validation
//! docgate plans --format json
//! ```
//!
//! # Module Organization
//!
//! - [`core`]: extraction, schema checks, lifecycle tracking, conformance
//!   checks, report aggregation and the pipeline that wires them together

mod cli;
pub mod core;

use crate::cli::{Cli, Command, MetadataCommand, OutputFormat, PlansCli, RepoArgs, VerifyCli};
use crate::core::config::{self, GovernanceConfig};
use crate::core::error::DocgateError;
use crate::core::lifecycle::{self, Plan};
use crate::core::validate::{self, VerifyOptions};
use crate::core::{corpus, metadata, output, time};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parses the command line and runs it. Returns the process exit code.
pub fn run() -> Result<i32, DocgateError> {
    let cli = Cli::parse();
    match cli.command {
        Command::Version => {
            println!("v{}", VERSION);
            Ok(0)
        }
        Command::Verify(verify_cli) => run_verify(verify_cli),
        Command::Metadata(metadata_cli) => match metadata_cli.command {
            MetadataCommand::Show { file } => {
                show_metadata(&file)?;
                Ok(0)
            }
            MetadataCommand::Set { file, fields } => {
                set_metadata(&file, &fields)?;
                Ok(0)
            }
        },
        Command::Plans(plans_cli) => {
            list_plans(plans_cli)?;
            Ok(0)
        }
    }
}

fn resolve_repo(args: &RepoArgs) -> Result<(PathBuf, GovernanceConfig), DocgateError> {
    let root = match &args.root {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let config = GovernanceConfig::load(&root, args.config.as_deref())?;
    Ok((root, config))
}

fn run_verify(cli: VerifyCli) -> Result<i32, DocgateError> {
    let (root, config) = resolve_repo(&cli.repo)?;
    // Threshold problems are fatal before any document is read.
    let env_days = std::env::var(config::STALE_DAYS_ENV).ok();
    let stale_after_days = config::resolve_stale_days(
        cli.stale_days.as_deref(),
        env_days.as_deref(),
        config.stale_after_days,
    )?;
    let options = VerifyOptions {
        schema_override: cli.schema.clone(),
        stale_after_days,
        today: time::today()?,
        generated_at_utc: time::now_utc_rfc3339(),
    };

    let report = validate::run_verification(&root, &config, &options)?;

    let report_path = match (cli.no_report, cli.report) {
        (true, _) => None,
        (false, Some(path)) => Some(path),
        (false, None) => Some(root.join(&config.report_path)),
    };
    if let Some(path) = &report_path {
        report.write_artifact(path)?;
    }

    match cli.format {
        OutputFormat::Json => println!("{}", report.to_json_pretty()?),
        OutputFormat::Text => {
            if let Some(path) = &report_path {
                println!("docgate: report written to {}", path.display());
            }
            output::print_transcript(&report);
        }
    }
    Ok(report.exit_code())
}

fn show_metadata(file: &Path) -> Result<(), DocgateError> {
    let text = fs::read_to_string(file).map_err(|e| DocgateError::io_at(file, e))?;
    let md = metadata::extract_metadata(&text);
    let body = serde_json::to_string_pretty(md.entries()).map_err(|e| {
        DocgateError::ValidationError(format!("Unable to serialize metadata: {e}"))
    })?;
    println!("{}", body);
    Ok(())
}

/// `Key=Value` pairs from repeated `--field` flags.
pub fn parse_field_assignments(raw: &[String]) -> Result<Vec<(String, String)>, DocgateError> {
    raw.iter()
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.trim().to_string()))
            }
            _ => Err(DocgateError::ConfigError(format!(
                "expected --field Key=Value, got `{pair}`"
            ))),
        })
        .collect()
}

fn set_metadata(file: &Path, raw_fields: &[String]) -> Result<(), DocgateError> {
    let updates = parse_field_assignments(raw_fields)?;
    let text = fs::read_to_string(file).map_err(|e| DocgateError::io_at(file, e))?;
    let merged = metadata::extract_metadata(&text).merged_with(&updates);
    let rewritten = metadata::upsert_metadata(&text, &merged);
    if rewritten != text {
        fs::write(file, &rewritten).map_err(|e| DocgateError::io_at(file, e))?;
    }
    println!(
        "docgate: metadata updated in {} ({} field(s))",
        file.display(),
        merged.len()
    );
    Ok(())
}

fn resolved_plans(root: &Path, config: &GovernanceConfig) -> Result<Vec<Plan>, DocgateError> {
    let schemas = validate::load_schemas(root, config, None)?;
    let discovered = corpus::discover_plans(root, &config.plans_root)?;
    let files = corpus::read_plans(root, &discovered)?;
    Ok(lifecycle::track_plans(&files, &validate::lifecycle_machine(&schemas)).plans)
}

fn list_plans(cli: PlansCli) -> Result<(), DocgateError> {
    let (root, config) = resolve_repo(&cli.repo)?;
    let plans = resolved_plans(&root, &config)?;
    match cli.format {
        OutputFormat::Json => {
            let body = serde_json::to_string_pretty(&plans).map_err(|e| {
                DocgateError::ValidationError(format!("Unable to serialize plans: {e}"))
            })?;
            println!("{}", body);
        }
        OutputFormat::Text => {
            for plan in &plans {
                let deps = if plan.dependencies.is_empty() {
                    "-".to_string()
                } else {
                    plan.dependencies.join(",")
                };
                println!(
                    "{:<9} {} status={} priority={} deps={}",
                    plan.bucket,
                    plan.plan_id,
                    plan.status.as_deref().unwrap_or("-"),
                    plan.priority.as_str(),
                    deps
                );
            }
            println!("docgate: {} plan(s)", plans.len());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_assignments_split_on_first_equals() {
        let parsed = parse_field_assignments(&[
            "Status = validation".to_string(),
            "Done-Evidence=a=b".to_string(),
            "Owner=".to_string(),
        ])
        .unwrap();
        assert_eq!(
            parsed,
            vec![
                ("Status".to_string(), "validation".to_string()),
                ("Done-Evidence".to_string(), "a=b".to_string()),
                ("Owner".to_string(), String::new()),
            ]
        );
        assert!(parse_field_assignments(&["Status".to_string()]).is_err());
        assert!(parse_field_assignments(&["=x".to_string()]).is_err());
    }
}
