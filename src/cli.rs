//! CLI struct definitions for the docgate command-line interface.
//!
//! All clap-derived types live here. Dispatch logic lives in `lib.rs`.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "docgate",
    version = env!("CARGO_PKG_VERSION"),
    about = "Verifies that policy documents, plan lifecycle metadata and the conformance artifact of a repository meet their governance rules.",
    disable_version_flag = true
)]
pub(crate) struct Cli {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Run every governance gate and emit the report
    #[clap(name = "verify", visible_alias = "v")]
    Verify(VerifyCli),
    /// Inspect or edit a document's `## Metadata` section
    Metadata(MetadataCli),
    /// List resolved plans across lifecycle buckets
    Plans(PlansCli),
    /// Print the version
    Version,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

#[derive(clap::Args, Debug)]
pub(crate) struct RepoArgs {
    /// Repository root (defaults to the current directory).
    #[clap(long)]
    pub root: Option<PathBuf>,
    /// Engine configuration file (defaults to `.docgate/config.toml` under the root).
    #[clap(long)]
    pub config: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub(crate) struct VerifyCli {
    #[clap(flatten)]
    pub repo: RepoArgs,
    /// Schema file overriding the configured or built-in schema.
    #[clap(long)]
    pub schema: Option<PathBuf>,
    /// Staleness threshold in days. Must be a positive integer.
    #[clap(long = "stale-days")]
    pub stale_days: Option<String>,
    /// Output format for stdout.
    #[clap(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
    /// Report artifact path (defaults to the configured report path).
    #[clap(long)]
    pub report: Option<PathBuf>,
    /// Do not write the report artifact.
    #[clap(long = "no-report", conflicts_with = "report")]
    pub no_report: bool,
}

#[derive(clap::Args, Debug)]
pub(crate) struct MetadataCli {
    #[clap(subcommand)]
    pub command: MetadataCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum MetadataCommand {
    /// Print the parsed metadata section as JSON
    Show {
        file: PathBuf,
    },
    /// Merge fields into the metadata section and rewrite the file
    Set {
        file: PathBuf,
        /// `Key=Value`, repeatable.
        #[clap(long = "field", required = true)]
        fields: Vec<String>,
    },
}

#[derive(clap::Args, Debug)]
pub(crate) struct PlansCli {
    #[clap(flatten)]
    pub repo: RepoArgs,
    #[clap(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}
