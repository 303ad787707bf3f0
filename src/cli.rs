//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Harvest statute PDFs into a verified, resumable archive.
///
/// `run` discovers item pages from a listing, downloads each document, and
/// records provenance in a JSON manifest. Re-running skips verified downloads.
/// `verify` re-hashes every downloaded file against the manifest.
#[derive(Parser, Debug)]
#[command(name = "harvester")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored log output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Config file (default: $XDG_CONFIG_HOME/statute-harvester/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Root that relative output, manifest, and log paths resolve against
    #[arg(long, global = true, value_name = "DIR")]
    pub project_root: Option<PathBuf>,

    /// Manifest JSON path
    #[arg(short, long, global = true, value_name = "PATH")]
    pub manifest: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Discover, download, verify, and record documents
    Run(RunArgs),
    /// Re-hash every downloaded document listed in the manifest
    Verify,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Listing page that links to the item pages
    #[arg(short = 's', long, value_name = "URL")]
    pub start_url: Option<String>,

    /// Directory receiving downloaded documents
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Append-only error log path
    #[arg(long, value_name = "PATH")]
    pub error_log: Option<PathBuf>,

    /// Maximum concurrent items (1-100)
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: Option<u8>,

    /// Longest stall while fetching a document, in seconds (1-3600)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub fetch_timeout_secs: Option<u64>,

    /// Page load timeout in seconds (1-3600)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub page_timeout_secs: Option<u64>,

    /// Only item links whose URL matches this regex are harvested
    #[arg(long, value_name = "REGEX", allow_hyphen_values = true)]
    pub link_pattern: Option<String>,

    /// Append a short hash of the item key to each file name
    #[arg(long)]
    pub disambiguate_names: bool,

    /// Re-hash stored files before skipping them
    #[arg(long)]
    pub verify_on_skip: bool,

    /// User-Agent for document and page requests
    #[arg(long, value_name = "UA")]
    pub user_agent: Option<String>,
}
