use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use harvester_core::{DEFAULT_CONCURRENCY, FetchSettings, RendererSettings};
use regex::Regex;

use crate::app_config::{FileConfig, VerbositySetting};
use crate::cli::{Cli, RunArgs};

pub(crate) const DEFAULT_OUTPUT_DIR: &str = "Data/raw/pakistancode_civil_pdfs_en";
pub(crate) const DEFAULT_MANIFEST_PATH: &str = "Data/metadata/pakistancode_manifest_en.json";
pub(crate) const DEFAULT_ERROR_LOG_PATH: &str = "Data/metadata/pakistancode_download_errors.log";

/// Effective settings of a `run` after CLI, file, and default layers are merged.
#[derive(Debug, Clone)]
pub(crate) struct RunSettings {
    pub(crate) start_url: String,
    pub(crate) project_root: PathBuf,
    pub(crate) output_dir: PathBuf,
    pub(crate) manifest_path: PathBuf,
    pub(crate) error_log_path: PathBuf,
    pub(crate) concurrency: usize,
    pub(crate) link_pattern: Option<Regex>,
    pub(crate) disambiguate_names: bool,
    pub(crate) verify_on_skip: bool,
    pub(crate) fetch: FetchSettings,
    pub(crate) renderer: RendererSettings,
}

/// Effective settings of a `verify`.
#[derive(Debug, Clone)]
pub(crate) struct VerifySettings {
    pub(crate) project_root: PathBuf,
    pub(crate) manifest_path: PathBuf,
}

pub(crate) fn resolve_run_settings(
    cli: &Cli,
    args: &RunArgs,
    file_config: &FileConfig,
) -> Result<RunSettings> {
    let Some(start_url) = args
        .start_url
        .clone()
        .or_else(|| file_config.start_url.clone())
    else {
        bail!("No start URL configured. Pass --start-url or set `start_url` in the config file");
    };
    url::Url::parse(&start_url)
        .with_context(|| format!("Invalid start URL '{start_url}': expected an absolute URL"))?;

    let project_root = resolve_project_root(cli.project_root.as_deref(), file_config)?;
    let output_dir = resolve_against(
        &project_root,
        args.output_dir
            .as_deref()
            .or(file_config.output_dir.as_deref())
            .unwrap_or(Path::new(DEFAULT_OUTPUT_DIR)),
    );
    let manifest_path = resolve_manifest_path(&project_root, cli, file_config);
    let error_log_path = resolve_against(
        &project_root,
        args.error_log
            .as_deref()
            .or(file_config.error_log_path.as_deref())
            .unwrap_or(Path::new(DEFAULT_ERROR_LOG_PATH)),
    );

    let concurrency = args
        .concurrency
        .or(file_config.concurrency)
        .map_or(DEFAULT_CONCURRENCY, usize::from);

    let link_pattern = match args
        .link_pattern
        .as_deref()
        .or(file_config.link_pattern.as_deref())
    {
        Some(pattern) => Some(
            Regex::new(pattern)
                .with_context(|| format!("Invalid link pattern '{pattern}'"))?,
        ),
        None => None,
    };

    let mut fetch = FetchSettings::default();
    let mut renderer = RendererSettings::default();
    if let Some(secs) = args.fetch_timeout_secs.or(file_config.fetch_timeout_secs) {
        fetch.fetch_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = args.page_timeout_secs.or(file_config.page_timeout_secs) {
        renderer.page_timeout = Duration::from_secs(secs);
    }
    if let Some(user_agent) = args
        .user_agent
        .clone()
        .or_else(|| file_config.user_agent.clone())
    {
        fetch.user_agent.clone_from(&user_agent);
        renderer.user_agent = user_agent;
    }

    Ok(RunSettings {
        start_url,
        project_root,
        output_dir,
        manifest_path,
        error_log_path,
        concurrency,
        link_pattern,
        disambiguate_names: args.disambiguate_names
            || file_config.disambiguate_names.unwrap_or(false),
        verify_on_skip: args.verify_on_skip || file_config.verify_on_skip.unwrap_or(false),
        fetch,
        renderer,
    })
}

pub(crate) fn resolve_verify_settings(cli: &Cli, file_config: &FileConfig) -> Result<VerifySettings> {
    let project_root = resolve_project_root(cli.project_root.as_deref(), file_config)?;
    let manifest_path = resolve_manifest_path(&project_root, cli, file_config);
    Ok(VerifySettings {
        project_root,
        manifest_path,
    })
}

fn resolve_manifest_path(project_root: &Path, cli: &Cli, file_config: &FileConfig) -> PathBuf {
    resolve_against(
        project_root,
        cli.manifest
            .as_deref()
            .or(file_config.manifest_path.as_deref())
            .unwrap_or(Path::new(DEFAULT_MANIFEST_PATH)),
    )
}

/// Project root from CLI, then config, then the working directory; always absolute.
fn resolve_project_root(cli_value: Option<&Path>, file_config: &FileConfig) -> Result<PathBuf> {
    let cwd = env::current_dir().context("Failed to read the current working directory")?;
    Ok(match cli_value.or(file_config.project_root.as_deref()) {
        Some(root) => resolve_against(&cwd, root),
        None => cwd,
    })
}

pub(crate) fn resolve_against(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

pub(crate) fn resolve_default_log_level(
    verbose: u8,
    quiet: bool,
    file_verbosity: Option<VerbositySetting>,
) -> &'static str {
    if should_force_cli_log_level(verbose, quiet) {
        return if quiet {
            "error"
        } else if verbose == 1 {
            "debug"
        } else {
            "trace"
        };
    }
    match file_verbosity {
        Some(VerbositySetting::Quiet) => "error",
        Some(VerbositySetting::Verbose) => "debug",
        Some(VerbositySetting::Debug) => "trace",
        Some(VerbositySetting::Default) | None => "info",
    }
}

pub(crate) fn should_force_cli_log_level(verbose: u8, quiet: bool) -> bool {
    verbose > 0 || quiet
}

/// Quiet mode after merging the CLI flag with the config verbosity.
pub(crate) fn effective_quiet(quiet: bool, file_verbosity: Option<VerbositySetting>) -> bool {
    quiet || file_verbosity == Some(VerbositySetting::Quiet)
}
