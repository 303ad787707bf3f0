use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::sync::atomic::Ordering;

use anyhow::{Context, Result, bail};
use clap::Parser;
use harvester_core::{
    DiscoveryOptions, ErrorLog, FetchExecutor, HarvestConfig, Harvester, HttpClient,
    HttpPageRenderer, ManifestStore, SharedManifest, audit_downloads, discover_items,
};
use tracing::{debug, error, info};

use crate::app::config_runtime::{self, RunSettings, VerifySettings};
use crate::app::{exit_handler, progress_manager, terminal};
use crate::app_config;
use crate::cli::{Cli, Command};
use crate::{ProcessExit, output};

pub(crate) async fn run_harvester() -> Result<ProcessExit> {
    let cli = Cli::parse();
    let loaded = app_config::load_file_config(cli.config.as_deref())?;
    let file_config = loaded.file_config();

    let default_level =
        config_runtime::resolve_default_log_level(cli.verbose, cli.quiet, file_config.verbosity);
    let force_cli_log_level = config_runtime::should_force_cli_log_level(cli.verbose, cli.quiet);
    let no_color = terminal::is_no_color_requested(cli.no_color);
    terminal::init_tracing(default_level, force_cli_log_level, no_color);

    if loaded.loaded_from_file
        && let Some(path) = loaded.path.as_deref()
    {
        debug!(path = %path.display(), "loaded config file");
    }

    let quiet = config_runtime::effective_quiet(cli.quiet, file_config.verbosity);
    match &cli.command {
        Command::Run(args) => {
            let settings = config_runtime::resolve_run_settings(&cli, args, &file_config)?;
            run_harvest(settings, quiet).await
        }
        Command::Verify => {
            let settings = config_runtime::resolve_verify_settings(&cli, &file_config)?;
            run_verify(settings).await
        }
    }
}

async fn run_harvest(settings: RunSettings, quiet: bool) -> Result<ProcessExit> {
    info!(
        start_url = %settings.start_url,
        output_dir = %settings.output_dir.display(),
        manifest = %settings.manifest_path.display(),
        concurrency = settings.concurrency,
        "Harvester starting"
    );

    let renderer = Arc::new(
        HttpPageRenderer::new(&settings.renderer).context("Failed to build the page renderer")?,
    );
    let client =
        HttpClient::with_settings(&settings.fetch).context("Failed to build the HTTP client")?;

    let store = ManifestStore::load(&settings.manifest_path, settings.project_root.clone())
        .await
        .with_context(|| {
            format!(
                "Failed to load manifest '{}'",
                settings.manifest_path.display()
            )
        })?;
    let manifest = SharedManifest::new(store);

    let error_log = ErrorLog::new(&settings.error_log_path);

    let options = DiscoveryOptions {
        link_pattern: settings.link_pattern.clone(),
    };
    let items = match discover_items(renderer.as_ref(), &settings.start_url, &options).await {
        Ok(items) => items,
        Err(discovery_error) => {
            error!(error = %discovery_error, "discovery failed; aborting run");
            error_log
                .append(&format!("Discovery failed: {discovery_error}"))
                .await;
            return Err(discovery_error).context("Discovery failed");
        }
    };

    tokio::fs::create_dir_all(&settings.output_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create output directory '{}'",
                settings.output_dir.display()
            )
        })?;

    let mut config = HarvestConfig::new(&settings.output_dir);
    config.concurrency = settings.concurrency;
    config.disambiguate_names = settings.disambiguate_names;
    config.verify_on_skip = settings.verify_on_skip;

    let harvester = Harvester::new(
        config,
        renderer,
        FetchExecutor::new(Arc::new(client)),
        manifest,
        error_log,
    )?;

    let total = items.len();
    let use_spinner = terminal::should_use_spinner(
        io::stderr().is_terminal(),
        quiet,
        terminal::is_dumb_terminal(),
    );
    let (progress_handle, progress_stop) =
        progress_manager::spawn_progress_ui(use_spinner, harvester.stats(), total);

    let result = harvester.run(items).await;

    progress_stop.store(true, Ordering::SeqCst);
    if let Some(handle) = progress_handle {
        let _ = handle.await;
    }

    let summary = result.context("Harvest failed")?;
    output::print_harvest_summary(
        &summary,
        &settings.output_dir,
        &settings.manifest_path,
        &settings.error_log_path,
    );
    Ok(ProcessExit::Success)
}

async fn run_verify(settings: VerifySettings) -> Result<ProcessExit> {
    if !settings.manifest_path.is_file() {
        bail!(
            "Manifest '{}' does not exist",
            settings.manifest_path.display()
        );
    }

    let store = ManifestStore::load(&settings.manifest_path, settings.project_root)
        .await
        .with_context(|| {
            format!(
                "Failed to load manifest '{}'",
                settings.manifest_path.display()
            )
        })?;
    info!(records = store.len(), "verifying downloaded documents");

    let report = audit_downloads(&store).await;
    output::print_audit_report(&report);
    Ok(exit_handler::determine_verify_exit(&report))
}
