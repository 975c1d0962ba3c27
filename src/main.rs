//! catalog-lens: one dashboard pass over a streaming catalog
//!
//! Loads configuration and the catalog, resolves the filter controls, then
//! renders the selected view to stdout and the chart directory.

use anyhow::{Context, Result};
use catalog_lens::dashboard::{prepare_output_dir, Dashboard, RenderOptions};
use catalog_lens::{load_catalog, Args, Config, FilterOptions};
use clap::Parser;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();
    init_tracing(args.verbose)?;

    let start_time = Instant::now();
    let config = Config::load(args.config.as_deref())?;

    // Step 1: Load the record store
    let catalog_path = args
        .input
        .clone()
        .unwrap_or_else(|| config.data.catalog_path.clone());
    let catalog = load_catalog(&catalog_path)
        .with_context(|| format!("failed to load catalog from {}", catalog_path.display()))?;

    // Step 2: Resolve the sidebar filter
    let options = FilterOptions::from_catalog(&catalog, &config.filters);
    let selection = args.filter_selection(&config.filters, &options)?;
    let view = selection.view(&catalog)?;
    tracing::info!(
        filter = %selection.active().describe(),
        rows = view.len(),
        total = catalog.len(),
        "view ready"
    );

    // Step 3: Render
    let mut dashboard = Dashboard::new(&catalog, view, &config);
    if let Some(geo) = &args.geo {
        dashboard = dashboard.with_geo_reference(geo.clone());
    }
    if !args.no_charts {
        let output_dir = args
            .output
            .clone()
            .unwrap_or_else(|| config.data.output_dir.clone());
        prepare_output_dir(&output_dir)?;
        dashboard = dashboard.with_output_dir(output_dir);
    }

    let render_options = RenderOptions {
        preview_rows: args.rows,
        show_all: args.all,
        details: args.detail_query(),
        title: args.title.clone(),
    };
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    dashboard.render(args.view, &render_options, &mut out)?;

    tracing::debug!(elapsed_ms = start_time.elapsed().as_millis() as u64, "pass complete");
    Ok(())
}

/// RUST_LOG wins; otherwise info, or debug with --verbose
fn init_tracing(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))
}
