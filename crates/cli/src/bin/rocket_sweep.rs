//! Run a wind sweep of an external rocket flight simulator and export one CSV per run.

use std::path::PathBuf;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use rocket_sweep::config::{SweepConfig, load_sweep_config};
use rocket_sweep::engine::ProcessEngine;
use rocket_sweep::sweep::{SweepPlan, engine_settings, run_sweep};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Sweep wind speed and turbulence across simulator runs, one CSV per run"
)]
struct Cli {
    /// Sweep configuration file (TOML or YAML); flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Rocket design document to simulate
    #[arg(long)]
    document: Option<PathBuf>,

    /// Base directory for results
    #[arg(long)]
    output_root: Option<PathBuf>,

    /// Number of simulations in the sweep
    #[arg(long)]
    iterations: Option<usize>,

    /// Wind speed of the first run (m/s)
    #[arg(long)]
    base_wind_speed: Option<f64>,

    /// Wind speed added per iteration (m/s)
    #[arg(long)]
    wind_step: Option<f64>,

    /// Turbulence intensity of the first run
    #[arg(long)]
    base_turbulence: Option<f64>,

    /// Turbulence intensity added per iteration
    #[arg(long)]
    turbulence_step: Option<f64>,

    /// Simulator executable
    #[arg(long)]
    engine: Option<String>,

    /// Extra argument passed to the simulator before the sweep options (repeatable)
    #[arg(long = "engine-arg", allow_hyphen_values = true)]
    engine_args: Vec<String>,

    /// Skip writing sweep.json
    #[arg(long, default_value_t = false)]
    no_manifest: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    let plan = SweepPlan::from_config(&config);

    let engine = ProcessEngine::init(engine_settings(&config))
        .context("failed to initialize simulation engine")?;
    let started_at = Local::now().naive_local();
    let report = run_sweep(&engine, &plan, started_at).context("sweep aborted")?;

    println!("=== Sweep Complete ===");
    println!("Output directory : {}", report.directory.display());
    for run in &report.runs {
        println!(
            "  [{}] wind = {:.3} m/s, turbulence = {:.3} -> {} ({} rows)",
            run.iteration,
            run.wind_speed,
            run.turbulence,
            run.path.display(),
            run.rows
        );
    }
    if let Some(manifest) = &report.manifest {
        println!("Manifest         : {}", manifest.display());
    }
    Ok(())
}

fn resolve_config(cli: &Cli) -> anyhow::Result<SweepConfig> {
    let mut config = match &cli.config {
        Some(path) => load_sweep_config(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SweepConfig::default(),
    };

    if let Some(document) = &cli.document {
        config.document_path = document.clone();
    }
    if let Some(root) = &cli.output_root {
        config.output_root = root.clone();
    }
    if let Some(iterations) = cli.iterations {
        config.iterations = iterations;
    }
    if let Some(v) = cli.base_wind_speed {
        config.sweep.base_wind_speed = v;
    }
    if let Some(v) = cli.wind_step {
        config.sweep.wind_step = v;
    }
    if let Some(v) = cli.base_turbulence {
        config.sweep.base_turbulence = v;
    }
    if let Some(v) = cli.turbulence_step {
        config.sweep.turbulence_step = v;
    }
    if let Some(engine) = &cli.engine {
        config.engine.command = Some(engine.clone());
    }
    if !cli.engine_args.is_empty() {
        config.engine.args = cli.engine_args.clone();
    }
    if cli.no_manifest {
        config.manifest = false;
    }

    config.validate().context("invalid sweep configuration")?;
    Ok(config)
}
