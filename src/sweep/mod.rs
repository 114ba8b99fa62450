//! The sweep driver: one document, N simulations, one CSV per simulation.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use sweep_core::channels::{DataChannel, default_channels};
use sweep_engine::{
    CustomExpression, Document, DocumentLoadError, ExpressionError, SimulationEngine,
    SimulationError,
};
use sweep_export::ExportError;
use sweep_export::flight_csv::export_csv_file;
use sweep_export::manifest::{Manifest, ManifestRun, write_manifest};
use thiserror::Error;

use crate::layout::OutputLayout;

pub mod plan;

pub use plan::{SweepPlan, engine_settings};

/// Name of the derived dynamic pressure channel.
pub const DYNAMIC_PRESSURE_NAME: &str = "Dynamic Pressure";
pub const DYNAMIC_PRESSURE_SYMBOL: &str = "Q";
pub const DYNAMIC_PRESSURE_UNIT: &str = "Pa";
/// `q = ½·v²·ρ` with density from the ideal gas law (`ρ = P / (R·T)`).
pub const DYNAMIC_PRESSURE_FORMULA: &str = "0.5 * Vt^2 * P / (T*287)";

/// Failures that abort a sweep. Files written by earlier iterations are kept.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error(transparent)]
    DocumentLoad(#[from] DocumentLoadError),
    #[error("failed to register derived channels: {0}")]
    Expression(#[from] ExpressionError),
    #[error("failed to create output directory {path}: {source}")]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("iteration {iteration}: simulation failed: {source}")]
    Simulation {
        iteration: usize,
        #[source]
        source: SimulationError,
    },
    #[error("iteration {iteration}: failed to write {path}: {source}")]
    Export {
        iteration: usize,
        path: PathBuf,
        #[source]
        source: ExportError,
    },
    #[error("failed to write sweep manifest into {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: ExportError,
    },
}

impl SweepError {
    /// Iteration the failure happened in, if it happened inside the loop.
    pub fn iteration(&self) -> Option<usize> {
        match self {
            Self::Simulation { iteration, .. } | Self::Export { iteration, .. } => Some(*iteration),
            _ => None,
        }
    }
}

/// Parameters and output of one completed iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub iteration: usize,
    pub wind_speed: f64,
    pub turbulence: f64,
    pub path: PathBuf,
    pub rows: usize,
}

/// Outcome of a completed sweep.
#[derive(Debug, Clone)]
pub struct SweepReport {
    pub directory: PathBuf,
    pub started_at: NaiveDateTime,
    pub channels: Vec<DataChannel>,
    pub runs: Vec<RunRecord>,
    pub manifest: Option<PathBuf>,
}

/// Export columns plus the expressions the engine must evaluate to fill them.
#[derive(Debug, Clone)]
pub struct ChannelSet {
    pub channels: Vec<DataChannel>,
    pub expressions: Vec<CustomExpression>,
}

/// Attach the dynamic pressure expression to `document` and build the export
/// column list: the default channels followed by the derived one.
pub fn register_channels<E: SimulationEngine + ?Sized>(
    engine: &E,
    document: &mut Document,
) -> Result<ChannelSet, ExpressionError> {
    let dynamic_pressure = engine.attach_custom_expression(
        document,
        DYNAMIC_PRESSURE_NAME,
        DYNAMIC_PRESSURE_SYMBOL,
        DYNAMIC_PRESSURE_UNIT,
        DYNAMIC_PRESSURE_FORMULA,
    )?;
    let mut channels = default_channels();
    channels.push(dynamic_pressure.channel());
    Ok(ChannelSet {
        channels,
        expressions: vec![dynamic_pressure],
    })
}

/// Run the whole sweep against an initialized engine.
///
/// `started_at` is truncated to the minute and names the output directory.
/// The document is loaded before anything touches the filesystem, so a bad
/// document leaves no trace. The first failing iteration aborts the sweep.
pub fn run_sweep<E: SimulationEngine + ?Sized>(
    engine: &E,
    plan: &SweepPlan,
    started_at: NaiveDateTime,
) -> Result<SweepReport, SweepError> {
    let mut document = engine.load_document(&plan.document_path)?;
    tracing::info!(document = %document.path().display(), "design document loaded");

    let ChannelSet {
        channels,
        expressions,
    } = register_channels(engine, &mut document)?;

    let layout = OutputLayout::new(&plan.output_root, started_at);
    let directory = layout
        .create()
        .map_err(|source| SweepError::CreateOutputDir {
            path: layout.directory(),
            source,
        })?;
    tracing::info!(
        directory = %directory.display(),
        iterations = plan.parameters.iterations,
        "starting sweep"
    );

    let mut runs = Vec::with_capacity(plan.parameters.iterations);
    for iteration in 0..plan.parameters.iterations {
        let config = plan.parameters.config_for(iteration, &plan.launch);
        tracing::info!(
            iteration,
            wind_speed = config.wind_speed_average,
            turbulence = config.wind_turbulence_intensity,
            "running simulation"
        );

        let result = engine
            .run_simulation(&document, &config, &expressions)
            .map_err(|source| SweepError::Simulation { iteration, source })?;
        let branch = result
            .branch(0)
            .ok_or_else(|| SweepError::Simulation {
                iteration,
                source: SimulationError::NoData,
            })?;

        let path = layout.file_for(iteration);
        let rows = export_csv_file(&path, branch, &channels, &plan.format).map_err(|source| {
            SweepError::Export {
                iteration,
                path: path.clone(),
                source,
            }
        })?;
        tracing::debug!(iteration, rows, path = %path.display(), "flight data exported");

        runs.push(RunRecord {
            iteration,
            wind_speed: config.wind_speed_average,
            turbulence: config.wind_turbulence_intensity,
            path,
            rows,
        });
    }

    let manifest = if plan.write_manifest {
        let manifest = build_manifest(&document, plan, &layout, &channels, &runs);
        let path = write_manifest(&directory, &manifest).map_err(|source| {
            SweepError::Manifest {
                path: directory.clone(),
                source,
            }
        })?;
        Some(path)
    } else {
        None
    };

    tracing::info!(files = runs.len(), "sweep complete");
    Ok(SweepReport {
        directory,
        started_at: layout.started_at(),
        channels,
        runs,
        manifest,
    })
}

fn build_manifest(
    document: &Document,
    plan: &SweepPlan,
    layout: &OutputLayout,
    channels: &[DataChannel],
    runs: &[RunRecord],
) -> Manifest {
    Manifest {
        document: document.path().to_path_buf(),
        started_at: layout.started_at().format("%Y-%m-%dT%H:%M:%S").to_string(),
        parameters: plan.parameters,
        launch: plan.launch,
        channels: channels.iter().map(DataChannel::label).collect(),
        runs: runs
            .iter()
            .map(|run| ManifestRun {
                iteration: run.iteration,
                wind_speed_m_s: run.wind_speed,
                turbulence_intensity: run.turbulence,
                file: run
                    .path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                rows: run.rows,
            })
            .collect(),
    }
}
