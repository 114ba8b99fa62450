//! Conversion from file/CLI configuration into a runnable sweep plan.

use std::path::PathBuf;

use sweep_config::SweepConfig;
use sweep_core::options::LaunchSettings;
use sweep_core::schedule::SweepParameters;
use sweep_engine::EngineSettings;
use sweep_export::flight_csv::CsvFormat;

/// Everything the driver needs besides the engine handle and the start time.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPlan {
    pub document_path: PathBuf,
    pub output_root: PathBuf,
    pub parameters: SweepParameters,
    pub launch: LaunchSettings,
    pub format: CsvFormat,
    pub write_manifest: bool,
}

impl SweepPlan {
    /// Build a plan from a validated configuration.
    pub fn from_config(config: &SweepConfig) -> Self {
        Self {
            document_path: config.document_path.clone(),
            output_root: config.output_root.clone(),
            parameters: SweepParameters {
                iterations: config.iterations,
                base_wind_speed: config.sweep.base_wind_speed,
                wind_step: config.sweep.wind_step,
                base_turbulence: config.sweep.base_turbulence,
                turbulence_step: config.sweep.turbulence_step,
            },
            launch: LaunchSettings {
                rod_length_m: config.launch.rod_length_m,
                rod_angle_deg: config.launch.rod_angle_deg,
                into_wind: config.launch.into_wind,
            },
            format: CsvFormat {
                delimiter: config
                    .export
                    .delimiter
                    .as_bytes()
                    .first()
                    .copied()
                    .unwrap_or(b','),
                precision: config.export.precision,
                comment_marker: config.export.comment_marker.clone(),
                field_comments: config.export.field_comments,
            },
            write_manifest: config.manifest,
        }
    }
}

/// Engine settings carried in the same configuration file.
pub fn engine_settings(config: &SweepConfig) -> EngineSettings {
    EngineSettings {
        command: config.engine.command.clone(),
        args: config.engine.args.clone(),
    }
}
