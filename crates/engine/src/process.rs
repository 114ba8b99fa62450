//! Engine backend that runs an external simulator executable once per simulation.
//!
//! Invocation:
//!
//! ```text
//! <command> <args...> --document <path> --wind-speed <m/s> --turbulence <fraction>
//!     --rod-length <m> --rod-angle <deg> [--launch-into-wind]
//!     --expression "<name>;<symbol>;<unit>;<formula>" ...
//! ```
//!
//! Only the formula may contain `;`; split expressions on the first three.
//!
//! The simulator writes CSV to stdout: a header row of channel symbols followed
//! by one row per time step, values in SI. A `# branch: <name>` line starts a
//! new branch; other `#` lines and blank lines are ignored. Rows before the
//! first marker belong to a branch named `Main`.

use std::path::Path;
use std::process::{Command, Stdio};

use sweep_core::options::SimulationConfig;
use thiserror::Error;

use crate::document::Document;
use crate::expression::CustomExpression;
use crate::result::{FlightDataBranch, SimulationError, SimulationResult};
use crate::SimulationEngine;

const DEFAULT_BRANCH: &str = "Main";
const BRANCH_MARKER: &str = "branch:";

/// How to reach the simulator executable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineSettings {
    pub command: Option<String>,
    pub args: Vec<String>,
}

#[derive(Debug, Error)]
pub enum EngineInitError {
    #[error("no simulation engine command configured")]
    MissingCommand,
    #[error("simulation engine executable not found at {0}")]
    CommandNotFound(String),
}

/// Initialized handle to an external simulator.
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    command: String,
    args: Vec<String>,
}

impl ProcessEngine {
    /// One-time engine setup. Call before loading any document.
    pub fn init(settings: EngineSettings) -> Result<Self, EngineInitError> {
        let command = settings
            .command
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(EngineInitError::MissingCommand)?;
        let looks_like_path = command.contains('/') || command.contains(std::path::MAIN_SEPARATOR);
        if looks_like_path && !Path::new(&command).exists() {
            return Err(EngineInitError::CommandNotFound(command));
        }
        tracing::info!(command = %command, args = ?settings.args, "simulation engine initialized");
        Ok(Self {
            command,
            args: settings.args,
        })
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    fn build_command(
        &self,
        document: &Document,
        config: &SimulationConfig,
        expressions: &[CustomExpression],
    ) -> Command {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .arg("--document")
            .arg(document.path())
            .arg("--wind-speed")
            .arg(config.wind_speed_average.to_string())
            .arg("--turbulence")
            .arg(config.wind_turbulence_intensity.to_string())
            .arg("--rod-length")
            .arg(config.launch_rod_length_m.to_string())
            .arg("--rod-angle")
            .arg(config.launch_rod_angle_deg.to_string());
        if config.launch_into_wind {
            cmd.arg("--launch-into-wind");
        }
        for expression in expressions {
            cmd.arg("--expression").arg(format!(
                "{};{};{};{}",
                expression.name(),
                expression.symbol(),
                expression.unit().symbol(),
                expression.formula()
            ));
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

impl SimulationEngine for ProcessEngine {
    fn run_simulation(
        &self,
        document: &Document,
        config: &SimulationConfig,
        expressions: &[CustomExpression],
    ) -> Result<SimulationResult, SimulationError> {
        check_config(config)?;
        tracing::debug!(
            command = %self.command,
            wind_speed = config.wind_speed_average,
            turbulence = config.wind_turbulence_intensity,
            "launching simulator"
        );
        let output = self
            .build_command(document, config, expressions)
            .output()
            .map_err(|source| SimulationError::Spawn {
                command: self.command.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(SimulationError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let stdout = String::from_utf8(output.stdout).map_err(|_| {
            SimulationError::MalformedOutput("stdout is not valid UTF-8".to_string())
        })?;
        parse_output(&stdout)
    }
}

fn check_config(config: &SimulationConfig) -> Result<(), SimulationError> {
    if !config.wind_speed_average.is_finite() || config.wind_speed_average < 0.0 {
        return Err(SimulationError::InvalidConfiguration(format!(
            "average wind speed {} m/s",
            config.wind_speed_average
        )));
    }
    if !config.wind_turbulence_intensity.is_finite() || config.wind_turbulence_intensity < 0.0 {
        return Err(SimulationError::InvalidConfiguration(format!(
            "turbulence intensity {}",
            config.wind_turbulence_intensity
        )));
    }
    Ok(())
}

/// Parse simulator stdout into branches.
pub fn parse_output(stdout: &str) -> Result<SimulationResult, SimulationError> {
    let mut segments: Vec<(String, String)> = vec![(DEFAULT_BRANCH.to_string(), String::new())];
    for line in stdout.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(comment) = trimmed.strip_prefix('#') {
            if let Some(name) = comment.trim_start().strip_prefix(BRANCH_MARKER) {
                segments.push((name.trim().to_string(), String::new()));
            }
            continue;
        }
        if let Some((_, body)) = segments.last_mut() {
            body.push_str(trimmed);
            body.push('\n');
        }
    }

    let mut branches = Vec::new();
    for (index, (name, body)) in segments.into_iter().enumerate() {
        // Only the implicit leading branch may be absent.
        if index == 0 && body.is_empty() {
            continue;
        }
        branches.push(parse_branch(name, &body)?);
    }

    if branches.iter().all(FlightDataBranch::is_empty) {
        return Err(SimulationError::NoData);
    }
    Ok(SimulationResult::new(branches))
}

fn parse_branch(name: String, body: &str) -> Result<FlightDataBranch, SimulationError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());
    let symbols: Vec<String> = reader
        .headers()
        .map_err(|err| malformed(&name, err))?
        .iter()
        .map(str::to_string)
        .collect();
    if symbols.is_empty() || symbols.iter().any(String::is_empty) {
        return Err(SimulationError::MalformedOutput(format!(
            "branch `{name}` has an empty header field"
        )));
    }

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); symbols.len()];
    for record in reader.records() {
        let record = record.map_err(|err| malformed(&name, err))?;
        for (column, field) in columns.iter_mut().zip(record.iter()) {
            let value = field.parse::<f64>().map_err(|_| {
                SimulationError::MalformedOutput(format!(
                    "branch `{name}` has non-numeric value `{field}`"
                ))
            })?;
            column.push(value);
        }
    }

    let mut branch = FlightDataBranch::new(name);
    for (symbol, values) in symbols.into_iter().zip(columns) {
        branch.set_column(symbol, values);
    }
    Ok(branch)
}

fn malformed(branch: &str, err: csv::Error) -> SimulationError {
    SimulationError::MalformedOutput(format!("branch `{branch}`: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_requires_a_command() {
        assert!(matches!(
            ProcessEngine::init(EngineSettings::default()),
            Err(EngineInitError::MissingCommand)
        ));
        assert!(matches!(
            ProcessEngine::init(EngineSettings {
                command: Some("/definitely/not/here/simulator".into()),
                args: Vec::new(),
            }),
            Err(EngineInitError::CommandNotFound(_))
        ));
        let engine = ProcessEngine::init(EngineSettings {
            command: Some(" simulator ".into()),
            args: Vec::new(),
        })
        .expect("bare command names are resolved at run time");
        assert_eq!(engine.command(), "simulator");
    }

    #[test]
    fn parses_single_implicit_branch() {
        let out = "# produced by test\nt,h,Px,Py,Q\n0,0,0,0,0\n0.01, 0.5 ,0.001,0,12.25\n";
        let result = parse_output(out).expect("parsed");
        assert_eq!(result.branch_count(), 1);
        let main = result.branch(0).unwrap();
        assert_eq!(main.name(), "Main");
        assert_eq!(main.len(), 2);
        assert_eq!(main.get("h"), Some(&[0.0, 0.5][..]));
        assert_eq!(main.get("Q"), Some(&[0.0, 12.25][..]));
    }

    #[test]
    fn branch_markers_split_output() {
        let out = "# branch: Sustainer\nt,h\n0,0\n1,10\n\n# branch: Booster\nt,h\n0,0\n";
        let result = parse_output(out).expect("parsed");
        assert_eq!(result.branch_count(), 2);
        assert_eq!(result.branch(0).unwrap().name(), "Sustainer");
        assert_eq!(result.branch(1).unwrap().name(), "Booster");
        assert_eq!(result.branch(1).unwrap().len(), 1);
    }

    #[test]
    fn nan_values_are_kept() {
        let result = parse_output("t,Q\n0,NaN\n").expect("parsed");
        assert!(result.branch(0).unwrap().get("Q").unwrap()[0].is_nan());
    }

    #[test]
    fn rejects_bad_output() {
        assert!(matches!(parse_output(""), Err(SimulationError::NoData)));
        assert!(matches!(
            parse_output("t,h\n"),
            Err(SimulationError::NoData)
        ));
        assert!(matches!(
            parse_output("t,h\n0,abc\n"),
            Err(SimulationError::MalformedOutput(_))
        ));
        assert!(matches!(
            parse_output("t,h\n0,1,2\n"),
            Err(SimulationError::MalformedOutput(_))
        ));
    }

    #[test]
    fn negative_wind_is_rejected_before_launch() {
        let config = SimulationConfig {
            wind_speed_average: -1.0,
            wind_turbulence_intensity: 0.1,
            launch_rod_length_m: 6.0,
            launch_rod_angle_deg: 5.0,
            launch_into_wind: true,
        };
        assert!(matches!(
            check_config(&config),
            Err(SimulationError::InvalidConfiguration(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn runs_simulator_script_and_passes_options() {
        let dir = tempfile::tempdir().expect("tempdir");
        let doc_path = dir.path().join("rocket.ork");
        std::fs::write(&doc_path, b"PK\x03\x04").expect("write doc");
        let args_path = dir.path().join("args.txt");
        let script = format!(
            "echo \"$@\" > '{}'; printf 't,h,Px,Py,Q\\n0,0,0,0,0\\n0.5,3,0.1,0.2,40\\n'",
            args_path.display()
        );
        let engine = ProcessEngine::init(EngineSettings {
            command: Some("sh".into()),
            args: vec!["-c".into(), script, "simulator".into()],
        })
        .expect("engine");

        let mut document = engine.load_document(&doc_path).expect("document");
        let q = engine
            .attach_custom_expression(&mut document, "Dynamic Pressure", "Q", "Pa", "0.5 * Vt^2")
            .expect("expression");
        let config = SimulationConfig {
            wind_speed_average: 0.5,
            wind_turbulence_intensity: 0.1,
            launch_rod_length_m: 6.0,
            launch_rod_angle_deg: 5.0,
            launch_into_wind: true,
        };
        let result = engine
            .run_simulation(&document, &config, &[q])
            .expect("simulation");
        assert_eq!(result.branch(0).unwrap().get("Q"), Some(&[0.0, 40.0][..]));

        let args = std::fs::read_to_string(&args_path).expect("args file");
        assert!(args.contains("--wind-speed 0.5"), "{args}");
        assert!(args.contains("--turbulence 0.1"), "{args}");
        assert!(args.contains("--rod-length 6 --rod-angle 5 --launch-into-wind"), "{args}");
        assert!(args.contains("--expression Dynamic Pressure;Q;Pa;0.5 * Vt^2"), "{args}");
    }

    #[cfg(unix)]
    #[test]
    fn failing_simulator_surfaces_stderr() {
        let dir = tempfile::tempdir().expect("tempdir");
        let doc_path = dir.path().join("rocket.ork");
        std::fs::write(&doc_path, b"PK\x03\x04").expect("write doc");
        let engine = ProcessEngine::init(EngineSettings {
            command: Some("sh".into()),
            args: vec!["-c".into(), "echo diverged >&2; exit 3".into(), "simulator".into()],
        })
        .expect("engine");
        let document = engine.load_document(&doc_path).expect("document");
        let config = SimulationConfig {
            wind_speed_average: 0.0,
            wind_turbulence_intensity: 0.0,
            launch_rod_length_m: 6.0,
            launch_rod_angle_deg: 5.0,
            launch_into_wind: false,
        };
        match engine.run_simulation(&document, &config, &[]) {
            Err(SimulationError::Failed { stderr, .. }) => assert_eq!(stderr, "diverged"),
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
