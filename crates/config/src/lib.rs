//! Configuration models and loaders for the rocket sweep driver.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Top-level sweep configuration, as read from a TOML or YAML file.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SweepConfig {
    /// Rocket design document to load.
    pub document_path: PathBuf,
    /// Base directory for results; timestamped subdirectories land here.
    pub output_root: PathBuf,
    pub iterations: usize,
    /// Write `sweep.json` next to the CSV files.
    pub manifest: bool,
    pub sweep: SweepSteps,
    pub launch: LaunchConfig,
    pub engine: EngineConfig,
    pub export: ExportConfig,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            document_path: PathBuf::from("rocket.ork"),
            output_root: PathBuf::from("results"),
            iterations: 2,
            manifest: true,
            sweep: SweepSteps::default(),
            launch: LaunchConfig::default(),
            engine: EngineConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

/// Starting values and per-iteration deltas of the swept quantities.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SweepSteps {
    pub base_wind_speed: f64,
    pub wind_step: f64,
    pub base_turbulence: f64,
    pub turbulence_step: f64,
}

impl Default for SweepSteps {
    fn default() -> Self {
        Self {
            base_wind_speed: 0.0,
            wind_step: 0.5,
            base_turbulence: 0.0,
            turbulence_step: 0.1,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LaunchConfig {
    pub rod_length_m: f64,
    pub rod_angle_deg: f64,
    pub into_wind: bool,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            rod_length_m: 6.0,
            rod_angle_deg: 5.0,
            into_wind: true,
        }
    }
}

/// External simulator invocation.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub command: Option<String>,
    pub args: Vec<String>,
}

/// CSV layout of exported files.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    pub delimiter: String,
    pub precision: usize,
    pub comment_marker: String,
    /// Emit the commented header row with field names.
    pub field_comments: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            delimiter: ",".to_string(),
            precision: 3,
            comment_marker: "#".to_string(),
            field_comments: true,
        }
    }
}

/// Largest number of decimals the exporter accepts.
pub const MAX_PRECISION: usize = 15;

/// Errors that can occur while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Load a sweep configuration, choosing TOML or YAML by file extension.
pub fn load_sweep_config<P: AsRef<Path>>(path: P) -> Result<SweepConfig, ConfigError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)?;
    let config: SweepConfig = if path.extension().map(|ext| ext == "toml").unwrap_or(false) {
        toml::from_str(&contents)?
    } else {
        serde_yaml::from_str(&contents)?
    };
    config.validate()?;
    Ok(config)
}

impl SweepConfig {
    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            ("sweep.base_wind_speed", self.sweep.base_wind_speed),
            ("sweep.wind_step", self.sweep.wind_step),
            ("sweep.base_turbulence", self.sweep.base_turbulence),
            ("sweep.turbulence_step", self.sweep.turbulence_step),
            ("launch.rod_length_m", self.launch.rod_length_m),
            ("launch.rod_angle_deg", self.launch.rod_angle_deg),
        ];
        if let Some((name, _)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(invalid(format!("{name} must be a finite number")));
        }
        let swept = [
            (
                "sweep.base_wind_speed",
                "wind speed",
                self.sweep.base_wind_speed,
                self.sweep.wind_step,
            ),
            (
                "sweep.base_turbulence",
                "turbulence intensity",
                self.sweep.base_turbulence,
                self.sweep.turbulence_step,
            ),
        ];
        for (name, quantity, base, step) in swept {
            if base < 0.0 {
                return Err(invalid(format!("{name} must not be negative")));
            }
            if let Some(last) = self.iterations.checked_sub(1) {
                let value = base + last as f64 * step;
                if value < 0.0 {
                    return Err(invalid(format!(
                        "{quantity} of iteration {last} would be {value}; it must not go negative"
                    )));
                }
            }
        }
        if self.launch.rod_length_m < 0.0 {
            return Err(invalid("launch.rod_length_m must not be negative"));
        }
        if !(-90.0..=90.0).contains(&self.launch.rod_angle_deg) {
            return Err(invalid("launch.rod_angle_deg must lie within [-90, 90]"));
        }
        if self.document_path.as_os_str().is_empty() {
            return Err(invalid("document_path must not be empty"));
        }
        if self.export.precision > MAX_PRECISION {
            return Err(invalid(format!(
                "export.precision must be at most {MAX_PRECISION}"
            )));
        }
        let delimiter = self.export.delimiter.as_bytes();
        if delimiter.len() != 1 || !delimiter[0].is_ascii() {
            return Err(invalid("export.delimiter must be a single ASCII character"));
        }
        if matches!(delimiter[0], b'"' | b'.' | b'-' | b'+' | b'\r' | b'\n')
            || delimiter[0].is_ascii_alphanumeric()
        {
            return Err(invalid(format!(
                "export.delimiter {:?} would clash with exported values",
                self.export.delimiter
            )));
        }
        if self.export.comment_marker.is_empty() {
            return Err(invalid("export.comment_marker must not be empty"));
        }
        if self
            .export
            .comment_marker
            .bytes()
            .any(|b| b == delimiter[0] || matches!(b, b'"' | b'\r' | b'\n'))
        {
            return Err(invalid(
                "export.comment_marker must not contain the delimiter or quoting characters",
            ));
        }
        if let Some(command) = &self.engine.command {
            if command.trim().is_empty() {
                return Err(invalid("engine.command must not be blank"));
            }
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).expect("create config");
        file.write_all(contents.as_bytes()).expect("write config");
        (dir, path)
    }

    #[test]
    fn toml_config_overrides_defaults() {
        let (_dir, path) = write_temp(
            "sweep.toml",
            r#"
document_path = "designs/defiance.ork"
output_root = "out"
iterations = 5

[sweep]
wind_step = 1.0

[engine]
command = "simulate"
args = ["--quiet"]
"#,
        );
        let config = load_sweep_config(&path).expect("toml config");
        assert_eq!(config.document_path, PathBuf::from("designs/defiance.ork"));
        assert_eq!(config.output_root, PathBuf::from("out"));
        assert_eq!(config.iterations, 5);
        assert_eq!(config.sweep.wind_step, 1.0);
        assert_eq!(config.sweep.turbulence_step, 0.1);
        assert_eq!(config.launch, LaunchConfig::default());
        assert_eq!(config.engine.command.as_deref(), Some("simulate"));
        assert_eq!(config.engine.args, ["--quiet"]);
        assert_eq!(config.export.precision, 3);
    }

    #[test]
    fn yaml_config_is_accepted() {
        let (_dir, path) = write_temp(
            "sweep.yaml",
            "document_path: rocket.ork\niterations: 0\nlaunch:\n  rod_angle_deg: 2.5\n",
        );
        let config = load_sweep_config(&path).expect("yaml config");
        assert_eq!(config.iterations, 0);
        assert_eq!(config.launch.rod_angle_deg, 2.5);
        assert_eq!(config.launch.rod_length_m, 6.0);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let (_dir, path) = write_temp("sweep.toml", "iteratons = 3\n");
        assert!(matches!(
            load_sweep_config(&path),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn missing_file_reports_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_sweep_config(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = SweepConfig::default();
        config.export.delimiter = ";;".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = SweepConfig::default();
        config.sweep.wind_step = f64::NAN;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sweep.wind_step"));

        let mut config = SweepConfig::default();
        config.launch.rod_angle_deg = 120.0;
        assert!(config.validate().is_err());

        let mut config = SweepConfig::default();
        config.export.precision = 40;
        assert!(config.validate().is_err());

        assert!(SweepConfig::default().validate().is_ok());
    }

    #[test]
    fn sweep_values_must_stay_non_negative_for_every_iteration() {
        let mut config = SweepConfig::default();
        config.sweep.base_wind_speed = 1.0;
        config.sweep.wind_step = -0.5;
        config.iterations = 4;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("wind speed of iteration 3"), "{err}");

        config.iterations = 3;
        assert!(config.validate().is_ok());

        let mut config = SweepConfig::default();
        config.sweep.base_turbulence = -0.1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sweep.base_turbulence"), "{err}");

        let mut config = SweepConfig::default();
        config.sweep.base_wind_speed = -1.0;
        config.iterations = 0;
        assert!(config.validate().is_err());

        let mut config = SweepConfig::default();
        config.sweep.turbulence_step = -1.0;
        config.iterations = 0;
        assert!(config.validate().is_ok());
        config.iterations = 1;
        assert!(config.validate().is_ok());
        config.iterations = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn comment_marker_and_delimiter_must_not_collide() {
        let mut config = SweepConfig::default();
        config.export.comment_marker = "#,".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = SweepConfig::default();
        config.export.comment_marker = "\"#".into();
        assert!(config.validate().is_err());

        let mut config = SweepConfig::default();
        config.export.delimiter = ";".into();
        config.export.comment_marker = "//".into();
        assert!(config.validate().is_ok());

        for delimiter in [".", "-", "5", "N"] {
            let mut config = SweepConfig::default();
            config.export.delimiter = delimiter.into();
            assert!(config.validate().is_err(), "delimiter {delimiter:?}");
        }
    }
}
