//! Simulation output: branches of time-series flight data keyed by channel symbol.

use std::process::ExitStatus;

use thiserror::Error;

/// Errors surfaced when the engine cannot complete a run.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("failed to launch simulator `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("simulator exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },
    #[error("simulator output is malformed: {0}")]
    MalformedOutput(String),
    #[error("simulation produced no flight data")]
    NoData,
    #[error("simulation rejected the configuration: {0}")]
    InvalidConfiguration(String),
}

/// One branch of flight data (e.g. the main stage, or a separated booster).
///
/// Columns are stored in SI units and share a common row count.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightDataBranch {
    name: String,
    columns: Vec<(String, Vec<f64>)>,
}

impl FlightDataBranch {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Add or replace the column for `symbol`.
    pub fn with_column(mut self, symbol: impl Into<String>, values: Vec<f64>) -> Self {
        self.set_column(symbol, values);
        self
    }

    pub fn set_column(&mut self, symbol: impl Into<String>, values: Vec<f64>) {
        let symbol = symbol.into();
        match self.columns.iter_mut().find(|(s, _)| *s == symbol) {
            Some((_, existing)) => *existing = values,
            None => self.columns.push((symbol, values)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Values of the column keyed by `symbol`, if the engine produced it.
    pub fn get(&self, symbol: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, values)| values.as_slice())
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(s, _)| s.as_str())
    }

    /// Number of time steps (the longest column).
    pub fn len(&self) -> usize {
        self.columns
            .iter()
            .map(|(_, values)| values.len())
            .max()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything one simulation run produced.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimulationResult {
    branches: Vec<FlightDataBranch>,
}

impl SimulationResult {
    pub fn new(branches: Vec<FlightDataBranch>) -> Self {
        Self { branches }
    }

    pub fn branch(&self, index: usize) -> Option<&FlightDataBranch> {
        self.branches.get(index)
    }

    pub fn branches(&self) -> &[FlightDataBranch] {
        &self.branches
    }

    pub fn branch_count(&self) -> usize {
        self.branches.len()
    }
}
