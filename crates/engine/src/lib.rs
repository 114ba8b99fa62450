//! Simulation engine seam for the sweep driver.
//!
//! The flight simulator itself is an external collaborator. This crate fixes the
//! capabilities the driver consumes ([`SimulationEngine`]), the handles passed
//! across that seam, and ships [`ProcessEngine`], which drives a simulator
//! executable over a small stdout CSV protocol.

use std::path::Path;

use sweep_core::options::SimulationConfig;

pub mod document;
pub mod expression;
pub mod process;
pub mod result;

pub use document::{Document, DocumentFormat, DocumentLoadError};
pub use expression::{CustomExpression, ExpressionError};
pub use process::{EngineInitError, EngineSettings, ProcessEngine};
pub use result::{FlightDataBranch, SimulationError, SimulationResult};

/// Capabilities the sweep driver needs from a simulation backend.
///
/// A value implementing this trait is an initialized engine handle; construct
/// it once before loading any document and pass it to the driver.
pub trait SimulationEngine {
    /// Load a rocket design document.
    fn load_document(&self, path: &Path) -> Result<Document, DocumentLoadError> {
        Document::open(path)
    }

    /// Attach a derived channel to `document`, returning the registered expression.
    fn attach_custom_expression(
        &self,
        document: &mut Document,
        name: &str,
        symbol: &str,
        unit: &str,
        formula: &str,
    ) -> Result<CustomExpression, ExpressionError> {
        let expression = CustomExpression::new(name, symbol, unit, formula)?;
        document.attach(expression.clone())?;
        Ok(expression)
    }

    /// Run one simulation of `document` under `config`, populating the
    /// channels of `expressions` alongside the built-in ones.
    fn run_simulation(
        &self,
        document: &Document,
        config: &SimulationConfig,
        expressions: &[CustomExpression],
    ) -> Result<SimulationResult, SimulationError>;
}
