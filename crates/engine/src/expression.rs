//! Custom expressions: named, unit-tagged formulas evaluated by the engine.

use sweep_core::channels::{DataChannel, Quantity, RESERVED_SYMBOLS};
use sweep_core::units::Unit;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExpressionError {
    #[error("custom expression name must not be empty")]
    EmptyName,
    #[error("custom expression name `{0}` must not contain `;` or line breaks")]
    InvalidName(String),
    #[error("custom expression symbol `{0}` must be non-empty ASCII alphanumerics or '_'")]
    InvalidSymbol(String),
    #[error("custom expression symbol `{0}` clashes with a built-in quantity")]
    ReservedSymbol(String),
    #[error("custom expression symbol `{0}` is already attached to the document")]
    DuplicateSymbol(String),
    #[error("custom expression `{0}` has an empty formula")]
    EmptyFormula(String),
    #[error("unknown unit `{0}`")]
    UnknownUnit(String),
}

/// A formula producing an extra flight data channel.
///
/// The formula text is opaque here; the engine evaluates it against the
/// built-in channels of each simulation step. Name, symbol and unit never
/// contain `;`, so the formula is everything after the third separator of
/// the `<name>;<symbol>;<unit>;<formula>` wire form.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomExpression {
    name: String,
    symbol: String,
    unit: Unit,
    formula: String,
}

impl CustomExpression {
    /// Validate and build an expression; `unit` is a header symbol such as `Pa`.
    pub fn new(
        name: &str,
        symbol: &str,
        unit: &str,
        formula: &str,
    ) -> Result<Self, ExpressionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ExpressionError::EmptyName);
        }
        if name.contains([';', '\n', '\r']) {
            return Err(ExpressionError::InvalidName(name.to_string()));
        }
        if symbol.is_empty()
            || !symbol
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(ExpressionError::InvalidSymbol(symbol.to_string()));
        }
        if RESERVED_SYMBOLS.contains(&symbol) {
            return Err(ExpressionError::ReservedSymbol(symbol.to_string()));
        }
        if formula.trim().is_empty() {
            return Err(ExpressionError::EmptyFormula(name.to_string()));
        }
        let unit = Unit::from_symbol(unit)
            .ok_or_else(|| ExpressionError::UnknownUnit(unit.to_string()))?;

        Ok(Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            unit,
            formula: formula.trim().to_string(),
        })
    }

    /// Channel name used in the CSV header.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column key in engine output.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Trimmed formula text.
    pub fn formula(&self) -> &str {
        &self.formula
    }

    /// The export channel this expression populates, in its declared unit.
    pub fn channel(&self) -> DataChannel {
        DataChannel::new(
            Quantity::Custom {
                name: self.name.clone(),
                symbol: self.symbol.clone(),
            },
            self.unit,
        )
    }
}
