//! Error types shared by all reasoning components.
//!
//! Search exhaustion (equation not balanced, target never produced, no calculation path)
//! is NOT an error here: those outcomes come back as ordinary results with `success == false`
//! and the partial trace, so only genuinely bad input and provider faults end up in [`ChemError`].
use thiserror::Error;

/// errors surfaced by the reasoning core
#[derive(Debug, Error)]
pub enum ChemError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),
    #[error("Malformed equation: {0}")]
    MalformedEquation(String),
    #[error("Element '{symbol}' of formula '{formula}' is not found in the periodic table")]
    UnknownElement { symbol: String, formula: String },
    #[error("Computation error at step {step} (rule '{rule}'): {source}")]
    Computation {
        step: usize,
        rule: String,
        #[source]
        source: ExprError,
    },
    #[error("Rule provider error: {0}")]
    Provider(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// errors of the restricted arithmetic evaluator
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),
    #[error("variable '{0}' is missing")]
    MissingVariable(String),
    #[error("function '{0}' is not allowed")]
    UnknownFunction(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("math domain error: {0}")]
    Domain(String),
    #[error("expression nested deeper than {0} levels")]
    TooDeep(usize),
}
