use thiserror::Error;

/// Failures reported by the frame analysis engine.
///
/// The engine never substitutes defaults or clamps bad parameters; every
/// violated precondition surfaces as one of these variants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Empty signal, bad sample rate, bad window parameters, degenerate scale.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Frame too short for the requested lag or pitch band.
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// Parameters that are individually valid but do not fit together.
    #[error("Parameter conflict: {0}")]
    ParameterConflict(String),
}

impl AnalysisError {
    pub(crate) fn input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub(crate) fn frame(msg: impl Into<String>) -> Self {
        Self::InvalidFrame(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
