//! Error types for the recommendation engine.

use thiserror::Error;

use crate::simulator::SimulatorError;

/// Convenient result alias for the recommendation engine.
pub type Result<T> = std::result::Result<T, Error>;

/// Which brute-force search ran out of candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    /// GF fitting against a target total decompression time.
    TdtFit,
    /// Highest GF keeping a repetitive dive free of mandatory stops.
    NoDecoCeiling,
}

impl std::fmt::Display for SearchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TdtFit => write!(f, "total decompression time fit"),
            Self::NoDecoCeiling => write!(f, "no-decompression ceiling search"),
        }
    }
}

/// Top-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed parameters, detected before any simulator call.
    #[error("invalid {field}: {message}")]
    InvalidInput {
        field: &'static str,
        message: String,
    },

    /// A single required simulation could not produce a schedule.
    #[error("simulator could not produce a schedule: {0}")]
    SimulatorInfeasible(#[from] SimulatorError),

    /// No candidate in the scanned domain satisfied the stopping condition.
    #[error(
        "{search} exhausted GF {highest}..={lowest} without a match ({infeasible} infeasible candidates)"
    )]
    SearchExhausted {
        search: SearchKind,
        highest: i32,
        lowest: i32,
        infeasible: usize,
    },

    /// A gradient factor left the valid percentage range after adjustments.
    #[error("gradient factor {value:.1} is outside {min}..={max}")]
    OutOfRange { value: f64, min: i32, max: i32 },

    /// The first dive already needed decompression, so the second has no
    /// no-decompression time.
    #[error("no no-decompression time available for the second dive")]
    NoDecoTimeUnavailable,

    /// An environment setting could not be parsed.
    #[error("invalid setting {key}: {message}")]
    Config { key: String, message: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            message: message.into(),
        }
    }
}
