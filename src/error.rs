//! Errors raised while evaluating incentives.
use crate::context::InputName;
use crate::id::IncentiveID;
use thiserror::Error;

/// An error raised by the incentive engine.
///
/// All of these are fatal for the scenario being evaluated. The computation is deterministic, so
/// the only way to recover is to fix the assessment context, the selection or the catalog.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IncentiveError {
    /// The selection contains an id which is not in the catalog
    #[error("invalid incentive number '{id}'")]
    InvalidIncentive {
        /// The offending id
        id: IncentiveID,
    },
    /// A program needs an input which was not supplied
    #[error("missing parameter '{input}' for incentive {id}")]
    MissingParameter {
        /// The program which needs the input
        id: IncentiveID,
        /// The missing input
        input: InputName,
    },
    /// A series does not have one value per plant year
    #[error("series '{input}' has {actual} values but the plant has {expected} years")]
    ShapeMismatch {
        /// The offending series
        input: String,
        /// Number of plant years
        expected: usize,
        /// Length of the series
        actual: usize,
    },
    /// The construction/startup schedule is malformed
    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),
    /// The catalog of programs is malformed
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),
}

/// Result type for the incentive engine
pub type EngineResult<T> = Result<T, IncentiveError>;
