//! Errors of the measurement update operations.
//!
//! All errors are local to a single call. A failed update leaves its inputs and the updater
//! untouched, so the caller may retry with corrected inputs.

use thiserror::Error;

/// Measurement update error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UpdateError {
    /// No measurement model on the measurement and none configured on the updater.
    #[error("no measurement model: none on the measurement and no updater default")]
    NoMeasurementModel,

    /// A linear updater was given a model without a fixed observation matrix.
    #[error("measurement model has no linear observation matrix")]
    ModelNotLinear,

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Matrix could not be inverted, or its reciprocal condition number is below the limit.
    #[error("{0} is singular or ill-conditioned")]
    SingularMatrix(&'static str),

    #[error("{0} is not positive definite")]
    NotPositiveDefinite(&'static str),

    #[error("dimension mismatch in {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
}

impl UpdateError {
    /// True for errors caused by how the updater or its models are configured rather than by the numbers.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            UpdateError::NoMeasurementModel | UpdateError::ModelNotLinear | UpdateError::InvalidParameter(_)
        )
    }
}

/// Fails with [`UpdateError::DimensionMismatch`] unless `found == expected`.
pub fn check_dim(what: &'static str, expected: usize, found: usize) -> Result<(), UpdateError> {
    if expected == found {
        Ok(())
    } else {
        Err(UpdateError::DimensionMismatch { what, expected, found })
    }
}
