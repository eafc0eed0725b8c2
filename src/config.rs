//! Updater configuration.
//!
//! Configuration is plain data fixed when an updater is constructed, it is never changed by an update.

use nalgebra as na;
use na::{allocator::Allocator, DefaultAllocator, Dim, RealField};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use crate::error::UpdateError;
use crate::models::SharedModel;

/// Numerical settings of the gain and posterior computation.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct NumericSettings<N> {
    /// Minimum reciprocal condition number of the innovation covariance, scaled to a unit diagonal,
    /// for it to be inverted
    pub rcond_limit: N,
    /// Replace the posterior covariance with its symmetric part
    pub symmetrise: bool,
}

impl<N: RealField> Default for NumericSettings<N> {
    fn default() -> Self {
        NumericSettings {
            // 5 decimal digits of headroom above epsilon
            rcond_limit: na::convert(f64::EPSILON * 1e5),
            symmetrise: true,
        }
    }
}

impl<N: RealField> NumericSettings<N> {
    pub fn validate(&self) -> Result<(), UpdateError> {
        if !(self.rcond_limit >= N::zero()) || !self.rcond_limit.is_finite() || self.rcond_limit > N::one() {
            return Err(UpdateError::InvalidParameter(format!(
                "rcond_limit {:?} must be within [0, 1]",
                self.rcond_limit
            )));
        }
        Ok(())
    }
}

/// Configuration common to all updaters.
pub struct UpdaterConfig<N: RealField, D: Dim, ZD: Dim>
where
    DefaultAllocator: Allocator<N, D> + Allocator<N, ZD> + Allocator<N, ZD, ZD> + Allocator<N, ZD, D>,
{
    /// Model used when a measurement does not carry its own
    pub measurement_model: Option<SharedModel<N, D, ZD>>,
    pub numeric: NumericSettings<N>,
}

impl<N: RealField, D: Dim, ZD: Dim> UpdaterConfig<N, D, ZD>
where
    DefaultAllocator: Allocator<N, D> + Allocator<N, ZD> + Allocator<N, ZD, ZD> + Allocator<N, ZD, D>,
{
    pub fn new() -> Self {
        UpdaterConfig {
            measurement_model: None,
            numeric: NumericSettings::default(),
        }
    }

    pub fn with_measurement_model(mut self, model: SharedModel<N, D, ZD>) -> Self {
        self.measurement_model = Some(model);
        self
    }

    pub fn with_numeric(mut self, numeric: NumericSettings<N>) -> Self {
        self.numeric = numeric;
        self
    }

    pub fn validate(&self) -> Result<(), UpdateError> {
        self.numeric.validate()
    }
}

impl<N: RealField, D: Dim, ZD: Dim> Default for UpdaterConfig<N, D, ZD>
where
    DefaultAllocator: Allocator<N, D> + Allocator<N, ZD> + Allocator<N, ZD, ZD> + Allocator<N, ZD, D>,
{
    fn default() -> Self {
        UpdaterConfig::new()
    }
}

impl<N: RealField, D: Dim, ZD: Dim> Clone for UpdaterConfig<N, D, ZD>
where
    DefaultAllocator: Allocator<N, D> + Allocator<N, ZD> + Allocator<N, ZD, ZD> + Allocator<N, ZD, D>,
{
    fn clone(&self) -> Self {
        UpdaterConfig {
            measurement_model: self.measurement_model.clone(),
            numeric: self.numeric,
        }
    }
}
