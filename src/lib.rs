//!
//! Bayes+Update the Bayesian measurement update library.
//! Copyright (c) 2020 Michael Stevens
//!
//! Bayesian Filtering is a probabilistic technique for data fusion. The technique combines a concise mathematical formulation of a system with observations of that system.
//! Probabilities are used to represent the state of a system, likelihood functions to represent their relationships.
//!
//! This library implements the measurement update of Gaussian state estimates: given a predicted state and an
//! observed measurement it computes the posterior state. The standard Kalman filter, the Extended Kalman filter and
//! the Unscented Kalman filter updates are provided. They share one Kalman gain and posterior computation and differ
//! only in how the measurement prediction is obtained from the measurement model.
//!
//! Measurement models are represented by a trait. States, measurements and hypotheses are represented by structs.
//! All operations are numerically and dimensionally generic using nalgebra, they work with fixed and Dynamic dimensions.
//!
//! # Licensing
//!
//! All Bayes++ source code files are copyright with the license conditions as given here. The copyright notice is that of the MIT license.
//!  This in no way restricts any commercial use you may wish to make using our source code.
//!  As long as you respect the copyright and license conditions, Michael Stevens is happy to for you to use it in any way you wish.
//!
//! Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the "Software"), to deal in the Software without restriction,
//! including without limitation the rights to use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the Software,
//! and to permit persons to whom the Software is furnished to do so, subject to the following conditions:
//!
//! The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.
//!
//! THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
//! FITNESS FOR A PARTICULAR PURPOSE AND NON INFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY,
//! WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

pub mod config;
pub mod error;
pub mod linalg;
pub mod measurement_models;
pub mod models;
pub mod noise;
pub mod sigma_points;
pub mod updaters;

pub use config::{NumericSettings, UpdaterConfig};
pub use error::UpdateError;
pub use models::{
    GaussianMeasurementPrediction, GaussianState, GaussianStateUpdate, Hypothesis, Measurement, MeasurementModel,
    SharedModel,
};
pub use updaters::{
    ExtendedKalmanUpdater, KalmanUpdater, MeasurementMatrix, MeasurementPredictor, UnscentedKalmanUpdater,
    UnscentedParams, Updater,
};
