// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Regression tests of the Yandasoft calibrator. The executables are run as
//! subprocesses one at a time; any failure (a program exiting badly or a
//! result outside its tolerance) aborts the test with a descriptive error.

mod error;
mod images;
mod runner;
mod scenarios;

pub use error::RegressionError;
pub use images::{analyse_images, angular_distance, sin_projection, ImageStats};
pub use runner::{RunnerConfig, SynthesisRunner};
pub use scenarios::{
    bandpass_parallel_scenario, calibrator_scenario, leakage_scenario,
    smoothness_gradient_cost_scenario, smoothness_parallel_scenario,
};

use log::debug;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Solvers available to ccalibrator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString, Serialize, Deserialize,
)]
pub enum CalSolver {
    #[strum(serialize = "SVD")]
    #[serde(rename = "SVD")]
    Svd,

    #[strum(serialize = "LSQR")]
    #[serde(rename = "LSQR")]
    Lsqr,
}

/// Ensure that `measured` is within `tolerance` of `expected`.
pub fn check_tolerance(
    quantity: &str,
    measured: f64,
    expected: f64,
    tolerance: f64,
) -> Result<(), RegressionError> {
    // A NaN is never within tolerance.
    if (measured - expected).abs() <= tolerance {
        debug!("{quantity} = {measured} (expected {expected} ± {tolerance})");
        return Ok(());
    }
    Err(RegressionError::OutOfTolerance {
        quantity: quantity.to_string(),
        measured,
        expected,
        tolerance,
    })
}
