// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with analysing calibration solutions.

use num_complex::Complex64;
use thiserror::Error;

use crate::parset::ParsetReadError;

#[derive(Error, Debug)]
pub enum GainsError {
    #[error("Gain parameter {key} was found in the result, but is missing from the gains it's compared against")]
    MissingGain { key: String },

    #[error("Gain parameter {key} has a value of {got} which is notably different from {expected} (tolerance {tolerance})")]
    GainMismatch {
        key: String,
        got: Complex64,
        expected: Complex64,
        tolerance: f64,
    },

    #[error("Gain parameter {key} has a value of {got} which is notably different from {target} (tolerance {tolerance})")]
    GainNotNear {
        key: String,
        got: Complex64,
        target: Complex64,
        tolerance: f64,
    },

    #[error("Gain parameter {key} is needed to calculate the gradient cost, but it isn't available")]
    GradientMissingGain { key: String },

    #[error("No '{key_prefix}' parameters were found in {file}")]
    NoGains { key_prefix: String, file: String },

    #[error(transparent)]
    ParsetRead(#[from] ParsetReadError),
}
