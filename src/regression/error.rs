// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors from running the regression tests.

use thiserror::Error;

use crate::{parset::ParamsWriteError, solutions::GainsError};

#[derive(Error, Debug)]
pub enum RegressionError {
    #[error("{quantity} is {measured}, but {expected} was expected (tolerance {tolerance})")]
    OutOfTolerance {
        quantity: String,
        measured: f64,
        expected: f64,
        tolerance: f64,
    },

    #[error("Template parset '{0}' doesn't exist")]
    MissingTemplate(String),

    #[error("Image '{0}' doesn't exist")]
    MissingImage(String),

    #[error("Couldn't read the statistics of image '{image}' from '{output}'; expected 'peak ra dec rms median'")]
    BadImageStats { image: String, output: String },

    #[error("A tarball with measurement sets does not seem to exist ({0})")]
    MissingArchive(String),

    #[error("Couldn't run '{command}': {err}")]
    Spawn {
        command: String,
        err: std::io::Error,
    },

    #[error("'{command}' failed with {status}")]
    ProcessFailed { command: String, status: String },

    #[error(transparent)]
    Gains(#[from] GainsError),

    #[error(transparent)]
    ParamsWrite(#[from] ParamsWriteError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
