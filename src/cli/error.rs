// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all yanda-related errors. This should be the *only* error
//! enum that is publicly visible.

use thiserror::Error;

use super::regression::RegressionArgsError;
use crate::{
    container::ContainerError,
    parset::{ParamsWriteError, ParsetReadError},
    regression::RegressionError,
    solutions::GainsError,
};

/// The *only* publicly visible error from yanda.
#[derive(Error, Debug)]
pub enum YandaError {
    /// An error related to writing or reading parsets.
    #[error("{0}")]
    Parset(String),

    /// Calibration solutions couldn't be compared or were too different.
    #[error("{0}\n\nTry raising the verbosity (-v or -vv) to see which solutions were compared.")]
    Solutions(String),

    /// A regression test failed.
    #[error("Regression test failed: {0}")]
    Regression(String),

    /// A Yandasoft executable couldn't be run or exited badly.
    #[error("{0}\n\nCheck that the Yandasoft executables are on your PATH, or give their locations.")]
    Executable(String),

    /// An error related to Docker images or the development container.
    #[error("{0}")]
    Container(String),

    /// An error related to argument files.
    #[error("{0}")]
    ArgFile(String),

    /// A generic error that can't be clarified further, e.g. IO errors.
    #[error("{0}")]
    Generic(String),
}

// When changing the error propagation below, ensure `Self::from(e)` uses the
// correct `e`!

impl From<RegressionArgsError> for YandaError {
    fn from(e: RegressionArgsError) -> Self {
        Self::Regression(e.to_string())
    }
}

impl From<ParamsWriteError> for YandaError {
    fn from(e: ParamsWriteError) -> Self {
        Self::Parset(e.to_string())
    }
}

impl From<ParsetReadError> for YandaError {
    fn from(e: ParsetReadError) -> Self {
        let s = e.to_string();
        match e {
            ParsetReadError::IO(_) => Self::Generic(s),
            _ => Self::Parset(s),
        }
    }
}

impl From<GainsError> for YandaError {
    fn from(e: GainsError) -> Self {
        match e {
            GainsError::ParsetRead(e) => Self::from(e),
            _ => Self::Solutions(e.to_string()),
        }
    }
}

impl From<RegressionError> for YandaError {
    fn from(e: RegressionError) -> Self {
        let s = e.to_string();
        match e {
            RegressionError::OutOfTolerance { .. }
            | RegressionError::MissingTemplate(_)
            | RegressionError::MissingImage(_)
            | RegressionError::BadImageStats { .. }
            | RegressionError::MissingArchive(_) => Self::Regression(s),
            RegressionError::Spawn { .. } | RegressionError::ProcessFailed { .. } => {
                Self::Executable(s)
            }
            RegressionError::Gains(e) => match e {
                GainsError::ParsetRead(e) => Self::from(e),
                e => Self::Regression(e.to_string()),
            },
            RegressionError::ParamsWrite(e) => Self::from(e),
            RegressionError::IO(e) => Self::from(e),
        }
    }
}

impl From<ContainerError> for YandaError {
    fn from(e: ContainerError) -> Self {
        Self::Container(e.to_string())
    }
}

impl From<std::io::Error> for YandaError {
    fn from(e: std::io::Error) -> Self {
        Self::Generic(e.to_string())
    }
}
