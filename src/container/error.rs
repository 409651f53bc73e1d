// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors from making Docker images and launching containers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("MPI name '{0}' is too short; expected one of mpich, openmpi, mpich-X.Y.Z or openmpi-X.Y.Z")]
    MpiTooShort(String),

    #[error("Unrecognised MPI name '{0}'; expected one of mpich, openmpi, mpich-X.Y.Z or openmpi-X.Y.Z")]
    BadMpiName(String),

    #[error("Illegal {kind} version '{version}'; expected X.Y.Z")]
    BadMpiVersion { kind: String, version: String },

    #[error("Unrecognised machine target '{0}'; expected generic or galaxy")]
    BadMachine(String),

    #[error("Illegal recipe name '{0}'")]
    BadRecipeName(String),

    #[error("Recipe '{0}' is empty")]
    EmptyRecipe(String),

    #[error("Recipe file '{0}' doesn't exist; it must be written before the image is built")]
    MissingRecipe(String),

    #[error("Couldn't write recipe file '{file}': {err}")]
    WriteRecipe { file: String, err: std::io::Error },

    #[error("Illegal image name '{0}'")]
    BadImageName(String),

    #[error("Illegal timezone '{0}'")]
    BadTimezone(String),

    #[error("The directory to mount ({0}) must be an absolute path")]
    RelativeMountDir(String),

    #[error("Couldn't run '{command}': {err}")]
    Spawn {
        command: String,
        err: std::io::Error,
    },

    #[error("'{command}' failed with {status}")]
    ContainerFailed { command: String, status: String },
}
