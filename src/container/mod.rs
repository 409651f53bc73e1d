// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Yandasoft Docker images: making them from generated Dockerfiles, and
//! launching an interactive container of a development image with a host
//! directory mounted inside it.

mod error;
mod recipes;
#[cfg(test)]
mod tests;

pub use error::ContainerError;
pub use recipes::{
    base_recipe, final_recipe, image_targets, DockerRecipe, ImageTarget, MachineKind,
    RecipeSettings,
};

use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;

use itertools::Itertools;
use log::{debug, info};
use strum_macros::{Display, EnumIter, EnumString};

use crate::constants::{
    CONTAINER_MOUNT_POINT, DEFAULT_DOCKER_IMAGE, DEFAULT_TIMEZONE, FORBIDDEN_NAME_CHARS,
};

/// Is this name non-empty and free of characters that have no business being
/// in an image, file or timezone name?
pub fn is_proper_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(|c| FORBIDDEN_NAME_CHARS.contains(c))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
pub enum MpiKind {
    #[strum(serialize = "mpich")]
    Mpich,

    #[strum(serialize = "openmpi")]
    OpenMpi,
}

/// The MPI flavour a development image is built against. Without a version,
/// the distribution's packaged MPI is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpiTarget {
    pub kind: MpiKind,
    pub version: Option<(u32, u32, u32)>,
}

impl FromStr for MpiTarget {
    type Err = ContainerError;

    /// Parse `mpich`, `openmpi`, `mpich-X.Y.Z` or `openmpi-X.Y.Z`
    /// (case insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        if lower.len() < 5 {
            return Err(ContainerError::MpiTooShort(s.to_string()));
        }

        let (kind_str, version_str) = match lower.split_once('-') {
            Some((k, v)) => (k, Some(v)),
            None => (lower.as_str(), None),
        };
        let kind = MpiKind::from_str(kind_str)
            .map_err(|_| ContainerError::BadMpiName(s.to_string()))?;

        let version = match version_str {
            None => None,
            Some(v) => {
                let bad_version = || ContainerError::BadMpiVersion {
                    kind: kind.to_string(),
                    version: v.to_string(),
                };
                let parts = v
                    .split('.')
                    .map(|p| p.parse::<u32>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|_| bad_version())?;
                match parts.as_slice() {
                    [major, minor, patch] => Some((*major, *minor, *patch)),
                    _ => return Err(bad_version()),
                }
            }
        };

        Ok(MpiTarget { kind, version })
    }
}

impl std::fmt::Display for MpiTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.version {
            None => write!(f, "{}", self.kind),
            Some((major, minor, patch)) => write!(f, "{}-{major}.{minor}.{patch}", self.kind),
        }
    }
}

/// Run a command to completion, with its output going to ours.
pub(crate) fn run_command(command: &[String], dir: Option<&Path>) -> Result<(), ContainerError> {
    let command_str = command.iter().join(" ");
    info!("Running {command_str}");

    let (program, args) = command
        .split_first()
        .ok_or_else(|| ContainerError::Spawn {
            command: command_str.clone(),
            err: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
        })?;
    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }
    let status = cmd.status().map_err(|err| ContainerError::Spawn {
        command: command_str.clone(),
        err,
    })?;
    if !status.success() {
        return Err(ContainerError::ContainerFailed {
            command: command_str,
            status: status.to_string(),
        });
    }
    Ok(())
}

/// The development (base) image for an MPI target.
pub fn image_for(mpi: &MpiTarget) -> String {
    recipes::base_image_name(&ImageTarget::Generic(*mpi))
}

/// Everything needed to start the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerLaunch {
    /// The host directory mounted in the container. Must be absolute.
    pub mount_dir: PathBuf,
    pub image: String,
    pub timezone: String,
}

impl ContainerLaunch {
    pub fn new(mount_dir: PathBuf) -> ContainerLaunch {
        ContainerLaunch {
            mount_dir,
            image: DEFAULT_DOCKER_IMAGE.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }

    /// Check the launch settings before anything is run.
    pub fn validate(&self) -> Result<(), ContainerError> {
        if !is_proper_name(&self.image) {
            return Err(ContainerError::BadImageName(self.image.clone()));
        }
        if !is_proper_name(&self.timezone) {
            return Err(ContainerError::BadTimezone(self.timezone.clone()));
        }
        if !self.mount_dir.is_absolute() {
            return Err(ContainerError::RelativeMountDir(
                self.mount_dir.display().to_string(),
            ));
        }
        Ok(())
    }

    /// The program and arguments that start the container.
    pub fn command(&self) -> Vec<String> {
        vec![
            "docker".to_string(),
            "container".to_string(),
            "run".to_string(),
            "--rm".to_string(),
            "-it".to_string(),
            "-v".to_string(),
            format!("{}:{CONTAINER_MOUNT_POINT}", self.mount_dir.display()),
            "-e".to_string(),
            format!("TZ={}", self.timezone),
            self.image.clone(),
            "/bin/bash".to_string(),
        ]
    }

    /// The command as it would be typed into a shell.
    pub fn command_string(&self) -> String {
        self.command().iter().join(" ")
    }

    /// Run the container interactively and wait for it to exit.
    pub fn run(&self) -> Result<(), ContainerError> {
        self.validate()?;
        run_command(&self.command(), None)?;
        debug!("Container exited");
        Ok(())
    }
}
