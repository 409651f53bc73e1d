// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Running the Yandasoft executables against a working parset.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use itertools::Itertools;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use super::{images::ImageStats, RegressionError};
use crate::{
    constants::{
        DEFAULT_CALIBRATOR, DEFAULT_IMAGER, DEFAULT_IMAGE_STATS, DEFAULT_MPIRUN, DEFAULT_SIMULATOR,
        WORKING_PARSET,
    },
    parset::Params,
};

/// Which executables to run, and where. Programs given with a relative path
/// containing a directory (e.g. `./bin/csimulator`) are relative to the
/// current directory, not the working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub simulator: String,
    pub imager: String,
    pub calibrator: String,
    pub mpirun: String,
    /// Prints `peak ra dec rms median` for the image given as its only
    /// argument.
    pub image_stats: String,
    pub working_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig {
            simulator: DEFAULT_SIMULATOR.to_string(),
            imager: DEFAULT_IMAGER.to_string(),
            calibrator: DEFAULT_CALIBRATOR.to_string(),
            mpirun: DEFAULT_MPIRUN.to_string(),
            image_stats: DEFAULT_IMAGE_STATS.to_string(),
            working_dir: PathBuf::from("."),
        }
    }
}

/// Runs the synthesis programs one after another. Every program is given the
/// same working parset, which starts as a copy of a template and grows with
/// [`SynthesisRunner::add_to_parset`]. Later lines override earlier ones when
/// the programs read the parset.
#[derive(Debug)]
pub struct SynthesisRunner {
    config: RunnerConfig,
    template: PathBuf,
    parset: PathBuf,
}

impl SynthesisRunner {
    /// Create a runner and initialise its working parset from the template.
    /// A relative template path is relative to the working directory.
    pub fn new<P: AsRef<Path>>(
        template: P,
        config: RunnerConfig,
    ) -> Result<SynthesisRunner, RegressionError> {
        let template = config.working_dir.join(template.as_ref());
        if !template.exists() {
            return Err(RegressionError::MissingTemplate(
                template.display().to_string(),
            ));
        }
        let parset = config.working_dir.join(WORKING_PARSET);
        let runner = SynthesisRunner {
            config,
            template,
            parset,
        };
        runner.init_parset()?;
        Ok(runner)
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn working_dir(&self) -> &Path {
        &self.config.working_dir
    }

    pub fn parset_path(&self) -> &Path {
        &self.parset
    }

    /// Reset the working parset to the template.
    pub fn init_parset(&self) -> Result<(), RegressionError> {
        trace!(
            "Initialising {} from {}",
            self.parset.display(),
            self.template.display()
        );
        fs::copy(&self.template, &self.parset)?;
        Ok(())
    }

    /// Append a single line (e.g. `Ccalibrator.solver = SVD`) to the working
    /// parset.
    pub fn add_to_parset(&self, line: &str) -> Result<(), RegressionError> {
        trace!("Adding to parset: {line}");
        let mut f = OpenOptions::new().append(true).open(&self.parset)?;
        writeln!(f, "{line}")?;
        Ok(())
    }

    /// Append all of the options of a builder to the working parset.
    pub fn add_params(&self, params: &Params) -> Result<(), RegressionError> {
        trace!("Adding {} options to parset", params.len());
        let mut f = OpenOptions::new().append(true).open(&self.parset)?;
        f.write_all(params.serialize().as_bytes())?;
        Ok(())
    }

    pub fn run_simulator(&self) -> Result<(), RegressionError> {
        self.run_program(&self.config.simulator, &[])
    }

    pub fn run_imager(&self) -> Result<(), RegressionError> {
        self.run_program(&self.config.imager, &[])
    }

    pub fn run_calibrator(&self) -> Result<(), RegressionError> {
        self.run_program(&self.config.calibrator, &[])
    }

    /// Run the calibrator with MPI on `num_procs` processes.
    pub fn run_calibrator_parallel(&self, num_procs: usize) -> Result<(), RegressionError> {
        let np = num_procs.to_string();
        let calibrator = resolve_program(&self.config.calibrator)?;
        let calibrator = calibrator.display().to_string();
        self.run_program(&self.config.mpirun, &["-np", np.as_str(), calibrator.as_str()])
    }

    /// Get the statistics of an image in the working directory.
    pub fn image_stats(&self, image: &str) -> Result<ImageStats, RegressionError> {
        if !self.config.working_dir.join(image).exists() {
            return Err(RegressionError::MissingImage(image.to_string()));
        }
        let command_str = format!("{} {image}", self.config.image_stats);
        debug!("Running {command_str}");
        let output = Command::new(resolve_program(&self.config.image_stats)?)
            .arg(image)
            .current_dir(&self.config.working_dir)
            .output()
            .map_err(|err| RegressionError::Spawn {
                command: command_str.clone(),
                err,
            })?;
        if !output.status.success() {
            return Err(RegressionError::ProcessFailed {
                command: command_str,
                status: output.status.to_string(),
            });
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stats = ImageStats::parse(&stdout).ok_or_else(|| RegressionError::BadImageStats {
            image: image.to_string(),
            output: stdout.trim().to_string(),
        })?;
        info!("Statistics for {image}: {stats}");
        Ok(stats)
    }

    /// Run `<program> <pre_args...> -c <parset>` in the working directory and
    /// wait for it to finish.
    fn run_program(&self, program: &str, pre_args: &[&str]) -> Result<(), RegressionError> {
        // The program runs in the working directory, so hand it the parset's
        // file name rather than a path relative to here.
        let parset = self
            .parset
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| self.parset.clone());

        let mut cmd = Command::new(resolve_program(program)?);
        cmd.args(pre_args)
            .arg("-c")
            .arg(&parset)
            .current_dir(&self.config.working_dir);
        let command_str = std::iter::once(program.to_string())
            .chain(pre_args.iter().map(|s| s.to_string()))
            .chain(["-c".to_string(), parset.display().to_string()])
            .join(" ");

        info!("Running {command_str}");
        let status = cmd.status().map_err(|err| RegressionError::Spawn {
            command: command_str.clone(),
            err,
        })?;
        if !status.success() {
            return Err(RegressionError::ProcessFailed {
                command: command_str,
                status: status.to_string(),
            });
        }
        debug!("{command_str} finished");
        Ok(())
    }
}

/// Anchor a relative program path with a directory in it (e.g.
/// `./bin/csimulator`) to the current directory, as the program is run from
/// the working directory. Bare names are left to be found on `PATH`.
pub(super) fn resolve_program(program: &str) -> Result<PathBuf, RegressionError> {
    let path = Path::new(program);
    if path.is_relative() && path.components().count() > 1 {
        Ok(std::env::current_dir()?.join(path))
    } else {
        Ok(path.to_path_buf())
    }
}

/// Remove a file or directory tree if it exists. Measurement sets and
/// calibration tables are directories.
pub(super) fn remove_if_exists(path: &Path) -> Result<(), RegressionError> {
    if path.is_dir() {
        debug!("Removing old {}", path.display());
        fs::remove_dir_all(path)?;
    } else if path.exists() {
        debug!("Removing old {}", path.display());
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Unpack a bzip2-compressed tarball into `dir` with the system's `tar`.
pub(super) fn extract_archive(archive: &Path, dir: &Path) -> Result<(), RegressionError> {
    if !archive.exists() {
        return Err(RegressionError::MissingArchive(
            archive.display().to_string(),
        ));
    }
    let archive = archive.canonicalize()?;
    let command_str = format!("tar -xjf {}", archive.display());
    info!("Running {command_str}");
    let status = Command::new("tar")
        .arg("-xjf")
        .arg(&archive)
        .current_dir(dir)
        .status()
        .map_err(|err| RegressionError::Spawn {
            command: command_str.clone(),
            err,
        })?;
    if !status.success() {
        return Err(RegressionError::ProcessFailed {
            command: command_str,
            status: status.to_string(),
        });
    }
    Ok(())
}
