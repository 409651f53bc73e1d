// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Run the calibration regression tests against installed Yandasoft
//! executables.

use std::{path::PathBuf, str::FromStr};

use clap::Parser;
use itertools::Itertools;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

use super::common::{InfoPrinter, ARG_FILE_HELP};
use crate::{
    cli::YandaError,
    constants::*,
    regression::{
        bandpass_parallel_scenario, calibrator_scenario, leakage_scenario,
        smoothness_gradient_cost_scenario, smoothness_parallel_scenario, CalSolver, RunnerConfig,
    },
};

lazy_static::lazy_static! {
    static ref SUITE_HELP: String =
        format!("The regression tests to run. Options: {}. Default: {}", RegressionSuite::iter().join(", "), RegressionSuite::Calibrator);

    static ref SOLVER_HELP: String =
        format!("Only test this calibration solver. Options: {}. Default: all of them", CalSolver::iter().join(", "));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
pub(super) enum RegressionSuite {
    #[strum(serialize = "calibrator")]
    Calibrator,

    #[strum(serialize = "leakage")]
    Leakage,
}

/// The bandpass solution is compared between serial and parallel runs with
/// this many calibration cycles.
const BANDPASS_NUM_CYCLES: [usize; 2] = [1, 5];

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct RegressionArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    #[clap(long, help = SUITE_HELP.as_str(), help_heading = "TESTS")]
    pub(super) suite: Option<String>,

    #[clap(long, help = SOLVER_HELP.as_str(), help_heading = "TESTS")]
    pub(super) solver: Option<String>,

    /// Also run the parallel bandpass tests. These need MPI and the
    /// measurement set archives. Only used by the calibrator suite.
    #[clap(short, long, help_heading = "TESTS")]
    #[serde(default)]
    pub(super) parallel: bool,

    /// The template parset, relative to the working directory. Default:
    /// calibratortest_template.in or leakagecalibtest_template.in, depending
    /// on the suite.
    #[clap(long, help_heading = "INPUT FILES")]
    pub(super) template: Option<PathBuf>,

    /// The measurement set archive for the serial/parallel bandpass test,
    /// relative to the working directory.
    #[clap(long, help_heading = "INPUT FILES")]
    pub(super) bandpass_archive: Option<PathBuf>,

    /// The measurement set archive for the smoothness-constraint tests,
    /// relative to the working directory.
    #[clap(long, help_heading = "INPUT FILES")]
    pub(super) smoothness_archive: Option<PathBuf>,

    /// The directory the executables are run in. Default: the current
    /// directory.
    #[clap(short, long, help_heading = "EXECUTABLES")]
    pub(super) working_dir: Option<PathBuf>,

    /// The simulator to run. Default: csimulator
    #[clap(long, help_heading = "EXECUTABLES")]
    pub(super) simulator: Option<String>,

    /// The imager to run. Default: cimager
    #[clap(long, help_heading = "EXECUTABLES")]
    pub(super) imager: Option<String>,

    /// The calibrator to run. Default: ccalibrator
    #[clap(long, help_heading = "EXECUTABLES")]
    pub(super) calibrator: Option<String>,

    /// The MPI launcher for parallel runs. Default: mpirun
    #[clap(long, help_heading = "EXECUTABLES")]
    pub(super) mpirun: Option<String>,

    /// The program that prints "peak ra dec rms median" for an image.
    /// Default: imgstat
    #[clap(long, help_heading = "EXECUTABLES")]
    pub(super) image_stats: Option<String>,
}

/// What the regression tests will do, after the arguments have been checked.
#[derive(Debug)]
struct RegressionParams {
    suite: RegressionSuite,
    solvers: Vec<CalSolver>,
    parallel: bool,
    template: PathBuf,
    bandpass_archive: PathBuf,
    smoothness_archive: PathBuf,
    config: RunnerConfig,
}

impl RegressionArgs {
    /// Both command-line and file arguments overlap in terms of what is
    /// available; this function consolidates everything that was specified into
    /// a single struct. Where applicable, it will prefer CLI parameters over
    /// those in the file.
    pub(super) fn merge(self) -> Result<RegressionArgs, YandaError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            // Ensure all of the file args are accounted for by pattern
            // matching.
            let RegressionArgs {
                args_file: _,
                suite,
                solver,
                parallel,
                template,
                bandpass_archive,
                smoothness_archive,
                working_dir,
                simulator,
                imager,
                calibrator,
                mpirun,
                image_stats,
            } = unpack_arg_file!(arg_file);

            Ok(RegressionArgs {
                args_file: None,
                suite: cli_args.suite.or(suite),
                solver: cli_args.solver.or(solver),
                parallel: cli_args.parallel || parallel,
                template: cli_args.template.or(template),
                bandpass_archive: cli_args.bandpass_archive.or(bandpass_archive),
                smoothness_archive: cli_args.smoothness_archive.or(smoothness_archive),
                working_dir: cli_args.working_dir.or(working_dir),
                simulator: cli_args.simulator.or(simulator),
                imager: cli_args.imager.or(imager),
                calibrator: cli_args.calibrator.or(calibrator),
                mpirun: cli_args.mpirun.or(mpirun),
                image_stats: cli_args.image_stats.or(image_stats),
            })
        } else {
            Ok(cli_args)
        }
    }

    fn parse(self) -> Result<RegressionParams, RegressionArgsError> {
        trace!("{:#?}", self);

        let RegressionArgs {
            args_file: _,
            suite,
            solver,
            parallel,
            template,
            bandpass_archive,
            smoothness_archive,
            working_dir,
            simulator,
            imager,
            calibrator,
            mpirun,
            image_stats,
        } = self;

        let suite = match suite {
            Some(s) => RegressionSuite::from_str(&s).map_err(|_| {
                RegressionArgsError::UnknownSuite {
                    got: s,
                    valid: RegressionSuite::iter().join(", "),
                }
            })?,
            None => RegressionSuite::Calibrator,
        };
        let solvers = match solver {
            Some(s) => vec![CalSolver::from_str(&s).map_err(|_| {
                RegressionArgsError::UnknownSolver {
                    got: s,
                    valid: CalSolver::iter().join(", "),
                }
            })?],
            None => CalSolver::iter().collect(),
        };
        if parallel && suite != RegressionSuite::Calibrator {
            return Err(RegressionArgsError::ParallelNeedsCalibrator);
        }

        let template = template.unwrap_or_else(|| {
            PathBuf::from(match suite {
                RegressionSuite::Calibrator => DEFAULT_CALIBRATOR_TEMPLATE,
                RegressionSuite::Leakage => DEFAULT_LEAKAGE_TEMPLATE,
            })
        });

        let defaults = RunnerConfig::default();
        let config = RunnerConfig {
            simulator: simulator.unwrap_or(defaults.simulator),
            imager: imager.unwrap_or(defaults.imager),
            calibrator: calibrator.unwrap_or(defaults.calibrator),
            mpirun: mpirun.unwrap_or(defaults.mpirun),
            image_stats: image_stats.unwrap_or(defaults.image_stats),
            working_dir: working_dir.unwrap_or(defaults.working_dir),
        };
        if !config.working_dir.is_dir() {
            return Err(RegressionArgsError::NoWorkingDir(
                config.working_dir.display().to_string(),
            ));
        }

        Ok(RegressionParams {
            suite,
            solvers,
            parallel,
            template,
            bandpass_archive: bandpass_archive
                .unwrap_or_else(|| PathBuf::from(DEFAULT_BANDPASS_ARCHIVE)),
            smoothness_archive: smoothness_archive
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SMOOTHNESS_ARCHIVE)),
            config,
        })
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), YandaError> {
        debug!("Converting arguments into parameters");
        let params = self.parse()?;
        params.display();

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        params.run()
    }
}

impl RegressionParams {
    fn display(&self) {
        let mut printer = InfoPrinter::new(format!("{} regression tests", self.suite).into());
        printer.push_line(
            format!(
                "Solvers: {}",
                self.solvers.iter().map(|s| s.to_string()).join(", ")
            )
            .into(),
        );
        printer.push_line(format!("Template parset: {}", self.template.display()).into());
        if self.parallel {
            printer.push_block(vec![
                "Parallel bandpass tests".into(),
                format!("Bandpass archive: {}", self.bandpass_archive.display()).into(),
                format!("Smoothness archive: {}", self.smoothness_archive.display()).into(),
            ]);
        }
        printer.push_block(vec![
            format!("Working directory: {}", self.config.working_dir.display()).into(),
            format!("Simulator: {}", self.config.simulator).into(),
            format!("Imager: {}", self.config.imager).into(),
            format!("Calibrator: {}", self.config.calibrator).into(),
            format!("MPI launcher: {}", self.config.mpirun).into(),
            format!("Image statistics: {}", self.config.image_stats).into(),
        ]);
        printer.display();
    }

    fn run(&self) -> Result<(), YandaError> {
        for &solver in &self.solvers {
            match self.suite {
                RegressionSuite::Calibrator => {
                    calibrator_scenario(&self.config, &self.template, solver)?
                }
                RegressionSuite::Leakage => leakage_scenario(&self.config, &self.template, solver)?,
            }
        }

        if self.parallel {
            for num_cycles in BANDPASS_NUM_CYCLES {
                bandpass_parallel_scenario(&self.config, &self.bandpass_archive, num_cycles)?;
            }
            smoothness_parallel_scenario(&self.config, &self.smoothness_archive)?;
            smoothness_gradient_cost_scenario(&self.config, &self.smoothness_archive)?;
        }

        info!("All {} regression tests passed", self.suite);
        Ok(())
    }
}

#[derive(Error, Debug)]
pub(super) enum RegressionArgsError {
    #[error("Unknown regression suite '{got}'; valid suites are: {valid}")]
    UnknownSuite { got: String, valid: String },

    #[error("Unknown calibration solver '{got}'; valid solvers are: {valid}")]
    UnknownSolver { got: String, valid: String },

    #[error("The parallel tests are only part of the calibrator suite")]
    ParallelNeedsCalibrator,

    #[error("The working directory '{0}' doesn't exist")]
    NoWorkingDir(String),
}
