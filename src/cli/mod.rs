// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Command-line interface code. More specific options for `yanda`
//! subcommands are contained in modules.
//!
//! Arguments that can come from an arguments file follow these rules: all
//! booleans must have `#[serde(default)]` annotated, and anything that isn't
//! a boolean must be optional.
//!
//! Only 3 things should be public in this module: `Yanda`, `Yanda::run`, and
//! `YandaError`.

#[macro_use]
mod common;
mod compare_gains;
mod container;
mod error;
mod gridder;
mod images;
mod parset;
mod regression;

pub use error::YandaError;

use std::path::PathBuf;

use clap::{AppSettings, Args, Parser, Subcommand};
use log::info;

// Add build-time information from the "built" crate.
include!(concat!(env!("OUT_DIR"), "/built.rs"));

#[derive(Debug, Parser)]
#[clap(
    version,
    author,
    about = r#"Developer tools for the Yandasoft radio-interferometry suite.
Builds parsets, runs calibration regression tests, and makes and starts development containers."#
)]
#[clap(global_setting(AppSettings::DeriveDisplayOrder))]
#[clap(disable_help_subcommand = true)]
#[clap(infer_subcommands = true)]
#[clap(propagate_version = true)]
#[clap(infer_long_args = true)]
pub struct Yanda {
    #[clap(flatten)]
    global_opts: GlobalArgs,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// The verbosity of the program. Increase by specifying multiple times
    /// (e.g. -vv). The default is to print only high-level information.
    #[clap(short, long, parse(from_occurrences))]
    #[clap(global = true)]
    verbosity: u8,

    /// Only verify that arguments were correctly ingested and print out
    /// high-level information.
    #[clap(long)]
    #[clap(global = true)]
    dry_run: bool,

    /// Save the input arguments into a new TOML file that can be used to
    /// reproduce this run. Only used by the regression subcommand.
    #[clap(long)]
    #[clap(global = true)]
    save_toml: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
#[clap(arg_required_else_help = true)]
enum Command {
    #[clap(about = "Write a parset of options under a prefix (and optional group).")]
    Parset(parset::ParsetArgs),

    #[clap(about = "Write the gridder options of a Cimager parset.")]
    Gridder(gridder::GridderArgs),

    #[clap(alias = "compare-solutions")]
    #[clap(about = "Check that the calibration solutions in two results parsets agree.")]
    CompareGains(compare_gains::CompareGainsArgs),

    #[clap(about = r#"Run the calibration regression tests.
Csimulator, cimager and ccalibrator are run in the working directory, which must hold the template parsets and model gains."#)]
    Regression(regression::RegressionArgs),

    #[clap(alias = "docker")]
    #[clap(about = "Start an interactive Yandasoft development container with Docker.")]
    Container(container::ContainerArgs),

    #[clap(alias = "docker-images")]
    #[clap(about = r#"Write the Dockerfiles of Yandasoft images and optionally build them.
Each target has a base image with Yandasoft's dependencies and a final image with Yandasoft built on it."#)]
    Images(images::ImagesArgs),
}

impl Yanda {
    pub fn run(self) -> Result<(), YandaError> {
        // Set up logging.
        let GlobalArgs {
            verbosity,
            dry_run,
            save_toml,
        } = self.global_opts;
        // A parset written to stdout must not be mixed with log messages.
        let parset_on_stdout = match &self.command {
            Command::Parset(args) => args.writes_to_stdout(dry_run),
            Command::Gridder(args) => args.writes_to_stdout(dry_run),
            _ => false,
        };
        setup_logging(
            verbosity,
            if parset_on_stdout {
                env_logger::Target::Stderr
            } else {
                env_logger::Target::Stdout
            },
        );

        // Print the version of yanda and its build-time information.
        let sub_command = match &self.command {
            Command::Parset(_) => "parset",
            Command::Gridder(_) => "gridder",
            Command::CompareGains(_) => "compare-gains",
            Command::Regression(_) => "regression",
            Command::Container(_) => "container",
            Command::Images(_) => "images",
        };
        info!("yanda {} {}", sub_command, env!("CARGO_PKG_VERSION"));
        display_build_info();

        let result = match self.command {
            Command::Parset(args) => args.run(dry_run),
            Command::Gridder(args) => args.run(dry_run),
            Command::CompareGains(args) => args.run(),
            Command::Regression(args) => merge_save_run(args, save_toml, dry_run),
            Command::Container(args) => args.run(dry_run),
            Command::Images(args) => args.run(dry_run),
        };
        common::display_warnings();
        result?;

        info!("yanda {} complete.", sub_command);
        Ok(())
    }
}

/// Merge the regression arguments with any arguments file, optionally save
/// them, then run.
fn merge_save_run(
    args: regression::RegressionArgs,
    save_toml: Option<PathBuf>,
    dry_run: bool,
) -> Result<(), YandaError> {
    use std::{
        fs::File,
        io::{BufWriter, Write},
    };

    let args = args.merge()?;
    if let Some(toml) = save_toml {
        let mut f = BufWriter::new(File::create(&toml)?);
        let toml_str = toml::to_string(&args)
            .map_err(|e| YandaError::ArgFile(format!("Couldn't serialise arguments: {e}")))?;
        f.write_all(toml_str.as_bytes())?;
        info!("Saved arguments to {}", toml.display());
    }
    args.run(dry_run)
}

/// Activate a logger. All log messages are put onto `target` (`stdout`
/// unless that is taken by a parset). `env_logger`
/// automatically only uses colours and fancy symbols if we're on a tty (e.g. a
/// terminal); piped output will be formatted sensibly. Source code lines are
/// displayed in log messages when verbosity >= 3.
fn setup_logging(verbosity: u8, target: env_logger::Target) {
    let mut builder = env_logger::Builder::from_default_env();
    builder.target(target);
    builder.format_target(false);
    match verbosity {
        0 => builder.filter_level(log::LevelFilter::Info),
        1 => builder.filter_level(log::LevelFilter::Debug),
        2 => builder.filter_level(log::LevelFilter::Trace),
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
            builder.format(|buf, record| {
                use std::io::Write;

                let timestamp = buf.timestamp();
                let level = record.level();
                let target = record.target();
                let line = record.line().unwrap_or(0);
                let message = record.args();

                writeln!(buf, "[{timestamp} {level} {target}:{line}] {message}")
            })
        }
    };
    // Only fails if a logger was already set up.
    let _ = builder.try_init();
}

/// Write many info-level log lines of how this executable was compiled.
fn display_build_info() {
    let dirty = match GIT_DIRTY {
        Some(true) => " (dirty)",
        _ => "",
    };
    match GIT_COMMIT_HASH_SHORT {
        Some(hash) => {
            info!("Compiled on git commit hash: {hash}{dirty}");
        }
        None => info!("Compiled on git commit hash: <no git info>"),
    }
    if let Some(hr) = GIT_HEAD_REF {
        info!("            git head ref: {}", hr);
    }
    info!("            {}", BUILT_TIME_UTC);
    info!("         with compiler {}", RUSTC_VERSION);
    info!("");
}
