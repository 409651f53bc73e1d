// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Compare the calibration solutions in two results parsets.

use std::{path::PathBuf, str::FromStr};

use clap::Parser;
use itertools::Itertools;
use log::{info, warn};
use strum::IntoEnumIterator;

use super::common::InfoPrinter;
use crate::{
    cli::YandaError,
    constants::SERIAL_PARALLEL_TOLERANCE,
    solutions::{compare_gains, gradient_cost, load_gains, GainsError, GradientMode},
};

lazy_static::lazy_static! {
    static ref TOLERANCE_HELP: String =
        format!("The largest allowed difference between corresponding solutions. Default: {SERIAL_PARALLEL_TOLERANCE:e}");

    static ref GRADIENT_MODE_HELP: String =
        format!("How differences between channels are measured for the gradient cost. Options: {}. Default: {}", GradientMode::iter().join(", "), GradientMode::ComplexParts);
}

#[derive(Parser, Debug)]
pub(super) struct CompareGainsArgs {
    /// The results parset to check. Every solution in it must also be in the
    /// reference.
    #[clap(name = "SOLUTIONS", parse(from_os_str))]
    solutions: PathBuf,

    /// The results parset to compare against.
    #[clap(name = "REFERENCE", parse(from_os_str))]
    reference: PathBuf,

    #[clap(short, long, help = TOLERANCE_HELP.as_str())]
    tolerance: Option<f64>,

    /// Only parameters whose names start with this are compared, e.g. "gain"
    /// or "leakage".
    #[clap(short, long, default_value = "gain")]
    key_prefix: String,

    /// Don't reference the gain phases to the first antenna before comparing.
    #[clap(long)]
    no_rotate: bool,

    /// The number of channels of the bandpass. If given with --num-ants, the
    /// frequency-gradient cost of both sets of solutions is reported.
    #[clap(long, help_heading = "GRADIENT COST")]
    num_chans: Option<usize>,

    /// The number of antennas of the bandpass.
    #[clap(long, help_heading = "GRADIENT COST")]
    num_ants: Option<usize>,

    #[clap(long, help = GRADIENT_MODE_HELP.as_str(), help_heading = "GRADIENT COST")]
    gradient_mode: Option<String>,
}

impl CompareGainsArgs {
    pub(super) fn run(self) -> Result<(), YandaError> {
        let CompareGainsArgs {
            solutions,
            reference,
            tolerance,
            key_prefix,
            no_rotate,
            num_chans,
            num_ants,
            gradient_mode,
        } = self;
        let tolerance = tolerance.unwrap_or(SERIAL_PARALLEL_TOLERANCE);
        let gradient_mode = match gradient_mode {
            Some(m) => GradientMode::from_str(&m).map_err(|_| {
                YandaError::Solutions(format!(
                    "Unknown gradient mode '{m}'; valid modes are: {}",
                    GradientMode::iter().join(", ")
                ))
            })?,
            None => GradientMode::ComplexParts,
        };

        let gains = load_gains(&solutions, &key_prefix, !no_rotate)?;
        if gains.is_empty() {
            return Err(GainsError::NoGains {
                key_prefix,
                file: solutions.display().to_string(),
            }
            .into());
        }
        let reference_gains = load_gains(&reference, &key_prefix, !no_rotate)?;

        let mut printer = InfoPrinter::new("Comparing solutions".into());
        printer.push_block(vec![
            format!("{}: {} solutions", solutions.display(), gains.len()).into(),
            format!(
                "{}: {} solutions",
                reference.display(),
                reference_gains.len()
            )
            .into(),
        ]);
        printer.push_line(format!("Tolerance: {tolerance:e}").into());
        if no_rotate {
            printer.push_line("Phases not referenced to the first antenna".into());
        }
        printer.display();

        match (num_chans, num_ants) {
            (Some(num_chans), Some(num_ants)) => {
                for (file, g) in [(&solutions, &gains), (&reference, &reference_gains)] {
                    let cost = gradient_cost(g, num_chans, num_ants, gradient_mode)?;
                    info!("Gradient cost of {}: {cost}", file.display());
                }
            }
            (None, None) => (),
            _ => warn!("Both --num-chans and --num-ants are needed for the gradient cost"),
        }

        compare_gains(&gains, &reference_gains, tolerance)?;
        info!(
            "All {} solutions agree to within {tolerance:e}",
            gains.len()
        );
        Ok(())
    }
}
