// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to analyse calibration solutions read from parsets.
//!
//! Gains are keyed like `gain.<pol>.<antenna>.<beam>[.<channel>]`, where
//! `<pol>` is `g11` or `g22`. Leakages are keyed like `leakage.<d12|d21>...`.

mod error;

pub use error::GainsError;

use std::path::Path;

use indexmap::IndexMap;
use log::{debug, trace};
use num_complex::Complex64;
use strum_macros::{Display, EnumIter, EnumString};

use crate::parset::read_complex_parset;

/// Complex-valued solutions keyed by parameter name, in file order.
pub type Gains = IndexMap<String, Complex64>;

const FIRST_POL_REF: &str = "gain.g11.0.0";
const SECOND_POL_REF: &str = "gain.g22.0.0";
const POLS: [&str; 2] = ["g11", "g22"];

/// Read gains (or leakages, or anything else complex) from a results parset.
/// If `rotate` is true, the gain phases are referenced to the first antenna
/// (see [`rotate_phases`]).
pub fn load_gains<P: AsRef<Path>>(
    path: P,
    key_prefix: &str,
    rotate: bool,
) -> Result<Gains, GainsError> {
    let mut gains = read_complex_parset(path, key_prefix)?;
    if rotate {
        rotate_phases(&mut gains);
    }
    Ok(gains)
}

/// Reference the gain phases so that the first antenna has zero phase on both
/// polarisations. If a polarisation's reference gain is missing (or zero),
/// that polarisation is left untouched.
pub fn rotate_phases(gains: &mut Gains) {
    let unit_conj = |key: &str| -> Complex64 {
        match gains.get(key) {
            Some(g) if g.norm() > 0.0 => g.conj() / g.norm(),
            _ => {
                trace!("No usable reference gain {key}; not rotating its polarisation");
                Complex64::new(1.0, 0.0)
            }
        }
    };
    let first_pol = unit_conj(FIRST_POL_REF);
    let second_pol = unit_conj(SECOND_POL_REF);

    for (key, gain) in gains.iter_mut() {
        if key.contains("gain.g11") {
            *gain *= first_pol;
        }
        if key.contains("gain.g22") {
            *gain *= second_pol;
        }
    }
}

/// Ensure that every gain in `gains` is within `tolerance` of `target`.
pub fn check_gains_near(gains: &Gains, target: Complex64, tolerance: f64) -> Result<(), GainsError> {
    for (key, &got) in gains {
        if (got - target).norm() > tolerance {
            return Err(GainsError::GainNotNear {
                key: key.clone(),
                got,
                target,
                tolerance,
            });
        }
    }
    debug!(
        "All {} parameters are within {tolerance} of {target}",
        gains.len()
    );
    Ok(())
}

/// Ensure that every gain in `gains` is present in `reference` and that they
/// agree to within `tolerance`. Gains only in `reference` are ignored.
pub fn compare_gains(gains: &Gains, reference: &Gains, tolerance: f64) -> Result<(), GainsError> {
    for (key, &got) in gains {
        let expected = *reference
            .get(key)
            .ok_or_else(|| GainsError::MissingGain { key: key.clone() })?;
        if (got - expected).norm() > tolerance {
            return Err(GainsError::GainMismatch {
                key: key.clone(),
                got,
                expected,
                tolerance,
            });
        }
    }
    debug!(
        "All {} parameters agree to within {tolerance}",
        gains.len()
    );
    Ok(())
}

/// Compare the gains in two results parsets, both phase referenced.
pub fn compare_gain_files<P: AsRef<Path>, Q: AsRef<Path>>(
    file1: P,
    file2: Q,
    key_prefix: &str,
    tolerance: f64,
) -> Result<(), GainsError> {
    let gains1 = load_gains(&file1, key_prefix, true)?;
    if gains1.is_empty() {
        return Err(GainsError::NoGains {
            key_prefix: key_prefix.to_string(),
            file: file1.as_ref().display().to_string(),
        });
    }
    let gains2 = load_gains(&file2, key_prefix, true)?;
    compare_gains(&gains1, &gains2, tolerance)
}

/// How differences between neighbouring channels are measured by
/// [`gradient_cost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
pub enum GradientMode {
    /// Differences of the real and imaginary parts.
    #[strum(serialize = "complex")]
    ComplexParts,

    /// Differences of the magnitudes and phases.
    #[strum(serialize = "magphase")]
    MagnitudePhase,
}

/// The sum of squared forward differences in frequency of bandpass gains,
/// over both polarisations, `num_ants` antennas and `num_chans` channels of
/// beam 0. A smooth bandpass has a small cost.
pub fn gradient_cost(
    gains: &Gains,
    num_chans: usize,
    num_ants: usize,
    mode: GradientMode,
) -> Result<f64, GainsError> {
    let get = |key: String| -> Result<Complex64, GainsError> {
        gains
            .get(&key)
            .copied()
            .ok_or(GainsError::GradientMissingGain { key })
    };

    let mut cost = 0.0;
    for pol in POLS {
        for ant in 0..num_ants {
            for chan in 0..num_chans.saturating_sub(1) {
                let curr = get(format!("gain.{pol}.{ant}.0.{chan}"))?;
                let next = get(format!("gain.{pol}.{ant}.0.{}", chan + 1))?;
                match mode {
                    GradientMode::ComplexParts => {
                        cost += (next.re - curr.re).powi(2);
                        cost += (next.im - curr.im).powi(2);
                    }
                    GradientMode::MagnitudePhase => {
                        cost += (next.norm() - curr.norm()).powi(2);
                        cost += (next.arg() - curr.arg()).powi(2);
                    }
                }
            }
        }
    }
    Ok(cost)
}
