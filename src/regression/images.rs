// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Checks of the images cimager makes from the simulated visibilities. The
//! simulated sky is a single 1 Jy point source offset from the phase centre.

use std::fmt;

use log::debug;

use super::{check_tolerance, RegressionError, SynthesisRunner};
use crate::constants::{
    PEAK_FLUX_TOLERANCE, PEAK_POSITION_TOLERANCE, RESIDUAL_MEDIAN_TOLERANCE,
    RESIDUAL_RMS_TOLERANCE, WEIGHTS_TOLERANCE,
};

const RESTORED_IMAGE: &str = "image.field1.restored";
const MODEL_IMAGE: &str = "image.field1";
const PSF_IMAGE: &str = "psf.field1";
const WEIGHTS_IMAGE: &str = "weights.field1";
const RESIDUAL_IMAGE: &str = "residual.field1";

/// The phase centre of the test field (RA, Dec in degrees), where the PSF
/// peaks.
const PSF_PEAK: (f64, f64) = (-172.5, -45.0);

/// The offset of the source from the phase centre in both directions
/// \[radians\].
const SOURCE_OFFSET: f64 = 0.004;

/// Statistics of an image, as reported by the image statistics program.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageStats {
    pub peak: f64,
    /// RA of the peak \[degrees\]
    pub ra: f64,
    /// Dec of the peak \[degrees\]
    pub dec: f64,
    pub rms: f64,
    pub median: f64,
}

impl ImageStats {
    /// Parse `peak ra dec rms median` from the last non-empty line of the
    /// output of the image statistics program.
    pub fn parse(output: &str) -> Option<ImageStats> {
        let line = output.lines().rev().find(|l| !l.trim().is_empty())?;
        let values = line
            .split_whitespace()
            .map(|v| v.parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .ok()?;
        match values.as_slice() {
            [peak, ra, dec, rms, median] => Some(ImageStats {
                peak: *peak,
                ra: *ra,
                dec: *dec,
                rms: *rms,
                median: *median,
            }),
            _ => None,
        }
    }
}

impl fmt::Display for ImageStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "peak {} at ({}, {}), rms {}, median {}",
            self.peak, self.ra, self.dec, self.rms, self.median
        )
    }
}

/// The sky position of a point at offsets `l` and `m` \[degrees\] from
/// `centre` (RA, Dec in degrees) in the SIN projection about `centre`.
pub fn sin_projection(centre: (f64, f64), l: f64, m: f64) -> (f64, f64) {
    let ra0 = centre.0.to_radians();
    let dec0 = centre.1.to_radians();
    let l = l.to_radians();
    let m = m.to_radians();
    let n = (1.0 - l * l - m * m).sqrt();

    let dec = (m * dec0.cos() + dec0.sin() * n).asin();
    let ra = ra0 + l.atan2(dec0.cos() * n - m * dec0.sin());
    (ra.to_degrees(), dec.to_degrees())
}

/// The angle between two sky positions \[degrees\].
pub fn angular_distance(ra1: f64, dec1: f64, ra2: f64, dec2: f64) -> f64 {
    let (ra1, dec1, ra2, dec2) = (
        ra1.to_radians(),
        dec1.to_radians(),
        ra2.to_radians(),
        dec2.to_radians(),
    );
    // Haversine; accurate for the tiny separations of interest here.
    let hav = ((dec2 - dec1) / 2.0).sin().powi(2)
        + dec1.cos() * dec2.cos() * ((ra2 - ra1) / 2.0).sin().powi(2);
    (2.0 * hav.sqrt().min(1.0).asin()).to_degrees()
}

fn check_peak_position(
    name: &str,
    stats: &ImageStats,
    expected: (f64, f64),
) -> Result<(), RegressionError> {
    let offset = angular_distance(stats.ra, stats.dec, expected.0, expected.1) * 3600.0;
    let quantity = format!(
        "Offset (arcsec) of the {name} peak from ({}, {})",
        expected.0, expected.1
    );
    check_tolerance(&quantity, offset, 0.0, PEAK_POSITION_TOLERANCE)
}

/// Check the images of the last imaging run: the source must be where it was
/// simulated with the right flux, the weights must be flat and the residuals
/// must be noise-free.
pub fn analyse_images(runner: &SynthesisRunner) -> Result<(), RegressionError> {
    let offset = SOURCE_OFFSET.to_degrees();
    let true_peak = sin_projection(PSF_PEAK, offset, offset);
    debug!("Expecting the source at {true_peak:?}");

    let stats = runner.image_stats(RESTORED_IMAGE)?;
    check_peak_position("restored image", &stats, true_peak)?;
    check_tolerance(
        "Peak flux of the restored image",
        stats.peak,
        1.0,
        PEAK_FLUX_TOLERANCE,
    )?;

    let stats = runner.image_stats(MODEL_IMAGE)?;
    check_peak_position("model image", &stats, true_peak)?;

    let stats = runner.image_stats(PSF_IMAGE)?;
    check_peak_position("PSF", &stats, PSF_PEAK)?;

    // WProject and WStack gridders make constant weights.
    let stats = runner.image_stats(WEIGHTS_IMAGE)?;
    check_tolerance("Weights image rms", stats.rms, stats.peak, WEIGHTS_TOLERANCE)?;
    check_tolerance(
        "Weights image median",
        stats.median,
        stats.peak,
        WEIGHTS_TOLERANCE,
    )?;
    check_tolerance(
        "Weights image rms (vs. median)",
        stats.rms,
        stats.median,
        WEIGHTS_TOLERANCE,
    )?;

    let stats = runner.image_stats(RESIDUAL_IMAGE)?;
    check_tolerance("Residual image rms", stats.rms, 0.0, RESIDUAL_RMS_TOLERANCE)?;
    check_tolerance(
        "Residual image median",
        stats.median,
        0.0,
        RESIDUAL_MEDIAN_TOLERANCE,
    )?;
    Ok(())
}
