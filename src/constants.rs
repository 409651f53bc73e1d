// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Useful constants.

/// All gridder options live under this prefix.
pub const GRIDDER_PREFIX: &str = "Cimager.gridder";

/// The gridder type of a w-projection gridder.
pub const WPROJECT_GRIDDER: &str = "WProject";

// Executables of the Yandasoft suite.
pub const DEFAULT_SIMULATOR: &str = "csimulator";
pub const DEFAULT_IMAGER: &str = "cimager";
pub const DEFAULT_CALIBRATOR: &str = "ccalibrator";
pub const DEFAULT_MPIRUN: &str = "mpirun";
pub const DEFAULT_IMAGE_STATS: &str = "imgstat";

/// The name of the parset the regression runner hands to executables.
pub const WORKING_PARSET: &str = "temp_parset.in";

/// Where ccalibrator writes its solutions when `calibaccess = parset`.
pub const CAL_RESULT_FILE: &str = "result.dat";

/// The model gains used to corrupt simulated visibilities.
pub const MODEL_GAINS_FILE: &str = "rndgains.in";

/// The model gains and leakages used to corrupt simulated visibilities.
pub const MODEL_LEAKAGES_FILE: &str = "rndgainsandleakages.in";

/// The calibration table written by time-dependent solutions.
pub const CAL_TABLE: &str = "caldata.tab";

pub const DEFAULT_CALIBRATOR_TEMPLATE: &str = "calibratortest_template.in";
pub const DEFAULT_LEAKAGE_TEMPLATE: &str = "leakagecalibtest_template.in";
pub const DEFAULT_BANDPASS_ARCHIVE: &str = "vis_4chan.tar.bz2";
pub const DEFAULT_SMOOTHNESS_ARCHIVE: &str = "40chan.ms.tar.bz2";

/// Maximum deviation of gains from unity when the visibilities are not
/// corrupted.
pub const UNCORRUPTED_GAIN_TOLERANCE: f64 = 0.03;

/// Maximum deviation of solved gains from the model gains.
pub const MODEL_GAIN_TOLERANCE: f64 = 0.03;

/// Maximum magnitude of leakages when the visibilities are not corrupted.
pub const UNCORRUPTED_LEAKAGE_TOLERANCE: f64 = 0.003;

/// Maximum deviation of solved leakages from the model leakages.
pub const MODEL_LEAKAGE_TOLERANCE: f64 = 0.04;

/// How far (arcsec) an image peak may be from where it's expected; one
/// cell of the test images.
pub const PEAK_POSITION_TOLERANCE: f64 = 8.0;

/// Maximum deviation of the restored image's peak flux from 1 Jy.
pub const PEAK_FLUX_TOLERANCE: f64 = 0.1;

/// Maximum spread of the peak, rms and median of the weights image.
pub const WEIGHTS_TOLERANCE: f64 = 0.1;

/// Maximum rms of the residual image.
pub const RESIDUAL_RMS_TOLERANCE: f64 = 0.01;

/// Maximum magnitude of the residual image's median.
pub const RESIDUAL_MEDIAN_TOLERANCE: f64 = 1e-4;

/// Serial and parallel bandpass solutions must agree to this level.
pub const SERIAL_PARALLEL_TOLERANCE: f64 = 1e-6;

/// Solutions with different numbers of workers must agree to this level.
pub const WORKER_COUNT_TOLERANCE: f64 = 1e-4;

pub const DEFAULT_DOCKER_IMAGE: &str = "yandabase-mpich:latest";
pub const DEFAULT_TIMEZONE: &str = "Australia/Sydney";

/// Where the host directory is mounted inside the development container.
pub const CONTAINER_MOUNT_POINT: &str = "/home/yanda-user/all_yandasoft";

/// Characters that can't appear in Docker image and recipe names.
pub const FORBIDDEN_NAME_CHARS: &str = "?!@#$%^&* ;<>?|\"\x07\x08\x0c\n\r\t\x0b";
