// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to build and read "parsets", the `key = value` configuration files
//! consumed (and produced) by the Yandasoft executables.
//!
//! [`Params`] accumulates options under a dotted prefix and renders them,
//! [`Gridder`] namespaces options under a gridder type, and
//! [`read_complex_parset`] reads the complex-valued results (gains, leakages)
//! written by the calibrator.

mod error;
mod gridder;
mod params;
mod read;

pub use error::{ParamsWriteError, ParsetReadError};
pub use gridder::Gridder;
pub use params::{ParamValue, Params};
pub use read::{parse_complex_parset, read_complex_parset};
