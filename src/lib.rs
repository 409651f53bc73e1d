// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Developer tools for the Yandasoft radio-interferometry suite: builders for
the "parset" configuration files its executables read, a regression harness
that drives those executables, and the Docker images and containers developers
work in.
 */

mod cli;
pub mod constants;
pub mod container;
pub mod parset;
pub mod regression;
pub mod solutions;

// Re-exports.
pub use cli::{Yanda, YandaError};
pub use parset::{Gridder, ParamValue, Params};
