// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Build the gridder part of a Cimager parset.

use std::path::PathBuf;

use clap::Parser;
use log::info;

use super::common::{apply_settings, output_parset, parse_setting, InfoPrinter};
use crate::{
    cli::YandaError,
    constants::WPROJECT_GRIDDER,
    parset::{Gridder, ParamValue},
};

#[derive(Parser, Debug)]
pub(super) struct GridderArgs {
    /// The type of gridder. Options are namespaced under it.
    #[clap(short = 't', long, default_value = WPROJECT_GRIDDER)]
    gridder_type: String,

    /// Add the snapshot-imaging settings (snapshot imaging disabled, but with
    /// a w tolerance of 2600, long-track mode and 1% clipping). Options given
    /// with --set override these.
    #[clap(long)]
    snapshot_imaging: bool,

    /// A gridder option to write, as key=value. May be given many times.
    #[clap(short, long = "set", value_name = "KEY=VALUE", parse(try_from_str = parse_setting))]
    settings: Vec<(String, ParamValue)>,

    /// Write the parset here instead of to stdout.
    #[clap(short, long, parse(from_os_str))]
    output: Option<PathBuf>,
}

impl GridderArgs {
    /// Will the parset be written to stdout?
    pub(super) fn writes_to_stdout(&self, dry_run: bool) -> bool {
        !dry_run && self.output.is_none()
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), YandaError> {
        let GridderArgs {
            gridder_type,
            snapshot_imaging,
            settings,
            output,
        } = self;

        let mut gridder = Gridder::new(gridder_type);
        if snapshot_imaging {
            gridder.snapshot_imaging();
        }
        apply_settings(settings, |key, value| gridder.update(key, value));

        if dry_run {
            let mut printer = InfoPrinter::new("Gridder".into());
            printer.push_line(format!("Type: {}", gridder.gridder_type()).into());
            printer.push_line(format!("Options: {}", gridder.params().len()).into());
            printer.display();
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        output_parset(gridder.params(), output.as_deref())
    }
}
