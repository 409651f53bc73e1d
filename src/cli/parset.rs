// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Build a parset from `key=value` settings.

use std::path::PathBuf;

use clap::Parser;
use log::{debug, info};

use super::common::{apply_settings, output_parset, parse_setting, InfoPrinter};
use crate::{
    cli::YandaError,
    parset::{ParamValue, Params},
};

#[derive(Parser, Debug)]
pub(super) struct ParsetArgs {
    /// The dot-separated path every option is written under, e.g.
    /// "Cimager" or "Ccalibrator.solver".
    #[clap(short, long)]
    prefix: String,

    /// An optional group appended to the prefix, e.g. "LSQR".
    #[clap(short, long)]
    group: Option<String>,

    /// An option to write, as key=value. May be given many times; options are
    /// written in the order they're first given.
    #[clap(short, long = "set", value_name = "KEY=VALUE", parse(try_from_str = parse_setting))]
    settings: Vec<(String, ParamValue)>,

    /// Write the parset here instead of to stdout.
    #[clap(short, long, parse(from_os_str))]
    output: Option<PathBuf>,
}

impl ParsetArgs {
    /// Will the parset be written to stdout?
    pub(super) fn writes_to_stdout(&self, dry_run: bool) -> bool {
        !dry_run && self.output.is_none()
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), YandaError> {
        let ParsetArgs {
            prefix,
            group,
            settings,
            output,
        } = self;

        let mut params = match group {
            Some(group) => Params::with_group(prefix, group),
            None => Params::new(prefix),
        };
        apply_settings(settings, |key, value| params.update(key, value));
        debug!("{} options under {}", params.len(), params.effective_prefix());

        if dry_run {
            let mut printer = InfoPrinter::new("Parset".into());
            printer.push_line(format!("Prefix: {}", params.effective_prefix()).into());
            printer.push_line(format!("Options: {}", params.len()).into());
            if let Some(output) = output.as_ref() {
                printer.push_line(format!("Output: {}", output.display()).into());
            }
            printer.display();
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        output_parset(&params, output.as_deref())
    }
}
