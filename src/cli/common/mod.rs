// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Things shared by the `yanda` subcommands: argument files, `key=value`
//! settings and writing out parsets.

mod printers;

pub(super) use printers::InfoPrinter;
pub(crate) use printers::{display_warnings, Warn};

use std::{collections::HashSet, io::Write, path::Path};

use itertools::Itertools;
use log::{debug, info};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use super::YandaError;
use crate::parset::{ParamValue, Params};

lazy_static::lazy_static! {
    pub(super) static ref ARG_FILE_TYPES_COMMA_SEPARATED: String = ArgFileTypes::iter().join(", ");

    pub(super) static ref ARG_FILE_HELP: String =
        format!("All arguments may be specified in a file. Any CLI arguments override arguments set in the file. Supported formats: {}", *ARG_FILE_TYPES_COMMA_SEPARATED);
}

#[derive(Debug, Display, EnumIter, EnumString)]
pub(super) enum ArgFileTypes {
    #[strum(serialize = "toml")]
    Toml,
    #[strum(serialize = "json")]
    Json,
}

macro_rules! unpack_arg_file {
    ($arg_file:expr) => ({
        use std::{fs::File, io::Read, str::FromStr};

        use crate::cli::common::{ArgFileTypes, ARG_FILE_TYPES_COMMA_SEPARATED};

        debug!("Attempting to parse argument file {}", $arg_file.display());

        let mut contents = String::new();
        let arg_file_type = $arg_file
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .and_then(|e| ArgFileTypes::from_str(&e).ok());

        match arg_file_type {
            Some(ArgFileTypes::Toml) => {
                debug!("Parsing toml file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match toml::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(YandaError::ArgFile(format!(
                            "Couldn't decode toml structure from {:?}:\n{err}",
                            $arg_file
                        )))
                    }
                }
            }
            Some(ArgFileTypes::Json) => {
                debug!("Parsing json file...");
                let mut fh = File::open(&$arg_file)?;
                fh.read_to_string(&mut contents)?;
                match serde_json::from_str(&contents) {
                    Ok(p) => p,
                    Err(err) => {
                        return Err(YandaError::ArgFile(format!(
                            "Couldn't decode json structure from {:?}:\n{err}",
                            $arg_file
                        )))
                    }
                }
            }

            _ => {
                return Err(YandaError::ArgFile(format!(
                    "Argument file '{:?}' doesn't have a recognised file extension! Valid extensions are: {}", $arg_file, *ARG_FILE_TYPES_COMMA_SEPARATED)
                ))
            }
        }
    });
}

/// Parse a `key=value` setting given on the command line. `true` and `false`
/// become booleans; any other value is written exactly as given.
pub(super) fn parse_setting(s: &str) -> Result<(String, ParamValue), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("Expected key=value, but got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("No key in setting '{s}'"));
    }
    Ok((key.to_string(), ParamValue::infer(value.trim())))
}

/// Apply settings in order with `update`. A key given more than once is
/// reported as a warning; the last value given wins.
pub(super) fn apply_settings<F>(settings: Vec<(String, ParamValue)>, mut update: F)
where
    F: FnMut(String, ParamValue),
{
    let mut seen = HashSet::with_capacity(settings.len());
    for (key, value) in settings {
        if !seen.insert(key.clone()) {
            format!("'{key}' was set more than once; using the last value ({value})").warn();
        }
        update(key, value);
    }
}

/// Write a parset to a file, or to stdout if no file was given.
pub(super) fn output_parset(params: &Params, output: Option<&Path>) -> Result<(), YandaError> {
    match output {
        Some(path) => {
            params.write_to(path)?;
            info!("Wrote {} options to {}", params.len(), path.display());
        }
        None => {
            debug!("Writing parset to stdout");
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            lock.write_all(params.serialize().as_bytes())?;
            lock.flush()?;
        }
    }
    Ok(())
}
