// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

// Calibration results (e.g. result.dat written by ccalibrator) look like
//
// gain.g11.0.0 = [1.00129,-0.00302]
// gain.g22.0.0 = [0.99871,0.00412]
// leakage.d12.3.0 = [0.01,-0.02]
//
// i.e. one parameter per line, with exactly three whitespace-separated parts
// and a bracketed complex number without spaces. Only lines starting with the
// requested key prefix are read; everything else is skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use indexmap::IndexMap;
use log::trace;
use num_complex::Complex64;

use super::ParsetReadError;

/// Read all complex-valued parameters whose names start with `key_prefix`
/// (e.g. "gain" or "leakage") from a parset file.
pub fn read_complex_parset<P: AsRef<Path>>(
    path: P,
    key_prefix: &str,
) -> Result<IndexMap<String, Complex64>, ParsetReadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ParsetReadError::Open {
        file: path.display().to_string(),
        err: e,
    })?;
    let res = parse_complex_parset(BufReader::new(file), key_prefix)?;
    trace!(
        "Read {} '{key_prefix}' parameters from {}",
        res.len(),
        path.display()
    );
    Ok(res)
}

/// The same as [`read_complex_parset`], but for anything buffered.
pub fn parse_complex_parset<T: BufRead>(
    reader: T,
    key_prefix: &str,
) -> Result<IndexMap<String, Complex64>, ParsetReadError> {
    let mut res = IndexMap::new();
    for (i_line, line) in reader.lines().enumerate() {
        let line = line?;
        if !line.starts_with(key_prefix) {
            continue;
        }
        let line_num = i_line + 1;

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 3 {
            return Err(ParsetReadError::BadPartCount {
                count: parts.len(),
                line_num,
                line: line.clone(),
            });
        }
        let (key, equals, value) = (parts[0], parts[1], parts[2]);
        if equals != "=" {
            return Err(ParsetReadError::NoEquals {
                got: equals.to_string(),
                line_num,
            });
        }
        let inner = value
            .strip_prefix('[')
            .and_then(|v| v.strip_suffix(']'))
            .ok_or_else(|| ParsetReadError::NoBrackets {
                got: value.to_string(),
                line_num,
            })?;

        let numbers: Vec<&str> = inner.split(',').collect();
        if numbers.len() != 2 {
            return Err(ParsetReadError::BadNumberCount {
                count: numbers.len(),
                got: inner.to_string(),
                line_num,
            });
        }
        let parse = |text: &str| {
            text.trim()
                .parse::<f64>()
                .map_err(|_| ParsetReadError::ParseFloat {
                    text: text.to_string(),
                    line_num,
                })
        };
        let re = parse(numbers[0])?;
        let im = parse(numbers[1])?;

        res.insert(key.to_string(), Complex64::new(re, im));
    }

    Ok(res)
}
