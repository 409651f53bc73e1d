// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors associated with writing and reading parsets.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParamsWriteError {
    #[error("Couldn't create parset file '{file}': {err}")]
    Create { file: String, err: std::io::Error },

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ParsetReadError {
    #[error("Couldn't open parset file '{file}': {err}")]
    Open { file: String, err: std::io::Error },

    #[error("Expected 3 whitespace-separated parts on line {line_num}, got {count}: '{line}'")]
    BadPartCount {
        count: usize,
        line_num: usize,
        line: String,
    },

    #[error("Key and value are supposed to be separated by '=' on line {line_num}, got '{got}'")]
    NoEquals { got: String, line_num: usize },

    #[error("Value is supposed to be in square brackets on line {line_num}, got '{got}'")]
    NoBrackets { got: String, line_num: usize },

    #[error("Expected two comma-separated numbers on line {line_num}, got {count}: '{got}'")]
    BadNumberCount {
        count: usize,
        got: String,
        line_num: usize,
    },

    #[error("Couldn't parse '{text}' as a float on line {line_num}")]
    ParseFloat { text: String, line_num: usize },

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
