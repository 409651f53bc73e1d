// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fmt::{self, Display};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use indexmap::IndexMap;
use log::debug;

use super::ParamsWriteError;

/// A single parset value. The Yandasoft parset syntax has no quoting, so each
/// variant is rendered as plain text; booleans must be the lowercase words
/// `true` and `false`.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ParamValue {
    /// Interpret user-supplied text as a value. Only the words `true` and
    /// `false` become booleans; all other text is kept exactly as given
    /// (apart from surrounding whitespace), so `1.10` stays `1.10`.
    pub fn infer(s: &str) -> ParamValue {
        match s.trim() {
            "true" => ParamValue::Bool(true),
            "false" => ParamValue::Bool(false),
            trimmed => ParamValue::Str(trimmed.to_string()),
        }
    }
}

impl Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(x) => write!(f, "{x}"),
            ParamValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Str(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Str(s)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

impl From<i32> for ParamValue {
    fn from(i: i32) -> Self {
        ParamValue::Int(i64::from(i))
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        ParamValue::Int(i)
    }
}

impl From<u32> for ParamValue {
    fn from(i: u32) -> Self {
        ParamValue::Int(i64::from(i))
    }
}

impl From<usize> for ParamValue {
    fn from(i: usize) -> Self {
        ParamValue::Int(i as i64)
    }
}

impl From<f32> for ParamValue {
    fn from(x: f32) -> Self {
        ParamValue::Float(f64::from(x))
    }
}

impl From<f64> for ParamValue {
    fn from(x: f64) -> Self {
        ParamValue::Float(x)
    }
}

/// A flat set of parset options sharing a common prefix (e.g. `Cimager` or
/// `Cimager.gridder`), optionally scoped further by a group (e.g.
/// `WProject`).
///
/// Options are kept in the order they were first inserted; overwriting an
/// option changes its value but not its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    prefix: String,
    group: Option<String>,
    params: IndexMap<String, ParamValue>,
}

impl Params {
    pub fn new<S: Into<String>>(prefix: S) -> Params {
        Params {
            prefix: prefix.into(),
            group: None,
            params: IndexMap::new(),
        }
    }

    pub fn with_group<S: Into<String>, G: Into<String>>(prefix: S, group: G) -> Params {
        Params {
            prefix: prefix.into(),
            group: Some(group.into()),
            params: IndexMap::new(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// The prefix each rendered line starts with.
    pub fn effective_prefix(&self) -> String {
        match &self.group {
            Some(group) => format!("{}.{group}", self.prefix),
            None => self.prefix.clone(),
        }
    }

    /// Set or overwrite an option. The key is not interpreted in any way.
    pub fn update<K: Into<String>, V: Into<ParamValue>>(&mut self, key: K, value: V) {
        // `IndexMap::insert` keeps the existing slot for a known key.
        self.params.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.params.iter()
    }

    /// Render all options as `<prefix>.<key> = <value>` lines, each
    /// terminated by a newline. This can be called any number of times.
    pub fn serialize(&self) -> String {
        let prefix = self.effective_prefix();
        let mut out = String::new();
        for (key, value) in &self.params {
            out.push_str(&format!("{prefix}.{key} = {value}\n"));
        }
        out
    }

    /// Write the rendered options to `path`, replacing any existing file.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ParamsWriteError> {
        let path = path.as_ref();
        debug!(
            "Writing {} options under '{}' to {}",
            self.len(),
            self.effective_prefix(),
            path.display()
        );
        let file = File::create(path).map_err(|e| ParamsWriteError::Create {
            file: path.display().to_string(),
            err: e,
        })?;
        let mut f = BufWriter::new(file);
        f.write_all(self.serialize().as_bytes())?;
        f.flush()?;
        Ok(())
    }
}

impl Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}
