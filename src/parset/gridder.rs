// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use super::{ParamValue, Params};
use crate::constants::{GRIDDER_PREFIX, WPROJECT_GRIDDER};

/// Options for a `Cimager` gridder. Every option is namespaced under the
/// gridder type, e.g. `wmax` on a "WProject" gridder becomes
/// `Cimager.gridder.WProject.wmax`.
#[derive(Debug, Clone, PartialEq)]
pub struct Gridder {
    params: Params,
    gridder_type: String,
}

impl Gridder {
    pub fn new<S: Into<String>>(gridder_type: S) -> Gridder {
        Gridder {
            params: Params::new(GRIDDER_PREFIX),
            gridder_type: gridder_type.into(),
        }
    }

    /// A "WProject" gridder.
    pub fn wproject() -> Gridder {
        Gridder::new(WPROJECT_GRIDDER)
    }

    pub fn gridder_type(&self) -> &str {
        &self.gridder_type
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn update<K: AsRef<str>, V: Into<ParamValue>>(&mut self, key: K, value: V) {
        self.params
            .update(format!("{}.{}", self.gridder_type, key.as_ref()), value);
    }

    /// Settings for snapshot imaging. These are the same for every gridder
    /// type.
    pub fn snapshot_imaging(&mut self) {
        self.update("snapshotimaging", false);
        self.update("snapshotimaging.wtolerance", 2600);
        self.update("snapshotimaging.longtrack", true);
        self.update("snapshotimaging.clipping", 0.01);
    }

    pub fn serialize(&self) -> String {
        self.params.serialize()
    }
}
