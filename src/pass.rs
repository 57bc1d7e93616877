// Copyright 2026 The Changeset Engine Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The pass manager (§2, §7 item 5).
//!
//! Each component is a pass that declares which artifacts it `requires` and
//! which it `produces`. The manager refuses to start a pass whose
//! requirements aren't yet on the books, and records what a pass produces
//! once it returns successfully — this is the only thing standing in for a
//! build-system DAG here, since the component order itself (C1..C11) is
//! fixed and linear.

use std::collections::HashSet;

use tracing::info;
use tracing::instrument;

use crate::error::Error;
use crate::error::Result;

/// Tracks which artifacts have been produced so far in a run.
#[derive(Debug, Default)]
pub struct PassManager {
    produced: HashSet<&'static str>,
}

impl PassManager {
    /// Creates a manager with no artifacts yet produced.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `artifact` as already present, e.g. when resuming a run from a
    /// working directory that already has earlier passes' output on disk.
    pub fn observe_produced(&mut self, artifact: &'static str) {
        self.produced.insert(artifact);
    }

    /// Runs `pass_name`, failing with [`Error::MissingPrerequisite`] if any
    /// of `requires` hasn't been produced yet. On success, every entry in
    /// `produces` is recorded as now present.
    #[instrument(skip(self, body), fields(pass = pass_name))]
    pub fn run_pass<T>(
        &mut self,
        pass_name: &'static str,
        requires: &[&'static str],
        produces: &[&'static str],
        body: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        for &artifact in requires {
            if !self.produced.contains(artifact) {
                return Err(Error::MissingPrerequisite { pass: pass_name, artifact });
            }
        }
        info!(pass = pass_name, "starting pass");
        let result = body()?;
        for &artifact in produces {
            self.produced.insert(artifact);
        }
        info!(pass = pass_name, "finished pass");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_with_unmet_requirement_is_rejected() {
        let mut mgr = PassManager::new();
        let err = mgr
            .run_pass::<()>("c7", &["revision-changesets"], &[], || Ok(()))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MissingPrerequisite { pass: "c7", artifact: "revision-changesets" }
        ));
    }

    #[test]
    fn successful_pass_records_its_products_for_the_next_pass() {
        let mut mgr = PassManager::new();
        mgr.run_pass::<()>("c6", &[], &["revision-changesets"], || Ok(())).unwrap();
        mgr.run_pass::<()>("c7", &["revision-changesets"], &["acyclic-revisions"], || Ok(()))
            .unwrap();
    }

    #[test]
    fn observed_artifacts_satisfy_later_requirements() {
        let mut mgr = PassManager::new();
        mgr.observe_produced("revision-changesets");
        mgr.run_pass::<()>("c7", &["revision-changesets"], &[], || Ok(())).unwrap();
    }
}
