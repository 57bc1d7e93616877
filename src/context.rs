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

//! The explicit run context (Design Notes "Forbid hidden globals").
//!
//! Every pass takes a `&RunContext` instead of reaching for a global
//! singleton: settings, the working directory, and the shared id generators
//! are all plain fields, so a pass's dependencies are visible in its
//! signature.

use std::path::Path;
use std::path::PathBuf;

use crate::config::Settings;
use crate::ids::KeyGenerator;

/// Bundles everything a pass needs that isn't itself an artifact (§2, Design
/// Notes "Forbid hidden globals").
#[derive(Debug)]
pub struct RunContext {
    /// Directory holding every artifact this run reads or writes.
    working_dir: PathBuf,
    /// Configuration recognized by the core (§6).
    pub settings: Settings,
    /// Shared id generator for items, seeded past every id already on disk
    /// when resuming a pass (§3 "Identifiers").
    pub item_ids: KeyGenerator,
    /// Shared id generator for changesets.
    pub changeset_ids: KeyGenerator,
}

impl RunContext {
    /// Builds a context rooted at `working_dir`, with fresh id generators
    /// starting at zero. Callers resuming a run from an earlier pass's
    /// output should call [`KeyGenerator::observe`] on `item_ids`/
    /// `changeset_ids` after loading the existing stores.
    pub fn new(working_dir: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            working_dir: working_dir.into(),
            settings,
            item_ids: KeyGenerator::default(),
            changeset_ids: KeyGenerator::default(),
        }
    }

    /// The directory every artifact path is resolved relative to.
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Resolves an artifact's file name to a path under the working
    /// directory.
    pub fn artifact_path(&self, file_name: &str) -> PathBuf {
        self.working_dir.join(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_paths_are_resolved_under_the_working_dir() {
        let ctx = RunContext::new("/tmp/run", Settings::default());
        assert_eq!(ctx.artifact_path("items.dat"), PathBuf::from("/tmp/run/items.dat"));
    }

    #[test]
    fn id_generators_start_independent_and_fresh() {
        let ctx = RunContext::new("/tmp/run", Settings::default());
        assert_eq!(ctx.item_ids.next(), 0);
        assert_eq!(ctx.changeset_ids.next(), 0);
    }
}
