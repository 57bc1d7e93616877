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

//! Configuration recognized by the core (`spec.md` §6).
//!
//! The core owns no config file format and reads no global state: the
//! integrator (the excluded CLI layer, or a test) builds a [`Settings`] value
//! explicitly and threads it through a [`crate::context::RunContext`].

use std::time::Duration;

/// Default commit grouping window: 300 seconds (`spec.md` §4.5, §6).
pub const DEFAULT_COMMIT_WINDOW: Duration = Duration::from_secs(300);

/// Settings recognized by the core.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Maximum time gap tolerated within a single grouped revision
    /// changeset before a new one starts (§4.5).
    pub commit_window: Duration,
    /// Whether a symbol's items may span more than one project. Consulted by
    /// the (external) symbol-policy classifier upstream of this core; carried
    /// here only because downstream passes log it for diagnostics.
    pub cross_project_symbols: bool,
    /// Whether a symbol's items may span more than one branch.
    pub cross_branch_symbols: bool,
    /// When set, skip all symbol changesets entirely: the symbol summary is
    /// not read by the initial changeset builder (§4.5) and the full-graph
    /// cycle breaker (§4.8) becomes a no-op.
    pub trunk_only: bool,
    /// The branch symbol, if any, that the source repository used as a
    /// vendor-style "non-trunk default branch": commits on this branch are
    /// mirrored to trunk with a post-commit (§4.10). Classification of which
    /// branch (if any) plays this role is done upstream of the core; the
    /// core only needs the answer at commit-creation time.
    pub default_branch_symbol: Option<crate::ids::SymbolId>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            commit_window: DEFAULT_COMMIT_WINDOW,
            cross_project_symbols: false,
            cross_branch_symbols: false,
            trunk_only: false,
            default_branch_symbol: None,
        }
    }
}
