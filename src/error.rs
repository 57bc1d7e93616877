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

//! The crate-wide error taxonomy (`spec.md` §7). No error is recovered within
//! the core; every error aborts the current pass and the run, leaving partial
//! artifacts on disk for inspection.

use std::path::PathBuf;

use crate::ids::ChangesetId;
use crate::ids::ItemId;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// All ways a pass can fail. Variants map directly onto `spec.md` §7's
/// taxonomy: input inconsistency, cycle-break regress, I/O failure, lock
/// contention, precondition violation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Dependency symmetry violated: `succ` lists `id` as a successor but `id`
    /// does not list it back as a predecessor, or vice versa.
    #[error(
        "dependency symmetry violated between item {item} and item {other}: \
         edge is not mirrored in both directions"
    )]
    AsymmetricDependency {
        /// The item whose predecessor/successor set was inspected.
        item: ItemId,
        /// The item it names, which failed to name it back.
        other: ItemId,
    },

    /// A referenced item id has no entry in the item store.
    #[error("item {0} referenced but not found in the item store")]
    MissingItem(ItemId),

    /// An item was looked up in the `item_id → changeset_id` table but has no
    /// entry (§3 "Invariant (partition)": the map must be total over every
    /// non-excluded item).
    #[error("item {0} has no changeset mapping; partition invariant violated")]
    UnmappedItem(ItemId),

    /// A referenced changeset id has no entry in the changeset store.
    #[error("changeset {0} referenced but not found in the changeset store")]
    MissingChangeset(ChangesetId),

    /// A symbol item names a symbol kind the symbol database doesn't have, or
    /// a kind inconsistent with the changeset variant it was placed in.
    #[error("symbol {0} has unknown or inconsistent kind")]
    UnknownSymbolKind(crate::ids::SymbolId),

    /// The cycle breaker was invoked but the split it produced did not remove
    /// any cycle edge, so another call would loop forever (§7 item 2).
    #[error(
        "cycle breaker made no progress on cycle through changeset {0}: \
         this indicates a bug in the splitting heuristic"
    )]
    CycleBreakRegress(ChangesetId),

    /// A pass was started before all of its declared required artifacts were
    /// produced by an earlier pass (§7 item 5, §2 "pass manager").
    #[error("pass {pass:?} requires artifact {artifact:?}, which has not been produced yet")]
    MissingPrerequisite {
        /// Name of the pass that could not start.
        pass: &'static str,
        /// Name of the artifact tag the pass manager could not find.
        artifact: &'static str,
    },

    /// The working-directory lock is already held (§7 item 4).
    #[error("lock directory {0:?} already exists; remove it manually if no run is in progress")]
    LockHeld(PathBuf),

    /// An on-disk artifact's header didn't match what this build expects.
    #[error("artifact {path:?} has an incompatible format header")]
    IncompatibleFormat {
        /// Path to the offending artifact.
        path: PathBuf,
    },

    /// Any I/O failure, tagged with the operation and path that failed.
    #[error("I/O error during {operation} on {path:?}")]
    Io {
        /// Short description of what was being attempted.
        operation: &'static str,
        /// Path involved.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A record could not be (de)serialized to/from its on-disk form.
    #[error("failed to (de)serialize record in {path:?}")]
    Codec {
        /// Path of the artifact being read or written.
        path: PathBuf,
        /// The underlying codec error.
        #[source]
        source: Box<bincode::ErrorKind>,
    },
}

impl Error {
    /// Wraps an I/O error with the operation and path that produced it.
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Wraps a `bincode` codec error with the path being (de)serialized.
    pub fn codec(path: impl Into<PathBuf>, source: Box<bincode::ErrorKind>) -> Self {
        Self::Codec {
            path: path.into(),
            source,
        }
    }
}
