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

//! Deterministic content hashing for revision metadata (Design Notes
//! "Deterministic hashing for metadata").
//!
//! A [`MetadataId`] is a pure function of `(author, log, project_id,
//! branch_name)`: two revisions with identical metadata always produce the
//! same id, on any machine, on any run. This is what lets the initial
//! changeset builder (§4.5) group revisions sharing the same author/log/time
//! window into a single commit.

use std::fmt;

use blake2::Blake2b512;
use blake2::Digest;

use crate::hex_util;

/// Content-addressed id of a `(author, log, project_id?, branch_name?)`
/// tuple. Two equal tuples always hash to the same `MetadataId`, in this run
/// or any other (§1 "Non-goals" excludes byte-layout fidelity, not semantic
/// reproducibility — and §8 property 8, determinism, requires it).
#[derive(serde::Serialize, serde::Deserialize, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetadataId(Vec<u8>);

impl MetadataId {
    /// Computes the id for the given metadata fields. `project_id` and
    /// `branch_name` are optional because the source format may not track
    /// per-project or per-branch metadata separately from the log message.
    pub fn compute(author: &str, log: &str, project_id: Option<&str>, branch_name: Option<&str>) -> Self {
        let mut hasher = Blake2b512::new();
        hasher.update(author.as_bytes());
        hasher.update(b"\0");
        hasher.update(log.as_bytes());
        hasher.update(b"\0");
        hasher.update(project_id.unwrap_or("").as_bytes());
        hasher.update(b"\0");
        hasher.update(branch_name.unwrap_or("").as_bytes());
        Self(hasher.finalize().to_vec())
    }

    /// Returns the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Hex representation, used as the `<metadata_id_hex>` field of the
    /// revision summary file (§4.2).
    pub fn hex(&self) -> String {
        hex_util::encode_hex(&self.0)
    }
}

impl fmt::Debug for MetadataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MetadataId").field(&self.hex()).finish()
    }
}

impl fmt::Display for MetadataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_inputs_hash_identically() {
        let a = MetadataId::compute("alice", "fix bug", Some("proj"), None);
        let b = MetadataId::compute("alice", "fix bug", Some("proj"), None);
        assert_eq!(a, b);
    }

    #[test]
    fn differing_fields_hash_differently() {
        let a = MetadataId::compute("alice", "fix bug", Some("proj"), None);
        let b = MetadataId::compute("bob", "fix bug", Some("proj"), None);
        let c = MetadataId::compute("alice", "fix bug", Some("proj"), Some("br"));
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn separator_prevents_field_concatenation_collisions() {
        // Without a separator, ("ab", "c") and ("a", "bc") would collide.
        let a = MetadataId::compute("ab", "c", None, None);
        let b = MetadataId::compute("a", "bc", None, None);
        assert_ne!(a, b);
    }
}
