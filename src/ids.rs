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

//! Stable integer identifiers and the monotonic generators that mint them.
//!
//! Every item and every changeset has a run-unique integer id (§3
//! "Identifiers"). Ids are never reused: a split changeset gets fresh ids for
//! its replacement parts, the original id is simply retired.

use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

/// Defines a newtype wrapping a `u64` id, with the traits every pass needs to
/// use it as a map key, sort key, and stable `Debug`/hex-ish `Display`.
macro_rules! int_id {
    ($(#[$attr:meta])* $vis:vis $name:ident) => {
        $(#[$attr])*
        #[derive(
            serde::Serialize, serde::Deserialize,
            PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash,
        )]
        $vis struct $name(pub u64);

        impl $name {
            /// Returns the wrapped numeric value.
            pub fn value(self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:#x})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:x}", self.0)
            }
        }
    };
}

int_id!(
    /// Identifies an [`crate::item::Item`] within a run.
    pub ItemId
);
int_id!(
    /// Identifies a [`crate::changeset::Changeset`] within a run.
    pub ChangesetId
);
int_id!(
    /// Identifies a file, assigned by the upstream parser.
    pub FileId
);
int_id!(
    /// Identifies a branch or tag symbol, assigned by the upstream parser.
    pub SymbolId
);

/// Monotonic, thread-safe id generator. One instance per id kind is normally
/// shared for the lifetime of a run; ids are never recycled (§1 Non-goals:
/// no incremental re-runs reuse state across invocations).
#[derive(Debug, Default)]
pub struct KeyGenerator {
    next: AtomicU64,
}

impl KeyGenerator {
    /// Creates a generator that will hand out `start, start + 1, ...`.
    pub fn starting_at(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }

    /// Returns the next unused value and advances the generator.
    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Advances the generator so that it will never hand out a value `<= high`.
    ///
    /// Used when ids are read back from a resumed pass's input rather than
    /// minted fresh, so later splits don't collide with ids already on disk.
    pub fn observe(&self, high: u64) {
        self.next.fetch_max(high + 1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_is_monotonic() {
        let gen = KeyGenerator::default();
        let a = gen.next();
        let b = gen.next();
        let c = gen.next();
        assert_eq!([a, b, c], [0, 1, 2]);
    }

    #[test]
    fn observe_advances_past_high_watermark() {
        let gen = KeyGenerator::default();
        gen.next();
        gen.observe(41);
        assert_eq!(gen.next(), 42);
    }

    #[test]
    fn display_and_debug_use_hex() {
        let id = ItemId(255);
        assert_eq!(format!("{id}"), "ff");
        assert_eq!(format!("{id:?}"), "ItemId(0xff)");
    }
}
