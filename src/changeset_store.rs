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

//! The changeset store and the `item_id → changeset_id` table (§6 "Emitted
//! for output back-end" (a) and (b)).
//!
//! Both artifacts get a fresh on-disk version at the start of each pass that
//! rewrites changesets (§3 "Lifecycle": changesets are created, possibly
//! split, and finally consumed) — the pass manager (`pass.rs`) tracks which
//! version is current.

use std::collections::BTreeMap;
use std::path::Path;

use crate::changeset::Changeset;
use crate::error::Error;
use crate::error::Result;
use crate::ids::ChangesetId;
use crate::ids::ItemId;
use crate::record_table::RecordTable;
use crate::store::IndexedStore;

/// Magic tag identifying a changeset store's on-disk schema.
pub const CHANGESET_STORE_MAGIC: &[u8; 4] = b"CSCS";

/// The changeset store (§6 "(a) A changeset store keyed by changeset id").
#[derive(Debug)]
pub struct ChangesetStore(IndexedStore<Changeset>);

impl ChangesetStore {
    /// Creates a new, empty changeset store.
    pub fn create(data_path: impl AsRef<Path>, table_path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self(IndexedStore::create(data_path, table_path, CHANGESET_STORE_MAGIC)?))
    }

    /// Opens an existing changeset store.
    pub fn open(data_path: impl AsRef<Path>, table_path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self(IndexedStore::open(data_path, table_path, CHANGESET_STORE_MAGIC)?))
    }

    /// Appends `changeset` under its own id.
    pub fn put(&mut self, changeset: &Changeset) -> Result<()> {
        self.0.put(changeset.id().value(), changeset)
    }

    /// Reads back the changeset for `id`.
    pub fn get(&mut self, id: ChangesetId) -> Result<Changeset> {
        self.0.get(id.value())?.ok_or(Error::MissingChangeset(id))
    }

    /// Marks `id` as deleted (§3 "Lifecycle": splitting deletes the
    /// original).
    pub fn delete(&mut self, id: ChangesetId) -> Result<()> {
        self.0.delete(id.value())
    }

    /// Yields every non-deleted changeset, in id order.
    pub fn iter(&mut self) -> Result<Vec<Changeset>> {
        Ok(self.0.iter()?.into_iter().map(|(_, cs)| cs).collect())
    }
}

/// The `item_id → changeset_id` table (§6 "(b)"). Backed by the same
/// fixed-width record table as C2, with values offset by one so `0` can keep
/// meaning "unmapped" while changeset id `0` remains representable (§3
/// "Invariant (partition)": this map must be total over every non-excluded
/// item).
#[derive(Debug)]
pub struct ItemChangesetMap(RecordTable);

impl ItemChangesetMap {
    /// Creates a new, empty mapping.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self(RecordTable::create(path)?))
    }

    /// Opens an existing mapping.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self(RecordTable::open(path)?))
    }

    /// Records that `item_id` now belongs to `changeset_id`.
    pub fn set(&mut self, item_id: ItemId, changeset_id: ChangesetId) -> Result<()> {
        self.0.set(item_id.value(), changeset_id.value() + 1)
    }

    /// Looks up the changeset an item currently belongs to.
    pub fn get(&mut self, item_id: ItemId) -> Result<Option<ChangesetId>> {
        let raw = self.0.get(item_id.value())?;
        Ok((raw != 0).then(|| ChangesetId(raw - 1)))
    }

    /// Loads the whole mapping into memory, e.g. to pass to
    /// [`Changeset::create_graph_node`] across many changesets without
    /// repeated disk seeks.
    pub fn load_all(&mut self, item_ids: impl IntoIterator<Item = ItemId>) -> Result<BTreeMap<ItemId, ChangesetId>> {
        let mut map = BTreeMap::new();
        for id in item_ids {
            if let Some(cs) = self.get(id)? {
                map.insert(id, cs);
            }
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changeset::RevisionChangeset;

    #[test]
    fn changeset_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ChangesetStore::create(dir.path().join("c.dat"), dir.path().join("c.idx")).unwrap();
        let cs = Changeset::Revision(RevisionChangeset { id: ChangesetId(0), item_ids: vec![ItemId(1)] });
        store.put(&cs).unwrap();
        assert_eq!(store.get(ChangesetId(0)).unwrap(), cs);
        assert!(matches!(store.get(ChangesetId(1)).unwrap_err(), Error::MissingChangeset(ChangesetId(1))));
    }

    #[test]
    fn item_changeset_map_round_trips_including_id_zero() {
        let dir = tempfile::tempdir().unwrap();
        let mut map = ItemChangesetMap::create(dir.path().join("m")).unwrap();
        map.set(ItemId(5), ChangesetId(0)).unwrap();
        map.set(ItemId(6), ChangesetId(3)).unwrap();
        assert_eq!(map.get(ItemId(5)).unwrap(), Some(ChangesetId(0)));
        assert_eq!(map.get(ItemId(6)).unwrap(), Some(ChangesetId(3)));
        assert_eq!(map.get(ItemId(7)).unwrap(), None);
    }
}
