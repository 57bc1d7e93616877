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

//! The item sum type (`spec.md` §3 "Item").
//!
//! Items are created once by the (external) parser and never mutated by the
//! core afterward: ids of referenced items may be rewritten as changesets
//! split, but item content is stable for the lifetime of a run.

use serde::Deserialize;
use serde::Serialize;

use crate::error::Error;
use crate::error::Result;
use crate::ids::FileId;
use crate::ids::ItemId;
use crate::ids::SymbolId;
use crate::store::IndexedStore;

/// Magic tag identifying an item store's on-disk schema.
pub const ITEM_STORE_MAGIC: &[u8; 4] = b"CSIT";

/// The indexed item store (C1), specialized to [`Item`] records.
#[derive(Debug)]
pub struct ItemStore(IndexedStore<Item>);

impl ItemStore {
    /// Creates a new, empty item store.
    pub fn create(data_path: impl AsRef<std::path::Path>, table_path: impl AsRef<std::path::Path>) -> Result<Self> {
        Ok(Self(IndexedStore::create(data_path, table_path, ITEM_STORE_MAGIC)?))
    }

    /// Opens an existing item store.
    pub fn open(data_path: impl AsRef<std::path::Path>, table_path: impl AsRef<std::path::Path>) -> Result<Self> {
        Ok(Self(IndexedStore::open(data_path, table_path, ITEM_STORE_MAGIC)?))
    }

    /// Appends `item` under its own id.
    pub fn put(&mut self, item: &Item) -> Result<()> {
        self.0.put(item.id().value(), item)
    }

    /// Reads back the item for `id`, failing with [`Error::MissingItem`] if
    /// it was never written or has been deleted (§4.1 "fails with NotFound
    /// when the offset is 0").
    pub fn get(&mut self, id: ItemId) -> Result<Item> {
        self.0.get(id.value())?.ok_or(Error::MissingItem(id))
    }

    /// Marks `id` as deleted. Space is not reclaimed (§4.1).
    pub fn delete(&mut self, id: ItemId) -> Result<()> {
        self.0.delete(id.value())
    }

    /// Yields every non-deleted item, in id order.
    pub fn iter(&mut self) -> Result<Vec<Item>> {
        Ok(self.0.iter()?.into_iter().map(|(_, item)| item).collect())
    }
}

/// A line of development: trunk, or a named branch symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineOfDevelopment {
    /// The default, unnamed line of development.
    Trunk,
    /// A named branch, identified by its symbol id.
    Branch(SymbolId),
}

/// What a revision did to its file's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    /// The file did not exist on this line of development before; it does
    /// now.
    Add,
    /// The file existed before and its content changed.
    Change,
    /// The file is removed from this line of development as of this
    /// revision.
    Delete,
    /// No content change (e.g. a revision created only to carry a symbol
    /// attachment).
    Noop,
}

/// One revision of one file on one line of development (§3 "Revision item").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionItem {
    /// This item's id.
    pub id: ItemId,
    /// The file this revision belongs to.
    pub file_id: FileId,
    /// Path within the file's line of development at the time of this
    /// revision (paths can move across renames the parser has already
    /// resolved).
    pub path: String,
    /// Trunk or branch.
    pub lod: LineOfDevelopment,
    /// Revision timestamp, in integer seconds since the epoch.
    pub timestamp: i64,
    /// What happened to the file's content.
    pub op: OperationKind,
    /// Digest of this revision's author/log/project/branch metadata.
    pub metadata_id: crate::metadata::MetadataId,
    /// Revision-number components, most-significant first (e.g. CVS's
    /// `1.2.3` becomes `[1, 2, 3]`), used to break ties when ordering items
    /// that share a timestamp (§4.5 step 2).
    pub revision_number: Vec<u64>,
    /// Predecessor item ids, in the order the parser recorded them.
    pub pred: Vec<ItemId>,
    /// Successor item ids, in the order the parser recorded them.
    pub succ: Vec<ItemId>,
    /// Symbol items for tags attached at this revision.
    pub tag_item_ids: Vec<ItemId>,
    /// Symbol items for branches attached at this revision.
    pub branch_item_ids: Vec<ItemId>,
    /// Symbols that close (stop tracking) as of this revision.
    pub closing_symbol_ids: Vec<SymbolId>,
}

/// One attachment of a branch or tag symbol to one file (§3 "Symbol item").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolItem {
    /// This item's id.
    pub id: ItemId,
    /// The file this symbol is attached to.
    pub file_id: FileId,
    /// Which symbol this attachment belongs to.
    pub symbol_id: SymbolId,
    /// Predecessor item ids (normally the revision item this symbol was cut
    /// from).
    pub pred: Vec<ItemId>,
    /// Successor item ids (for branches: the first revision committed on
    /// the branch, if any).
    pub succ: Vec<ItemId>,
}

/// The item sum type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Item {
    /// §3 "Revision item".
    Revision(RevisionItem),
    /// §3 "Symbol item".
    Symbol(SymbolItem),
}

impl Item {
    /// Returns this item's id, regardless of variant.
    pub fn id(&self) -> ItemId {
        match self {
            Item::Revision(r) => r.id,
            Item::Symbol(s) => s.id,
        }
    }

    /// Returns the file this item belongs to.
    pub fn file_id(&self) -> FileId {
        match self {
            Item::Revision(r) => r.file_id,
            Item::Symbol(s) => s.file_id,
        }
    }

    /// Returns this item's predecessor ids.
    pub fn pred(&self) -> &[ItemId] {
        match self {
            Item::Revision(r) => &r.pred,
            Item::Symbol(s) => &s.pred,
        }
    }

    /// Returns this item's successor ids.
    pub fn succ(&self) -> &[ItemId] {
        match self {
            Item::Revision(r) => &r.succ,
            Item::Symbol(s) => &s.succ,
        }
    }

    /// Returns the revision item, if this is one.
    pub fn as_revision(&self) -> Option<&RevisionItem> {
        match self {
            Item::Revision(r) => Some(r),
            Item::Symbol(_) => None,
        }
    }

    /// Returns the symbol item, if this is one.
    pub fn as_symbol(&self) -> Option<&SymbolItem> {
        match self {
            Item::Symbol(s) => Some(s),
            Item::Revision(_) => None,
        }
    }
}

/// Verifies the dependency-symmetry invariant (§3, §8 property 1) over a
/// closed collection of items: for every item `x` and every `s` in
/// `x.succ()`, the item with id `s` must list `x.id()` among its
/// predecessors, and vice versa.
pub fn check_dependency_symmetry<'a>(
    items: impl IntoIterator<Item = &'a Item>,
) -> crate::error::Result<()> {
    use std::collections::HashMap;

    let items: Vec<&Item> = items.into_iter().collect();
    let by_id: HashMap<ItemId, &Item> = items.iter().map(|item| (item.id(), *item)).collect();

    for item in &items {
        for &succ_id in item.succ() {
            let Some(succ) = by_id.get(&succ_id) else {
                continue; // cross-batch reference checked elsewhere by the store lookup.
            };
            if !succ.pred().contains(&item.id()) {
                return Err(crate::error::Error::AsymmetricDependency {
                    item: item.id(),
                    other: succ_id,
                });
            }
        }
        for &pred_id in item.pred() {
            let Some(pred) = by_id.get(&pred_id) else {
                continue;
            };
            if !pred.succ().contains(&item.id()) {
                return Err(crate::error::Error::AsymmetricDependency {
                    item: item.id(),
                    other: pred_id,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MetadataId;

    fn revision(id: u64, succ: Vec<u64>, pred: Vec<u64>) -> Item {
        Item::Revision(RevisionItem {
            id: ItemId(id),
            file_id: FileId(1),
            path: "a.txt".into(),
            lod: LineOfDevelopment::Trunk,
            timestamp: 100,
            op: OperationKind::Change,
            metadata_id: MetadataId::compute("a", "l", None, None),
            revision_number: vec![1],
            pred: pred.into_iter().map(ItemId).collect(),
            succ: succ.into_iter().map(ItemId).collect(),
            tag_item_ids: vec![],
            branch_item_ids: vec![],
            closing_symbol_ids: vec![],
        })
    }

    #[test]
    fn symmetric_edges_pass() {
        let items = vec![revision(1, vec![2], vec![]), revision(2, vec![], vec![1])];
        assert!(check_dependency_symmetry(&items).is_ok());
    }

    #[test]
    fn asymmetric_edge_fails() {
        let items = vec![revision(1, vec![2], vec![]), revision(2, vec![], vec![])];
        let err = check_dependency_symmetry(&items).unwrap_err();
        assert!(matches!(err, crate::error::Error::AsymmetricDependency { .. }));
    }

    #[test]
    fn item_store_round_trips_and_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ItemStore::create(dir.path().join("items.dat"), dir.path().join("items.idx")).unwrap();
        let item = revision(0, vec![], vec![]);
        store.put(&item).unwrap();
        assert_eq!(store.get(ItemId(0)).unwrap(), item);
        let err = store.get(ItemId(1)).unwrap_err();
        assert!(matches!(err, crate::error::Error::MissingItem(ItemId(1))));
    }
}
