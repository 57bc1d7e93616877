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

//! C4: the changeset model (`spec.md` §3 "Changeset", §4.3).
//!
//! A changeset is modeled as a tagged sum with one arm per variant, the way
//! Design Notes prescribes ("replace the source's class hierarchy and virtual
//! methods" with "table lookups on the tag"). [`Changeset::create_graph_node`]
//! and [`Changeset::split`] are the two operations the graph machinery (C5)
//! and the builders (C6-C9) dispatch on.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::error::Error;
use crate::error::Result;
use crate::ids::ChangesetId;
use crate::ids::ItemId;
use crate::ids::SymbolId;
use crate::item::Item;
use crate::item::ItemStore;

/// The inclusive timestamp range spanned by a changeset's revision items.
/// `None` for changesets with no revision items (pure symbol changesets,
/// §3 "Graph node").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeRange {
    /// Earliest revision timestamp in the changeset.
    pub t_min: i64,
    /// Latest revision timestamp in the changeset.
    pub t_max: i64,
}

impl TimeRange {
    /// Builds the range spanning `timestamps`, or `None` if empty.
    pub fn of(timestamps: impl IntoIterator<Item = i64>) -> Option<Self> {
        let mut iter = timestamps.into_iter();
        let first = iter.next()?;
        let (mut t_min, mut t_max) = (first, first);
        for t in iter {
            t_min = t_min.min(t);
            t_max = t_max.max(t);
        }
        Some(Self { t_min, t_max })
    }
}

/// A graph node computed from a changeset (§3 "Graph node"): the changeset's
/// time range plus its predecessor/successor changeset ids. Nodes are
/// ephemeral — they live only in memory during a single pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    /// The changeset this node was built from.
    pub changeset_id: ChangesetId,
    /// Timestamp span, or `None` for a pure symbol changeset.
    pub time_range: Option<TimeRange>,
    /// Changesets that must be committed before this one.
    pub pred: BTreeSet<ChangesetId>,
    /// Changesets that must be committed after this one.
    pub succ: BTreeSet<ChangesetId>,
}

/// A revision changeset: a set of revision items intended to become a
/// single primary commit (§3 "Revision changeset").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionChangeset {
    /// This changeset's id.
    pub id: ChangesetId,
    /// The revision items it contains.
    pub item_ids: Vec<ItemId>,
}

/// A revision changeset after the revision topological sort (C8): carries
/// its position in the linear chain and the chain's links (§3 "Ordered
/// changeset").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedChangeset {
    /// This changeset's id.
    pub id: ChangesetId,
    /// The revision items it contains.
    pub item_ids: Vec<ItemId>,
    /// Index of this changeset in the revision chain.
    pub ordinal: u64,
    /// The previous changeset in the chain, if any.
    pub prev_id: Option<ChangesetId>,
    /// The next changeset in the chain, if any.
    pub next_id: Option<ChangesetId>,
}

/// A branch or tag changeset: a set of symbol items referring to the same
/// symbol (§3 "Branch changeset"/"Tag changeset").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolChangeset {
    /// This changeset's id.
    pub id: ChangesetId,
    /// The symbol items it contains.
    pub item_ids: Vec<ItemId>,
    /// The symbol all items in this changeset attach.
    pub symbol_id: SymbolId,
}

/// The changeset sum type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Changeset {
    /// §3 "Revision changeset".
    Revision(RevisionChangeset),
    /// §3 "Ordered changeset".
    Ordered(OrderedChangeset),
    /// §3 "Branch changeset".
    Branch(SymbolChangeset),
    /// §3 "Tag changeset".
    Tag(SymbolChangeset),
}

/// Relative rank of a changeset's variant used for cycle-break tie-breaking
/// (§4.3 "tag < branch < ordered < revision").
fn class_rank(changeset: &Changeset) -> u8 {
    match changeset {
        Changeset::Tag(_) => 0,
        Changeset::Branch(_) => 1,
        Changeset::Ordered(_) => 2,
        Changeset::Revision(_) => 3,
    }
}

impl Changeset {
    /// This changeset's id, regardless of variant.
    pub fn id(&self) -> ChangesetId {
        match self {
            Changeset::Revision(c) => c.id,
            Changeset::Ordered(c) => c.id,
            Changeset::Branch(c) | Changeset::Tag(c) => c.id,
        }
    }

    /// The item ids this changeset contains.
    pub fn item_ids(&self) -> &[ItemId] {
        match self {
            Changeset::Revision(c) => &c.item_ids,
            Changeset::Ordered(c) => &c.item_ids,
            Changeset::Branch(c) | Changeset::Tag(c) => &c.item_ids,
        }
    }

    /// The symbol this changeset's items attach, for symbol variants.
    pub fn symbol_id(&self) -> Option<SymbolId> {
        match self {
            Changeset::Branch(c) | Changeset::Tag(c) => Some(c.symbol_id),
            Changeset::Revision(_) | Changeset::Ordered(_) => None,
        }
    }

    /// The tie-break sort key used by the cycle breakers (§4.3): class first
    /// (tag < branch < ordered < revision), then symbol (for symbol
    /// variants), then id.
    pub fn sort_key(&self) -> (u8, Option<SymbolId>, ChangesetId) {
        (class_rank(self), self.symbol_id(), self.id())
    }

    /// Builds this changeset's graph node (§4.3 `create_graph_node`).
    ///
    /// `items` must contain every item referenced transitively by this
    /// changeset's own items' predecessor/successor sets (the caller
    /// typically passes the whole item store). `item_to_changeset` must be a
    /// total mapping over every non-excluded item (§3 "Invariant
    /// (partition)").
    pub fn create_graph_node(
        &self,
        items: &mut ItemStore,
        item_to_changeset: &BTreeMap<ItemId, ChangesetId>,
    ) -> Result<GraphNode> {
        let own_id = self.id();
        let mut pred = BTreeSet::new();
        let mut succ = BTreeSet::new();
        let mut timestamps = Vec::new();

        let resolve = |id: ItemId| -> Result<ChangesetId> {
            item_to_changeset.get(&id).copied().ok_or(Error::UnmappedItem(id))
        };

        match self {
            Changeset::Revision(c) => {
                for &item_id in &c.item_ids {
                    let item = items.get(item_id)?;
                    if let Some(rev) = item.as_revision() {
                        timestamps.push(rev.timestamp);
                    }
                    for &p in item.pred() {
                        let cs = resolve(p)?;
                        if cs != own_id {
                            pred.insert(cs);
                        }
                    }
                    for &s in item.succ() {
                        let cs = resolve(s)?;
                        if cs != own_id {
                            succ.insert(cs);
                        }
                    }
                }
            }
            Changeset::Ordered(c) => {
                for &item_id in &c.item_ids {
                    let item = items.get(item_id)?;
                    if let Some(rev) = item.as_revision() {
                        timestamps.push(rev.timestamp);
                    }
                    // Intra-chain edges (revision item <-> revision item) are
                    // already captured by prev_id/next_id; only translate
                    // edges that cross into a symbol changeset.
                    for &p in item.pred() {
                        if is_symbol_item(items, p)? {
                            let cs = resolve(p)?;
                            if cs != own_id {
                                pred.insert(cs);
                            }
                        }
                    }
                    for &s in item.succ() {
                        if is_symbol_item(items, s)? {
                            let cs = resolve(s)?;
                            if cs != own_id {
                                succ.insert(cs);
                            }
                        }
                    }
                }
                if let Some(prev_id) = c.prev_id {
                    pred.insert(prev_id);
                }
                if let Some(next_id) = c.next_id {
                    succ.insert(next_id);
                }
            }
            Changeset::Branch(c) | Changeset::Tag(c) => {
                for &item_id in &c.item_ids {
                    let item = items.get(item_id)?;
                    for &p in item.pred() {
                        let cs = resolve(p)?;
                        if cs != own_id {
                            pred.insert(cs);
                        }
                    }
                    for &s in item.succ() {
                        let cs = resolve(s)?;
                        if cs != own_id {
                            succ.insert(cs);
                        }
                    }
                }
            }
        }

        Ok(GraphNode {
            changeset_id: own_id,
            time_range: TimeRange::of(timestamps),
            pred,
            succ,
        })
    }

    /// Splits off a new changeset of the same variant carrying `subset`
    /// (§4.3 `split`). The original changeset is left untouched on disk;
    /// callers are responsible for deleting it and rewriting the
    /// `item_id → changeset_id` table for the moved items (§4.6).
    ///
    /// Panics if called on an [`Changeset::Ordered`] changeset: ordered
    /// changesets are never split (only plain revision changesets are, by
    /// C6/C7, before C8 assigns ordinals).
    pub fn split(&self, new_id: ChangesetId, subset: Vec<ItemId>) -> Changeset {
        match self {
            Changeset::Revision(_) => Changeset::Revision(RevisionChangeset {
                id: new_id,
                item_ids: subset,
            }),
            Changeset::Branch(c) => Changeset::Branch(SymbolChangeset {
                id: new_id,
                item_ids: subset,
                symbol_id: c.symbol_id,
            }),
            Changeset::Tag(c) => Changeset::Tag(SymbolChangeset {
                id: new_id,
                item_ids: subset,
                symbol_id: c.symbol_id,
            }),
            Changeset::Ordered(_) => {
                panic!("ordered changesets are never split")
            }
        }
    }
}

fn is_symbol_item(items: &mut ItemStore, id: ItemId) -> Result<bool> {
    Ok(matches!(items.get(id)?, Item::Symbol(_)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::LineOfDevelopment;
    use crate::item::OperationKind;
    use crate::item::RevisionItem;
    use crate::item::SymbolItem;
    use crate::metadata::MetadataId;
    use crate::symbol::SymbolKind;

    fn revision(id: u64, pred: Vec<u64>, succ: Vec<u64>, ts: i64) -> Item {
        Item::Revision(RevisionItem {
            id: ItemId(id),
            file_id: crate::ids::FileId(1),
            path: "a.txt".into(),
            lod: LineOfDevelopment::Trunk,
            timestamp: ts,
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

    fn symbol(id: u64, pred: Vec<u64>, succ: Vec<u64>) -> Item {
        Item::Symbol(SymbolItem {
            id: ItemId(id),
            file_id: crate::ids::FileId(1),
            symbol_id: SymbolId(9),
            pred: pred.into_iter().map(ItemId).collect(),
            succ: succ.into_iter().map(ItemId).collect(),
        })
    }

    fn fresh_store(dir: &tempfile::TempDir) -> ItemStore {
        ItemStore::create(dir.path().join("items.dat"), dir.path().join("items.idx")).unwrap()
    }

    #[test]
    fn sort_key_orders_tag_before_branch_before_ordered_before_revision() {
        let tag = Changeset::Tag(SymbolChangeset { id: ChangesetId(1), item_ids: vec![], symbol_id: SymbolId(1) });
        let branch = Changeset::Branch(SymbolChangeset { id: ChangesetId(1), item_ids: vec![], symbol_id: SymbolId(1) });
        let ordered = Changeset::Ordered(OrderedChangeset { id: ChangesetId(1), item_ids: vec![], ordinal: 0, prev_id: None, next_id: None });
        let revision = Changeset::Revision(RevisionChangeset { id: ChangesetId(1), item_ids: vec![] });
        assert!(tag.sort_key() < branch.sort_key());
        assert!(branch.sort_key() < ordered.sort_key());
        assert!(ordered.sort_key() < revision.sort_key());
    }

    #[test]
    fn revision_graph_node_has_time_range_and_translated_edges() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = fresh_store(&dir);
        store.put(&revision(1, vec![], vec![2], 100)).unwrap();
        store.put(&revision(2, vec![1], vec![], 200)).unwrap();

        let cs_a = Changeset::Revision(RevisionChangeset { id: ChangesetId(10), item_ids: vec![ItemId(1)] });
        let cs_b = Changeset::Revision(RevisionChangeset { id: ChangesetId(20), item_ids: vec![ItemId(2)] });
        let mut map = BTreeMap::new();
        map.insert(ItemId(1), ChangesetId(10));
        map.insert(ItemId(2), ChangesetId(20));

        let node_a = cs_a.create_graph_node(&mut store, &map).unwrap();
        assert_eq!(node_a.time_range, Some(TimeRange { t_min: 100, t_max: 100 }));
        assert_eq!(node_a.succ, BTreeSet::from([ChangesetId(20)]));
        assert!(node_a.pred.is_empty());

        let node_b = cs_b.create_graph_node(&mut store, &map).unwrap();
        assert_eq!(node_b.pred, BTreeSet::from([ChangesetId(10)]));
    }

    #[test]
    fn ordered_graph_node_uses_chain_links_and_ignores_intra_chain_item_edges() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = fresh_store(&dir);
        // r1 -> r2 is an intra-chain edge; r1 -> s (symbol) crosses to a branch.
        store.put(&revision(1, vec![], vec![2, 3], 100)).unwrap();
        store.put(&revision(2, vec![1], vec![], 200)).unwrap();
        store.put(&symbol(3, vec![1], vec![])).unwrap();

        let oc = Changeset::Ordered(OrderedChangeset {
            id: ChangesetId(10),
            item_ids: vec![ItemId(1)],
            ordinal: 0,
            prev_id: None,
            next_id: Some(ChangesetId(20)),
        });
        let mut map = BTreeMap::new();
        map.insert(ItemId(1), ChangesetId(10));
        map.insert(ItemId(2), ChangesetId(20));
        map.insert(ItemId(3), ChangesetId(30));

        let node = oc.create_graph_node(&mut store, &map).unwrap();
        // next_id contributes the chain edge, and the symbol edge is added
        // once; the intra-chain revision->revision edge must not be
        // duplicated or separately present.
        assert_eq!(node.succ, BTreeSet::from([ChangesetId(20), ChangesetId(30)]));
    }

    #[test]
    fn split_preserves_variant_and_symbol() {
        let original = Changeset::Branch(SymbolChangeset {
            id: ChangesetId(1),
            item_ids: vec![ItemId(1), ItemId(2)],
            symbol_id: SymbolId(7),
        });
        let split = original.split(ChangesetId(2), vec![ItemId(2)]);
        match split {
            Changeset::Branch(c) => {
                assert_eq!(c.id, ChangesetId(2));
                assert_eq!(c.item_ids, vec![ItemId(2)]);
                assert_eq!(c.symbol_id, SymbolId(7));
            }
            _ => panic!("expected Branch"),
        }
    }
}
