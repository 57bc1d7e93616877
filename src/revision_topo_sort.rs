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

//! C8: the revision topological sort (§4.7).
//!
//! Consumes the now-acyclic revision subgraph built by C6/C7 in commit
//! order and attaches chain links: `ordinal`, `prev_id`, `next_id`. Symbol
//! changesets are not part of this subgraph and pass through untouched.

use std::collections::BTreeMap;

use tracing::instrument;

use crate::changeset::Changeset;
use crate::changeset::OrderedChangeset;
use crate::changeset::RevisionChangeset;
use crate::changeset_store::ChangesetStore;
use crate::error::Error;
use crate::error::Result;
use crate::graph::ChangesetGraph;
use crate::ids::ChangesetId;
use crate::ids::ItemId;
use crate::item::ItemStore;

/// Consumes `graph` (already cycle-free; see
/// [`crate::revision_cycle_breaker`]) and returns the revision changesets
/// in commit order, each promoted to an [`OrderedChangeset`] carrying its
/// `ordinal`, `prev_id`, and `next_id` (§4.7).
///
/// `changesets` is used only to look up each consumed id's item list; the
/// caller is responsible for deleting the old [`RevisionChangeset`] records
/// and writing the returned [`OrderedChangeset`]s in their place.
#[instrument(skip(graph, changesets))]
pub fn topo_sort_revisions(graph: ChangesetGraph, changesets: &mut ChangesetStore) -> Result<Vec<OrderedChangeset>> {
    let order = graph.consume(|_, cycle| {
        Err(Error::CycleBreakRegress(*cycle.first().expect("cycle is non-empty")))
    })?;

    let mut ordered = Vec::with_capacity(order.len());
    for (ordinal, (id, _time_range)) in order.into_iter().enumerate() {
        let changeset = changesets.get(id)?;
        let item_ids = match changeset {
            Changeset::Revision(RevisionChangeset { item_ids, .. }) => item_ids,
            other => {
                // The revision subgraph (§4.6) contains only revision
                // changesets; C9 is what later mixes in symbol changesets.
                panic!("revision topo-sort consumed a non-revision changeset: {other:?}")
            }
        };
        ordered.push(OrderedChangeset {
            id,
            item_ids,
            ordinal: ordinal as u64,
            prev_id: None,
            next_id: None,
        });
    }

    // Second pass to fill in the chain links now that every ordinal is known.
    for i in 0..ordered.len() {
        let prev_id = if i > 0 { Some(ordered[i - 1].id) } else { None };
        let next_id = ordered.get(i + 1).map(|c| c.id);
        ordered[i].prev_id = prev_id;
        ordered[i].next_id = next_id;
    }

    Ok(ordered)
}

/// Loads an `item_id -> changeset_id` snapshot restricted to the items of
/// `ordered`, for callers that need to feed
/// [`crate::changeset::Changeset::create_graph_node`] downstream (C9).
pub fn item_to_changeset_map(ordered: &[OrderedChangeset]) -> BTreeMap<ItemId, ChangesetId> {
    let mut map = BTreeMap::new();
    for changeset in ordered {
        for &item_id in &changeset.item_ids {
            map.insert(item_id, changeset.id);
        }
    }
    map
}
