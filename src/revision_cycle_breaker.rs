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

//! C7: breaks cycles among revision changesets (§4.6), leaving the revision
//! subgraph acyclic without touching symbol changesets, which haven't been
//! added to the graph yet at this stage.
//!
//! Meant to be driven as the `cycle_breaker` callback of
//! [`crate::graph::ChangesetGraph::consume`]: call
//! [`break_one_cycle`] each time the graph reports a cycle.

use std::collections::BTreeMap;
use std::collections::HashSet;

use tracing::debug;
use tracing::instrument;

use crate::changeset::Changeset;
use crate::changeset::RevisionChangeset;
use crate::changeset_store::ChangesetStore;
use crate::error::Result;
use crate::graph::ChangesetGraph;
use crate::ids::ChangesetId;
use crate::ids::ItemId;
use crate::ids::KeyGenerator;
use crate::item::ItemStore;

/// Picks one changeset on `cycle` and splits it so at least one cycle edge
/// disappears (§4.6). Mutates `graph`, `changesets`, and `item_to_changeset`
/// in place.
#[instrument(skip(graph, changesets, item_to_changeset, items, key_gen), fields(cycle_len = cycle.len()))]
pub fn break_one_cycle(
    graph: &mut ChangesetGraph,
    cycle: &[ChangesetId],
    changesets: &mut ChangesetStore,
    item_to_changeset: &mut BTreeMap<ItemId, ChangesetId>,
    items: &mut ItemStore,
    key_gen: &KeyGenerator,
) -> Result<()> {
    let len = cycle.len();

    struct Candidate {
        node_id: ChangesetId,
        prev_id: ChangesetId,
        next_id: ChangesetId,
        item_ids: Vec<ItemId>,
        a: HashSet<ItemId>,
        b: HashSet<ItemId>,
    }

    let mut best: Option<Candidate> = None;

    for i in 0..len {
        let node_id = cycle[i];
        let prev_id = cycle[(i + len - 1) % len];
        let next_id = cycle[(i + 1) % len];

        let changeset = changesets.get(node_id)?;
        let item_ids = changeset.item_ids().to_vec();

        let mut a = HashSet::new();
        let mut b = HashSet::new();
        for &item_id in &item_ids {
            let item = items.get(item_id)?;
            for &succ_id in item.succ() {
                match item_to_changeset.get(&succ_id) {
                    Some(&cs) if cs == prev_id => {
                        a.insert(item_id);
                    }
                    Some(&cs) if cs == next_id => {
                        b.insert(item_id);
                    }
                    _ => {}
                }
            }
        }

        let score = (a.intersection(&b).count(), a.len() + b.len(), node_id);
        let is_better = match &best {
            None => true,
            Some(current) => {
                score < (current.a.intersection(&current.b).count(), current.a.len() + current.b.len(), current.node_id)
            }
        };
        if is_better {
            best = Some(Candidate { node_id, prev_id, next_id, item_ids, a, b });
        }
    }

    let best = best.expect("a non-empty cycle has at least one node");
    debug!(
        node = %best.node_id,
        prev = %best.prev_id,
        next = %best.next_id,
        a = best.a.len(),
        b = best.b.len(),
        "splitting revision changeset to break cycle"
    );

    let (first_ids, second_ids) = partition_by_link(&best.item_ids, &best.a, &best.b);

    // Neighbors' nodes cache edges to/from the node being replaced; once the
    // split moves items around, those cached edges go stale and must be
    // recomputed from each neighbor's own (unchanged) item set against the
    // now-updated item_id -> changeset_id table.
    let removed = graph.remove(best.node_id).expect("cycle node is present in the graph");
    let neighbor_ids: HashSet<ChangesetId> = removed.pred.iter().chain(removed.succ.iter()).copied().collect();
    changesets.delete(best.node_id)?;

    let first = RevisionChangeset { id: best.node_id, item_ids: first_ids };
    for &item_id in &first.item_ids {
        item_to_changeset.insert(item_id, first.id);
    }
    changesets.put(&Changeset::Revision(first.clone()))?;
    graph.add(&Changeset::Revision(first), items, item_to_changeset)?;

    let second_id = ChangesetId(key_gen.next());
    let second = RevisionChangeset { id: second_id, item_ids: second_ids };
    for &item_id in &second.item_ids {
        item_to_changeset.insert(item_id, second.id);
    }
    changesets.put(&Changeset::Revision(second.clone()))?;
    graph.add(&Changeset::Revision(second), items, item_to_changeset)?;

    for neighbor_id in neighbor_ids {
        let neighbor = changesets.get(neighbor_id)?;
        let node = neighbor.create_graph_node(items, item_to_changeset)?;
        graph.insert_node(node);
    }

    // The split pieces and recomputed neighbors may pick up edges into
    // symbol changesets not yet in this subgraph; keep the same "induced
    // subgraph" invariant the initial build established (§4.6).
    graph.prune_external_edges();

    Ok(())
}

/// Splits `item_ids` into the "A-side" (linked to `prev_on_cycle`) and
/// "B-side" (linked to `next_on_cycle`) halves (§4.6 "Split that node into
/// two changesets"). Items in neither set, or in both, attach to whichever
/// half currently has fewer items, ties broken by id.
fn partition_by_link(item_ids: &[ItemId], a: &HashSet<ItemId>, b: &HashSet<ItemId>) -> (Vec<ItemId>, Vec<ItemId>) {
    let mut first = Vec::new();
    let mut second = Vec::new();
    let mut undecided = Vec::new();

    for &id in item_ids {
        match (a.contains(&id), b.contains(&id)) {
            (true, false) => first.push(id),
            (false, true) => second.push(id),
            _ => undecided.push(id),
        }
    }
    undecided.sort();
    for id in undecided {
        if first.len() <= second.len() {
            first.push(id);
        } else {
            second.push(id);
        }
    }
    first.sort();
    second.sort();
    (first, second)
}
