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

//! C5: the in-memory changeset graph (§4.4).
//!
//! A [`ChangesetGraph`] maps changeset id to [`GraphNode`]. It supports
//! insertion, deletion, and consuming the whole graph in an order consistent
//! with both the dependency edges and the revision timestamps, invoking a
//! caller-supplied callback whenever it gets stuck on a cycle.

use std::collections::BTreeMap;
use std::collections::HashMap;

use crate::changeset::Changeset;
use crate::changeset::GraphNode;
use crate::changeset::TimeRange;
use crate::error::Error;
use crate::error::Result;
use crate::ids::ChangesetId;
use crate::ids::ItemId;
use crate::item::ItemStore;

/// The in-memory changeset graph (§4.4).
#[derive(Debug, Default)]
pub struct ChangesetGraph {
    nodes: HashMap<ChangesetId, GraphNode>,
}

impl ChangesetGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes currently in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up a node without removing it.
    pub fn node(&self, id: ChangesetId) -> Option<&GraphNode> {
        self.nodes.get(&id)
    }

    /// Builds `changeset`'s graph node and inserts it (§4.4 `add`). The
    /// node's predecessor/successor sets are fixed at insertion time; later
    /// splits or edits to other changesets don't retroactively update this
    /// node (they go through [`ChangesetGraph::remove`] and a fresh `add`
    /// instead).
    pub fn add(
        &mut self,
        changeset: &Changeset,
        items: &mut ItemStore,
        item_to_changeset: &BTreeMap<ItemId, ChangesetId>,
    ) -> Result<()> {
        let node = changeset.create_graph_node(items, item_to_changeset)?;
        self.insert_node(node);
        Ok(())
    }

    /// Inserts an already-built node directly, bypassing
    /// [`crate::changeset::Changeset::create_graph_node`]. Mostly useful for
    /// tests and for callbacks that construct replacement nodes themselves.
    pub fn insert_node(&mut self, node: GraphNode) {
        self.nodes.insert(node.changeset_id, node);
    }

    /// Removes a node. Its id is scrubbed from every successor's
    /// predecessor set (so those successors can become sources); incoming
    /// edges from predecessors that still reference this id are left as-is,
    /// since the node is simply gone (§4.4 "Edge cleanup").
    pub fn remove(&mut self, id: ChangesetId) -> Option<GraphNode> {
        let node = self.nodes.remove(&id)?;
        for succ_id in &node.succ {
            if let Some(succ_node) = self.nodes.get_mut(succ_id) {
                succ_node.pred.remove(&id);
            }
        }
        Some(node)
    }

    /// Drops pred/succ entries that reference a changeset id with no node in
    /// this graph. Used when a caller builds the *induced subgraph* over a
    /// subset of changesets (§4.6 "the subgraph induced by revision
    /// changesets"): an item-level edge crossing out to a changeset that
    /// hasn't been added yet (e.g. a revision item attaching a symbol not
    /// yet turned into a changeset node) is not part of that subgraph and
    /// must not block a node from ever becoming a source.
    pub fn prune_external_edges(&mut self) {
        let present: std::collections::HashSet<ChangesetId> = self.nodes.keys().copied().collect();
        for node in self.nodes.values_mut() {
            node.pred.retain(|id| present.contains(id));
            node.succ.retain(|id| present.contains(id));
        }
    }

    /// Total number of predecessor-edges currently recorded, used by
    /// [`ChangesetGraph::consume`] to detect a cycle breaker that failed to
    /// make progress.
    fn total_pred_edges(&self) -> usize {
        self.nodes.values().map(|n| n.pred.len()).sum()
    }

    /// A node with no predecessors: a *source*, ready to be committed.
    /// Among several sources, prefers the one with the earliest `t_max`
    /// (pure symbol changesets, whose time range is empty, sort first —
    /// they impose no timestamp constraint of their own and are emitted as
    /// soon as their dependencies allow, matching the
    /// `max(t_max, previous_timestamp + 1)` monotonization rule of C10);
    /// ties broken by id (§4.4, §5 "Ordering guarantees").
    fn pick_source(&self) -> Option<ChangesetId> {
        self.nodes
            .values()
            .filter(|n| n.pred.is_empty())
            .min_by_key(|n| (n.time_range.map(|r| r.t_max).unwrap_or(i64::MIN), n.changeset_id))
            .map(|n| n.changeset_id)
    }

    /// Finds a cycle reachable by following successor edges, as a `Vec` of
    /// changeset ids in cycle order (§4.4 "Cycle detection"). Deterministic:
    /// always starts from the smallest unvisited id and always explores
    /// successors in ascending id order, so repeated calls on the same graph
    /// return the same cycle (§5 "Determinism").
    fn find_cycle(&self) -> Option<Vec<ChangesetId>> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Color {
            White,
            Gray,
            Black,
        }

        let mut color: HashMap<ChangesetId, Color> =
            self.nodes.keys().map(|&id| (id, Color::White)).collect();
        let mut starts: Vec<ChangesetId> = self.nodes.keys().copied().collect();
        starts.sort();

        for start in starts {
            if color[&start] != Color::White {
                continue;
            }
            let mut path: Vec<ChangesetId> = vec![start];
            color.insert(start, Color::Gray);
            // Stack frames: (successors of this node, next index to visit).
            let mut stack: Vec<(Vec<ChangesetId>, usize)> = vec![(self.successors_sorted(start), 0)];

            while let Some((succs, idx)) = stack.last_mut() {
                if *idx >= succs.len() {
                    let finished = path.pop().expect("path non-empty while stack non-empty");
                    color.insert(finished, Color::Black);
                    stack.pop();
                    continue;
                }
                let next = succs[*idx];
                *idx += 1;
                match color.get(&next).copied() {
                    Some(Color::White) => {
                        color.insert(next, Color::Gray);
                        path.push(next);
                        stack.push((self.successors_sorted(next), 0));
                    }
                    Some(Color::Gray) => {
                        let pos = path.iter().position(|&id| id == next).expect("gray node is on path");
                        return Some(path[pos..].to_vec());
                    }
                    _ => {}
                }
            }
        }
        None
    }

    fn successors_sorted(&self, id: ChangesetId) -> Vec<ChangesetId> {
        let mut succs: Vec<ChangesetId> = self.nodes[&id].succ.iter().copied().collect();
        succs.sort();
        succs
    }

    /// Repeatedly removes and yields sources in commit order. When no source
    /// exists but the graph is non-empty, finds a cycle and invokes
    /// `cycle_breaker` with it; the callback is expected to mutate `self`
    /// (typically by splitting one of the cycle's changesets: removing it,
    /// inserting replacements, and updating the `item_id → changeset_id`
    /// table) so that at least one predecessor edge disappears. If the
    /// number of predecessor edges in the graph does not strictly decrease
    /// after the callback runs, that's treated as the callback failing to
    /// make progress (§4.4, §7 item 2).
    pub fn consume(
        mut self,
        mut cycle_breaker: impl FnMut(&mut Self, &[ChangesetId]) -> Result<()>,
    ) -> Result<Vec<(ChangesetId, Option<TimeRange>)>> {
        let mut order = Vec::new();
        while !self.nodes.is_empty() {
            if let Some(source_id) = self.pick_source() {
                let node = self.remove(source_id).expect("just found as a node");
                order.push((source_id, node.time_range));
                continue;
            }
            let cycle = self
                .find_cycle()
                .expect("a non-empty graph with no source must contain a cycle");
            let edges_before = self.total_pred_edges();
            cycle_breaker(&mut self, &cycle)?;
            let edges_after = self.total_pred_edges();
            if edges_after >= edges_before {
                return Err(Error::CycleBreakRegress(cycle[0]));
            }
        }
        Ok(order)
    }
}
