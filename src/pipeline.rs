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

//! Wires C6 through C11 together behind the pass manager (§2).
//!
//! C1-C5 are reusable building blocks ([`crate::store`], [`crate::sort`],
//! [`crate::changeset`], [`crate::graph`]) rather than passes of their own;
//! [`run_pipeline`] is where a populated [`ItemStore`] (the parser's output,
//! out of scope here — §1 Non-goals) actually gets turned into target
//! commits.

use std::collections::BTreeMap;

use tracing::info;
use tracing::instrument;

use crate::builder;
use crate::changeset::Changeset;
use crate::changeset::OrderedChangeset;
use crate::changeset_store::ChangesetStore;
use crate::commit_creator;
use crate::commit_creator::TargetCommit;
use crate::context::RunContext;
use crate::error::Result;
use crate::final_sort;
use crate::full_cycle_breaker;
use crate::graph::ChangesetGraph;
use crate::ids::ChangesetId;
use crate::ids::ItemId;
use crate::item::ItemStore;
use crate::lock::WorkingDirLock;
use crate::pass::PassManager;
use crate::revision_cycle_breaker;
use crate::revision_topo_sort;
use crate::sort;
use crate::symbol::SymbolDatabase;

/// Runs every pass over `items`, returning the target commits produced by
/// the commit creator (§4.10). Acquires the working-directory lock for the
/// duration of the run (§5, §7 item 4).
#[instrument(skip(ctx, items, symbols))]
pub fn run_pipeline(ctx: &RunContext, items: &mut ItemStore, symbols: &SymbolDatabase) -> Result<Vec<TargetCommit>> {
    let _lock = WorkingDirLock::acquire(ctx.working_dir())?;
    let mut manager = PassManager::new();
    manager.observe_produced("items");

    let mut changesets = ChangesetStore::create(
        ctx.artifact_path("changesets.dat"),
        ctx.artifact_path("changesets.idx"),
    )?;
    let mut item_to_changeset: BTreeMap<ItemId, ChangesetId> = BTreeMap::new();

    manager.run_pass("c6-initial-changeset-builder", &["items"], &["initial-changesets"], || {
        build_initial_changesets(ctx, &mut *items, symbols, &mut changesets, &mut item_to_changeset)
    })?;

    manager.run_pass(
        "c7-revision-cycle-breaker",
        &["initial-changesets"],
        &["acyclic-revisions"],
        || break_revision_cycles(ctx, &mut *items, &mut changesets, &mut item_to_changeset),
    )?;

    let ordered = manager.run_pass(
        "c8-revision-topo-sort",
        &["acyclic-revisions"],
        &["ordered-revisions"],
        || order_revisions(&mut *items, &mut changesets),
    )?;

    manager.run_pass(
        "c9-full-cycle-breaker",
        &["ordered-revisions"],
        &["placed-symbols"],
        || place_symbol_changesets(ctx, &mut *items, &mut changesets, &mut item_to_changeset, &ordered),
    )?;

    let order = manager.run_pass(
        "c10-final-sort",
        &["placed-symbols"],
        &["commit-order"],
        || finalize_order(ctx, &mut *items, &mut changesets),
    )?;

    manager.run_pass("c11-commit-creator", &["commit-order"], &["target-commits"], || {
        let log_path = ctx.artifact_path("openings-closings.log");
        commit_creator::create_commits(&order, &mut changesets, &mut *items, &ctx.settings, &log_path)
    })
}

fn build_initial_changesets(
    ctx: &RunContext,
    items: &mut ItemStore,
    symbols: &SymbolDatabase,
    changesets: &mut ChangesetStore,
    item_to_changeset: &mut BTreeMap<ItemId, ChangesetId>,
) -> Result<()> {
    let revision_summary = ctx.artifact_path("revision-summary.txt");
    let revision_summary_sorted = ctx.artifact_path("revision-summary-sorted.txt");
    builder::write_revision_summary(items, &revision_summary)?;
    sort::external_merge_sort(&revision_summary, &revision_summary_sorted, sort::DEFAULT_RUN_SIZE)?;

    let grouped = builder::group_revision_changesets(&revision_summary_sorted, ctx.settings.commit_window, &ctx.changeset_ids)?;
    let mut revision_count = 0usize;
    for changeset in grouped {
        for split in builder::split_intra_dependencies(changeset, items, &ctx.changeset_ids)? {
            for &item_id in &split.item_ids {
                item_to_changeset.insert(item_id, split.id);
            }
            changesets.put(&Changeset::Revision(split))?;
            revision_count += 1;
        }
    }
    info!(revision_count, "built initial revision changesets");

    if ctx.settings.trunk_only {
        info!("trunk_only set: skipping symbol summary and symbol changesets");
        return Ok(());
    }

    let symbol_summary = ctx.artifact_path("symbol-summary.txt");
    let symbol_summary_sorted = ctx.artifact_path("symbol-summary-sorted.txt");
    builder::write_symbol_summary(items, &symbol_summary)?;
    sort::external_merge_sort(&symbol_summary, &symbol_summary_sorted, sort::DEFAULT_RUN_SIZE)?;

    let symbol_changesets = builder::group_symbol_changesets(&symbol_summary_sorted, symbols, &ctx.changeset_ids)?;
    let mut symbol_count = 0usize;
    for changeset in symbol_changesets {
        for &item_id in changeset.item_ids() {
            item_to_changeset.insert(item_id, changeset.id());
        }
        changesets.put(&changeset)?;
        symbol_count += 1;
    }
    info!(symbol_count, "built initial symbol changesets");
    Ok(())
}

fn break_revision_cycles(
    ctx: &RunContext,
    items: &mut ItemStore,
    changesets: &mut ChangesetStore,
    item_to_changeset: &mut BTreeMap<ItemId, ChangesetId>,
) -> Result<()> {
    let mut graph = ChangesetGraph::new();
    for changeset in changesets.iter()? {
        if let Changeset::Revision(_) = &changeset {
            graph.add(&changeset, items, item_to_changeset)?;
        }
    }
    // Symbol changesets aren't added yet (§4.6): an item edge crossing out to
    // one must not block its revision changeset from becoming a source.
    graph.prune_external_edges();

    graph.consume(|g, cycle| revision_cycle_breaker::break_one_cycle(g, cycle, changesets, item_to_changeset, items, &ctx.changeset_ids))?;
    Ok(())
}

fn order_revisions(items: &mut ItemStore, changesets: &mut ChangesetStore) -> Result<Vec<OrderedChangeset>> {
    let mut graph = ChangesetGraph::new();
    // Every changeset on disk at this point (revision or symbol) needs an
    // entry so that a revision item's edge into an already-built symbol
    // changeset resolves instead of erroring as unmapped; only revision
    // changesets become nodes, so `prune_external_edges` then drops the
    // resulting cross-subgraph edges (§4.6/§4.7: symbol changesets aren't
    // part of the revision subgraph yet).
    let item_to_changeset = all_item_to_changeset(changesets)?;
    for changeset in changesets.iter()? {
        if let Changeset::Revision(_) = &changeset {
            graph.add(&changeset, items, &item_to_changeset)?;
        }
    }
    graph.prune_external_edges();

    let ordered = revision_topo_sort::topo_sort_revisions(graph, changesets)?;
    for oc in &ordered {
        changesets.put(&Changeset::Ordered(oc.clone()))?;
    }
    Ok(ordered)
}

/// Rebuilds `item_id -> changeset_id` over every changeset currently on
/// disk, reading it back from the changeset store instead of threading the
/// C6/C7 in-memory map across a pass boundary (§2 "passes communicate only
/// through artifacts").
fn all_item_to_changeset(changesets: &mut ChangesetStore) -> Result<BTreeMap<ItemId, ChangesetId>> {
    let mut map = BTreeMap::new();
    for changeset in changesets.iter()? {
        for &item_id in changeset.item_ids() {
            map.insert(item_id, changeset.id());
        }
    }
    Ok(map)
}

fn place_symbol_changesets(
    ctx: &RunContext,
    items: &mut ItemStore,
    changesets: &mut ChangesetStore,
    item_to_changeset: &mut BTreeMap<ItemId, ChangesetId>,
    ordered: &[OrderedChangeset],
) -> Result<()> {
    let mut item_ordinal = BTreeMap::new();
    for oc in ordered {
        for &item_id in &oc.item_ids {
            item_ordinal.insert(item_id, oc.ordinal);
        }
    }

    let branches: Vec<_> = changesets
        .iter()?
        .into_iter()
        .filter_map(|c| match c {
            Changeset::Branch(b) => Some(b),
            _ => None,
        })
        .collect();

    for branch in branches {
        let original_id = branch.id;
        let pieces = full_cycle_breaker::resolve_branch_placement(branch, items, &item_ordinal, &ctx.changeset_ids)?;
        if pieces.len() == 1 && pieces[0].id == original_id {
            continue; // unchanged, already on disk under its original id
        }
        changesets.delete(original_id)?;
        for piece in pieces {
            for &item_id in &piece.item_ids {
                item_to_changeset.insert(item_id, piece.id);
            }
            changesets.put(&Changeset::Branch(piece))?;
        }
    }
    Ok(())
}

fn finalize_order(ctx: &RunContext, items: &mut ItemStore, changesets: &mut ChangesetStore) -> Result<Vec<(ChangesetId, i64)>> {
    let item_to_changeset = all_item_to_changeset(changesets)?;

    let mut graph = ChangesetGraph::new();
    for changeset in changesets.iter()? {
        graph.add(&changeset, items, &item_to_changeset)?;
    }

    let order = final_sort::finalize_commit_order(graph)?;
    let sorted_path = ctx.artifact_path("changesets-sorted.txt");
    final_sort::write_sorted_changesets(&order, &sorted_path)?;
    Ok(order)
}
