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

//! C9: the full-graph cycle breaker (§4.8).
//!
//! By this point every revision changeset has become an [`OrderedChangeset`]
//! with a fixed ordinal. A branch changeset's items each attach at one
//! ordinal (their predecessor) and, for the branch's first commit, point
//! forward to another ordinal (their successor). A branch can only occupy a
//! single position in the final order if every one of its predecessor
//! ordinals precedes every one of its successor ordinals; otherwise it is
//! split into several branch changesets, each internally consistent. Tag
//! changesets have no successors and are never split.

use std::collections::BTreeMap;

use tracing::debug;
use tracing::instrument;

use crate::changeset::SymbolChangeset;
use crate::error::Error;
use crate::error::Result;
use crate::ids::ChangesetId;
use crate::ids::ItemId;
use crate::ids::KeyGenerator;
use crate::item::Item;
use crate::item::ItemStore;

struct ItemOrdinals {
    item_id: ItemId,
    pred_ordinal: u64,
    succ_ordinal: Option<u64>,
}

fn ordinal_of(item_ordinal: &BTreeMap<ItemId, u64>, id: ItemId) -> Result<u64> {
    item_ordinal.get(&id).copied().ok_or(Error::UnmappedItem(id))
}

fn item_ordinals(item: &Item, item_ordinal: &BTreeMap<ItemId, u64>) -> Result<ItemOrdinals> {
    let symbol = item
        .as_symbol()
        .unwrap_or_else(|| panic!("branch changesets contain only symbol items (§3 Invariant (homogeneity))"));
    let pred_id = *symbol
        .pred
        .first()
        .expect("every symbol item has exactly one revision predecessor (§4.8)");
    let pred_ordinal = ordinal_of(item_ordinal, pred_id)?;
    let succ_ordinal = match symbol.succ.first() {
        Some(&succ_id) => Some(ordinal_of(item_ordinal, succ_id)?),
        None => None,
    };
    Ok(ItemOrdinals { item_id: symbol.id, pred_ordinal, succ_ordinal })
}

/// Splits `branch` as needed so every resulting branch changeset satisfies
/// `max(pred ordinals) < min(succ ordinals)` (§8 property 6). Returns
/// `branch` unchanged (same id) if it already satisfies the invariant.
#[instrument(skip(branch, items, item_ordinal, key_gen), fields(branch_id = %branch.id))]
pub fn resolve_branch_placement(
    branch: SymbolChangeset,
    items: &mut ItemStore,
    item_ordinal: &BTreeMap<ItemId, u64>,
    key_gen: &KeyGenerator,
) -> Result<Vec<SymbolChangeset>> {
    let mut annotated = Vec::with_capacity(branch.item_ids.len());
    for &item_id in &branch.item_ids {
        let item = items.get(item_id)?;
        annotated.push(item_ordinals(&item, item_ordinal)?);
    }

    if is_legally_placed(&annotated) {
        return Ok(vec![branch]);
    }

    debug!(items = annotated.len(), "branch changeset needs splitting");
    annotated.sort_by_key(|a| a.pred_ordinal);

    let mut pieces: Vec<Vec<ItemOrdinals>> = Vec::new();
    let mut remaining = annotated;
    while !remaining.is_empty() {
        if is_legally_placed(&remaining) {
            pieces.push(remaining);
            break;
        }
        let min_succ = remaining
            .iter()
            .filter_map(|a| a.succ_ordinal)
            .min()
            .expect("is_legally_placed would be true if no item had a successor");
        let mut split_at = remaining.iter().take_while(|a| a.pred_ordinal < min_succ).count();
        // Guarantee progress even in pathological input where the very first
        // item's own predecessor ordinal isn't below the remainder's nearest
        // successor ordinal.
        split_at = split_at.clamp(1, remaining.len());
        let rest = remaining.split_off(split_at);
        pieces.push(remaining);
        remaining = rest;
    }

    let mut result = Vec::with_capacity(pieces.len());
    for piece in pieces {
        let item_ids = piece.iter().map(|a| a.item_id).collect();
        result.push(SymbolChangeset {
            id: ChangesetId(key_gen.next()),
            item_ids,
            symbol_id: branch.symbol_id,
        });
    }
    Ok(result)
}

fn is_legally_placed(items: &[ItemOrdinals]) -> bool {
    let max_pred = items.iter().map(|a| a.pred_ordinal).max();
    let min_succ = items.iter().filter_map(|a| a.succ_ordinal).min();
    match (max_pred, min_succ) {
        (Some(max_pred), Some(min_succ)) => max_pred < min_succ,
        _ => true,
    }
}
