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

//! C6: the initial changeset builder (§4.5).
//!
//! Two producers feed the initial pool: revision changesets, grouped from
//! the sorted revision summary by metadata id and commit-window proximity;
//! and symbol changesets, grouped from the sorted symbol summary by
//! contiguous symbol id. Revision changesets that turn out to straddle an
//! internal dependency are split recursively so every changeset the pool
//! hands downstream is a legal candidate commit (§8 property 4).

use std::collections::HashMap;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use tracing::debug;
use tracing::instrument;

use crate::changeset::Changeset;
use crate::changeset::RevisionChangeset;
use crate::changeset::SymbolChangeset;
use crate::error::Error;
use crate::error::Result;
use crate::hex_util;
use crate::ids::ChangesetId;
use crate::ids::ItemId;
use crate::ids::KeyGenerator;
use crate::item::Item;
use crate::item::ItemStore;
use crate::symbol::SymbolDatabase;
use crate::symbol::SymbolKind;

/// Writes the unsorted revision summary: one `<metadata_id_hex>
/// <timestamp_hex8> <item_id_hex>` line per revision item (§4.2).
#[instrument(skip(items))]
pub fn write_revision_summary(items: &mut ItemStore, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::io("create revision summary", path, e))?;
    let mut writer = BufWriter::new(file);
    for item in items.iter()? {
        let Item::Revision(rev) = item else { continue };
        // Source timestamps are non-negative seconds since the epoch; the
        // 8-hex-digit encoding only needs the low 32 bits to preserve
        // lexicographic-equals-numeric order over that range (§4.2).
        let ts = rev.timestamp.clamp(0, u32::MAX as i64) as u32;
        writeln!(
            writer,
            "{} {} {}",
            rev.metadata_id.hex(),
            hex_util::encode_timestamp_hex8(ts),
            rev.id
        )
        .map_err(|e| Error::io("write revision summary line", path, e))?;
    }
    writer.flush().map_err(|e| Error::io("flush revision summary", path, e))?;
    Ok(())
}

/// Writes the unsorted symbol summary: one `<symbol_id_hex> <item_id_hex>`
/// line per symbol item (§4.2).
#[instrument(skip(items))]
pub fn write_symbol_summary(items: &mut ItemStore, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::io("create symbol summary", path, e))?;
    let mut writer = BufWriter::new(file);
    for item in items.iter()? {
        let Item::Symbol(sym) = item else { continue };
        writeln!(writer, "{} {}", sym.symbol_id, sym.id).map_err(|e| Error::io("write symbol summary line", path, e))?;
    }
    writer.flush().map_err(|e| Error::io("flush symbol summary", path, e))?;
    Ok(())
}

struct RevisionSummaryLine {
    metadata_hex: String,
    timestamp: u32,
    item_id: ItemId,
}

fn parse_revision_summary_line(line: &str) -> Option<RevisionSummaryLine> {
    let mut fields = line.split(' ');
    let metadata_hex = fields.next()?.to_string();
    let timestamp = hex_util::decode_timestamp_hex8(fields.next()?)?;
    let item_id = ItemId(u64::from_str_radix(fields.next()?, 16).ok()?);
    Some(RevisionSummaryLine { metadata_hex, timestamp, item_id })
}

/// Groups the sorted revision summary into initial revision changesets
/// (§4.5 "Revision changesets"): a new changeset starts whenever the
/// metadata id changes or the timestamp gap above the previous line exceeds
/// `commit_window`.
#[instrument(skip(key_gen))]
pub fn group_revision_changesets(
    sorted_summary_path: &Path,
    commit_window: Duration,
    key_gen: &KeyGenerator,
) -> Result<Vec<RevisionChangeset>> {
    let file =
        File::open(sorted_summary_path).map_err(|e| Error::io("open sorted revision summary", sorted_summary_path, e))?;
    let reader = BufReader::new(file);
    let window_secs = commit_window.as_secs();

    let mut changesets = Vec::new();
    let mut current: Option<(String, u32, Vec<ItemId>)> = None;

    for line in reader.lines() {
        let line = line.map_err(|e| Error::io("read sorted revision summary", sorted_summary_path, e))?;
        if line.is_empty() {
            continue;
        }
        let parsed = parse_revision_summary_line(&line).ok_or_else(|| Error::IncompatibleFormat {
            path: sorted_summary_path.to_path_buf(),
        })?;

        match &mut current {
            Some((metadata_hex, last_ts, item_ids))
                if *metadata_hex == parsed.metadata_hex
                    && (parsed.timestamp as i64 - *last_ts as i64) <= window_secs as i64 =>
            {
                *last_ts = parsed.timestamp;
                item_ids.push(parsed.item_id);
            }
            _ => {
                if let Some((_, _, item_ids)) = current.take() {
                    changesets.push(RevisionChangeset {
                        id: ChangesetId(key_gen.next()),
                        item_ids,
                    });
                }
                current = Some((parsed.metadata_hex, parsed.timestamp, vec![parsed.item_id]));
            }
        }
    }
    if let Some((_, _, item_ids)) = current {
        changesets.push(RevisionChangeset {
            id: ChangesetId(key_gen.next()),
            item_ids,
        });
    }
    Ok(changesets)
}

/// Groups the sorted symbol summary into branch/tag changesets: one per
/// contiguous run sharing a symbol id (§4.5 "Symbol changesets").
#[instrument(skip(symbols, key_gen))]
pub fn group_symbol_changesets(
    sorted_summary_path: &Path,
    symbols: &SymbolDatabase,
    key_gen: &KeyGenerator,
) -> Result<Vec<Changeset>> {
    let file =
        File::open(sorted_summary_path).map_err(|e| Error::io("open sorted symbol summary", sorted_summary_path, e))?;
    let reader = BufReader::new(file);

    let mut changesets = Vec::new();
    let mut current: Option<(crate::ids::SymbolId, Vec<ItemId>)> = None;

    for line in reader.lines() {
        let line = line.map_err(|e| Error::io("read sorted symbol summary", sorted_summary_path, e))?;
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split(' ');
        let symbol_id = crate::ids::SymbolId(
            u64::from_str_radix(fields.next().ok_or_else(|| bad_format(sorted_summary_path))?, 16)
                .map_err(|_| bad_format(sorted_summary_path))?,
        );
        let item_id = ItemId(
            u64::from_str_radix(fields.next().ok_or_else(|| bad_format(sorted_summary_path))?, 16)
                .map_err(|_| bad_format(sorted_summary_path))?,
        );

        match &mut current {
            Some((sym, item_ids)) if *sym == symbol_id => item_ids.push(item_id),
            _ => {
                if let Some((sym, item_ids)) = current.take() {
                    changesets.push(finish_symbol_changeset(sym, item_ids, symbols, key_gen)?);
                }
                current = Some((symbol_id, vec![item_id]));
            }
        }
    }
    if let Some((sym, item_ids)) = current {
        changesets.push(finish_symbol_changeset(sym, item_ids, symbols, key_gen)?);
    }
    Ok(changesets)
}

fn bad_format(path: &Path) -> Error {
    Error::IncompatibleFormat { path: path.to_path_buf() }
}

fn finish_symbol_changeset(
    symbol_id: crate::ids::SymbolId,
    item_ids: Vec<ItemId>,
    symbols: &SymbolDatabase,
    key_gen: &KeyGenerator,
) -> Result<Changeset> {
    let kind = symbols.kind(symbol_id).ok_or(Error::UnknownSymbolKind(symbol_id))?;
    let changeset = SymbolChangeset {
        id: ChangesetId(key_gen.next()),
        item_ids,
        symbol_id,
    };
    Ok(match kind {
        SymbolKind::Branch => Changeset::Branch(changeset),
        SymbolKind::Tag => Changeset::Tag(changeset),
    })
}

/// Splits a revision changeset so that no resulting changeset contains both
/// ends of an item-level predecessor/successor pair (§4.5 "Intra-changeset
/// dependency splitting", §8 property 4). Returns `changeset` unchanged
/// (same id, same items) if it has no internal dependency (§8 property 9).
#[instrument(skip(items, key_gen), fields(changeset_id = %changeset.id))]
pub fn split_intra_dependencies(
    changeset: RevisionChangeset,
    items: &mut ItemStore,
    key_gen: &KeyGenerator,
) -> Result<Vec<RevisionChangeset>> {
    split_inner(changeset.id, changeset.item_ids, items, key_gen)
}

fn split_inner(
    id: ChangesetId,
    item_ids: Vec<ItemId>,
    items: &mut ItemStore,
    key_gen: &KeyGenerator,
) -> Result<Vec<RevisionChangeset>> {
    if item_ids.len() <= 1 {
        return Ok(vec![RevisionChangeset { id, item_ids }]);
    }

    let item_set: HashSet<ItemId> = item_ids.iter().copied().collect();

    // Step 2: stable sort by (timestamp, path, revision number, id).
    struct SortKey {
        item_id: ItemId,
        timestamp: i64,
        path: String,
        revision_number: Vec<u64>,
    }
    let mut keys = Vec::with_capacity(item_ids.len());
    for &item_id in &item_ids {
        let item = items.get(item_id)?;
        let rev = item
            .as_revision()
            .expect("revision changesets contain only revision items (§3 Invariant (homogeneity))");
        keys.push(SortKey {
            item_id,
            timestamp: rev.timestamp,
            path: rev.path.clone(),
            revision_number: rev.revision_number.clone(),
        });
    }
    keys.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.path.cmp(&b.path))
            .then_with(|| a.revision_number.cmp(&b.revision_number))
            .then_with(|| a.item_id.cmp(&b.item_id))
    });
    let sorted_ids: Vec<ItemId> = keys.iter().map(|k| k.item_id).collect();
    let timestamps: Vec<i64> = keys.iter().map(|k| k.timestamp).collect();
    let pos: HashMap<ItemId, usize> = sorted_ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
    let n = sorted_ids.len();

    // Step 3: diff array of broken-dependency counts per split position.
    let mut diff = vec![0i64; n + 1];
    for &item_id in &sorted_ids {
        let item = items.get(item_id)?;
        for &succ_id in item.succ() {
            if !item_set.contains(&succ_id) {
                continue;
            }
            let i = pos[&item_id];
            let j = pos[&succ_id];
            let (lo, hi) = if i < j { (i, j) } else { (j, i) };
            diff[lo] += 1;
            diff[hi] -= 1;
        }
    }
    let mut prefix = vec![0i64; n.saturating_sub(1)];
    let mut running = 0i64;
    for (k, slot) in prefix.iter_mut().enumerate() {
        running += diff[k];
        *slot = running;
    }

    // Step 4: pick the split maximizing broken count, tie-break on minimal
    // timestamp gap across the boundary, then smallest index.
    let mut best: Option<(i64, i64, usize)> = None;
    for k in 0..prefix.len() {
        let count = prefix[k];
        if count <= 0 {
            continue;
        }
        let gap = (timestamps[k + 1] - timestamps[k]).abs();
        let candidate = (count, gap, k);
        best = Some(match best {
            None => candidate,
            Some((best_count, best_gap, best_k)) => {
                if count > best_count || (count == best_count && gap < best_gap) {
                    candidate
                } else {
                    (best_count, best_gap, best_k)
                }
            }
        });
    }

    let Some((_, _, k)) = best else {
        // No internal dependency: §8 property 9, return unchanged.
        return Ok(vec![RevisionChangeset { id, item_ids }]);
    };

    debug!(split_index = k, "splitting changeset on internal dependency");
    let first_half = sorted_ids[..=k].to_vec();
    let second_half = sorted_ids[k + 1..].to_vec();
    let new_id = ChangesetId(key_gen.next());

    let mut result = split_inner(id, first_half, items, key_gen)?;
    result.extend(split_inner(new_id, second_half, items, key_gen)?);
    Ok(result)
}
