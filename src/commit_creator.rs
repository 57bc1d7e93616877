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

//! C11: the commit creator (§4.10).
//!
//! The last pass: walks the final, timestamped commit order and produces
//! target commits, feeding the openings/closings log the materialization
//! pass (an external collaborator) consumes later.

use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;

use tracing::instrument;

use crate::changeset::Changeset;
use crate::changeset::OrderedChangeset;
use crate::changeset::SymbolChangeset;
use crate::changeset_store::ChangesetStore;
use crate::config::Settings;
use crate::error::Error;
use crate::error::Result;
use crate::ids::ChangesetId;
use crate::ids::FileId;
use crate::ids::ItemId;
use crate::ids::SymbolId;
use crate::item::Item;
use crate::item::ItemStore;
use crate::item::LineOfDevelopment;
use crate::item::OperationKind;
use crate::symbol::SymbolKind;

/// One file-level change folded into a primary or post-commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOperation {
    /// The file being changed.
    pub file_id: FileId,
    /// Path at the time of this operation.
    pub path: String,
    /// What happens to the file's content.
    pub op: OperationKind,
}

/// A target commit (§4.10).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetCommit {
    /// The main commit for a revision changeset.
    Primary {
        /// Source changeset.
        changeset_id: ChangesetId,
        /// Commit timestamp (monotonized by C10).
        timestamp: i64,
        /// Sequential revision number of this target commit.
        revnum: u64,
        /// File operations, sorted by path, with double-dead deletes
        /// already dropped.
        file_ops: Vec<FileOperation>,
    },
    /// Mirrors a non-trunk default-branch primary commit onto trunk
    /// (§4.10, "If any item is marked as a non-trunk default-branch
    /// commit").
    PostCommit {
        /// Source changeset (same as the primary commit it follows).
        changeset_id: ChangesetId,
        /// Commit timestamp; identical to the primary commit's.
        timestamp: i64,
        /// Sequential revision number of this target commit.
        revnum: u64,
        /// File operations mirrored onto trunk.
        file_ops: Vec<FileOperation>,
    },
    /// A tag or branch creation event.
    Symbol {
        /// Source changeset.
        changeset_id: ChangesetId,
        /// Commit timestamp.
        timestamp: i64,
        /// Sequential revision number of this target commit.
        revnum: u64,
        /// The symbol being created.
        symbol_id: SymbolId,
        /// Branch or tag.
        kind: SymbolKind,
    },
}

/// Whether a symbol attachment is opening or closing (§4.10, GLOSSARY
/// "Opening / Closing").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// First revision where the symbol is attached to a file.
    Opening,
    /// The revision, if any, where the symbol stops tracking a file.
    Closing,
}

/// Walks `order` (changeset ids with monotonized timestamps, from C10),
/// producing target commits and appending openings/closings records to
/// `log_path` (§6 "(d)").
#[instrument(skip(order, changesets, items, settings))]
pub fn create_commits(
    order: &[(ChangesetId, i64)],
    changesets: &mut ChangesetStore,
    items: &mut ItemStore,
    settings: &Settings,
    log_path: &Path,
) -> Result<Vec<TargetCommit>> {
    let log_file = File::create(log_path).map_err(|e| Error::io("create openings/closings log", log_path, e))?;
    let mut log = BufWriter::new(log_file);

    let mut revnum = 0u64;
    let mut commits = Vec::new();
    for &(id, timestamp) in order {
        let changeset = changesets.get(id)?;
        match changeset {
            Changeset::Ordered(ordered) => {
                commits.extend(create_ordered_commits(&ordered, timestamp, &mut revnum, items, settings, &mut log)?);
            }
            Changeset::Branch(symbol_changeset) => {
                commits.push(create_symbol_commit(&symbol_changeset, timestamp, &mut revnum, SymbolKind::Branch));
            }
            Changeset::Tag(symbol_changeset) => {
                commits.push(create_symbol_commit(&symbol_changeset, timestamp, &mut revnum, SymbolKind::Tag));
            }
            Changeset::Revision(_) => {
                panic!("commit creator consumed a revision changeset that was never topo-sorted into an ordered changeset")
            }
        }
    }
    log.flush().map_err(|e| Error::io("flush openings/closings log", log_path, e))?;
    Ok(commits)
}

fn create_symbol_commit(changeset: &SymbolChangeset, timestamp: i64, revnum: &mut u64, kind: SymbolKind) -> TargetCommit {
    let this_revnum = *revnum;
    *revnum += 1;
    TargetCommit::Symbol {
        changeset_id: changeset.id,
        timestamp,
        revnum: this_revnum,
        symbol_id: changeset.symbol_id,
        kind,
    }
}

fn create_ordered_commits(
    changeset: &OrderedChangeset,
    timestamp: i64,
    revnum: &mut u64,
    items: &mut ItemStore,
    settings: &Settings,
    log: &mut impl Write,
) -> Result<Vec<TargetCommit>> {
    struct Annotated {
        file_id: FileId,
        path: String,
        op: OperationKind,
        on_default_branch: bool,
    }

    let mut annotated = Vec::with_capacity(changeset.item_ids.len());
    for &item_id in &changeset.item_ids {
        let item = items.get(item_id)?;
        let Item::Revision(rev) = &item else {
            panic!("ordered changesets contain only revision items (§3 Invariant (homogeneity))")
        };

        let op = if rev.op == OperationKind::Delete && predecessor_is_delete(items, rev.pred.first().copied())? {
            // Double-dead: still part of the commit message, but no file
            // operation (§4.10, §8 scenario F).
            OperationKind::Noop
        } else {
            rev.op
        };

        let on_default_branch = match rev.lod {
            LineOfDevelopment::Branch(symbol_id) => settings.default_branch_symbol == Some(symbol_id),
            LineOfDevelopment::Trunk => false,
        };

        annotated.push(Annotated { file_id: rev.file_id, path: rev.path.clone(), op, on_default_branch });
    }
    annotated.sort_by(|a, b| a.path.cmp(&b.path));

    let file_ops: Vec<FileOperation> = annotated
        .iter()
        .filter(|a| a.op != OperationKind::Noop)
        .map(|a| FileOperation { file_id: a.file_id, path: a.path.clone(), op: a.op })
        .collect();
    let needs_post_commit = annotated.iter().any(|a| a.on_default_branch);

    let this_revnum = *revnum;
    *revnum += 1;
    let mut commits = vec![TargetCommit::Primary { changeset_id: changeset.id, timestamp, revnum: this_revnum, file_ops: file_ops.clone() }];

    if needs_post_commit {
        let post_revnum = *revnum;
        *revnum += 1;
        commits.push(TargetCommit::PostCommit { changeset_id: changeset.id, timestamp, revnum: post_revnum, file_ops });
    }

    write_openings_and_closings(changeset, this_revnum, items, log)?;

    Ok(commits)
}

fn predecessor_is_delete(items: &mut ItemStore, pred_id: Option<ItemId>) -> Result<bool> {
    let Some(pred_id) = pred_id else { return Ok(false) };
    let pred = items.get(pred_id)?;
    Ok(matches!(pred.as_revision(), Some(rev) if rev.op == OperationKind::Delete))
}

fn write_openings_and_closings(
    changeset: &OrderedChangeset,
    revnum: u64,
    items: &mut ItemStore,
    log: &mut impl Write,
) -> Result<()> {
    for &item_id in &changeset.item_ids {
        let item = items.get(item_id)?;
        let Item::Revision(rev) = &item else { continue };
        let branch = match rev.lod {
            LineOfDevelopment::Branch(symbol_id) => Some(symbol_id),
            LineOfDevelopment::Trunk => None,
        };

        for &symbol_item_id in rev.tag_item_ids.iter().chain(rev.branch_item_ids.iter()) {
            let symbol_item = items.get(symbol_item_id)?;
            let Item::Symbol(symbol) = &symbol_item else {
                panic!("tag_item_ids/branch_item_ids reference only symbol items")
            };
            write_event(log, symbol.symbol_id, revnum, EventKind::Opening, branch, rev.file_id)?;
        }
        for &symbol_id in &rev.closing_symbol_ids {
            write_event(log, symbol_id, revnum, EventKind::Closing, branch, rev.file_id)?;
        }
    }
    Ok(())
}

fn write_event(
    log: &mut impl Write,
    symbol_id: SymbolId,
    revnum: u64,
    kind: EventKind,
    branch: Option<SymbolId>,
    file_id: FileId,
) -> Result<()> {
    let kind_char = match kind {
        EventKind::Opening => 'O',
        EventKind::Closing => 'C',
    };
    let branch_field = branch.map(|b| b.to_string()).unwrap_or_else(|| "*".to_string());
    writeln!(log, "{symbol_id} {revnum} {kind_char} {branch_field} {file_id}")
        .map_err(|e| Error::io("write openings/closings event", Path::new("<log>"), e))
}
