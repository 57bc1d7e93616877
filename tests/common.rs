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

//! Shared item-graph builders for the `scenario_*` integration tests, kept in
//! one place so each scenario file only states the shape of its own items.

use changeset_engine::commit_creator::TargetCommit;
use changeset_engine::config::Settings;
use changeset_engine::context::RunContext;
use changeset_engine::ids::FileId;
use changeset_engine::ids::ItemId;
use changeset_engine::ids::SymbolId;
use changeset_engine::item::Item;
use changeset_engine::item::ItemStore;
use changeset_engine::item::LineOfDevelopment;
use changeset_engine::item::OperationKind;
use changeset_engine::item::RevisionItem;
use changeset_engine::item::SymbolItem;
use changeset_engine::metadata::MetadataId;
use changeset_engine::run_pipeline;
use changeset_engine::symbol::SymbolDatabase;

#[allow(clippy::too_many_arguments)]
pub fn revision(
    id: u64,
    file_id: u64,
    path: &str,
    lod: LineOfDevelopment,
    ts: i64,
    op: OperationKind,
    author: &str,
    log: &str,
    branch_name: Option<&str>,
    pred: Vec<u64>,
    succ: Vec<u64>,
) -> Item {
    tagged_revision(id, file_id, path, lod, ts, op, author, log, branch_name, pred, succ, vec![], vec![])
}

#[allow(clippy::too_many_arguments)]
pub fn tagged_revision(
    id: u64,
    file_id: u64,
    path: &str,
    lod: LineOfDevelopment,
    ts: i64,
    op: OperationKind,
    author: &str,
    log: &str,
    branch_name: Option<&str>,
    pred: Vec<u64>,
    succ: Vec<u64>,
    tag_item_ids: Vec<u64>,
    branch_item_ids: Vec<u64>,
) -> Item {
    Item::Revision(RevisionItem {
        id: ItemId(id),
        file_id: FileId(file_id),
        path: path.into(),
        lod,
        timestamp: ts,
        op,
        metadata_id: MetadataId::compute(author, log, None, branch_name),
        revision_number: vec![1],
        pred: pred.into_iter().map(ItemId).collect(),
        succ: succ.into_iter().map(ItemId).collect(),
        tag_item_ids: tag_item_ids.into_iter().map(ItemId).collect(),
        branch_item_ids: branch_item_ids.into_iter().map(ItemId).collect(),
        closing_symbol_ids: vec![],
    })
}

pub fn symbol(id: u64, file_id: u64, symbol_id: u64, pred: Vec<u64>, succ: Vec<u64>) -> Item {
    Item::Symbol(SymbolItem {
        id: ItemId(id),
        file_id: FileId(file_id),
        symbol_id: SymbolId(symbol_id),
        pred: pred.into_iter().map(ItemId).collect(),
        succ: succ.into_iter().map(ItemId).collect(),
    })
}

pub fn put_all(items: &mut ItemStore, batch: Vec<Item>) {
    for item in batch {
        items.put(&item).unwrap();
    }
}

pub fn run(items: &mut ItemStore, symbols: &SymbolDatabase, settings: Settings) -> Vec<TargetCommit> {
    let dir = tempfile::tempdir().unwrap();
    let ctx = RunContext::new(dir.path(), settings);
    run_pipeline(&ctx, items, symbols).unwrap()
}

pub fn item_store() -> (tempfile::TempDir, ItemStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = ItemStore::create(dir.path().join("items.dat"), dir.path().join("items.idx")).unwrap();
    (dir, store)
}
