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

//! §8 Scenario F: a file deleted, then deleted again on a branch without an
//! intervening add (a "double-dead" revision) keeps its commit but drops the
//! file operation.

use changeset_engine::commit_creator::TargetCommit;
use changeset_engine::config::Settings;
use changeset_engine::item::LineOfDevelopment;
use changeset_engine::item::OperationKind;
use changeset_engine::symbol::SymbolDatabase;

use crate::common::item_store;
use crate::common::put_all;
use crate::common::revision;
use crate::common::run;

#[test]
fn scenario_f_double_dead_delete_keeps_commit_but_drops_file_op() {
    let (_dir, mut items) = item_store();
    put_all(
        &mut items,
        vec![
            revision(0, 1, "a.txt", LineOfDevelopment::Trunk, 100, OperationKind::Add, "alice", "add", None, vec![], vec![1]),
            revision(1, 1, "a.txt", LineOfDevelopment::Trunk, 200, OperationKind::Delete, "alice", "delete", None, vec![0], vec![2]),
            revision(2, 1, "a.txt", LineOfDevelopment::Trunk, 900, OperationKind::Delete, "alice", "double-dead", None, vec![1], vec![]),
        ],
    );

    let mut settings = Settings::default();
    settings.trunk_only = true;
    let commits = run(&mut items, &SymbolDatabase::default(), settings);

    assert_eq!(commits.len(), 3);
    match &commits[2] {
        TargetCommit::Primary { file_ops, .. } => assert!(file_ops.is_empty(), "double-dead delete must carry no file op"),
        other => panic!("expected the double-dead delete's (empty) commit last, got {other:?}"),
    }
}
