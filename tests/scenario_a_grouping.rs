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

//! §8 Scenario A: four revisions of one file, same author/log, gaps of 100s
//! each (well within the default 300s window) group into a single changeset
//! and produce one commit.

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
fn scenario_a_same_metadata_within_window_becomes_one_commit() {
    let (_dir, mut items) = item_store();
    put_all(
        &mut items,
        vec![
            revision(0, 1, "a.txt", LineOfDevelopment::Trunk, 100, OperationKind::Add, "alice", "initial", None, vec![], vec![]),
            revision(1, 1, "a.txt", LineOfDevelopment::Trunk, 200, OperationKind::Change, "alice", "initial", None, vec![], vec![]),
            revision(2, 1, "a.txt", LineOfDevelopment::Trunk, 300, OperationKind::Change, "alice", "initial", None, vec![], vec![]),
            revision(3, 1, "a.txt", LineOfDevelopment::Trunk, 400, OperationKind::Change, "alice", "initial", None, vec![], vec![]),
        ],
    );

    let mut settings = Settings::default();
    settings.trunk_only = true;
    let commits = run(&mut items, &SymbolDatabase::default(), settings);

    assert_eq!(commits.len(), 1);
    match &commits[0] {
        TargetCommit::Primary { timestamp, file_ops, .. } => {
            assert_eq!(*timestamp, 400);
            assert_eq!(file_ops.len(), 4);
            assert!(file_ops.iter().all(|op| op.path == "a.txt"));
        }
        other => panic!("expected a primary commit, got {other:?}"),
    }
}
