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

//! §8 Scenario B: two files touched with identical author/log metadata at
//! nearly the same time form one commit; a later pair with different
//! metadata forms a second, later commit.

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
fn scenario_b_shared_metadata_across_files_groups_into_one_commit() {
    let (_dir, mut items) = item_store();
    put_all(
        &mut items,
        vec![
            revision(0, 1, "a.txt", LineOfDevelopment::Trunk, 100, OperationKind::Add, "alice", "touch both", None, vec![], vec![]),
            revision(1, 2, "b.txt", LineOfDevelopment::Trunk, 110, OperationKind::Add, "alice", "touch both", None, vec![], vec![]),
            revision(2, 1, "a.txt", LineOfDevelopment::Trunk, 200, OperationKind::Change, "alice", "second round", None, vec![], vec![]),
            revision(3, 2, "b.txt", LineOfDevelopment::Trunk, 210, OperationKind::Change, "alice", "second round", None, vec![], vec![]),
        ],
    );

    let mut settings = Settings::default();
    settings.trunk_only = true;
    let commits = run(&mut items, &SymbolDatabase::default(), settings);

    assert_eq!(commits.len(), 2);
    let timestamps: Vec<i64> = commits
        .iter()
        .map(|c| match c {
            TargetCommit::Primary { timestamp, .. } => *timestamp,
            other => panic!("expected only primary commits, got {other:?}"),
        })
        .collect();
    assert_eq!(timestamps, vec![110, 210]);

    match &commits[0] {
        TargetCommit::Primary { file_ops, .. } => {
            let paths: Vec<&str> = file_ops.iter().map(|op| op.path.as_str()).collect();
            assert_eq!(paths, vec!["a.txt", "b.txt"]);
        }
        _ => unreachable!(),
    }
}
