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

//! §8 Scenario D: a branch sprouts from trunk's first revision and commits
//! once before trunk's second revision lands. The branch's own commit on the
//! symbol is emitted with no time range of its own, between the two trunk
//! commits, and must not be blocked by a dangling predecessor edge into the
//! not-yet-built branch changeset (the induced-subgraph bug `graph.rs`'s
//! `prune_external_edges` fixes).

use std::collections::HashMap;

use changeset_engine::commit_creator::TargetCommit;
use changeset_engine::config::Settings;
use changeset_engine::ids::SymbolId;
use changeset_engine::item::LineOfDevelopment;
use changeset_engine::item::OperationKind;
use changeset_engine::symbol::SymbolDatabase;
use changeset_engine::symbol::SymbolInfo;
use changeset_engine::symbol::SymbolKind;

use crate::common::item_store;
use crate::common::put_all;
use crate::common::revision;
use crate::common::run;
use crate::common::symbol;
use crate::common::tagged_revision;

#[test]
fn scenario_d_branch_sprouts_then_commits_before_trunk_continues() {
    let (_dir, mut items) = item_store();
    put_all(
        &mut items,
        vec![
            // r1: trunk revision 1, attaches branch item 2.
            tagged_revision(0, 1, "fA", LineOfDevelopment::Trunk, 100, OperationKind::Add, "alice", "m1", None, vec![], vec![1, 2], vec![], vec![2]),
            // r2: trunk revision 2.
            revision(1, 1, "fA", LineOfDevelopment::Trunk, 200, OperationKind::Change, "alice", "m2", None, vec![0], vec![]),
            // branch attachment item: cut from r1, leads into rB1.
            symbol(2, 1, 1, vec![0], vec![3]),
            // rB1: first commit on branch B.
            revision(3, 1, "fA", LineOfDevelopment::Branch(SymbolId(1)), 150, OperationKind::Change, "alice", "mb", Some("B"), vec![2], vec![]),
        ],
    );

    let mut symbol_infos = HashMap::new();
    symbol_infos.insert(SymbolId(1), SymbolInfo { name: "B".into(), kind: SymbolKind::Branch });
    let symbols = SymbolDatabase::new(symbol_infos);

    let commits = run(&mut items, &symbols, Settings::default());

    assert_eq!(commits.len(), 4, "trunk r1, branch creation, branch r1, trunk r2");
    match &commits[0] {
        TargetCommit::Primary { timestamp, .. } => assert_eq!(*timestamp, 100),
        other => panic!("expected r1's primary commit first, got {other:?}"),
    }
    match &commits[1] {
        TargetCommit::Symbol { timestamp, symbol_id, kind, .. } => {
            assert_eq!(*timestamp, 101, "monotonized past r1's timestamp with no time range of its own");
            assert_eq!(*symbol_id, SymbolId(1));
            assert_eq!(*kind, SymbolKind::Branch);
        }
        other => panic!("expected the branch-creation commit second, got {other:?}"),
    }
    match &commits[2] {
        TargetCommit::Primary { timestamp, .. } => assert_eq!(*timestamp, 150, "rB1 follows the branch it was committed on"),
        other => panic!("expected rB1's primary commit third, got {other:?}"),
    }
    match &commits[3] {
        TargetCommit::Primary { timestamp, .. } => assert_eq!(*timestamp, 200),
        other => panic!("expected r2's primary commit last, got {other:?}"),
    }
}
