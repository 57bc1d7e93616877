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

//! C10: the final topological sort and timestamp monotonization (§4.9).
//!
//! Consumes the full graph (revision chain plus symbol changesets, now all
//! legally placed) and assigns every changeset a commit timestamp that is
//! strictly greater than the one before it, even when source timestamps tie
//! or regress (§8 property 7).

use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;

use tracing::instrument;

use crate::error::Error;
use crate::error::Result;
use crate::graph::ChangesetGraph;
use crate::hex_util;
use crate::ids::ChangesetId;

/// Consumes `graph`, returning `(changeset_id, timestamp)` pairs in final
/// commit order with timestamps monotonized per
/// `max(t_max, previous_timestamp + 1)` (§4.9).
///
/// The graph passed in must already be free of cycles (C7/C9 have run);
/// hitting a cycle here is a precondition violation rather than something
/// to be repaired in place.
#[instrument(skip(graph))]
pub fn finalize_commit_order(graph: ChangesetGraph) -> Result<Vec<(ChangesetId, i64)>> {
    let order = graph.consume(|_, cycle| {
        Err(Error::CycleBreakRegress(*cycle.first().expect("cycle is non-empty")))
    })?;

    let mut out = Vec::with_capacity(order.len());
    let mut previous_timestamp: Option<i64> = None;
    for (id, time_range) in order {
        // A pure symbol changeset with no time range of its own imposes no
        // timestamp floor beyond strict monotonicity.
        let source_ts = time_range.map(|r| r.t_max).unwrap_or(i64::MIN);
        let timestamp = match previous_timestamp {
            Some(prev) => source_ts.max(prev + 1),
            None => source_ts,
        };
        previous_timestamp = Some(timestamp);
        out.push((id, timestamp));
    }
    Ok(out)
}

/// Writes `(changeset_id_hex, timestamp_hex8)` lines, in order, to
/// `changesets-sorted.txt` (§6 "(c)").
#[instrument(skip(order))]
pub fn write_sorted_changesets(order: &[(ChangesetId, i64)], path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::io("create sorted changesets file", path, e))?;
    let mut writer = BufWriter::new(file);
    for &(id, timestamp) in order {
        let ts = timestamp.clamp(0, u32::MAX as i64) as u32;
        writeln!(writer, "{} {}", id, hex_util::encode_timestamp_hex8(ts))
            .map_err(|e| Error::io("write sorted changesets line", path, e))?;
    }
    writer.flush().map_err(|e| Error::io("flush sorted changesets file", path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changeset::GraphNode;
    use crate::changeset::TimeRange;
    use std::collections::BTreeSet;

    fn node(id: u64, pred: &[u64], t_max: Option<i64>) -> GraphNode {
        GraphNode {
            changeset_id: ChangesetId(id),
            time_range: t_max.map(|t| TimeRange { t_min: t, t_max: t }),
            pred: pred.iter().map(|&p| ChangesetId(p)).collect::<BTreeSet<_>>(),
            succ: BTreeSet::new(),
        }
    }

    #[test]
    fn timestamps_are_strictly_increasing_even_on_ties() {
        let mut graph = ChangesetGraph::new();
        graph.insert_node(node(1, &[], Some(100)));
        graph.insert_node(node(2, &[1], Some(100)));
        graph.insert_node(node(3, &[2], Some(100)));
        let order = finalize_commit_order(graph).unwrap();
        let timestamps: Vec<i64> = order.iter().map(|(_, ts)| *ts).collect();
        assert_eq!(timestamps, vec![100, 101, 102]);
    }

    #[test]
    fn symbol_changeset_with_no_time_range_still_advances_monotonically() {
        let mut graph = ChangesetGraph::new();
        graph.insert_node(node(1, &[], Some(100)));
        graph.insert_node(node(2, &[1], None));
        let order = finalize_commit_order(graph).unwrap();
        assert_eq!(order[1].1, 101);
    }

    #[test]
    fn sorted_file_round_trips_ids_and_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("changesets-sorted.txt");
        write_sorted_changesets(&[(ChangesetId(1), 100), (ChangesetId(2), 101)], &path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "1 00000064\n2 00000065\n");
    }
}
