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

//! C3: external merge sort (§4.2).
//!
//! Sorts a newline-delimited text file too large to hold in memory: split
//! the input into sorted runs of bounded size, spill each run to a temp
//! file, then k-way merge the runs with a min-heap. Used to sort the
//! revision and symbol summary files so that items sharing a metadata id or
//! symbol id become contiguous (§4.2, §4.5).
//!
//! The sort guarantee is lexicographic on the full line (§4.2); callers that
//! need numeric fields to sort correctly must zero-pad them into the line
//! text themselves (see `hex_util::encode_timestamp_hex8`).

use std::cmp::Ordering;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tempfile::TempDir;

use crate::error::Error;
use crate::error::Result;

/// Default number of lines held in memory per sorted run before spilling.
pub const DEFAULT_RUN_SIZE: usize = 100_000;

/// Sorts the newline-delimited lines of `input_path` into `output_path`,
/// using at most `run_size` lines of memory at a time.
pub fn external_merge_sort(input_path: &Path, output_path: &Path, run_size: usize) -> Result<()> {
    let spill_dir = TempDir::new().map_err(|e| Error::io("create merge sort temp dir", input_path, e))?;
    let runs = split_into_sorted_runs(input_path, run_size, spill_dir.path())?;
    merge_runs(&runs, output_path)
}

/// Reads `input_path` in chunks of `run_size` lines, sorts each chunk in
/// memory, and spills it to a temp file under `spill_dir`. Returns the spill
/// file handles in write order (each already flushed and reopened for
/// reading from the start).
fn split_into_sorted_runs(input_path: &Path, run_size: usize, spill_dir: &Path) -> Result<Vec<File>> {
    let input = File::open(input_path).map_err(|e| Error::io("open merge sort input", input_path, e))?;
    let reader = BufReader::new(input);
    let mut runs = Vec::new();
    let mut chunk: Vec<String> = Vec::with_capacity(run_size);

    for line in reader.lines() {
        let line = line.map_err(|e| Error::io("read merge sort input", input_path, e))?;
        chunk.push(line);
        if chunk.len() >= run_size {
            runs.push(spill_run(&mut chunk, spill_dir)?);
        }
    }
    if !chunk.is_empty() {
        runs.push(spill_run(&mut chunk, spill_dir)?);
    }
    Ok(runs)
}

fn spill_run(chunk: &mut Vec<String>, spill_dir: &Path) -> Result<File> {
    chunk.sort_unstable();
    let mut tmp =
        NamedTempFile::new_in(spill_dir).map_err(|e| Error::io("create merge sort run file", spill_dir, e))?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        for line in chunk.drain(..) {
            writer
                .write_all(line.as_bytes())
                .map_err(|e| Error::io("write merge sort run", spill_dir, e))?;
            writer
                .write_all(b"\n")
                .map_err(|e| Error::io("write merge sort run", spill_dir, e))?;
        }
        writer
            .flush()
            .map_err(|e| Error::io("flush merge sort run", spill_dir, e))?;
    }
    let mut file = tmp
        .reopen()
        .map_err(|e| Error::io("reopen merge sort run", spill_dir, e))?;
    use std::io::Seek;
    use std::io::SeekFrom;
    file.seek(SeekFrom::Start(0))
        .map_err(|e| Error::io("rewind merge sort run", spill_dir, e))?;
    Ok(file)
}

/// One run's read cursor in the k-way merge: the next unread line, and the
/// reader to pull the line after it from.
struct RunCursor {
    reader: BufReader<File>,
    head: String,
}

/// Ordered so [`BinaryHeap`] (a max-heap) yields the lexicographically
/// smallest head line first, via [`Reverse`].
impl PartialEq for RunCursor {
    fn eq(&self, other: &Self) -> bool {
        self.head == other.head
    }
}
impl Eq for RunCursor {}
impl PartialOrd for RunCursor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for RunCursor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.head.cmp(&other.head)
    }
}

fn merge_runs(runs: &[File], output_path: &Path) -> Result<()> {
    let output = File::create(output_path).map_err(|e| Error::io("create merge sort output", output_path, e))?;
    let mut writer = BufWriter::new(output);

    let mut heap: BinaryHeap<Reverse<RunCursor>> = BinaryHeap::new();
    for run in runs {
        let mut reader = BufReader::new(run.try_clone().map_err(|e| Error::io("clone run handle", output_path, e))?);
        let mut head = String::new();
        let read = reader
            .read_line(&mut head)
            .map_err(|e| Error::io("read merge sort run", output_path, e))?;
        if read > 0 {
            if head.ends_with('\n') {
                head.pop();
            }
            heap.push(Reverse(RunCursor { reader, head }));
        }
    }

    while let Some(Reverse(mut cursor)) = heap.pop() {
        writer
            .write_all(cursor.head.as_bytes())
            .map_err(|e| Error::io("write merge sort output", output_path, e))?;
        writer
            .write_all(b"\n")
            .map_err(|e| Error::io("write merge sort output", output_path, e))?;

        let mut next = String::new();
        let read = cursor
            .reader
            .read_line(&mut next)
            .map_err(|e| Error::io("read merge sort run", output_path, e))?;
        if read > 0 {
            if next.ends_with('\n') {
                next.pop();
            }
            cursor.head = next;
            heap.push(Reverse(cursor));
        }
    }

    writer
        .flush()
        .map_err(|e| Error::io("flush merge sort output", output_path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_lines(path: &Path, lines: &[&str]) {
        let mut f = File::create(path).unwrap();
        for line in lines {
            writeln!(f, "{line}").unwrap();
        }
    }

    fn read_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn sorts_within_a_single_run() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        let output = dir.path().join("out.txt");
        write_lines(&input, &["c", "a", "b"]);
        external_merge_sort(&input, &output, 100).unwrap();
        assert_eq!(read_lines(&output), vec!["a", "b", "c"]);
    }

    #[test]
    fn sorts_across_multiple_spilled_runs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        let output = dir.path().join("out.txt");
        let lines: Vec<String> = (0..50).rev().map(|i: i32| format!("{i:04}")).collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        write_lines(&input, &refs);
        // Force many small runs to exercise the k-way merge.
        external_merge_sort(&input, &output, 4).unwrap();
        let got = read_lines(&output);
        let mut expected = lines.clone();
        expected.sort();
        assert_eq!(got, expected);
    }

    #[test]
    fn empty_input_produces_empty_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        let output = dir.path().join("out.txt");
        File::create(&input).unwrap();
        external_merge_sort(&input, &output, 10).unwrap();
        assert_eq!(read_lines(&output), Vec::<String>::new());
    }
}
