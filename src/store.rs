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

//! C1: an append-only, indexed store of serialized records, keyed by integer
//! id (§4.1).
//!
//! The data file's first record is a self-describing header (a magic tag and
//! a format version); every later record is a `bincode`-encoded value,
//! appended at end-of-file. A companion [`crate::record_table::RecordTable`]
//! maps `id → byte offset`.
//!
//! Append-only storage makes [`IndexedStore::put`] O(1) and lets a modified
//! version of a store be produced by copying just the index while sharing the
//! data file — wasted space from overwritten/deleted records is accepted in
//! exchange for that simplicity (§4.1 "Design rationale").

use std::fs::File;
use std::fs::OpenOptions;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Write;
use std::marker::PhantomData;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::error::Result;
use crate::record_table::RecordTable;

const FORMAT_VERSION: u32 = 1;

/// An append-only store of `T` records, indexed by integer id.
#[derive(Debug)]
pub struct IndexedStore<T> {
    data: File,
    data_path: PathBuf,
    table: RecordTable,
    _marker: PhantomData<T>,
}

impl<T> IndexedStore<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Creates a new store. `magic` identifies the record schema (e.g.
    /// `b"CSIT"` for items, `b"CSCS"` for changesets) and is checked on
    /// [`IndexedStore::open`] so a store of one schema can't silently be read
    /// as another.
    pub fn create(data_path: impl AsRef<Path>, table_path: impl AsRef<Path>, magic: &[u8; 4]) -> Result<Self> {
        let data_path = data_path.as_ref().to_path_buf();
        let mut data = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&data_path)
            .map_err(|e| Error::io("create item store data file", &data_path, e))?;
        write_header(&mut data, &data_path, magic)?;
        let table = RecordTable::create(table_path)?;
        Ok(Self {
            data,
            data_path,
            table,
            _marker: PhantomData,
        })
    }

    /// Opens an existing store for reading and appending.
    pub fn open(data_path: impl AsRef<Path>, table_path: impl AsRef<Path>, magic: &[u8; 4]) -> Result<Self> {
        let data_path = data_path.as_ref().to_path_buf();
        let mut data = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&data_path)
            .map_err(|e| Error::io("open item store data file", &data_path, e))?;
        check_header(&mut data, &data_path, magic)?;
        let table = RecordTable::open(table_path)?;
        Ok(Self {
            data,
            data_path,
            table,
            _marker: PhantomData,
        })
    }

    /// Appends a serialized record and indexes it under `id`.
    pub fn put(&mut self, id: u64, record: &T) -> Result<()> {
        let offset = self
            .data
            .seek(SeekFrom::End(0))
            .map_err(|e| Error::io("seek item store to end", &self.data_path, e))?;
        // Every record is length-prefixed so iteration can walk forward without
        // consulting the index.
        let encoded = bincode::serialize(record).map_err(|e| Error::codec(&self.data_path, e))?;
        let mut writer = BufWriter::new(&mut self.data);
        writer
            .write_all(&(encoded.len() as u64).to_le_bytes())
            .map_err(|e| Error::io("write item store record length", &self.data_path, e))?;
        writer
            .write_all(&encoded)
            .map_err(|e| Error::io("write item store record", &self.data_path, e))?;
        writer
            .flush()
            .map_err(|e| Error::io("flush item store", &self.data_path, e))?;
        self.table.set(id, offset + 1)?; // +1 so a genuine offset 0 is never mistaken for absent
        Ok(())
    }

    /// Reads back the record for `id`. Fails with [`Error::MissingItem`]-style
    /// errors are the caller's responsibility to raise; this returns `None`
    /// when the slot is absent/deleted.
    pub fn get(&mut self, id: u64) -> Result<Option<T>> {
        let stored = self.table.get(id)?;
        if stored == 0 {
            return Ok(None);
        }
        let offset = stored - 1;
        self.data
            .seek(SeekFrom::Start(offset))
            .map_err(|e| Error::io("seek item store record", &self.data_path, e))?;
        let mut len_buf = [0u8; 8];
        self.data
            .read_exact(&mut len_buf)
            .map_err(|e| Error::io("read item store record length", &self.data_path, e))?;
        let len = u64::from_le_bytes(len_buf) as usize;
        let mut buf = vec![0u8; len];
        self.data
            .read_exact(&mut buf)
            .map_err(|e| Error::io("read item store record", &self.data_path, e))?;
        let record = bincode::deserialize(&buf).map_err(|e| Error::codec(&self.data_path, e))?;
        Ok(Some(record))
    }

    /// Marks `id` absent. The underlying bytes are not reclaimed.
    pub fn delete(&mut self, id: u64) -> Result<()> {
        self.table.delete(id)
    }

    /// Iterates over every non-deleted id in id order, yielding `(id,
    /// record)` pairs (§4.1 `iter()`).
    pub fn iter(&mut self) -> Result<Vec<(u64, T)>> {
        let slots = self.table.slot_count()?;
        let mut out = Vec::new();
        for id in 0..slots {
            if let Some(record) = self.get(id)? {
                out.push((id, record));
            }
        }
        Ok(out)
    }
}

fn write_header(data: &mut File, path: &Path, magic: &[u8; 4]) -> Result<()> {
    data.write_all(magic)
        .map_err(|e| Error::io("write store header magic", path, e))?;
    data.write_all(&FORMAT_VERSION.to_le_bytes())
        .map_err(|e| Error::io("write store header version", path, e))?;
    Ok(())
}

fn check_header(data: &mut File, path: &Path, magic: &[u8; 4]) -> Result<()> {
    let mut reader = BufReader::new(&mut *data);
    let mut header = [0u8; 8];
    reader
        .read_exact(&mut header)
        .map_err(|e| Error::io("read store header", path, e))?;
    let (got_magic, got_version) = header.split_at(4);
    if got_magic != magic || u32::from_le_bytes(got_version.try_into().unwrap()) != FORMAT_VERSION {
        return Err(Error::IncompatibleFormat { path: path.to_path_buf() });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
    struct Sample {
        tag: String,
        value: u64,
    }

    fn store(dir: &tempfile::TempDir) -> IndexedStore<Sample> {
        IndexedStore::create(dir.path().join("d"), dir.path().join("i"), b"TEST").unwrap()
    }

    #[test]
    fn put_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = store(&dir);
        let sample = Sample { tag: "a".into(), value: 42 };
        s.put(0, &sample).unwrap();
        assert_eq!(s.get(0).unwrap(), Some(sample));
    }

    #[test]
    fn missing_id_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = store(&dir);
        assert_eq!(s.get(99).unwrap(), None);
    }

    #[test]
    fn delete_hides_record_without_erasing_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = store(&dir);
        s.put(0, &Sample { tag: "a".into(), value: 1 }).unwrap();
        s.delete(0).unwrap();
        assert_eq!(s.get(0).unwrap(), None);
    }

    #[test]
    fn iter_yields_only_present_ids_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = store(&dir);
        s.put(0, &Sample { tag: "a".into(), value: 1 }).unwrap();
        s.put(1, &Sample { tag: "b".into(), value: 2 }).unwrap();
        s.put(2, &Sample { tag: "c".into(), value: 3 }).unwrap();
        s.delete(1).unwrap();
        let items = s.iter().unwrap();
        assert_eq!(items.iter().map(|(id, _)| *id).collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn opening_with_wrong_magic_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut s: IndexedStore<Sample> =
                IndexedStore::create(dir.path().join("d"), dir.path().join("i"), b"TEST").unwrap();
            s.put(0, &Sample { tag: "a".into(), value: 1 }).unwrap();
        }
        let err = IndexedStore::<Sample>::open(dir.path().join("d"), dir.path().join("i"), b"OTHR").unwrap_err();
        assert!(matches!(err, Error::IncompatibleFormat { .. }));
    }
}
