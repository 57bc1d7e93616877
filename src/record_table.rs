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

//! C2: a fixed-width integer→integer table on disk, mapping `id → byte
//! offset` for a companion [`crate::store::IndexedStore`] (§4.1).
//!
//! Slot `id` lives at byte offset `id * 8` and holds a little-endian `u64`.
//! Offset `0` means "absent/deleted". Seeking past the current end of file
//! and writing creates a sparse hole that reads back as zero, which is
//! exactly the "absent" sentinel, so slots for ids that were never written
//! (e.g. gaps in deleted ranges) don't need to be initialized explicitly.

use std::fs::File;
use std::fs::OpenOptions;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use crate::error::Error;
use crate::error::Result;

const SLOT_WIDTH: u64 = 8;

/// An on-disk `id → byte offset` table.
#[derive(Debug)]
pub struct RecordTable {
    file: File,
    path: PathBuf,
}

impl RecordTable {
    /// Creates a new, empty table at `path`, truncating any existing file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| Error::io("create record table", &path, e))?;
        Ok(Self { file, path })
    }

    /// Opens an existing table at `path` for reading and writing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| Error::io("open record table", &path, e))?;
        Ok(Self { file, path })
    }

    /// Records that `id` lives at `offset`. `offset` must never be `0`; use
    /// [`RecordTable::delete`] to clear a slot.
    pub fn set(&mut self, id: u64, offset: u64) -> Result<()> {
        debug_assert_ne!(offset, 0, "0 is the absent/deleted sentinel");
        self.write_slot(id, offset)
    }

    /// Marks `id` as absent/deleted.
    pub fn delete(&mut self, id: u64) -> Result<()> {
        self.write_slot(id, 0)
    }

    fn write_slot(&mut self, id: u64, value: u64) -> Result<()> {
        self.file
            .seek(SeekFrom::Start(id * SLOT_WIDTH))
            .map_err(|e| Error::io("seek record table", &self.path, e))?;
        self.file
            .write_all(&value.to_le_bytes())
            .map_err(|e| Error::io("write record table slot", &self.path, e))?;
        Ok(())
    }

    /// Reads the offset stored for `id`, or `0` if the slot was never
    /// written or was deleted.
    pub fn get(&mut self, id: u64) -> Result<u64> {
        let len = self
            .file
            .metadata()
            .map_err(|e| Error::io("stat record table", &self.path, e))?
            .len();
        let slot_start = id * SLOT_WIDTH;
        if slot_start + SLOT_WIDTH > len {
            return Ok(0);
        }
        self.file
            .seek(SeekFrom::Start(slot_start))
            .map_err(|e| Error::io("seek record table", &self.path, e))?;
        let mut buf = [0u8; 8];
        self.file
            .read_exact(&mut buf)
            .map_err(|e| Error::io("read record table slot", &self.path, e))?;
        Ok(u64::from_le_bytes(buf))
    }

    /// Returns the number of slots the table currently spans (the highest id
    /// ever written, plus one; not all slots in range are necessarily
    /// non-zero).
    pub fn slot_count(&self) -> Result<u64> {
        let len = self
            .file
            .metadata()
            .map_err(|e| Error::io("stat record table", &self.path, e))?
            .len();
        Ok(len.div_ceil(SLOT_WIDTH))
    }
}
