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

//! The file-metadata database consumed from the parser (§6): `file_id →
//! (path, mode)`.

use std::collections::HashMap;

use crate::ids::FileId;

/// Executable-bit style mode flags the commit creator needs to decide
/// whether a file's content should be staged as executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMode {
    /// Whether the file carries the executable bit on its line of
    /// development.
    pub executable: bool,
}

/// One entry in the file-metadata database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Path within the repository, forward-slash separated.
    pub path: String,
    /// Mode flags.
    pub mode: FileMode,
}

/// Read-only view over the parser's file-metadata database.
#[derive(Debug, Clone, Default)]
pub struct FileDatabase {
    files: HashMap<FileId, FileInfo>,
}

impl FileDatabase {
    /// Builds a database from parser-provided entries.
    pub fn new(files: HashMap<FileId, FileInfo>) -> Self {
        Self { files }
    }

    /// Looks up a file's metadata by id.
    pub fn get(&self, id: FileId) -> Option<&FileInfo> {
        self.files.get(&id)
    }

    /// Returns the path of a file, or `None` if `id` is unknown.
    pub fn path(&self, id: FileId) -> Option<&str> {
        self.files.get(&id).map(|info| info.path.as_str())
    }
}
