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

//! The working-directory lock (§5 "Concurrency", §7 item 4).
//!
//! Only one run may operate on a given working directory at a time.
//! Directory creation is atomic on every platform this crate targets, so a
//! plain `mkdir` doubling as a mutex is sufficient — no separate lock file
//! format or PID bookkeeping is needed.

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use tracing::instrument;

use crate::error::Error;
use crate::error::Result;

const LOCK_DIR_NAME: &str = "lock";

/// Holds the working-directory lock for as long as it's alive; dropping it
/// releases the lock by removing the lock directory.
#[derive(Debug)]
pub struct WorkingDirLock {
    path: PathBuf,
}

impl WorkingDirLock {
    /// Acquires the lock under `working_dir`, failing with
    /// [`Error::LockHeld`] if another run already holds it (§7 item 4).
    #[instrument]
    pub fn acquire(working_dir: &Path) -> Result<Self> {
        let path = working_dir.join(LOCK_DIR_NAME);
        match fs::create_dir(&path) {
            Ok(()) => Ok(Self { path }),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(Error::LockHeld(path)),
            Err(e) => Err(Error::io("create lock directory", path, e)),
        }
    }
}

impl Drop for WorkingDirLock {
    fn drop(&mut self) {
        // Best-effort: a failure here leaves a stale lock directory behind,
        // which is surfaced to the next run as `Error::LockHeld` rather than
        // silently swallowed.
        let _ = fs::remove_dir(&self.path);
    }
}
