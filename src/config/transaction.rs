// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Keymap write transactions with automatic backups

use atomic_write_file::AtomicWriteFile;
use std::{fs, io::Write, path::Path, path::PathBuf};

use crate::config::{ConfigError, KeymapFile};
use crate::core::parser::parse;

/// Atomic keymap write with a backup taken up front.
///
/// # Lifecycle
///
/// 1. `begin()` - Creates timestamped backup immediately
/// 2. Caller prepares new content (in memory)
/// 3. `commit()` - Writes atomically, or `rollback()` - Restores the backup
pub struct KeymapTransaction<'a> {
    file: &'a KeymapFile,
    backup_path: PathBuf,
}

impl<'a> KeymapTransaction<'a> {
    /// Begins a transaction by creating a timestamped backup.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the backup cannot be
    /// written. Nothing is modified in that case.
    pub fn begin(file: &'a KeymapFile) -> Result<Self, ConfigError> {
        let backup_path = file.create_timestamped_backup()?;
        Ok(Self { file, backup_path })
    }

    /// Path of the backup taken by `begin()`.
    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Commits only if `new_content` still parses as a keymap.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidKeymap` without touching the file when
    /// parsing fails.
    pub fn commit_with_validation(self, new_content: &str) -> Result<(), ConfigError> {
        let parsed = parse(new_content, None)?;
        log::debug!(
            "validated {} layer(s) before writing {}",
            parsed.layers.len(),
            self.file.path().display()
        );
        self.commit(new_content)
    }

    /// Atomically replaces the keymap file with `new_content`.
    ///
    /// On failure the original file is untouched and the backup remains.
    pub fn commit(self, new_content: &str) -> Result<(), ConfigError> {
        write_atomic(self.file.path(), new_content)
    }

    /// Restores the backup created by `begin()`.
    pub fn rollback(&self) -> Result<(), ConfigError> {
        let backup_content = fs::read_to_string(&self.backup_path)?;
        write_atomic(self.file.path(), &backup_content)
    }
}

fn write_atomic(path: &Path, content: &str) -> Result<(), ConfigError> {
    let mut file = AtomicWriteFile::options()
        .open(path)
        .map_err(|e| ConfigError::WriteFailed(format!("Failed to open for atomic write: {}", e)))?;

    file.write_all(content.as_bytes())
        .map_err(|e| ConfigError::WriteFailed(format!("Failed to write content: {}", e)))?;

    file.commit()
        .map_err(|e| ConfigError::WriteFailed(format!("Failed to commit atomic write: {}", e)))?;

    Ok(())
}
