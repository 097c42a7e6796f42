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

//! Keymap file management with atomic writes and backup support.
//!
//! The core parser and patcher work on strings; this module moves those
//! strings to and from disk:
//!
//! - **Atomic writes**: Uses temp-file-then-rename to prevent corruption
//! - **Automatic backups**: Every write creates a timestamped backup
//! - **Validation**: Content that no longer parses is never written
//!
//! # Example
//!
//! ```no_run
//! use keymap_weaver::config::{KeymapFile, KeymapTransaction};
//! use keymap_weaver::core::patcher::set_key;
//!
//! let file = KeymapFile::new("/home/user/qmk/keymap.c".into())?;
//! let source = file.read()?;
//! let edited = set_key(&source, 0, 0, "KC_ESC", None);
//!
//! KeymapTransaction::begin(&file)?.commit_with_validation(&edited)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod transaction;

pub use error::ConfigError;
pub use transaction::KeymapTransaction;

use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

/// A keymap source file plus the directory its backups go to.
#[derive(Debug)]
pub struct KeymapFile {
    path: PathBuf,
    backup_dir: PathBuf,
}

impl KeymapFile {
    /// Opens a keymap file and prepares its backup directory.
    ///
    /// Backups go to `backups/` next to the file. A symlinked keymap is
    /// allowed but logged.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if the file doesn't exist and
    /// `ConfigError::BackupDirNotWritable` if the backup directory cannot be
    /// created.
    pub fn new(path: PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }

        if path.read_link().is_ok() {
            log::warn!("keymap file is a symlink: {}", path.display());
        }

        // e.g., ~/qmk/keymaps/mine/keymap.c → ~/qmk/keymaps/mine/backups/
        let backup_dir = path
            .parent()
            .ok_or_else(|| ConfigError::BackupDirNotWritable(PathBuf::from("Keymap file has no parent directory")))?
            .join("backups");

        if !backup_dir.exists() {
            fs::create_dir_all(&backup_dir)
                .map_err(|_| ConfigError::BackupDirNotWritable(backup_dir.clone()))?;
        }

        if backup_dir.metadata()?.permissions().readonly() {
            return Err(ConfigError::BackupDirNotWritable(backup_dir));
        }

        Ok(Self { path, backup_dir })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Reads the current keymap source.
    pub fn read(&self) -> Result<String, ConfigError> {
        Ok(fs::read_to_string(&self.path)?)
    }

    /// Copies the current file to `backups/<name>.<YYYY-MM-DD_HHMMSS>`.
    pub(crate) fn create_timestamped_backup(&self) -> Result<PathBuf, ConfigError> {
        let content = fs::read_to_string(&self.path)?;
        let timestamp = Local::now().format("%Y-%m-%d_%H%M%S");

        let original_name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ConfigError::BackupFailed(format!("Unusable file name: {}", self.path.display())))?;

        let backup_path = self.backup_dir.join(format!("{}.{}", original_name, timestamp));
        fs::write(&backup_path, &content)
            .map_err(|e| ConfigError::BackupFailed(format!("{}: {}", backup_path.display(), e)))?;

        log::debug!("backup written to {}", backup_path.display());
        Ok(backup_path)
    }
}

#[cfg(test)]
mod tests;
