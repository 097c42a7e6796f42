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

use super::super::*;
use std::fs;
use tempfile::TempDir;

use crate::core::parser::ParseError;
use crate::core::patcher::set_key;

const ORIGINAL: &str = "[0] = KEYMAP(KC_A, KC_B)\n";

/// Helper to create a keymap file in a fresh temp dir
fn setup() -> (TempDir, KeymapFile) {
    let temp_dir = TempDir::new().unwrap();
    let keymap_path = temp_dir.path().join("keymap.c");
    fs::write(&keymap_path, ORIGINAL).unwrap();
    let file = KeymapFile::new(keymap_path).unwrap();
    (temp_dir, file)
}

// ============================================================================
// KeymapTransaction Tests
// ============================================================================

#[test]
fn test_transaction_basic_flow() {
    let (_temp_dir, file) = setup();

    // Begin transaction (creates backup)
    let tx = KeymapTransaction::begin(&file).unwrap();
    let backup = tx.backup_path().to_path_buf();
    assert_eq!(fs::read_to_string(&backup).unwrap(), ORIGINAL);

    let edited = set_key(ORIGINAL, 0, 1, "LT(1, KC_B)", None);
    tx.commit(&edited).unwrap();

    assert_eq!(file.read().unwrap(), "[0] = KEYMAP(KC_A, LT(1, KC_B))\n");
    // Backup survives the commit
    assert_eq!(fs::read_to_string(&backup).unwrap(), ORIGINAL);
}

#[test]
fn test_commit_with_validation_accepts_valid_keymap() {
    let (_temp_dir, file) = setup();

    let tx = KeymapTransaction::begin(&file).unwrap();
    tx.commit_with_validation("[0] = KEYMAP(KC_C, KC_D)\n").unwrap();

    assert_eq!(file.read().unwrap(), "[0] = KEYMAP(KC_C, KC_D)\n");
}

#[test]
fn test_commit_with_validation_refuses_invalid_keymap() {
    let (_temp_dir, file) = setup();

    let tx = KeymapTransaction::begin(&file).unwrap();
    let result = tx.commit_with_validation("[0] = KEYMAP(KC_C, LT(1, KC_D)\n");

    assert!(matches!(
        result,
        Err(ConfigError::InvalidKeymap(ParseError::UnbalancedParentheses { .. }))
    ));
    assert_eq!(file.read().unwrap(), ORIGINAL, "file must be untouched");
}

#[test]
fn test_transaction_rollback() {
    let (_temp_dir, file) = setup();

    let tx = KeymapTransaction::begin(&file).unwrap();
    fs::write(file.path(), "garbage").unwrap();

    tx.rollback().unwrap();
    assert_eq!(file.read().unwrap(), ORIGINAL);
}

#[test]
fn test_begin_fails_when_file_removed() {
    let (_temp_dir, file) = setup();
    fs::remove_file(file.path()).unwrap();

    assert!(matches!(
        KeymapTransaction::begin(&file),
        Err(ConfigError::Io(_))
    ));
}
