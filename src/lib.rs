// Copyright 2025 bakri (tidynest@proton.me)
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

//! Keymap Weaver
//!
//! Parser, patcher and evaluator for keyboard firmware keymaps written as
//! `KEYMAP(...)`, `LAYOUT(...)` or `LAYOUT_<variant>(...)` macro calls.
//!
//! # Features
//!
//! - **Offset-exact parsing:** Every key carries its byte span in the source
//! - **Settings block:** Optional `/*--- ... ---*/` metadata with `!regex` values
//! - **Minimal edits:** Replace one key or append a layer without touching
//!   any other byte
//! - **Pluggable semantics:** Evaluate keys with your own executor or the
//!   bundled keyboard one (modifiers, mod-tap, layer actions)
//!
//! # Architecture
//!
//! - **`core`:** Pure logic (types, parser, settings, patcher, evaluator, keycodes)
//! - **`config`:** Keymap file reading and atomic, backed-up writes
//! - **`logging`:** `env_logger` setup for binaries
//!
//! # Examples
//!
//! ## Parsing a keymap
//!
//! ```
//! use keymap_weaver::core::parse;
//!
//! let src = "[0] = LAYOUT(KC_ESC, LT(1, KC_SPC)),\n[1] = LAYOUT(KC_TRNS, KC_TRNS)";
//! let keymap = parse(src, Some(2))?;
//! assert_eq!(keymap.layers.len(), 2);
//! # Ok::<(), keymap_weaver::core::ParseError>(())
//! ```
//!
//! ## Evaluating keys
//!
//! ```
//! use keymap_weaver::core::{evaluate, parse, KeymapExecutor, SemanticResult};
//!
//! let keymap = parse("KEYMAP(LCTL_T(KC_ESC))", None)?;
//! let executor = KeymapExecutor::new();
//! let meaning = evaluate(&keymap.layers[0][0], &executor);
//! assert!(matches!(meaning, Some(SemanticResult::ModTap(_))));
//! # Ok::<(), keymap_weaver::core::ParseError>(())
//! ```

pub mod config;
pub mod core;
pub mod logging;

// Re-export commonly used types for convenience
pub use crate::core::{AstNode, ParseError, ParseResult, SemanticResult};
