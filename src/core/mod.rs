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

//! src/core/mod.rs
//!
//! Core keymap logic
//!
//! This module contains the parsing and evaluation pipeline:
//! - Syntax tree types with exact source offsets
//! - The `KEYMAP(...)`/`LAYOUT(...)` parser and settings block reader
//! - Position-preserving edits (single key, appended layer)
//! - Tree evaluation and the reference keyboard semantics
//!
//! Everything here is pure: no I/O, no shared state. File handling lives
//! in `config`.

pub mod evaluator;
pub mod keycodes;
pub mod parser;
pub mod patcher;
pub mod settings;
pub mod types;

pub use evaluator::{evaluate, evaluate_strict, EvalError, Executor, TableExecutor};
pub use keycodes::{KeymapExecutor, Modifier, Rendered, SemanticResult};
pub use parser::{parse, ParseError};
pub use patcher::{add_layer, set_key, set_key_checked};
pub use settings::{Settings, SettingValue};
pub use types::*;

#[cfg(test)]
mod tests;
