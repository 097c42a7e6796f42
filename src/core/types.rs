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

//! src/core/types.rs
//!
//! Syntax tree types produced by the keymap parser
//!
//! This module defines:
//! - `AstNode`: A single argument of a `KEYMAP(...)`/`LAYOUT(...)` call,
//!   either a bare word or a nested macro call
//! - `ParseResult`: Every layer found in a source file plus its settings
//!
//! All offsets are byte offsets into the original UTF-8 source. Every
//! delimiter the parser reacts to is ASCII, so offsets always fall on a
//! char boundary and can be used to slice the source directly.

use serde::Serialize;
use std::fmt;

use crate::core::settings::Settings;

/// One argument inside a macro invocation
///
/// Nodes are immutable once built and carry their exact source span so the
/// patcher can replace a single argument without touching anything else.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AstNode {
    /// A bare identifier such as `KC_A` or `_______`
    Word {
        /// Token text with surrounding whitespace removed
        content: String,
        /// Offset of the first character of `content`
        offset: usize,
        /// Offset of the delimiter that closed the token. Includes any
        /// trailing whitespace, so `end - offset >= content.len()`.
        end: usize,
    },

    /// A macro-style call such as `LT(1, KC_SPC)`
    Func {
        /// Function name, e.g. `LT`
        name: String,
        /// Evaluated left to right
        args: Vec<AstNode>,
        /// Offset of the first character of `name`
        offset: usize,
        /// Offset just past the matching `)`
        end: usize,
        /// Exact source text from `name` through the matching `)`
        #[serde(rename = "fullText")]
        full_text: String,
    },
}

impl AstNode {
    /// Offset where the node starts in the source
    pub fn offset(&self) -> usize {
        match self {
            AstNode::Word { offset, .. } | AstNode::Func { offset, .. } => *offset,
        }
    }

    /// End position as recorded by the parser
    pub fn end(&self) -> usize {
        match self {
            AstNode::Word { end, .. } | AstNode::Func { end, .. } => *end,
        }
    }

    /// The text the patcher replaces when this node is edited
    ///
    /// For a word this is the trimmed content; for a call it is the full
    /// text from the name through the closing parenthesis.
    pub fn source_text(&self) -> &str {
        match self {
            AstNode::Word { content, .. } => content,
            AstNode::Func { full_text, .. } => full_text,
        }
    }

    /// Byte range `[offset, offset + len(source_text))` replaced on edit
    pub fn replace_range(&self) -> std::ops::Range<usize> {
        let start = self.offset();
        start..start + self.source_text().len()
    }
}

impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AstNode::Word { content, .. } => write!(f, "{}", content),
            AstNode::Func { name, args, .. } => {
                let args = args
                    .iter()
                    .map(|a| a.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{}({})", name, args)
            }
        }
    }
}

/// Outcome of parsing a keymap source
///
/// Every layer holds the same number of nodes; the parser rejects input
/// where that does not hold.
#[derive(Clone, Debug, Serialize)]
pub struct ParseResult {
    /// Name of the first invocation, e.g. `KEYMAP` or `LAYOUT_ortho_4x12`
    #[serde(rename = "invocationKeyword")]
    pub invocation_keyword: String,

    /// One entry per invocation, in source order
    pub layers: Vec<Vec<AstNode>>,

    /// Offset just past the last invocation's closing parenthesis
    #[serde(rename = "endOffset")]
    pub end_offset: usize,

    /// Contents of the optional `/*--- ... ---*/` block
    pub settings: Settings,
}

impl ParseResult {
    /// Number of keys per layer (taken from layer 0)
    pub fn key_count(&self) -> usize {
        self.layers.first().map(|l| l.len()).unwrap_or(0)
    }

    /// Looks up a single key by layer and key index
    pub fn key(&self, layer: usize, key: usize) -> Option<&AstNode> {
        self.layers.get(layer).and_then(|l| l.get(key))
    }
}
