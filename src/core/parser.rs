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

//! src/core/parser.rs
//!
//! Keymap source parser
//!
//! This module extracts key assignments from C sources that declare layers
//! with `KEYMAP(...)`, `LAYOUT(...)` or `LAYOUT_<variant>(...)` macro calls.
//! It handles:
//! - Any surrounding text (includes, array syntax, layer indices)
//! - Nested macro calls such as `LT(1, LSFT(KC_A))`
//! - Block comments, line comments and backslash-newline continuations
//! - Byte-exact offsets for every argument
//!
//! # Architecture
//! Invocations are located with a regex. Each argument list is then read by
//! a recursive descent scanner: one call of `parse_args` per open
//! parenthesis, returning the position after its matching `)`. The nesting
//! depth doubles as the open-parenthesis counter.
//!
//! # Errors
//! Parsing fails fast: the first problem found is returned and no partial
//! tree is produced.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use crate::core::settings::{self, Settings};
use crate::core::types::{AstNode, ParseResult};

/// Deepest nesting of parentheses accepted inside one invocation
///
/// The invocation's own parenthesis counts as the first level.
pub const MAX_NESTING_DEPTH: usize = 64;

static INVOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b((?:KEYMAP|LAYOUT)(?:_\w+)?)\(")
        .expect("invocation pattern should be valid regex")
});

/// Parse errors with source offsets
///
/// Offsets are byte offsets into the parsed text. `MissingToken` and
/// `MissingFunctionName` point just past the offending delimiter;
/// `WhitespaceInToken` points at the start of the broken token.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ParseError {
    #[error("No KEYMAP or LAYOUT invocation found")]
    MissingInvocation,

    #[error("Unbalanced parentheses: {open} still open at end of input")]
    UnbalancedParentheses { open: usize },

    #[error("Missing token before offset {offset}")]
    MissingToken { offset: usize },

    #[error("Whitespace inside token starting at offset {offset}")]
    WhitespaceInToken { offset: usize },

    #[error("Missing function name before offset {offset}")]
    MissingFunctionName { offset: usize },

    #[error("Unexpected text after function call at offset {offset}")]
    UnexpectedText { offset: usize },

    #[error("Parentheses nested deeper than {max} levels at offset {offset}")]
    NestingTooDeep { offset: usize, max: usize },

    #[error("Layer {layer} has {actual} keys but layer 0 has {expected}")]
    LayerCountMismatch {
        layer: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Expected {expected} keys, found {actual}")]
    KeyCountMismatch { expected: usize, actual: usize },
}

impl ParseError {
    /// Source offset the error points at, if it has one
    pub fn offset(&self) -> Option<usize> {
        match self {
            ParseError::MissingToken { offset }
            | ParseError::WhitespaceInToken { offset }
            | ParseError::MissingFunctionName { offset }
            | ParseError::UnexpectedText { offset }
            | ParseError::NestingTooDeep { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}

/// A located `KEYMAP(`/`LAYOUT(` call
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation<'a> {
    /// Macro name, e.g. `LAYOUT_ortho_4x12`
    pub keyword: &'a str,
    /// Offset of the first character of the keyword
    pub start: usize,
    /// Offset just past the opening parenthesis
    pub args_start: usize,
}

/// Finds the next invocation at or after `from`
pub fn find_invocation(text: &str, from: usize) -> Option<Invocation<'_>> {
    let caps = INVOCATION.captures_at(text, from)?;
    let whole = caps.get(0)?;
    let keyword = caps.get(1)?;

    Some(Invocation {
        keyword: keyword.as_str(),
        start: whole.start(),
        args_start: whole.end(),
    })
}

/// Parse a keymap source
///
/// # Arguments
/// * `text` - The complete source file content
/// * `expected_key_count` - Number of keys the target keyboard has, if known
///
/// # Returns
/// All layers in source order together with the settings block, or the
/// first `ParseError` encountered.
///
/// # Example
/// ```
/// use keymap_weaver::core::parser::parse;
///
/// let result = parse("[0] = LAYOUT(KC_A, LT(1, KC_B))", Some(2))?;
/// assert_eq!(result.layers.len(), 1);
/// assert_eq!(result.invocation_keyword, "LAYOUT");
/// # Ok::<(), keymap_weaver::core::parser::ParseError>(())
/// ```
pub fn parse(text: &str, expected_key_count: Option<usize>) -> Result<ParseResult, ParseError> {
    let first = find_invocation(text, 0).ok_or(ParseError::MissingInvocation)?;
    let invocation_keyword = first.keyword.to_string();
    let settings = read_settings(&text[..first.start]);

    let mut layers = Vec::new();
    let mut end_offset = first.args_start;
    let mut next = Some(first);

    while let Some(invocation) = next {
        let (args, after) = parse_args(text, invocation.args_start, 1)?;
        layers.push(args);
        end_offset = after;
        next = find_invocation(text, after);
    }

    let expected = layers.first().map(|l| l.len()).unwrap_or(0);
    for (layer, keys) in layers.iter().enumerate().skip(1) {
        if keys.len() != expected {
            return Err(ParseError::LayerCountMismatch {
                layer,
                expected,
                actual: keys.len(),
            });
        }
    }

    if let Some(expected_keys) = expected_key_count {
        if expected != expected_keys {
            return Err(ParseError::KeyCountMismatch {
                expected: expected_keys,
                actual: expected,
            });
        }
    }

    log::debug!(
        "parsed {} layer(s) of {} key(s) using {}",
        layers.len(),
        expected,
        invocation_keyword
    );

    Ok(ParseResult {
        invocation_keyword,
        layers,
        end_offset,
        settings,
    })
}

/// Settings are optional: a missing or broken block yields empty settings
fn read_settings(preamble: &str) -> Settings {
    let Some(block) = settings::find_settings_block(preamble) else {
        return Settings::default();
    };

    settings::parse_settings(block).unwrap_or_else(|e| {
        log::warn!("ignoring settings block: {}", e);
        Settings::default()
    })
}

/// Token being accumulated between two delimiters
enum Pending {
    Empty,
    /// `start..content_end` is the token text seen so far
    Word { start: usize, content_end: usize },
    /// A completed call waiting for its delimiter
    Call(AstNode),
}

impl Pending {
    /// Closes the token at the delimiter found at `delimiter`
    fn finish(self, text: &str, delimiter: usize) -> Result<AstNode, ParseError> {
        match self {
            Pending::Empty => Err(ParseError::MissingToken {
                offset: delimiter + 1,
            }),
            Pending::Word { start, content_end } => Ok(AstNode::Word {
                content: text[start..content_end].to_string(),
                offset: start,
                end: delimiter,
            }),
            Pending::Call(node) => Ok(node),
        }
    }
}

/// Parse one argument list
///
/// `start` is the offset just after an opening parenthesis and `depth` the
/// number of parentheses currently open. Returns the arguments and the
/// offset just past the matching `)`.
fn parse_args(text: &str, start: usize, depth: usize) -> Result<(Vec<AstNode>, usize), ParseError> {
    let mut args = Vec::new();
    let mut pending = Pending::Empty;
    let mut pos = start;

    loop {
        let rest = &text[pos..];
        let Some(ch) = rest.chars().next() else {
            return Err(ParseError::UnbalancedParentheses { open: depth });
        };

        if rest.starts_with("/*") {
            pos = rest[2..]
                .find("*/")
                .map(|i| pos + 2 + i + 2)
                .unwrap_or(text.len());
            continue;
        }

        if rest.starts_with("//") {
            pos = rest.find('\n').map(|i| pos + i).unwrap_or(text.len());
            continue;
        }

        if let Some(len) = continuation_len(rest) {
            if matches!(pending, Pending::Word { .. }) {
                pending = Pending::Empty;
            }
            pos += len;
            continue;
        }

        match ch {
            ',' => {
                args.push(pending.finish(text, pos)?);
                pending = Pending::Empty;
                pos += 1;
            }
            ')' => {
                args.push(pending.finish(text, pos)?);
                return Ok((args, pos + 1));
            }
            '(' => {
                let (name_start, name_end) = match pending {
                    Pending::Word { start, content_end } => (start, content_end),
                    Pending::Empty => {
                        return Err(ParseError::MissingFunctionName { offset: pos + 1 })
                    }
                    Pending::Call(_) => return Err(ParseError::UnexpectedText { offset: pos }),
                };

                if depth >= MAX_NESTING_DEPTH {
                    return Err(ParseError::NestingTooDeep {
                        offset: pos,
                        max: MAX_NESTING_DEPTH,
                    });
                }

                let (inner, after) = parse_args(text, pos + 1, depth + 1)?;
                pending = Pending::Call(AstNode::Func {
                    name: text[name_start..name_end].to_string(),
                    args: inner,
                    offset: name_start,
                    end: after,
                    full_text: text[name_start..after].to_string(),
                });
                pos = after;
            }
            c if c.is_whitespace() => pos += c.len_utf8(),
            c => {
                let next = pos + c.len_utf8();
                pending = match pending {
                    Pending::Empty => Pending::Word {
                        start: pos,
                        content_end: next,
                    },
                    Pending::Word { start, content_end } if content_end == pos => Pending::Word {
                        start,
                        content_end: next,
                    },
                    Pending::Word { start, .. } => {
                        return Err(ParseError::WhitespaceInToken { offset: start })
                    }
                    Pending::Call(_) => return Err(ParseError::UnexpectedText { offset: pos }),
                };
                pos = next;
            }
        }
    }
}

/// Length of a backslash-newline continuation at the start of `rest`
fn continuation_len(rest: &str) -> Option<usize> {
    if rest.starts_with("\\\n") {
        Some(2)
    } else if rest.starts_with("\\\r\n") {
        Some(3)
    } else {
        None
    }
}
