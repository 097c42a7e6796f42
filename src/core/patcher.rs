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

//! src/core/patcher.rs
//!
//! Position-preserving edits of keymap sources
//!
//! Editors call these functions on live buffers that may be half-typed, so
//! none of them fail: anything that cannot be parsed is returned unchanged.
//! Edits touch only the bytes of the argument being replaced; comments,
//! whitespace and continuations elsewhere survive byte for byte.

use crate::core::parser::{parse, ParseError};

/// Keycode used to fill newly added layers
pub const TRANSPARENT_KEYCODE: &str = "KC_TRNS";

/// Result of a single-key edit
#[derive(Clone, Debug, PartialEq)]
pub struct Patched {
    /// Source after the edit (or the input, if nothing was changed)
    pub text: String,
    /// Whether the source was modified
    pub changed: bool,
    /// Set when the edited source no longer parses
    pub validation: Option<ParseError>,
}

/// Replace one key and report whether the result still parses
///
/// The edited text is returned even when re-validation fails; the error is
/// advisory so callers can flag the edit immediately.
pub fn set_key_checked(
    text: &str,
    layer: usize,
    key: usize,
    new_value: &str,
    expected_key_count: Option<usize>,
) -> Patched {
    let unchanged = || Patched {
        text: text.to_string(),
        changed: false,
        validation: None,
    };

    let parsed = match parse(text, expected_key_count) {
        Ok(parsed) => parsed,
        Err(e) => {
            log::debug!("set_key skipped: source does not parse: {}", e);
            return unchanged();
        }
    };

    let Some(node) = parsed.key(layer, key) else {
        log::debug!("set_key skipped: no key {} on layer {}", key, layer);
        return unchanged();
    };

    let range = node.replace_range();
    let mut edited = String::with_capacity(text.len() + new_value.len());
    edited.push_str(&text[..range.start]);
    edited.push_str(new_value);
    edited.push_str(&text[range.end..]);

    // Key count is not re-checked: the edit cannot add or remove layers,
    // but it can break parenthesis balance.
    let validation = parse(&edited, None).err();
    if let Some(e) = &validation {
        log::warn!("edit of layer {} key {} leaves an invalid keymap: {}", layer, key, e);
    }

    Patched {
        text: edited,
        changed: true,
        validation,
    }
}

/// Replace the source text of one key
///
/// Returns `text` unchanged if it does not parse or the indices are out of
/// range.
///
/// # Example
/// ```
/// use keymap_weaver::core::patcher::set_key;
///
/// let src = "LAYOUT(KC_A, /* keep */ KC_B)";
/// assert_eq!(set_key(src, 0, 1, "LT(1, KC_B)", None), "LAYOUT(KC_A, /* keep */ LT(1, KC_B))");
/// ```
pub fn set_key(
    text: &str,
    layer: usize,
    key: usize,
    new_value: &str,
    expected_key_count: Option<usize>,
) -> String {
    set_key_checked(text, layer, key, new_value, expected_key_count).text
}

/// Append a layer filled with `KC_TRNS`
///
/// The new entry is inserted right after the last invocation as
/// `,\n [n] = <keyword>(KC_TRNS, ...)`. Returns `text` unchanged if it does
/// not parse.
pub fn add_layer(text: &str, invocation_keyword: &str) -> String {
    let parsed = match parse(text, None) {
        Ok(parsed) => parsed,
        Err(e) => {
            log::debug!("add_layer skipped: source does not parse: {}", e);
            return text.to_string();
        }
    };

    let placeholders = vec![TRANSPARENT_KEYCODE; parsed.key_count()].join(", ");
    let entry = format!(
        ",\n [{}] = {}({})",
        parsed.layers.len(),
        invocation_keyword,
        placeholders
    );

    let at = parsed.end_offset;
    let mut edited = String::with_capacity(text.len() + entry.len());
    edited.push_str(&text[..at]);
    edited.push_str(&entry);
    edited.push_str(&text[at..]);
    edited
}
