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

use crate::core::parser::{parse, ParseError};
use crate::core::patcher::*;
use crate::core::AstNode;

// ============================================================================
// set_key
// ============================================================================

#[test]
fn test_set_key_replaces_word() {
    assert_eq!(set_key("KEYMAP(A, B, C)", 0, 1, "X", None), "KEYMAP(A, X, C)");
}

#[test]
fn test_set_key_replaces_whole_call() {
    assert_eq!(
        set_key("KEYMAP(LT(1, A), B)", 0, 0, "KC_Z", None),
        "KEYMAP(KC_Z, B)"
    );
}

#[test]
fn test_set_key_preserves_surrounding_text() {
    let src = "KEYMAP( A /* a */ ,\n  B )";
    assert_eq!(set_key(src, 0, 1, "Q", None), "KEYMAP( A /* a */ ,\n  Q )");
}

#[test]
fn test_set_key_on_later_layer() {
    let src = "KEYMAP(A, B),\nKEYMAP(C, D)";
    assert_eq!(set_key(src, 1, 0, "X", None), "KEYMAP(A, B),\nKEYMAP(X, D)");
}

#[test]
fn test_set_key_out_of_range_is_noop() {
    let src = "KEYMAP(A, B)";
    assert_eq!(set_key(src, 0, 5, "X", None), src);
    assert_eq!(set_key(src, 3, 0, "X", None), src);
}

#[test]
fn test_set_key_on_invalid_source_is_noop() {
    let src = "KEYMAP(A, B";
    assert_eq!(set_key(src, 0, 0, "X", None), src);

    // Key count mismatch counts as invalid
    assert_eq!(set_key("KEYMAP(A, B)", 0, 0, "X", Some(3)), "KEYMAP(A, B)");
}

#[test]
fn test_set_key_checked_flags_broken_edit() {
    let patched = set_key_checked("KEYMAP(A, B)", 0, 0, "LT(1", None);

    assert!(patched.changed);
    assert_eq!(patched.text, "KEYMAP(LT(1, B)");
    assert!(matches!(
        patched.validation,
        Some(ParseError::UnbalancedParentheses { .. })
    ));
}

#[test]
fn test_set_key_checked_clean_edit() {
    let patched = set_key_checked("KEYMAP(A, B)", 0, 1, "MO(2)", Some(2));

    assert!(patched.changed);
    assert_eq!(patched.validation, None);

    let reparsed = parse(&patched.text, Some(2)).unwrap();
    assert!(matches!(reparsed.key(0, 1), Some(AstNode::Func { name, .. }) if name == "MO"));
}

#[test]
fn test_set_key_checked_unchanged() {
    let patched = set_key_checked("not a keymap", 0, 0, "X", None);
    assert!(!patched.changed);
    assert_eq!(patched.text, "not a keymap");
}

// ============================================================================
// add_layer
// ============================================================================

#[test]
fn test_add_layer_format() {
    assert_eq!(
        add_layer("KEYMAP(A, B)", "KEYMAP"),
        "KEYMAP(A, B),\n [1] = KEYMAP(KC_TRNS, KC_TRNS)"
    );
}

#[test]
fn test_add_layer_keeps_trailing_text() {
    let src = "[0] = LAYOUT(A)\n};";
    let edited = add_layer(src, "LAYOUT");
    assert_eq!(edited, "[0] = LAYOUT(A),\n [1] = LAYOUT(KC_TRNS)\n};");

    let parsed = parse(&edited, Some(1)).unwrap();
    assert_eq!(parsed.layers.len(), 2);
    assert_eq!(parsed.layers[1][0].source_text(), TRANSPARENT_KEYCODE);
}

#[test]
fn test_add_layer_uses_given_keyword() {
    let edited = add_layer("KEYMAP(A)", "LAYOUT_ortho_1x1");
    assert!(edited.ends_with("[1] = LAYOUT_ortho_1x1(KC_TRNS)"));
}

#[test]
fn test_add_layer_on_invalid_source_is_noop() {
    let src = "KEYMAP(A, (B))";
    assert_eq!(add_layer(src, "KEYMAP"), src);
}
