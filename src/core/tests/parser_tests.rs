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

//! Parser module tests
//!
//! Tests for parsing keymap sources:
//! - Word offsets and trimming
//! - Nested function calls
//! - Comments and line continuations
//! - Multiple layers and count validation
//! - Error kinds and positions

use crate::core::{parser::*, types::AstNode};
use proptest::prelude::*;

fn word(content: &str, offset: usize, end: usize) -> AstNode {
    AstNode::Word {
        content: content.to_string(),
        offset,
        end,
    }
}

fn contents(layer: &[AstNode]) -> Vec<String> {
    layer.iter().map(|n| n.source_text().to_string()).collect()
}

#[test]
fn test_single_word_offsets() {
    let result = parse("123456 KEYMAP(  TEST   )", None).unwrap();

    assert_eq!(result.invocation_keyword, "KEYMAP");
    assert_eq!(result.layers.len(), 1);
    assert_eq!(result.layers[0], vec![word("TEST", 16, 23)]);
    assert_eq!(result.end_offset, 24);
}

#[test]
fn test_unbalanced_parentheses() {
    assert_eq!(
        parse("123456 KEYMAP(", None).unwrap_err(),
        ParseError::UnbalancedParentheses { open: 1 }
    );
    assert!(matches!(
        parse("KEYMAP(A, LT(1, B)", None),
        Err(ParseError::UnbalancedParentheses { .. })
    ));
}

#[test]
fn test_missing_token_positions() {
    assert_eq!(
        parse("123456 KEYMAP(,A)", None).unwrap_err(),
        ParseError::MissingToken { offset: 15 }
    );
    assert_eq!(
        parse("123456 KEYMAP(A,)", None).unwrap_err(),
        ParseError::MissingToken { offset: 17 }
    );
}

#[test]
fn test_whitespace_in_token() {
    assert_eq!(
        parse("123456 KEYMAP(A A)", None).unwrap_err(),
        ParseError::WhitespaceInToken { offset: 14 }
    );
    assert!(matches!(
        parse("KEYMAP(L T(1, A))", None),
        Err(ParseError::WhitespaceInToken { offset: 7 })
    ));
}

#[test]
fn test_missing_function_name() {
    assert_eq!(
        parse("KEYMAP(A, (B))", None).unwrap_err(),
        ParseError::MissingFunctionName { offset: 11 }
    );
}

#[test]
fn test_missing_invocation() {
    assert_eq!(
        parse("int main(void) { return 0; }", None).unwrap_err(),
        ParseError::MissingInvocation
    );
    // Prefixed names are not invocations
    assert_eq!(
        parse("MY_KEYMAP(A)", None).unwrap_err(),
        ParseError::MissingInvocation
    );
}

#[test]
fn test_block_comment_excluded() {
    let result = parse("KEYMAP(TOKEN /* x */, TOKEN2)", None).unwrap();
    assert_eq!(contents(&result.layers[0]), vec!["TOKEN", "TOKEN2"]);
    assert_eq!(result.layers[0][1].offset(), 22);
}

#[test]
fn test_line_comment_excluded() {
    let src = "KEYMAP(A, // first row\n B, // trailing ) , junk\n C)";
    let result = parse(src, None).unwrap();
    assert_eq!(contents(&result.layers[0]), vec!["A", "B", "C"]);
    assert_eq!(result.layers[0][2].offset(), src.find("C)").unwrap());
}

#[test]
fn test_comment_separates_token() {
    assert!(matches!(
        parse("KEYMAP(A/* x */B)", None),
        Err(ParseError::WhitespaceInToken { offset: 7 })
    ));
}

#[test]
fn test_line_continuation_skipped() {
    let src = "#define KEYMAP_ROW KEYMAP( \\\n  KC_A, \\\n  KC_B \\\n)";
    let result = parse(src, None);
    // The pending `KC_B` is restarted by the continuation after it
    assert!(matches!(result, Err(ParseError::MissingToken { .. })));

    let src = "KEYMAP( \\\n  KC_A, \\\n  KC_B)";
    let result = parse(src, None).unwrap();
    assert_eq!(contents(&result.layers[0]), vec!["KC_A", "KC_B"]);
    assert_eq!(result.layers[0][1].offset(), src.find("KC_B").unwrap());
}

#[test]
fn test_nested_function() {
    let src = "LAYOUT(KC_A, LT(1, LSFT(KC_B)) , KC_C)";
    let result = parse(src, Some(3)).unwrap();
    let layer = &result.layers[0];

    match &layer[1] {
        AstNode::Func {
            name,
            args,
            offset,
            end,
            full_text,
        } => {
            assert_eq!(name, "LT");
            assert_eq!(*offset, 13);
            assert_eq!(full_text, "LT(1, LSFT(KC_B))");
            assert_eq!(*end, 13 + full_text.len());
            assert_eq!(args.len(), 2);
            assert!(matches!(&args[1], AstNode::Func { name, .. } if name == "LSFT"));
        }
        other => panic!("Expected function node, got {:?}", other),
    }
}

#[test]
fn test_function_name_trailing_space() {
    let result = parse("KEYMAP(LT (1, A))", None).unwrap();
    assert!(matches!(&result.layers[0][0], AstNode::Func { name, .. } if name == "LT"));
}

#[test]
fn test_text_after_call_rejected() {
    assert_eq!(
        parse("KEYMAP(LT(1, A)B)", None).unwrap_err(),
        ParseError::UnexpectedText { offset: 15 }
    );
}

#[test]
fn test_multiple_layers() {
    let src = r#"
#include QMK_KEYBOARD_H

const uint16_t PROGMEM keymaps[][MATRIX_ROWS][MATRIX_COLS] = {
    [0] = LAYOUT_ortho_2x2(
        KC_A, KC_B,
        KC_C, MO(1)
    ),
    [1] = LAYOUT_ortho_2x2(
        _______, _______,
        KC_1,    KC_2
    )
};
"#;
    let result = parse(src, Some(4)).unwrap();

    assert_eq!(result.invocation_keyword, "LAYOUT_ortho_2x2");
    assert_eq!(result.layers.len(), 2);
    assert_eq!(contents(&result.layers[1]), vec!["_______", "_______", "KC_1", "KC_2"]);
    assert_eq!(&src[result.end_offset..], "\n};\n");
}

#[test]
fn test_layer_count_mismatch() {
    let src = "[0] = KEYMAP(A, B), [1] = KEYMAP(C)";
    assert_eq!(
        parse(src, None).unwrap_err(),
        ParseError::LayerCountMismatch {
            layer: 1,
            expected: 2,
            actual: 1
        }
    );
}

#[test]
fn test_key_count_mismatch() {
    assert_eq!(
        parse("KEYMAP(A, B, C)", Some(4)).unwrap_err(),
        ParseError::KeyCountMismatch {
            expected: 4,
            actual: 3
        }
    );
}

#[test]
fn test_non_ascii_offsets_are_bytes() {
    let src = "/* ключ */ KEYMAP(KC_A, KC_B)";
    let result = parse(src, None).unwrap();
    let node = &result.layers[0][1];
    assert_eq!(&src[node.replace_range()], "KC_B");
}

#[test]
fn test_nesting_limit() {
    let mut src = String::from("KEYMAP(");
    for _ in 0..MAX_NESTING_DEPTH {
        src.push_str("F(");
    }
    src.push('A');
    src.push_str(&")".repeat(MAX_NESTING_DEPTH + 1));

    assert!(matches!(
        parse(&src, None),
        Err(ParseError::NestingTooDeep { .. })
    ));
}

#[test]
fn test_settings_block_read() {
    let src = "/*---\nkeycaps:\n  - match: KC_A\n    text: Alpha\n---*/\nKEYMAP(KC_A)";
    let result = parse(src, None).unwrap();
    assert_eq!(result.settings.keycap_rules().len(), 1);
}

#[test]
fn test_broken_settings_block_ignored() {
    let src = "/*---\nkeycaps: [unterminated\n---*/\nKEYMAP(KC_A)";
    let result = parse(src, None).unwrap();
    assert!(result.settings.is_empty());
}

#[test]
fn test_settings_after_invocation_ignored() {
    let src = "KEYMAP(KC_A)\n/*---\nfoo: bar\n---*/";
    let result = parse(src, None).unwrap();
    assert!(result.settings.is_empty());
}

#[test]
fn test_error_offset_accessor() {
    assert_eq!(ParseError::MissingToken { offset: 3 }.offset(), Some(3));
    assert_eq!(ParseError::MissingInvocation.offset(), None);
}

proptest! {
    #[test]
    fn prop_layers_have_equal_length(
        keys in 1usize..12,
        layers in 1usize..5,
        name in "[A-Z][A-Z0-9_]{0,6}",
    ) {
        let body = vec![format!("KC_{}", name); keys].join(", ");
        let src = (0..layers)
            .map(|i| format!("[{}] = LAYOUT({})", i, body))
            .collect::<Vec<_>>()
            .join(",\n");

        let result = parse(&src, Some(keys)).unwrap();
        prop_assert_eq!(result.layers.len(), layers);
        for layer in &result.layers {
            prop_assert_eq!(layer.len(), keys);
            for node in layer {
                prop_assert_eq!(&src[node.replace_range()], node.source_text());
            }
        }
    }
}
