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

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::core::evaluator::*;
use crate::core::parser::{parse, MAX_NESTING_DEPTH};
use crate::core::AstNode;

/// Parses a single-key keymap and returns that key
fn key(src: &str) -> AstNode {
    parse(src, None).unwrap().layers[0][0].clone()
}

/// Executor that echoes calls back as text
fn echo() -> TableExecutor<String> {
    TableExecutor::new(|w: &str| w.to_string())
        .with_function("TEST", |args: Vec<String>| format!("TEST({})", args.join(",")))
        .with_function("TEST2", |args: Vec<String>| format!("TEST2({})", args.join(",")))
}

#[test]
fn test_nested_calls_evaluate_inside_out() {
    let node = key("KEYMAP(TEST(a, TEST2(c, d)))");
    assert_eq!(evaluate(&node, &echo()), Some("TEST(a,TEST2(c,d))".to_string()));
}

#[test]
fn test_word_evaluates_directly() {
    assert_eq!(evaluate(&key("KEYMAP(KC_A)"), &echo()), Some("KC_A".to_string()));
}

#[test]
fn test_words_visited_left_to_right() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    let exec = TableExecutor::new(move |w: &str| {
        log.lock().unwrap().push(w.to_string());
    })
    .with_function("F", |_: Vec<()>| ());

    evaluate(&key("KEYMAP(F(a, F(b, c), d))"), &exec).unwrap();
    assert_eq!(*seen.lock().unwrap(), vec!["a", "b", "c", "d"]);
}

#[test]
fn test_unknown_function_yields_none() {
    assert_eq!(evaluate(&key("KEYMAP(NOPE(a))"), &echo()), None);
    // Unknown anywhere in the tree poisons the result
    assert_eq!(evaluate(&key("KEYMAP(TEST(NOPE(a)))"), &echo()), None);
}

#[test]
fn test_strict_reports_unknown_function() {
    let err = evaluate_strict(&key("KEYMAP(TEST(NOPE(a)))"), &echo()).unwrap_err();
    assert_eq!(
        err,
        EvalError::UnknownFunction {
            name: "NOPE".to_string(),
            offset: 12,
        }
    );
}

#[test]
fn test_fallback_handles_unknown_names() {
    let exec = echo().with_fallback(|name, args| Some(format!("?{}[{}]", name, args.len())));
    assert_eq!(
        evaluate(&key("KEYMAP(TEST(X(a, b)))"), &exec),
        Some("TEST(?X[2])".to_string())
    );
}

#[test]
fn test_fallback_may_decline() {
    let exec = echo().with_fallback(|name, _| (name == "OK").then(|| "ok".to_string()));
    assert_eq!(evaluate(&key("KEYMAP(OK(a))"), &exec), Some("ok".to_string()));
    assert_eq!(evaluate(&key("KEYMAP(NO(a))"), &exec), None);
}

#[test]
fn test_depth_limit() {
    let mut node = AstNode::Word {
        content: "x".to_string(),
        offset: 0,
        end: 1,
    };
    for _ in 0..=MAX_NESTING_DEPTH {
        node = AstNode::Func {
            name: "TEST".to_string(),
            full_text: String::new(),
            args: vec![node],
            offset: 0,
            end: 0,
        };
    }

    assert!(matches!(
        evaluate_strict(&node, &echo()),
        Err(EvalError::NestingTooDeep { .. })
    ));
}

/// Executor implemented directly on the trait
struct Lengths {
    functions: HashMap<String, Function<usize>>,
}

impl Executor for Lengths {
    type Output = usize;

    fn word(&self, content: &str) -> usize {
        content.len()
    }

    fn function(&self, name: &str) -> Option<&Function<usize>> {
        self.functions.get(name)
    }
}

#[test]
fn test_custom_executor() {
    let mut functions: HashMap<String, Function<usize>> = HashMap::new();
    functions.insert("SUM".to_string(), Box::new(|args: Vec<usize>| args.iter().sum::<usize>()));
    let exec = Lengths { functions };

    assert_eq!(evaluate(&key("KEYMAP(SUM(ab, SUM(c, def)))"), &exec), Some(6));
    assert_eq!(evaluate(&key("KEYMAP(MAX(a))"), &exec), None);
}
