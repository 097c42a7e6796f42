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

//! src/core/evaluator.rs
//!
//! Syntax tree evaluation against a pluggable executor
//!
//! Evaluation is eager, depth-first and left to right. Words go to
//! `Executor::word`; calls evaluate their arguments first and are then
//! dispatched by name. A name with no function and no fallback result
//! yields `None`, which callers treat as "nothing to render".

use std::collections::HashMap;
use thiserror::Error;

use crate::core::parser::MAX_NESTING_DEPTH;
use crate::core::types::AstNode;

/// A named function in an executor's dispatch table
pub type Function<T> = Box<dyn Fn(Vec<T>) -> T + Send + Sync>;

/// Handler for names missing from the dispatch table
pub type Fallback<T> = Box<dyn Fn(&str, Vec<T>) -> Option<T> + Send + Sync>;

/// Assigns meaning to syntax tree nodes
pub trait Executor {
    type Output;

    /// Meaning of a bare word
    fn word(&self, content: &str) -> Self::Output;

    /// Looks up a function by name
    fn function(&self, name: &str) -> Option<&Function<Self::Output>>;

    /// Called for names `function` does not know
    fn fallback(&self, _name: &str, _args: Vec<Self::Output>) -> Option<Self::Output> {
        None
    }
}

/// Errors reported by `evaluate_strict`
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum EvalError {
    #[error("Unknown function '{name}' at offset {offset}")]
    UnknownFunction { name: String, offset: usize },

    #[error("Expression nested deeper than {max} levels at offset {offset}")]
    NestingTooDeep { offset: usize, max: usize },
}

/// Evaluate a node
///
/// Returns `None` when any call in the tree has no meaning for `executor`.
pub fn evaluate<E: Executor>(node: &AstNode, executor: &E) -> Option<E::Output> {
    evaluate_strict(node, executor).ok()
}

/// Evaluate a node, reporting why a result is missing
///
/// Identical to `evaluate` except that an unknown function name becomes
/// `EvalError::UnknownFunction` instead of a silent `None`.
pub fn evaluate_strict<E: Executor>(node: &AstNode, executor: &E) -> Result<E::Output, EvalError> {
    eval_at(node, executor, 0)
}

fn eval_at<E: Executor>(node: &AstNode, executor: &E, depth: usize) -> Result<E::Output, EvalError> {
    match node {
        AstNode::Word { content, .. } => Ok(executor.word(content)),
        AstNode::Func {
            name, args, offset, ..
        } => {
            if depth >= MAX_NESTING_DEPTH {
                return Err(EvalError::NestingTooDeep {
                    offset: *offset,
                    max: MAX_NESTING_DEPTH,
                });
            }

            let values = args
                .iter()
                .map(|arg| eval_at(arg, executor, depth + 1))
                .collect::<Result<Vec<_>, _>>()?;

            if let Some(function) = executor.function(name) {
                return Ok(function(values));
            }

            executor
                .fallback(name, values)
                .ok_or_else(|| EvalError::UnknownFunction {
                    name: name.clone(),
                    offset: *offset,
                })
        }
    }
}

/// Executor built from closures
///
/// # Example
/// ```
/// use keymap_weaver::core::evaluator::{evaluate, TableExecutor};
/// use keymap_weaver::core::parser::parse;
///
/// let exec = TableExecutor::new(|w: &str| w.to_string())
///     .with_function("TWICE", |args: Vec<String>| args.concat().repeat(2));
/// let parsed = parse("KEYMAP(TWICE(ab))", None)?;
/// assert_eq!(evaluate(&parsed.layers[0][0], &exec), Some("abab".to_string()));
/// # Ok::<(), keymap_weaver::core::parser::ParseError>(())
/// ```
pub struct TableExecutor<T> {
    word: Box<dyn Fn(&str) -> T + Send + Sync>,
    functions: HashMap<String, Function<T>>,
    fallback: Option<Fallback<T>>,
}

impl<T> TableExecutor<T> {
    pub fn new(word: impl Fn(&str) -> T + Send + Sync + 'static) -> Self {
        Self {
            word: Box::new(word),
            functions: HashMap::new(),
            fallback: None,
        }
    }

    pub fn with_function(
        mut self,
        name: &str,
        function: impl Fn(Vec<T>) -> T + Send + Sync + 'static,
    ) -> Self {
        self.functions.insert(name.to_string(), Box::new(function));
        self
    }

    pub fn with_fallback(
        mut self,
        fallback: impl Fn(&str, Vec<T>) -> Option<T> + Send + Sync + 'static,
    ) -> Self {
        self.fallback = Some(Box::new(fallback));
        self
    }
}

impl<T> Executor for TableExecutor<T> {
    type Output = T;

    fn word(&self, content: &str) -> T {
        (self.word)(content)
    }

    fn function(&self, name: &str) -> Option<&Function<T>> {
        self.functions.get(name)
    }

    fn fallback(&self, name: &str, args: Vec<T>) -> Option<T> {
        self.fallback.as_ref().and_then(|f| f(name, args))
    }
}
