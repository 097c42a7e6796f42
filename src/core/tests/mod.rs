//! Core module tests
//!
//! Contains test suites for core functionality:
//! - Parser tests (offsets, comments, error positions)
//! - Settings block tests
//! - Patcher tests (set_key, add_layer)
//! - Evaluator and keycode semantics tests
//! - Type tests (AstNode helpers)

#[cfg(test)]
mod evaluator_tests;
#[cfg(test)]
mod parser_tests;
#[cfg(test)]
mod patcher_tests;
