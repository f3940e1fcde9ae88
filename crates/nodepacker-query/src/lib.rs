//! Nodepacker Query - boolean filter expressions over resource records
//!
//! This crate provides:
//! - A lexer and hand-written recursive-descent parser for filters such as
//!   `cpu >= 4 & (mem < 16 | name ~= '^n2-')`
//! - The expression tree and its evaluator
//! - `Predicate`, the compiled filter used by the display commands

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod predicate;

// Re-export commonly used types
pub use ast::{Comparison, Expression, Leaf, Term};
pub use error::{FilterError, Result};
pub use predicate::{compile, Predicate};
