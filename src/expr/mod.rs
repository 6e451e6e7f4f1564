//! The template expression language.
//!
//! Code spans found inside templates are parsed once at compile time into
//! [`Expr`] trees and evaluated at render time against a
//! [`serde_json::Value`] scope.

pub mod ast;
pub mod eval;
pub mod parser;

pub use ast::{BinaryOperator, Expr, UnaryOperator};
pub use eval::{evaluate, is_truthy, value_to_string, LoopFrame, Scope};
pub use parser::parse_expression;
