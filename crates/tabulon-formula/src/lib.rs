//! Formula language: lexer, parser, evaluator and renderer.
//!
//! A formula is text starting with `=`. [`parse`] produces a
//! [`ParsedFormula`] holding the expression tree and the ordered list of
//! cell/range references it mentions; the caller resolves those references
//! against a document and hands the resulting values to [`evaluate`].
//! [`render`] turns a tree back into canonical formula text.

pub mod ast;
pub mod eval;
pub mod func;
pub mod lexer;
pub mod parser;
pub mod render;

pub use ast::{BinaryOp, Expr, RefText, SourceRef, UnaryOp};
pub use eval::evaluate;
pub use func::{function, FunctionDef};
pub use parser::{parse, ParsedFormula};
pub use render::render;
