//! mdc-core: the paperwork template language.
//!
//! Provides the value model, the lexer and parser for the Handlebars-style
//! template dialect used by paperwork generators, and the generator
//! definition schema with its dry-run validation.
//!
//! # Public API
//!
//! - [`parse()`] -- template source to [`Template`], or a [`ParseError`]
//! - [`Value`] -- dynamic value shared with the evaluator
//! - [`GeneratorDefinition`] -- content-store schema, see
//!   [`GeneratorDefinition::validate`]

pub mod ast;
pub mod error;
pub mod generator;
pub mod lexer;
pub mod parser;
pub mod value;

// ── Convenience re-exports ───────────────────────────────────────────

pub use ast::{
    Arg, BlockKind, BlockNode, InlineCall, InlineHelper, LoopBinding, Node, PathExpr, PathRoot,
    Template,
};
pub use error::ParseError;
pub use generator::{FieldKind, FieldSpec, GeneratorDefinition, GeneratorError};
pub use parser::parse;
pub use value::Value;
