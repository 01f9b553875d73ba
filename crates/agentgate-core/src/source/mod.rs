//! Structural source model for brace-delimited candidates.
//!
//! [`parse_source`] lexes a file, checks delimiter balance, and extracts the
//! subset of structure the analyzers need: namespace, imports, type and
//! member declarations, statement kinds, string literals and doc flags.

pub mod error;
pub mod lexer;
pub mod model;
pub mod parser;

pub use error::ParseError;
pub use model::{
    Import, MethodDecl, Param, SourceModel, Span, StatementKind, StringLiteral, TypeDecl, TypeKind,
};
pub use parser::parse_source;
