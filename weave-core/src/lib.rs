//! Node data model and dynaml grammar for the weave template-merging engine.
//!
//! This crate is the foundation the `weave` crate builds on: it owns the
//! document tree ([`node::Node`]), source positions ([`span`]), and the
//! dynaml expression language's lexer, token stream and AST
//! ([`lexer`], [`token`], [`ast`], [`parser`]). It does not know how to
//! *evaluate* an expression — that lookup/merge/fixpoint behavior lives in
//! the `weave` crate, which depends on this one.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod node;
pub mod parser;
pub mod span;
pub mod token;

pub use ast::{CompareOp, Expression, Lambda, LambdaParam, MappingKind, MergeOptions, PathSegment};
pub use error::ParseError;
pub use node::{Annotations, Node, Value};
pub use span::{Pos, Span};
