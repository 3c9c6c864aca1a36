//! Tokens produced by the dynaml [`crate::lexer`].

use crate::span::Span;
use std::fmt;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TokenKind {
	Integer(i64),
	Float(String),
	String(String),
	Name(String),
	Symbol(&'static str),
	Eof,
}

impl fmt::Display for TokenKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TokenKind::Integer(n) => write!(f, "{n}"),
			TokenKind::Float(s) => write!(f, "{s}"),
			TokenKind::String(s) => write!(f, "{s:?}"),
			TokenKind::Name(s) => write!(f, "{s}"),
			TokenKind::Symbol(s) => write!(f, "{s}"),
			TokenKind::Eof => write!(f, "<eof>"),
		}
	}
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Token {
	pub kind: TokenKind,
	pub span: Span,
}

impl Token {
	pub fn is_eof(&self) -> bool {
		matches!(self.kind, TokenKind::Eof)
	}

	pub fn is_symbol(&self, text: &str) -> bool {
		matches!(&self.kind, TokenKind::Symbol(s) if *s == text)
	}

	pub fn is_name(&self, text: &str) -> bool {
		matches!(&self.kind, TokenKind::Name(s) if s == text)
	}
}
