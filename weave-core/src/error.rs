//! Parse-time errors for the dynaml grammar.

use crate::span::Span;
use thiserror::Error;

/// A failure while lexing or parsing a dynaml expression.
///
/// `Display` renders the two forms the spec requires at the CLI boundary:
/// a single-line form when the offending span sits on one line, and a
/// two-line form when it spans multiple lines. Both forms quote the
/// offending slice of source text.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("{}", render(.span, .near))]
pub struct ParseError {
	pub span: Span,
	/// The exact slice of source the error points at, already quoted.
	pub near: String,
}

impl ParseError {
	pub fn new(span: Span, near: impl Into<String>) -> Self {
		ParseError { span, near: near.into() }
	}

	pub fn unexpected(span: Span, source: &str) -> Self {
		let slice = slice_at(source, &span);
		ParseError::new(span, slice)
	}
}

fn render(span: &Span, near: &str) -> String {
	format!("parse error {}: {:?}", span, near)
}

/// Extracts the source text an error span covers, clamped to the source
/// bounds (a span produced past EOF still renders something sensible).
fn slice_at(source: &str, span: &Span) -> String {
	let start = span.start.offset.min(source.len());
	let end = span.end.offset.clamp(start, source.len());
	source[start..end].to_string()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::span::Pos;

	#[test]
	fn single_line_message() {
		let span = Span::new(Pos::new(0, 2, 2), Pos::new(0, 5, 5));
		let err = ParseError::new(span, "\"bad\"");
		assert_eq!(err.to_string(), "parse error near symbol 3 - symbol 6: \"\\\"bad\\\"\"");
	}

	#[test]
	fn multi_line_message() {
		let span = Span::new(Pos::new(0, 2, 2), Pos::new(1, 1, 7));
		let err = ParseError::new(span, "x\ny");
		assert!(err.to_string().starts_with("parse error near line 1 symbol 3 - line 2 symbol 2:"));
	}
}
