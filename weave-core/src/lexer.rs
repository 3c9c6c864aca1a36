//! Turns a dynaml source string into a flat stream of [`Token`]s.
//!
//! Lexing is a standalone pass from parsing (spec §4.B): the parser never
//! looks at raw characters, only at the `Vec<Token>` this module produces.

use crate::error::ParseError;
use crate::span::{Pos, Span};
use crate::token::{Token, TokenKind};

/// Symbols recognized by the scanner, longest first so matching is greedy.
const SYMBOLS: &[&str] = &[
	"...", "->", "==", "!=", "<=", ">=", "||", "&&", "..", "[", "]", "(", ")", "{", "}", ",", ".", ":", "?", "!", "<",
	">", "=", "|", "+", "-", "*", "/", "%", "~",
];

struct Scanner<'a> {
	source: &'a str,
	bytes: &'a [u8],
	offset: usize,
	line: usize,
	column: usize,
}

impl<'a> Scanner<'a> {
	fn new(source: &'a str) -> Self {
		Scanner {
			source,
			bytes: source.as_bytes(),
			offset: 0,
			line: 0,
			column: 0,
		}
	}

	fn pos(&self) -> Pos {
		Pos::new(self.line, self.column, self.offset)
	}

	fn peek(&self) -> Option<char> {
		self.source[self.offset..].chars().next()
	}

	fn peek_at(&self, ahead: usize) -> Option<char> {
		self.source[self.offset..].chars().nth(ahead)
	}

	fn bump(&mut self) -> Option<char> {
		let c = self.peek()?;
		self.offset += c.len_utf8();
		if c == '\n' {
			self.line += 1;
			self.column = 0;
		} else {
			self.column += 1;
		}
		Some(c)
	}

	fn starts_with(&self, text: &str) -> bool {
		self.source[self.offset..].starts_with(text)
	}

	fn at_eof(&self) -> bool {
		self.offset >= self.bytes.len()
	}
}

/// Lexes `source` into a token stream ending with a single [`TokenKind::Eof`].
pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
	let mut scanner = Scanner::new(source);
	let mut tokens = Vec::new();

	loop {
		skip_trivia(&mut scanner);
		let start = scanner.pos();
		if scanner.at_eof() {
			tokens.push(Token {
				kind: TokenKind::Eof,
				span: Span::new(start, start),
			});
			break;
		}

		let c = scanner.peek().unwrap();
		let token = if c == '"' || c == '\'' {
			scan_string(&mut scanner, c)?
		} else if c.is_ascii_digit() {
			scan_number(&mut scanner)
		} else if is_name_start(c) {
			scan_name(&mut scanner)
		} else if let Some(sym) = scan_symbol(&mut scanner) {
			sym
		} else {
			let mut end = scanner.pos();
			scanner.bump();
			end.offset = scanner.offset;
			return Err(ParseError::unexpected(Span::new(start, end), source));
		};
		tokens.push(token);
	}

	Ok(tokens)
}

fn skip_trivia(scanner: &mut Scanner) {
	loop {
		match scanner.peek() {
			Some(c) if c.is_whitespace() => {
				scanner.bump();
			}
			Some('#') => {
				while !matches!(scanner.peek(), None | Some('\n')) {
					scanner.bump();
				}
			}
			_ => break,
		}
	}
}

fn is_name_start(c: char) -> bool {
	c.is_alphabetic() || c == '_'
}

fn is_name_continue(c: char) -> bool {
	c.is_alphanumeric() || c == '_' || c == '-'
}

fn scan_name(scanner: &mut Scanner) -> Token {
	let start = scanner.pos();
	let mut text = String::new();
	while let Some(c) = scanner.peek() {
		if is_name_continue(c) {
			text.push(c);
			scanner.bump();
		} else {
			break;
		}
	}
	let end = scanner.pos();
	Token {
		kind: TokenKind::Name(text),
		span: Span::new(start, end),
	}
}

/// Scans a run of dot-separated digit groups. Four groups with no fractional
/// part lexes as an IP literal upstream (in the parser, which has grammar
/// context); here we just emit the raw digits/dots as a float-ish token when
/// there is more than one dot, or an integer/float otherwise.
fn scan_number(scanner: &mut Scanner) -> Token {
	let start = scanner.pos();
	let mut text = String::new();
	let mut dots = 0usize;
	while let Some(c) = scanner.peek() {
		if c.is_ascii_digit() {
			text.push(c);
			scanner.bump();
		} else if c == '.' && scanner.peek_at(1).map(|n| n.is_ascii_digit()).unwrap_or(false) {
			dots += 1;
			text.push(c);
			scanner.bump();
		} else {
			break;
		}
	}
	let end = scanner.pos();
	let span = Span::new(start, end);
	if dots == 0 {
		let value: i64 = text.parse().unwrap_or_default();
		Token { kind: TokenKind::Integer(value), span }
	} else {
		Token { kind: TokenKind::Float(text), span }
	}
}

fn scan_string(scanner: &mut Scanner, quote: char) -> Result<Token, ParseError> {
	let start = scanner.pos();
	scanner.bump();
	let mut text = String::new();
	loop {
		match scanner.peek() {
			None => {
				let end = scanner.pos();
				return Err(ParseError::unexpected(Span::new(start, end), scanner.source));
			}
			Some(c) if c == quote => {
				scanner.bump();
				break;
			}
			Some('\\') if quote == '"' => {
				scanner.bump();
				match scanner.bump() {
					Some('n') => text.push('\n'),
					Some('t') => text.push('\t'),
					Some(other) => text.push(other),
					None => {}
				}
			}
			Some(c) => {
				text.push(c);
				scanner.bump();
			}
		}
	}
	let end = scanner.pos();
	Ok(Token {
		kind: TokenKind::String(text),
		span: Span::new(start, end),
	})
}

fn scan_symbol(scanner: &mut Scanner) -> Option<Token> {
	let start = scanner.pos();
	for sym in SYMBOLS {
		if scanner.starts_with(sym) {
			for _ in 0..sym.chars().count() {
				scanner.bump();
			}
			let end = scanner.pos();
			return Some(Token {
				kind: TokenKind::Symbol(sym),
				span: Span::new(start, end),
			});
		}
	}
	None
}

#[cfg(test)]
mod tests {
	use super::*;

	fn kinds(source: &str) -> Vec<TokenKind> {
		tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
	}

	#[test]
	fn skips_whitespace_and_comments() {
		let tokens = kinds("  1 # comment\n  2");
		assert_eq!(tokens, vec![TokenKind::Integer(1), TokenKind::Integer(2), TokenKind::Eof]);
	}

	#[test]
	fn lexes_reference_path() {
		let tokens = kinds("foo.bar");
		assert_eq!(
			tokens,
			vec![
				TokenKind::Name("foo".into()),
				TokenKind::Symbol("."),
				TokenKind::Name("bar".into()),
				TokenKind::Eof
			]
		);
	}

	#[test]
	fn lexes_string_with_escapes() {
		let tokens = kinds("\"a\\nb\"");
		assert_eq!(tokens, vec![TokenKind::String("a\nb".into()), TokenKind::Eof]);
	}

	#[test]
	fn greedily_matches_multi_char_symbols() {
		let tokens = kinds("a == b");
		assert_eq!(
			tokens,
			vec![
				TokenKind::Name("a".into()),
				TokenKind::Symbol("=="),
				TokenKind::Name("b".into()),
				TokenKind::Eof
			]
		);
	}

	#[test]
	fn lexes_float_and_dotted_quad() {
		assert_eq!(kinds("1.5"), vec![TokenKind::Float("1.5".into()), TokenKind::Eof]);
		assert_eq!(kinds("10.0.0.1"), vec![TokenKind::Float("10.0.0.1".into()), TokenKind::Eof]);
	}
}
