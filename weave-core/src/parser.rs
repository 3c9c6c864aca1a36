//! The dynaml parser: precedence-climbing recursive descent driving an
//! explicit operand stack (spec §4.B).
//!
//! Each terminal production pushes a value onto [`Builder`]'s stack; each
//! non-terminal pops its operands — the right operand first, as the spec
//! requires — and pushes the combined `Expression`. Argument lists, parameter
//! lists and map literals begin with a sentinel ([`StackItem::ListMark`]) and
//! accumulate items until [`Builder::drain_list`] unwinds back to it.
//!
//! Precedence, loosest to tightest: conditional, logical-or, logical-and,
//! validation-or, equality, comparison, concatenation (juxtaposition),
//! additive, multiplicative, unary-not, chained suffix, atom.

use crate::ast::{CompareOp, Expression, Lambda, LambdaParam, MappingKind, MergeOptions};
use crate::error::ParseError;
use crate::lexer::tokenize;
use crate::span::Span;
use crate::token::{Token, TokenKind};
use std::rc::Rc;

enum StackItem {
	Expr(Expression),
	ListMark,
}

/// The operand stack the grammar's non-terminals push to and pop from.
struct Builder {
	stack: Vec<StackItem>,
}

impl Builder {
	fn new() -> Self {
		Builder { stack: Vec::new() }
	}

	fn push_expr(&mut self, expr: Expression) {
		self.stack.push(StackItem::Expr(expr));
	}

	fn push_mark(&mut self) {
		self.stack.push(StackItem::ListMark);
	}

	/// Pops the top operand. Panics on an empty/mismatched stack — per spec
	/// §4.B, an inconsistent builder stack is an internal error, not a user
	/// -facing one: it means a grammar production forgot to push or pop.
	fn pop_expr(&mut self) -> Expression {
		match self.stack.pop() {
			Some(StackItem::Expr(expr)) => expr,
			Some(StackItem::ListMark) => panic!("dynaml AST builder stack corrupted: found a list sentinel where an operand was expected"),
			None => panic!("dynaml AST builder stack corrupted: expected an operand, stack was empty"),
		}
	}

	/// Combines a binary non-terminal: pops the right operand first, then
	/// the left, and pushes `build(left, right)`.
	fn combine_binary(&mut self, build: impl FnOnce(Expression, Expression) -> Expression) {
		let right = self.pop_expr();
		let left = self.pop_expr();
		self.push_expr(build(left, right));
	}

	fn combine_unary(&mut self, build: impl FnOnce(Expression) -> Expression) {
		let operand = self.pop_expr();
		self.push_expr(build(operand));
	}

	/// Unwinds the stack back to (and discarding) the nearest sentinel,
	/// returning accumulated items in source order.
	fn drain_list(&mut self) -> Vec<Expression> {
		let mut items = Vec::new();
		while let Some(top) = self.stack.pop() {
			match top {
				StackItem::ListMark => break,
				StackItem::Expr(expr) => items.push(expr),
			}
		}
		items.reverse();
		items
	}

	fn finish(mut self) -> Expression {
		self.pop_expr()
	}
}

struct Parser<'a> {
	tokens: Vec<Token>,
	pos: usize,
	builder: Builder,
	source: &'a str,
}

impl<'a> Parser<'a> {
	fn peek(&self) -> &Token {
		&self.tokens[self.pos]
	}

	fn advance(&mut self) -> Token {
		let tok = self.tokens[self.pos].clone();
		if self.pos + 1 < self.tokens.len() {
			self.pos += 1;
		}
		tok
	}

	fn err_here(&self, near: impl Into<String>) -> ParseError {
		ParseError::new(self.peek().span.clone(), near)
	}

	fn expect_symbol(&mut self, text: &'static str) -> Result<(), ParseError> {
		if self.peek().is_symbol(text) {
			self.advance();
			Ok(())
		} else {
			Err(self.err_here(format!("expected `{text}`, found `{}`", self.peek().kind)))
		}
	}

	fn eat_symbol(&mut self, text: &str) -> bool {
		if self.peek().is_symbol(text) {
			self.advance();
			true
		} else {
			false
		}
	}

	fn eat_name(&mut self, text: &str) -> bool {
		if self.peek().is_name(text) {
			self.advance();
			true
		} else {
			false
		}
	}

	fn expect_name(&mut self) -> Result<String, ParseError> {
		match self.peek().kind.clone() {
			TokenKind::Name(name) => {
				self.advance();
				Ok(name)
			}
			other => Err(self.err_here(format!("expected a name, found `{other}`"))),
		}
	}
}

/// Parses `source` (from the given template/stub path, used only for
/// diagnostics) into a single root [`Expression`].
pub fn parse(source: &str, path: &str, stub_path: Option<&str>) -> Result<Expression, ParseError> {
	let _ = (path, stub_path); // carried for future diagnostic enrichment, not needed by the grammar itself
	let tokens = tokenize(source)?;
	let mut parser = Parser {
		tokens,
		pos: 0,
		builder: Builder::new(),
		source,
	};
	parse_conditional(&mut parser)?;
	if !parser.peek().is_eof() {
		return Err(parser.err_here(format!("unexpected trailing `{}`", parser.peek().kind)));
	}
	Ok(parser.builder.finish())
}

fn parse_conditional(p: &mut Parser) -> Result<(), ParseError> {
	parse_logical_or(p)?;
	if p.eat_symbol("?") {
		parse_conditional(p)?;
		p.expect_symbol(":")?;
		parse_conditional(p)?;
		let when_false = p.builder.pop_expr();
		let when_true = p.builder.pop_expr();
		let condition = p.builder.pop_expr();
		p.builder.push_expr(Expression::Conditional {
			condition: Box::new(condition),
			when_true: Box::new(when_true),
			when_false: Box::new(when_false),
		});
	}
	Ok(())
}

fn parse_logical_or(p: &mut Parser) -> Result<(), ParseError> {
	parse_logical_and(p)?;
	loop {
		if p.eat_name("or") {
			parse_logical_and(p)?;
			p.builder.combine_binary(|l, r| Expression::LogOr(Box::new(l), Box::new(r)));
		} else if p.eat_symbol("||") {
			parse_logical_and(p)?;
			p.builder.combine_binary(|l, r| Expression::Or(Box::new(l), Box::new(r)));
		} else {
			break;
		}
	}
	Ok(())
}

fn parse_logical_and(p: &mut Parser) -> Result<(), ParseError> {
	parse_valid_or(p)?;
	while p.eat_name("and") {
		parse_valid_or(p)?;
		p.builder.combine_binary(|l, r| Expression::LogAnd(Box::new(l), Box::new(r)));
	}
	Ok(())
}

fn parse_valid_or(p: &mut Parser) -> Result<(), ParseError> {
	parse_equality(p)?;
	while p.eat_name("orelse") {
		parse_equality(p)?;
		p.builder.combine_binary(|l, r| Expression::ValidOr(Box::new(l), Box::new(r)));
	}
	Ok(())
}

fn parse_equality(p: &mut Parser) -> Result<(), ParseError> {
	parse_comparison(p)?;
	loop {
		let op = if p.eat_symbol("==") {
			CompareOp::Eq
		} else if p.eat_symbol("!=") {
			CompareOp::Ne
		} else {
			break;
		};
		parse_comparison(p)?;
		p.builder.combine_binary(move |l, r| Expression::Comparison(op, Box::new(l), Box::new(r)));
	}
	Ok(())
}

fn parse_comparison(p: &mut Parser) -> Result<(), ParseError> {
	parse_concat(p)?;
	loop {
		let op = if p.eat_symbol("<=") {
			CompareOp::Le
		} else if p.eat_symbol(">=") {
			CompareOp::Ge
		} else if p.eat_symbol("<") {
			CompareOp::Lt
		} else if p.eat_symbol(">") {
			CompareOp::Gt
		} else {
			break;
		};
		parse_concat(p)?;
		p.builder.combine_binary(move |l, r| Expression::Comparison(op, Box::new(l), Box::new(r)));
	}
	Ok(())
}

/// String/list concatenation by juxtaposition: two additive-level operands
/// with nothing between them combine via [`Expression::Concatenation`].
fn parse_concat(p: &mut Parser) -> Result<(), ParseError> {
	parse_additive(p)?;
	while starts_atom(p) {
		parse_additive(p)?;
		p.builder.combine_binary(|l, r| Expression::Concatenation(Box::new(l), Box::new(r)));
	}
	Ok(())
}

fn parse_additive(p: &mut Parser) -> Result<(), ParseError> {
	parse_multiplicative(p)?;
	loop {
		if p.eat_symbol("+") {
			parse_multiplicative(p)?;
			p.builder.combine_binary(|l, r| Expression::Addition(Box::new(l), Box::new(r)));
		} else if p.eat_symbol("-") {
			parse_multiplicative(p)?;
			p.builder.combine_binary(|l, r| Expression::Subtraction(Box::new(l), Box::new(r)));
		} else {
			break;
		}
	}
	Ok(())
}

fn parse_multiplicative(p: &mut Parser) -> Result<(), ParseError> {
	parse_unary(p)?;
	loop {
		if p.eat_symbol("*") {
			parse_unary(p)?;
			p.builder.combine_binary(|l, r| Expression::Multiplication(Box::new(l), Box::new(r)));
		} else if p.eat_symbol("/") {
			parse_unary(p)?;
			p.builder.combine_binary(|l, r| Expression::Division(Box::new(l), Box::new(r)));
		} else if p.eat_symbol("%") {
			parse_unary(p)?;
			p.builder.combine_binary(|l, r| Expression::Modulo(Box::new(l), Box::new(r)));
		} else {
			break;
		}
	}
	Ok(())
}

fn parse_unary(p: &mut Parser) -> Result<(), ParseError> {
	if p.eat_symbol("!") {
		parse_unary(p)?;
		p.builder.combine_unary(|e| Expression::Not(Box::new(e)));
		Ok(())
	} else {
		parse_suffix(p)
	}
}

/// Chained suffixes: `.field`, `.(expr)`, `.[*]`, `[from..to]`, `(args)`.
fn parse_suffix(p: &mut Parser) -> Result<(), ParseError> {
	parse_atom(p)?;
	loop {
		if p.eat_symbol(".") {
			if p.eat_symbol("[") {
				p.expect_symbol("*")?;
				p.expect_symbol("]")?;
				p.builder.combine_unary(|e| Expression::Projection(Box::new(e)));
			} else if p.eat_symbol("(") {
				parse_conditional(p)?;
				p.expect_symbol(")")?;
				p.builder.combine_binary(|l, r| Expression::DynamicExpr(Box::new(l), Box::new(r)));
			} else {
				let field = p.expect_name()?;
				p.builder.combine_unary(|e| Expression::QualifiedExpr(Box::new(e), field));
			}
		} else if p.eat_symbol("[") {
			parse_slice_or_index(p)?;
		} else if p.eat_symbol("(") {
			p.builder.push_mark();
			if !p.peek().is_symbol(")") {
				loop {
					parse_conditional(p)?;
					if !p.eat_symbol(",") {
						break;
					}
				}
			}
			p.expect_symbol(")")?;
			let args = p.builder.drain_list();
			let function = p.builder.pop_expr();
			p.builder.push_expr(Expression::Call { function: Box::new(function), args });
		} else {
			break;
		}
	}
	Ok(())
}

fn parse_slice_or_index(p: &mut Parser) -> Result<(), ParseError> {
	if p.eat_symbol("..") {
		let to = if p.peek().is_symbol("]") { None } else {
			parse_conditional(p)?;
			Some(Box::new(p.builder.pop_expr()))
		};
		p.expect_symbol("]")?;
		let base = p.builder.pop_expr();
		p.builder.push_expr(Expression::Slice { base: Box::new(base), from: None, to });
		return Ok(());
	}

	parse_conditional(p)?;
	if p.eat_symbol("..") {
		let to = if p.peek().is_symbol("]") { None } else {
			parse_conditional(p)?;
			Some(Box::new(p.builder.pop_expr()))
		};
		p.expect_symbol("]")?;
		let from = p.builder.pop_expr();
		let base = p.builder.pop_expr();
		p.builder.push_expr(Expression::Slice { base: Box::new(base), from: Some(Box::new(from)), to });
	} else {
		p.expect_symbol("]")?;
		let index = p.builder.pop_expr();
		let base = p.builder.pop_expr();
		p.builder.push_expr(Expression::DynamicExpr(Box::new(base), Box::new(index)));
	}
	Ok(())
}

fn starts_atom(p: &Parser) -> bool {
	match &p.peek().kind {
		TokenKind::Integer(_) | TokenKind::Float(_) | TokenKind::String(_) => true,
		TokenKind::Name(name) => !is_binding_keyword(name),
		TokenKind::Symbol(s) => matches!(*s, "(" | "[" | "{" | "~" | "!" | "|" | "."),
		TokenKind::Eof => false,
	}
}

/// Names that terminate a concatenation run instead of starting a new atom —
/// the word-operators, which would otherwise be mistaken for juxtaposed
/// string atoms.
fn is_binding_keyword(name: &str) -> bool {
	matches!(name, "or" | "and" | "orelse" | "on")
}

fn parse_atom(p: &mut Parser) -> Result<(), ParseError> {
	let tok = p.peek().clone();
	match tok.kind {
		TokenKind::Integer(n) => {
			p.advance();
			p.builder.push_expr(Expression::Integer(n));
		}
		TokenKind::Float(text) => {
			p.advance();
			p.builder.push_expr(parse_float_or_ip(&text));
		}
		TokenKind::String(s) => {
			p.advance();
			p.builder.push_expr(Expression::StringLit(s));
		}
		TokenKind::Symbol("~") => {
			p.advance();
			p.builder.push_expr(Expression::Default);
		}
		TokenKind::Symbol(".") => {
			p.advance();
			let mut path = vec![String::new()];
			path.extend(parse_reference_path(p)?);
			p.builder.push_expr(Expression::Reference(path));
		}
		TokenKind::Symbol("(") => {
			p.advance();
			parse_conditional(p)?;
			p.expect_symbol(")")?;
			p.builder.combine_unary(|e| Expression::Grouped(Box::new(e)));
		}
		TokenKind::Symbol("[") => {
			p.advance();
			parse_list_literal(p)?;
		}
		TokenKind::Symbol("{") => {
			p.advance();
			parse_map_literal(p)?;
		}
		TokenKind::Symbol("|") => {
			parse_lambda(p)?;
		}
		TokenKind::Name(name) => parse_name_atom(p, &name)?,
		other => return Err(p.err_here(format!("expression expected, found `{other}`"))),
	}
	Ok(())
}

fn parse_float_or_ip(text: &str) -> Expression {
	let groups: Vec<&str> = text.split('.').collect();
	if groups.len() == 4 {
		let mut octets = [0u8; 4];
		let mut ok = true;
		for (i, g) in groups.iter().enumerate() {
			match g.parse::<u16>() {
				Ok(v) if v <= 255 => octets[i] = v as u8,
				_ => {
					ok = false;
					break;
				}
			}
		}
		if ok {
			return Expression::Ip(octets);
		}
	}
	Expression::Float(text.parse().unwrap_or(0.0))
}

fn parse_list_literal(p: &mut Parser) -> Result<(), ParseError> {
	p.builder.push_mark();
	if !p.peek().is_symbol("]") {
		loop {
			parse_conditional(p)?;
			if !p.eat_symbol(",") {
				break;
			}
		}
	}
	p.expect_symbol("]")?;
	let items = p.builder.drain_list();
	p.builder.push_expr(Expression::List(items));
	Ok(())
}

fn parse_map_literal(p: &mut Parser) -> Result<(), ParseError> {
	let mut entries = Vec::new();
	if !p.peek().is_symbol("}") {
		loop {
			let key = match p.peek().kind.clone() {
				TokenKind::Name(name) => {
					p.advance();
					name
				}
				TokenKind::String(s) => {
					p.advance();
					s
				}
				other => return Err(p.err_here(format!("expected a map key, found `{other}`"))),
			};
			p.expect_symbol("=")?;
			parse_conditional(p)?;
			entries.push((key, p.builder.pop_expr()));
			if !p.eat_symbol(",") {
				break;
			}
		}
	}
	p.expect_symbol("}")?;
	p.builder.push_expr(Expression::CreateMap(entries));
	Ok(())
}

fn parse_lambda_params(p: &mut Parser) -> Result<Vec<LambdaParam>, ParseError> {
	p.expect_symbol("|")?;
	let mut params = Vec::new();
	if !p.peek().is_symbol("|") {
		loop {
			let variadic = p.eat_symbol("...");
			let name = p.expect_name()?;
			params.push(LambdaParam { name, variadic });
			if !p.eat_symbol(",") {
				break;
			}
		}
	}
	p.expect_symbol("|")?;
	Ok(params)
}

fn parse_lambda(p: &mut Parser) -> Result<(), ParseError> {
	let params = parse_lambda_params(p)?;
	p.expect_symbol("->")?;
	parse_conditional(p)?;
	let body = p.builder.pop_expr();
	p.builder.push_expr(Expression::LambdaExpr(Lambda { params, body: Rc::new(body) }));
	Ok(())
}

fn parse_lambda_value(p: &mut Parser) -> Result<Lambda, ParseError> {
	let params = parse_lambda_params(p)?;
	p.expect_symbol("->")?;
	parse_conditional(p)?;
	let body = p.builder.pop_expr();
	Ok(Lambda { params, body: Rc::new(body) })
}

fn parse_name_atom(p: &mut Parser, name: &str) -> Result<(), ParseError> {
	match name {
		"nil" => {
			p.advance();
			p.builder.push_expr(Expression::Nil);
		}
		"true" => {
			p.advance();
			p.builder.push_expr(Expression::Boolean(true));
		}
		"false" => {
			p.advance();
			p.builder.push_expr(Expression::Boolean(false));
		}
		"undefined" => {
			p.advance();
			p.builder.push_expr(Expression::Undefined);
		}
		"auto" => {
			p.advance();
			p.builder.push_expr(Expression::Auto);
		}
		"prefer" => {
			p.advance();
			parse_conditional(p)?;
			p.builder.combine_unary(|e| Expression::Prefer(Box::new(e)));
		}
		"merge" => {
			p.advance();
			p.builder.push_expr(Expression::Merge(parse_merge_options(p)?));
		}
		"marker" => {
			p.advance();
			let marker_name = p.expect_name()?;
			if p.eat_symbol(":") {
				parse_conditional(p)?;
				let value = p.builder.pop_expr();
				p.builder.push_expr(Expression::MarkerExpression(marker_name, Box::new(value)));
			} else {
				p.builder.push_expr(Expression::Marker(marker_name));
			}
		}
		"scope" => {
			p.advance();
			p.expect_symbol("(")?;
			let assignments = parse_assignment_list(p)?;
			p.expect_symbol(")")?;
			p.expect_symbol("(")?;
			parse_conditional(p)?;
			p.expect_symbol(")")?;
			let body = p.builder.pop_expr();
			p.builder.push_expr(Expression::Scope { assignments, body: Box::new(body) });
		}
		"sum" => {
			p.advance();
			p.expect_symbol("[")?;
			parse_conditional(p)?;
			p.expect_symbol("|")?;
			parse_conditional(p)?;
			p.expect_symbol(",")?;
			let lambda = parse_lambda_value(p)?;
			p.expect_symbol("]")?;
			let init = p.builder.pop_expr();
			let list = p.builder.pop_expr();
			p.builder.push_expr(Expression::Sum { list: Box::new(list), init: Box::new(init), lambda });
		}
		"map" | "select" | "mapkeys" | "mapmerge" | "selectmerge" => {
			let kind = match name {
				"map" => MappingKind::ListToList,
				"select" => MappingKind::ListToListFilter,
				"mapkeys" => MappingKind::MapToList,
				"mapmerge" => MappingKind::MapToMap,
				_ => MappingKind::MapToMapFilter,
			};
			p.advance();
			p.expect_symbol("[")?;
			parse_conditional(p)?;
			p.expect_symbol("|")?;
			let lambda = parse_lambda_value(p)?;
			p.expect_symbol("]")?;
			let source = p.builder.pop_expr();
			p.builder.push_expr(Expression::Mapping { kind, source: Box::new(source), lambda });
		}
		"catch" => {
			p.advance();
			p.expect_symbol("[")?;
			parse_conditional(p)?;
			p.expect_symbol("|")?;
			let lambda = parse_lambda_value(p)?;
			p.expect_symbol("]")?;
			let body = p.builder.pop_expr();
			p.builder.push_expr(Expression::Catch(Box::new(body), lambda));
		}
		"sync" => {
			p.advance();
			p.expect_symbol("[")?;
			parse_conditional(p)?;
			p.expect_symbol("|")?;
			let cond = parse_lambda_value(p)?;
			p.expect_symbol(",")?;
			parse_conditional(p)?;
			let timeout = if p.eat_symbol(",") {
				parse_conditional(p)?;
				Some(Box::new(p.builder.pop_expr()))
			} else {
				None
			};
			p.expect_symbol("]")?;
			let value = p.builder.pop_expr();
			let expr = p.builder.pop_expr();
			p.builder.push_expr(Expression::Sync { expr: Box::new(expr), cond, value: Box::new(value), timeout });
		}
		_ => {
			let path = parse_reference_path(p)?;
			p.builder.push_expr(Expression::Reference(path));
		}
	}
	Ok(())
}

/// Reads `name(.name)*`, as well as the leading-dot absolute form `.name...`
/// (handled by the caller, which only reaches here once the first name is
/// already known not to be a keyword).
fn parse_reference_path(p: &mut Parser) -> Result<Vec<String>, ParseError> {
	let mut path = vec![p.expect_name()?];
	while p.peek().is_symbol(".") {
		// Only consume `.name`; `.( `, `.[` are suffix productions handled by
		// the caller (`parse_suffix`), so stop before those.
		let dot_then_name = matches!(p.tokens.get(p.pos + 1).map(|t| &t.kind), Some(TokenKind::Name(_)));
		if !dot_then_name {
			break;
		}
		p.advance();
		path.push(p.expect_name()?);
	}
	Ok(path)
}

fn parse_assignment_list(p: &mut Parser) -> Result<Vec<(String, Expression)>, ParseError> {
	let mut assignments = Vec::new();
	if !p.peek().is_symbol(")") {
		loop {
			let name = p.expect_name()?;
			p.expect_symbol("=")?;
			parse_conditional(p)?;
			assignments.push((name, p.builder.pop_expr()));
			if !p.eat_symbol(",") {
				break;
			}
		}
	}
	Ok(assignments)
}

fn parse_merge_options(p: &mut Parser) -> Result<MergeOptions, ParseError> {
	let mut opts = MergeOptions::default();
	loop {
		if p.eat_name("replace") {
			opts.replace = true;
		} else if p.eat_name("required") {
			opts.required = true;
		} else if p.eat_name("none") {
			opts.none = true;
		} else if p.eat_name("on") {
			opts.key_name = Some(p.expect_name()?);
		} else if let TokenKind::Name(_) = p.peek().kind.clone() {
			opts.path = parse_reference_path(p)?;
			opts.redirect = true;
		} else {
			break;
		}
	}
	Ok(opts)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse_ok(source: &str) -> Expression {
		parse(source, "test", None).unwrap_or_else(|e| panic!("parse error in {source:?}: {e}"))
	}

	#[test]
	fn parses_arithmetic_precedence() {
		let expr = parse_ok("1 + 2 * 3");
		assert_eq!(expr.to_string(), "1 + 2 * 3");
		match expr {
			Expression::Addition(_, rhs) => assert!(matches!(*rhs, Expression::Multiplication(..))),
			other => panic!("expected addition, got {other:?}"),
		}
	}

	#[test]
	fn parses_reference() {
		assert_eq!(parse_ok("foo.bar").to_string(), "foo.bar");
	}

	#[test]
	fn parses_absolute_reference() {
		let expr = parse_ok(".foo.bar");
		match &expr {
			Expression::Reference(path) => assert_eq!(path[0], ""),
			other => panic!("expected reference, got {other:?}"),
		}
	}

	#[test]
	fn parses_ternary_and_boolean_ops() {
		let expr = parse_ok("a == 1 and b ? 1 : 2");
		assert!(matches!(expr, Expression::Conditional { .. }));
	}

	#[test]
	fn parses_merge_with_modifiers() {
		let expr = parse_ok("merge replace required on id");
		match expr {
			Expression::Merge(opts) => {
				assert!(opts.replace && opts.required);
				assert_eq!(opts.key_name.as_deref(), Some("id"));
			}
			other => panic!("expected merge, got {other:?}"),
		}
	}

	#[test]
	fn parses_lambda_and_call() {
		let expr = parse_ok("|x,y|->x + y");
		assert!(matches!(expr, Expression::LambdaExpr(_)));
		let call = parse_ok("add(1,2)");
		assert!(matches!(call, Expression::Call { .. }));
	}

	#[test]
	fn parses_slice_and_projection() {
		assert!(matches!(parse_ok("list[1..3]"), Expression::Slice { .. }));
		assert!(matches!(parse_ok("list.[*]"), Expression::Projection(_)));
	}

	#[test]
	fn parses_string_concatenation_by_juxtaposition() {
		let expr = parse_ok("\"hi \" who");
		assert!(matches!(expr, Expression::Concatenation(..)));
	}

	#[test]
	fn rejects_trailing_garbage() {
		assert!(parse("1 )", "test", None).is_err());
	}

	#[test]
	fn word_operators_round_trip_through_display() {
		for source in ["a or b", "a and b", "a orelse b", "undefined"] {
			let rendered = parse_ok(source).to_string();
			assert_eq!(rendered, source, "re-rendered form of {source:?} was {rendered:?}");
			assert_eq!(parse_ok(&rendered).to_string(), source, "{rendered:?} did not reparse back to {source:?}");
		}
	}
}
