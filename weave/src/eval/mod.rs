//! The expression evaluator (spec §4.D): `evaluate(expr, binding)` maps one
//! AST node to a resolved value, a deferral, or a failure. Submodules split
//! the match arms by construct family, mirroring the teacher's per-construct
//! evaluation files (`eval_bind.rs`, `eval_ternary.rs`, ...).

mod arithmetic;
mod builtins;
mod call;
mod catch;
mod literal;
mod logical;
mod meta;
mod reference;
mod structural;
mod sync;

use weave_core::{Expression, Lambda, Node, Value};

use crate::binding::Binding;
use crate::error::EvalIssue;

/// The three shapes an evaluation can end in (spec §4.D).
pub enum Outcome {
	/// `ok = true`, `node = concrete`.
	Resolved(Node),
	/// `ok = true`, `node = self-expression`: progress may be made later.
	Deferred,
	/// `ok = false`: a permanent error.
	Failed(EvalIssue),
}

impl Outcome {
	pub fn is_failed(&self) -> bool {
		matches!(self, Outcome::Failed(_))
	}
}

/// Evaluates one dynaml expression against a binding context.
pub fn evaluate(expr: &Expression, binding: &Binding) -> Outcome {
	match expr {
		Expression::Integer(_)
		| Expression::Float(_)
		| Expression::StringLit(_)
		| Expression::Boolean(_)
		| Expression::Nil
		| Expression::Undefined
		| Expression::Ip(_)
		| Expression::Default => literal::eval_literal(expr),

		Expression::Reference(path) => reference::eval_reference(path, binding),

		Expression::Addition(a, b) => arithmetic::eval_addition(a, b, binding),
		Expression::Subtraction(a, b) => arithmetic::eval_subtraction(a, b, binding),
		Expression::Multiplication(a, b) => arithmetic::eval_multiplication(a, b, binding),
		Expression::Division(a, b) => arithmetic::eval_division(a, b, binding),
		Expression::Modulo(a, b) => arithmetic::eval_modulo(a, b, binding),

		Expression::LogOr(a, b) => logical::eval_log_or(a, b, binding),
		Expression::LogAnd(a, b) => logical::eval_log_and(a, b, binding),
		Expression::Not(a) => logical::eval_not(a, binding),
		Expression::Or(a, b) => logical::eval_or(a, b, binding),
		Expression::ValidOr(a, b) => logical::eval_valid_or(a, b, binding),
		Expression::Comparison(op, a, b) => logical::eval_comparison(*op, a, b, binding),
		Expression::Conditional { condition, when_true, when_false } => {
			logical::eval_conditional(condition, when_true, when_false, binding)
		}

		Expression::Concatenation(a, b) => structural::eval_concatenation(a, b, binding),
		Expression::List(items) => structural::eval_list(items, binding),
		Expression::CreateMap(entries) => structural::eval_create_map(entries, binding),
		Expression::Scope { assignments, body } => structural::eval_scope(assignments, body, binding),
		Expression::Grouped(inner) => evaluate(inner, binding),
		Expression::Slice { base, from, to } => structural::eval_slice(base, from.as_deref(), to.as_deref(), binding),
		Expression::Range(from, to) => structural::eval_range(from, to, binding),
		Expression::Projection(base) => structural::eval_projection(base, binding),
		Expression::ProjectionValue => structural::eval_projection_value(binding),
		Expression::DynamicExpr(base, index) => structural::eval_dynamic(base, index, binding),
		Expression::QualifiedExpr(base, field) => structural::eval_qualified(base, field, binding),

		Expression::Call { function, args } => call::eval_call(function, args, binding),
		Expression::LambdaExpr(lambda) => Outcome::Resolved(Node::new(Value::Lambda(lambda.clone()))),
		Expression::LambdaRef(name) => call::eval_lambda_ref(name, binding),
		Expression::Sum { list, init, lambda } => call::eval_sum(list, init, lambda, binding),
		Expression::Mapping { kind, source, lambda } => call::eval_mapping(*kind, source, lambda, binding),

		Expression::Catch(body, lambda) => catch::eval_catch(body, lambda, binding),
		Expression::Sync { expr, cond, value, timeout } => sync::eval_sync(expr, cond, value, timeout.as_deref(), binding),

		Expression::Merge(opts) => meta::eval_merge(opts, binding),
		Expression::Prefer(inner) => meta::eval_prefer(inner, binding),
		Expression::Auto => meta::eval_auto(binding),
		Expression::Marker(name) => meta::eval_marker(name),
		Expression::MarkerExpression(name, value) => meta::eval_marker_expression(name, value, binding),
		Expression::Substitution(inner) => evaluate(inner, binding),
		Expression::Assignment(path, value) => meta::eval_assignment(path, value, binding),
	}
}

/// Evaluates `expr` and requires the result to be fully resolved, collapsing
/// `Deferred`/`Failed` into an early return. Used pervasively by constructs
/// that need a concrete operand before they can do anything (arithmetic,
/// calls, structural access).
macro_rules! resolve {
	($expr:expr, $binding:expr) => {
		match $crate::eval::evaluate($expr, $binding) {
			Outcome::Resolved(node) => node,
			Outcome::Deferred => return Outcome::Deferred,
			Outcome::Failed(issue) => return Outcome::Failed(issue),
		}
	};
}
pub(crate) use resolve;

/// Converts a resolved `Node` back into an `Expression` literal. Used by
/// partial application (spec §4.D "produce a partially applied lambda"),
/// which needs to close already-bound arguments over a lambda body that is
/// plain syntax, not a value.
pub(crate) fn reify(node: &Node) -> Expression {
	match node.value() {
		Value::Null => Expression::Nil,
		Value::Bool(b) => Expression::Boolean(*b),
		Value::Int(n) => Expression::Integer(*n),
		Value::Float(n) => Expression::Float(*n),
		Value::String(s) => Expression::StringLit(s.clone()),
		Value::Sequence(items) => Expression::List(items.iter().map(reify).collect()),
		Value::Mapping(entries) => Expression::CreateMap(entries.iter().map(|(k, v)| (k.clone(), reify(v))).collect()),
		Value::Lambda(lambda) => Expression::LambdaExpr(lambda.clone()),
		Value::Expression(expr) => (**expr).clone(),
	}
}

/// Binds a lambda call: the fixed parameters consume one argument each, the
/// final variadic parameter (if any) collects the rest into a list. Returns
/// either a fully bound scope ready to evaluate the body, or, when fewer
/// arguments were given than fixed parameters require, the still-missing
/// parameter list plus the bindings already made (for partial application).
pub(crate) enum CallBinding {
	Ready(Vec<(String, Node)>),
	Partial { bound: Vec<(String, Expression)>, remaining: Vec<weave_core::LambdaParam> },
}

pub(crate) fn bind_call_args(lambda: &Lambda, args: &[Expression], binding: &Binding) -> Result<CallBinding, Outcome> {
	let variadic = lambda.params.last().map(|p| p.variadic).unwrap_or(false);
	let fixed = if variadic { lambda.params.len() - 1 } else { lambda.params.len() };

	if args.len() < fixed {
		let mut bound = Vec::with_capacity(args.len());
		for (param, arg) in lambda.params.iter().zip(args.iter()) {
			let node = match evaluate(arg, binding) {
				Outcome::Resolved(node) => node,
				Outcome::Deferred => return Err(Outcome::Deferred),
				Outcome::Failed(issue) => return Err(Outcome::Failed(issue)),
			};
			bound.push((param.name.clone(), reify(&node)));
		}
		let remaining = lambda.params[args.len()..].to_vec();
		return Ok(CallBinding::Partial { bound, remaining });
	}

	let mut bindings = Vec::with_capacity(lambda.params.len());
	for (param, arg) in lambda.params[..fixed].iter().zip(args.iter()) {
		let node = match evaluate(arg, binding) {
			Outcome::Resolved(node) => node,
			Outcome::Deferred => return Err(Outcome::Deferred),
			Outcome::Failed(issue) => return Err(Outcome::Failed(issue)),
		};
		bindings.push((param.name.clone(), node));
	}
	if variadic {
		let mut rest = Vec::with_capacity(args.len().saturating_sub(fixed));
		for arg in &args[fixed..] {
			let node = match evaluate(arg, binding) {
				Outcome::Resolved(node) => node,
				Outcome::Deferred => return Err(Outcome::Deferred),
				Outcome::Failed(issue) => return Err(Outcome::Failed(issue)),
			};
			rest.push(node);
		}
		let name = lambda.params.last().unwrap().name.clone();
		bindings.push((name, Node::new(Value::Sequence(rest))));
	}
	Ok(CallBinding::Ready(bindings))
}

/// Evaluates a lambda body with an extra scope frame bound on top, as every
/// call site (full call, sum, map/select) needs.
pub(crate) fn call_with(lambda: &Lambda, bindings: Vec<(String, Node)>, binding: &Binding) -> Outcome {
	let extended = binding.with_scope(bindings);
	evaluate(&lambda.body, &extended)
}

