//! Boolean short-circuit operators, value-fallback `||`/`|||`, comparison and
//! the ternary conditional (spec §4.D "Boolean short-circuit").

use weave_core::{CompareOp, Expression, Node, Value};

use crate::binding::Binding;
use crate::error::EvalIssue;

use super::{evaluate, resolve, Outcome};

fn as_bool(node: &Node, op: &'static str) -> Result<bool, EvalIssue> {
	match node.value() {
		Value::Bool(b) => Ok(*b),
		other => Err(EvalIssue::WrongKind { expected: "boolean", found: other.scalar_kind() }.with_op(op)),
	}
}

// `EvalIssue::WrongKind` carries no operator context; `with_op` is a small
// local extension so the failure message stays specific without widening the
// shared enum for one caller.
trait WithOp {
	fn with_op(self, op: &'static str) -> Self;
}
impl WithOp for EvalIssue {
	fn with_op(self, op: &'static str) -> Self {
		match self {
			EvalIssue::WrongKind { expected, found } => EvalIssue::Custom(format!("{op}: expected a {expected}, found a {found}")),
			other => other,
		}
	}
}

/// `a -and b`: short-circuits on a `false` left without evaluating `b`.
pub(super) fn eval_log_and(a: &Expression, b: &Expression, binding: &Binding) -> Outcome {
	let left = resolve!(a, binding);
	match as_bool(&left, "and") {
		Ok(false) => Outcome::Resolved(Node::new(Value::Bool(false))),
		Ok(true) => {
			let right = resolve!(b, binding);
			match as_bool(&right, "and") {
				Ok(value) => Outcome::Resolved(Node::new(Value::Bool(value))),
				Err(issue) => Outcome::Failed(issue),
			}
		}
		Err(issue) => Outcome::Failed(issue),
	}
}

/// `a -or b`: short-circuits on a `true` left without evaluating `b`.
pub(super) fn eval_log_or(a: &Expression, b: &Expression, binding: &Binding) -> Outcome {
	let left = resolve!(a, binding);
	match as_bool(&left, "or") {
		Ok(true) => Outcome::Resolved(Node::new(Value::Bool(true))),
		Ok(false) => {
			let right = resolve!(b, binding);
			match as_bool(&right, "or") {
				Ok(value) => Outcome::Resolved(Node::new(Value::Bool(value))),
				Err(issue) => Outcome::Failed(issue),
			}
		}
		Err(issue) => Outcome::Failed(issue),
	}
}

pub(super) fn eval_not(a: &Expression, binding: &Binding) -> Outcome {
	let operand = resolve!(a, binding);
	match as_bool(&operand, "negate") {
		Ok(value) => Outcome::Resolved(Node::new(Value::Bool(!value))),
		Err(issue) => Outcome::Failed(issue),
	}
}

fn is_nil_like(node: &Node) -> bool {
	matches!(node.value(), Value::Null)
}

/// `a || b`: value fallback, not boolean-or. Returns `a` unless it evaluates
/// to nil/undefined, in which case `b` is evaluated instead.
pub(super) fn eval_or(a: &Expression, b: &Expression, binding: &Binding) -> Outcome {
	match evaluate(a, binding) {
		Outcome::Resolved(node) if !is_nil_like(&node) => Outcome::Resolved(node),
		Outcome::Resolved(_) => evaluate(b, binding),
		Outcome::Deferred => Outcome::Deferred,
		Outcome::Failed(issue) => Outcome::Failed(issue),
	}
}

/// `a ||| b`: like `||`, but also falls back when evaluating `a` fails
/// outright, not just when it's nil. Deferrals still propagate, since a
/// deferral isn't a permanent failure (spec §7 propagation rules).
pub(super) fn eval_valid_or(a: &Expression, b: &Expression, binding: &Binding) -> Outcome {
	match evaluate(a, binding) {
		Outcome::Resolved(node) if !is_nil_like(&node) => Outcome::Resolved(node),
		Outcome::Resolved(_) | Outcome::Failed(_) => evaluate(b, binding),
		Outcome::Deferred => Outcome::Deferred,
	}
}

pub(super) fn eval_comparison(op: CompareOp, a: &Expression, b: &Expression, binding: &Binding) -> Outcome {
	let left = resolve!(a, binding);
	let right = resolve!(b, binding);
	let ordering = compare(&left, &right);
	let result = match op {
		CompareOp::Eq => left.value() == right.value(),
		CompareOp::Ne => left.value() != right.value(),
		CompareOp::Lt => ordering == Some(std::cmp::Ordering::Less),
		CompareOp::Le => matches!(ordering, Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal)),
		CompareOp::Gt => ordering == Some(std::cmp::Ordering::Greater),
		CompareOp::Ge => matches!(ordering, Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal)),
	};
	Outcome::Resolved(Node::new(Value::Bool(result)))
}

/// Orders two values when that's meaningful (numbers, strings); anything else
/// is incomparable by `<`/`<=`/`>`/`>=` and only `==`/`!=` still work on it.
fn compare(left: &Node, right: &Node) -> Option<std::cmp::Ordering> {
	match (left.value(), right.value()) {
		(Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
		(Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
		(Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
		(Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
		(Value::String(a), Value::String(b)) => a.partial_cmp(b),
		_ => None,
	}
}

pub(super) fn eval_conditional(condition: &Expression, when_true: &Expression, when_false: &Expression, binding: &Binding) -> Outcome {
	let cond = resolve!(condition, binding);
	match as_bool(&cond, "evaluate condition of") {
		Ok(true) => evaluate(when_true, binding),
		Ok(false) => evaluate(when_false, binding),
		Err(issue) => Outcome::Failed(issue),
	}
}

#[cfg(test)]
mod tests {
	use std::rc::Rc;

	use super::*;

	fn binding() -> Binding {
		Binding::new(Rc::new(Node::new(Value::Null)), Rc::from(Vec::new()))
	}

	#[test]
	fn log_and_short_circuits_on_false() {
		let b = binding();
		// `foo` would fail to resolve (no such name) if actually evaluated.
		let bogus = Expression::Reference(vec!["nope".to_string()]);
		match eval_log_and(&Expression::Boolean(false), &bogus, &b) {
			Outcome::Resolved(node) => assert_eq!(node.value(), &Value::Bool(false)),
			_ => panic!("expected short-circuited false"),
		}
	}

	#[test]
	fn or_falls_back_on_nil() {
		let b = binding();
		match eval_or(&Expression::Nil, &Expression::Integer(9), &b) {
			Outcome::Resolved(node) => assert_eq!(node.value(), &Value::Int(9)),
			_ => panic!("expected fallback value"),
		}
	}

	#[test]
	fn valid_or_falls_back_on_failure_not_deferral() {
		let b = binding();
		let failing = Expression::Division(Box::new(Expression::Integer(1)), Box::new(Expression::Integer(0)));
		match eval_valid_or(&failing, &Expression::Integer(5), &b) {
			Outcome::Resolved(node) => assert_eq!(node.value(), &Value::Int(5)),
			_ => panic!("expected fallback after failure"),
		}
	}

	#[test]
	fn comparison_orders_integers() {
		let b = binding();
		match eval_comparison(CompareOp::Lt, &Expression::Integer(1), &Expression::Integer(2), &b) {
			Outcome::Resolved(node) => assert_eq!(node.value(), &Value::Bool(true)),
			_ => panic!("expected true"),
		}
	}

	#[test]
	fn conditional_picks_branch() {
		let b = binding();
		match eval_conditional(&Expression::Boolean(true), &Expression::Integer(1), &Expression::Integer(2), &b) {
			Outcome::Resolved(node) => assert_eq!(node.value(), &Value::Int(1)),
			_ => panic!("expected then-branch"),
		}
	}
}
