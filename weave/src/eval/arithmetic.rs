//! Arithmetic and the concatenation-flavored overloads it shares with the
//! `+` operator (spec §4.D "Arithmetic").

use weave_core::{Expression, Node, Value};

use crate::binding::Binding;
use crate::error::EvalIssue;

use super::{resolve, Outcome};

enum Number {
	Int(i64),
	Float(f64),
}

fn as_number(node: &Node) -> Option<Number> {
	match node.value() {
		Value::Int(n) => Some(Number::Int(*n)),
		Value::Float(n) => Some(Number::Float(*n)),
		_ => None,
	}
}

pub(super) fn eval_addition(a: &Expression, b: &Expression, binding: &Binding) -> Outcome {
	let left = resolve!(a, binding);
	let right = resolve!(b, binding);
	match (left.value(), right.value()) {
		(Value::String(..), Value::String(..))
		| (Value::Sequence(..), Value::Sequence(..))
		| (Value::Mapping(..), Value::Mapping(..)) => match combine_values(&left, &right) {
			Ok(node) => Outcome::Resolved(node),
			Err(issue) => Outcome::Failed(issue),
		},
		_ => numeric(&left, &right, "add", |a, b| a + b, |a, b| a + b),
	}
}

pub(super) fn eval_subtraction(a: &Expression, b: &Expression, binding: &Binding) -> Outcome {
	let left = resolve!(a, binding);
	let right = resolve!(b, binding);
	numeric(&left, &right, "subtract", |a, b| a - b, |a, b| a - b)
}

pub(super) fn eval_multiplication(a: &Expression, b: &Expression, binding: &Binding) -> Outcome {
	let left = resolve!(a, binding);
	let right = resolve!(b, binding);
	numeric(&left, &right, "multiply", |a, b| a * b, |a, b| a * b)
}

pub(super) fn eval_division(a: &Expression, b: &Expression, binding: &Binding) -> Outcome {
	let left = resolve!(a, binding);
	let right = resolve!(b, binding);
	if is_zero(&right) {
		return Outcome::Failed(EvalIssue::DivisionByZero);
	}
	numeric(&left, &right, "divide", |a, b| a / b, |a, b| a / b)
}

pub(super) fn eval_modulo(a: &Expression, b: &Expression, binding: &Binding) -> Outcome {
	let left = resolve!(a, binding);
	let right = resolve!(b, binding);
	if is_zero(&right) {
		return Outcome::Failed(EvalIssue::DivisionByZero);
	}
	numeric(&left, &right, "take the modulo of", |a, b| a % b, |a, b| a % b)
}

fn is_zero(node: &Node) -> bool {
	matches!(node.value(), Value::Int(0)) || matches!(node.value(), Value::Float(f) if *f == 0.0)
}

fn numeric(
	left: &Node,
	right: &Node,
	op: &'static str,
	int_op: impl Fn(i64, i64) -> i64,
	float_op: impl Fn(f64, f64) -> f64,
) -> Outcome {
	match (as_number(left), as_number(right)) {
		(Some(Number::Int(x)), Some(Number::Int(y))) => Outcome::Resolved(Node::new(Value::Int(int_op(x, y)))),
		(Some(x), Some(y)) => {
			let xf = match x {
				Number::Int(n) => n as f64,
				Number::Float(n) => n,
			};
			let yf = match y {
				Number::Int(n) => n as f64,
				Number::Float(n) => n,
			};
			Outcome::Resolved(Node::new(Value::Float(float_op(xf, yf))))
		}
		_ => Outcome::Failed(EvalIssue::TypeMismatch {
			op,
			lhs: left.value().scalar_kind(),
			rhs: right.value().scalar_kind(),
		}),
	}
}

/// `a b` (space-separated juxtaposition) and `(( a + b ))` on lists/maps share
/// the same value-level combination rules; `structural::eval_concatenation`
/// reuses this to avoid duplicating the string/list/mapping cases.
pub(crate) fn combine_values(left: &Node, right: &Node) -> Result<Node, EvalIssue> {
	match (left.value(), right.value()) {
		(Value::String(x), Value::String(y)) => Ok(Node::new(Value::String(format!("{x}{y}")))),
		(Value::Sequence(x), Value::Sequence(y)) => {
			let mut items = x.clone();
			items.extend(y.iter().cloned());
			Ok(Node::new(Value::Sequence(items)))
		}
		(Value::Mapping(x), Value::Mapping(y)) => {
			let mut entries = x.clone();
			for (k, v) in y {
				if let Some(slot) = entries.iter_mut().find(|(ek, _)| ek == k) {
					slot.1 = v.clone();
				} else {
					entries.push((k.clone(), v.clone()));
				}
			}
			Ok(Node::new(Value::Mapping(entries)))
		}
		_ => Ok(Node::new(Value::String(format!("{left}{right}")))),
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
	fn integer_addition_stays_integer() {
		let b = binding();
		match eval_addition(&Expression::Integer(1), &Expression::Integer(2), &b) {
			Outcome::Resolved(node) => assert_eq!(node.value(), &Value::Int(3)),
			_ => panic!("expected Resolved"),
		}
	}

	#[test]
	fn mixed_addition_promotes_to_float() {
		let b = binding();
		match eval_addition(&Expression::Integer(1), &Expression::Float(0.5), &b) {
			Outcome::Resolved(node) => assert_eq!(node.value(), &Value::Float(1.5)),
			_ => panic!("expected Resolved"),
		}
	}

	#[test]
	fn string_addition_concatenates() {
		let b = binding();
		match eval_addition(&Expression::StringLit("a".into()), &Expression::StringLit("b".into()), &b) {
			Outcome::Resolved(node) => assert_eq!(node.value(), &Value::String("ab".to_string())),
			_ => panic!("expected Resolved"),
		}
	}

	#[test]
	fn division_by_zero_fails() {
		let b = binding();
		match eval_division(&Expression::Integer(1), &Expression::Integer(0), &b) {
			Outcome::Failed(EvalIssue::DivisionByZero) => {}
			_ => panic!("expected DivisionByZero"),
		}
	}
}
