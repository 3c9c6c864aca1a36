//! Structural constructs: concatenation, list/map literals, `scope(...)`,
//! slicing, ranges, and projection (spec §4.D "Projection / slicing").

use weave_core::{Expression, Node, Value};

use crate::binding::Binding;
use crate::error::EvalIssue;

use super::{arithmetic, evaluate, resolve, Outcome};

pub(super) fn eval_concatenation(a: &Expression, b: &Expression, binding: &Binding) -> Outcome {
	let left = resolve!(a, binding);
	let right = resolve!(b, binding);
	match arithmetic::combine_values(&left, &right) {
		Ok(node) => Outcome::Resolved(node),
		Err(issue) => Outcome::Failed(issue),
	}
}

pub(super) fn eval_list(items: &[Expression], binding: &Binding) -> Outcome {
	let mut resolved = Vec::with_capacity(items.len());
	for item in items {
		resolved.push(resolve!(item, binding));
	}
	Outcome::Resolved(Node::new(Value::Sequence(resolved)))
}

pub(super) fn eval_create_map(entries: &[(String, Expression)], binding: &Binding) -> Outcome {
	let mut resolved = Vec::with_capacity(entries.len());
	for (key, value) in entries {
		resolved.push((key.clone(), resolve!(value, binding)));
	}
	Outcome::Resolved(Node::new(Value::Mapping(resolved)))
}

pub(super) fn eval_scope(assignments: &[(String, Expression)], body: &Expression, binding: &Binding) -> Outcome {
	let mut extended = binding.clone();
	let mut bound = Vec::with_capacity(assignments.len());
	for (name, expr) in assignments {
		let value = match evaluate(expr, &extended) {
			Outcome::Resolved(node) => node,
			Outcome::Deferred => return Outcome::Deferred,
			Outcome::Failed(issue) => return Outcome::Failed(issue),
		};
		bound.push((name.clone(), value));
		extended = extended.with_scope(bound.clone());
	}
	evaluate(body, &extended)
}

fn as_index(node: &Node) -> Option<i64> {
	match node.value() {
		Value::Int(n) => Some(*n),
		_ => None,
	}
}

/// Resolves a possibly-negative slice bound against a sequence length, the
/// way Python-style negative indices do: `-1` means the last element.
fn normalize_bound(raw: i64, len: usize) -> i64 {
	if raw < 0 {
		raw + len as i64
	} else {
		raw
	}
}

pub(super) fn eval_slice(base: &Expression, from: Option<&Expression>, to: Option<&Expression>, binding: &Binding) -> Outcome {
	let base_node = resolve!(base, binding);
	let items = match base_node.value() {
		Value::Sequence(items) => items,
		other => return Outcome::Failed(EvalIssue::WrongKind { expected: "list", found: other.scalar_kind() }),
	};
	let len = items.len();

	let from_idx = match from {
		Some(expr) => {
			let node = resolve!(expr, binding);
			match as_index(&node) {
				Some(n) => normalize_bound(n, len),
				None => return Outcome::Failed(EvalIssue::WrongKind { expected: "integer", found: node.value().scalar_kind() }),
			}
		}
		None => 0,
	};
	let to_idx = match to {
		Some(expr) => {
			let node = resolve!(expr, binding);
			match as_index(&node) {
				Some(n) => normalize_bound(n, len),
				None => return Outcome::Failed(EvalIssue::WrongKind { expected: "integer", found: node.value().scalar_kind() }),
			}
		}
		None => len as i64,
	};

	if from_idx < 0 || to_idx < from_idx || to_idx > len as i64 {
		return Outcome::Failed(EvalIssue::IndexOutOfBounds { index: if to_idx > len as i64 { to_idx } else { from_idx }, len });
	}

	Outcome::Resolved(Node::new(Value::Sequence(items[from_idx as usize..to_idx as usize].to_vec())))
}

pub(super) fn eval_range(from: &Expression, to: &Expression, binding: &Binding) -> Outcome {
	let from_node = resolve!(from, binding);
	let to_node = resolve!(to, binding);
	let (start, end) = match (as_index(&from_node), as_index(&to_node)) {
		(Some(s), Some(e)) => (s, e),
		_ => {
			return Outcome::Failed(EvalIssue::TypeMismatch {
				op: "build a range from",
				lhs: from_node.value().scalar_kind(),
				rhs: to_node.value().scalar_kind(),
			})
		}
	};
	let items = if start <= end {
		(start..=end).map(Node::from).collect()
	} else {
		(end..=start).rev().map(Node::from).collect()
	};
	Outcome::Resolved(Node::new(Value::Sequence(items)))
}

/// `a.[*]` alone projects to the same list; the interesting behavior — a
/// following `.field`/`.(index)` distributing over every element rather than
/// applying once — is implemented in [`eval_qualified`]/[`eval_dynamic`],
/// which special-case a `Projection` base.
pub(super) fn eval_projection(base: &Expression, binding: &Binding) -> Outcome {
	let node = resolve!(base, binding);
	match node.value() {
		Value::Sequence(_) => Outcome::Resolved(node),
		other => Outcome::Failed(EvalIssue::WrongKind { expected: "list", found: other.scalar_kind() }),
	}
}

/// The bare `*` placeholder is only meaningful inside a projection body that
/// binds it; at top level (our grammar never actually produces this node
/// today, see spec Open Question on exotic nodes) there is nothing to bind it
/// to.
pub(super) fn eval_projection_value(binding: &Binding) -> Outcome {
	match binding.find_reference(&["*".to_string()]) {
		crate::binding::Lookup::Found(node) => Outcome::Resolved(node),
		crate::binding::Lookup::Deferred => Outcome::Deferred,
		crate::binding::Lookup::NotFound => Outcome::Failed(EvalIssue::Custom("'*' has no projection binding here".to_string())),
	}
}

pub(super) fn eval_qualified(base: &Expression, field: &str, binding: &Binding) -> Outcome {
	if let Expression::Projection(inner) = base {
		return distribute(inner, binding, |item| qualify_one(item, field));
	}
	let node = resolve!(base, binding);
	qualify_one(&node, field)
}

fn qualify_one(node: &Node, field: &str) -> Outcome {
	match node.get(field) {
		Some(found) => Outcome::Resolved(found.referenced()),
		None => Outcome::Failed(EvalIssue::NotFound { path: field.to_string() }),
	}
}

pub(super) fn eval_dynamic(base: &Expression, index: &Expression, binding: &Binding) -> Outcome {
	if let Expression::Projection(inner) = base {
		return distribute(inner, binding, |item| index_one(item, index, binding));
	}
	let node = resolve!(base, binding);
	index_one(&node, index, binding)
}

fn index_one(node: &Node, index: &Expression, binding: &Binding) -> Outcome {
	let index_node = resolve!(index, binding);
	match (node.value(), index_node.value()) {
		(Value::Sequence(items), Value::Int(i)) => {
			let len = items.len();
			let idx = normalize_bound(*i, len);
			if idx < 0 || idx >= len as i64 {
				Outcome::Failed(EvalIssue::IndexOutOfBounds { index: *i, len })
			} else {
				Outcome::Resolved(items[idx as usize].referenced())
			}
		}
		(Value::Mapping(_), Value::String(key)) => qualify_one(node, key),
		(other, _) => Outcome::Failed(EvalIssue::WrongKind { expected: "list or map", found: other.scalar_kind() }),
	}
}

/// Evaluates `inner` to a list and applies `per_item` to each resolved
/// element, collecting the results back into a list. Used by `list.[*].field`
/// and `list.[*].(expr)` (spec §4.D Projection).
fn distribute(inner: &Expression, binding: &Binding, per_item: impl Fn(&Node) -> Outcome) -> Outcome {
	let list = resolve!(inner, binding);
	let items = match list.value() {
		Value::Sequence(items) => items,
		other => return Outcome::Failed(EvalIssue::WrongKind { expected: "list", found: other.scalar_kind() }),
	};
	let mut results = Vec::with_capacity(items.len());
	for item in items {
		match per_item(item) {
			Outcome::Resolved(node) => results.push(node),
			Outcome::Deferred => return Outcome::Deferred,
			Outcome::Failed(issue) => return Outcome::Failed(issue),
		}
	}
	Outcome::Resolved(Node::new(Value::Sequence(results)))
}

#[cfg(test)]
mod tests {
	use std::rc::Rc;

	use super::*;

	fn binding() -> Binding {
		Binding::new(Rc::new(Node::new(Value::Null)), Rc::from(Vec::new()))
	}

	#[test]
	fn list_literal_resolves_every_item() {
		let b = binding();
		match eval_list(&[Expression::Integer(1), Expression::Integer(2)], &b) {
			Outcome::Resolved(node) => assert_eq!(node.value(), &Value::Sequence(vec![Node::from(1i64), Node::from(2i64)])),
			_ => panic!("expected Resolved"),
		}
	}

	#[test]
	fn slice_supports_negative_bounds() {
		let b = binding();
		let list = Expression::List(vec![Expression::Integer(1), Expression::Integer(2), Expression::Integer(3)]);
		match eval_slice(&list, None, Some(&Expression::Integer(-1)), &b) {
			Outcome::Resolved(node) => {
				assert_eq!(node.value(), &Value::Sequence(vec![Node::from(1i64), Node::from(2i64)]));
			}
			_ => panic!("expected Resolved"),
		}
	}

	#[test]
	fn slice_out_of_bounds_fails() {
		let b = binding();
		let list = Expression::List(vec![Expression::Integer(1)]);
		match eval_slice(&list, None, Some(&Expression::Integer(5)), &b) {
			Outcome::Failed(EvalIssue::IndexOutOfBounds { .. }) => {}
			_ => panic!("expected IndexOutOfBounds"),
		}
	}

	#[test]
	fn range_produces_inclusive_sequence() {
		let b = binding();
		match eval_range(&Expression::Integer(1), &Expression::Integer(3), &b) {
			Outcome::Resolved(node) => {
				assert_eq!(node.value(), &Value::Sequence(vec![Node::from(1i64), Node::from(2i64), Node::from(3i64)]));
			}
			_ => panic!("expected Resolved"),
		}
	}

	#[test]
	fn projection_distributes_field_access() {
		let b = binding();
		let record = |n: i64| Expression::CreateMap(vec![("v".to_string(), Expression::Integer(n))]);
		let list = Expression::List(vec![record(1), record(2)]);
		let projection = Expression::Projection(Box::new(list));
		match eval_qualified(&projection, "v", &b) {
			Outcome::Resolved(node) => assert_eq!(node.value(), &Value::Sequence(vec![Node::from(1i64), Node::from(2i64)])),
			_ => panic!("expected Resolved"),
		}
	}
}
