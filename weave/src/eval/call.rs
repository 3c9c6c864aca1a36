//! Calls, named lambda references, `sum[...]` and the `map`/`select` family
//! (spec §4.D "Lambda and call").

use weave_core::{Expression, Lambda, MappingKind, Node, Value};

use crate::binding::{Binding, Lookup};
use crate::error::EvalIssue;

use super::{bind_call_args, builtins, call_with, evaluate, resolve, CallBinding, Outcome};

pub(super) fn eval_call(function: &Expression, args: &[Expression], binding: &Binding) -> Outcome {
	if let Expression::Reference(path) = function {
		if path.len() == 1 && builtins::is_builtin(&path[0]) && !is_shadowed(&path[0], binding) {
			return eval_builtin_call(&path[0], args, binding);
		}
	}

	let function_node = resolve!(function, binding);
	let lambda = match function_node.value() {
		Value::Lambda(lambda) => lambda.clone(),
		other => return Outcome::Failed(EvalIssue::WrongKind { expected: "lambda", found: other.scalar_kind() }),
	};
	call_lambda(&lambda, args, binding)
}

/// A builtin name is shadowed if the document or scope actually defines a
/// binding under that name — user definitions win over the builtin library.
fn is_shadowed(name: &str, binding: &Binding) -> bool {
	matches!(binding.find_reference(&[name.to_string()]), Lookup::Found(_))
}

fn eval_builtin_call(name: &str, args: &[Expression], binding: &Binding) -> Outcome {
	let mut resolved = Vec::with_capacity(args.len());
	for arg in args {
		resolved.push(resolve!(arg, binding));
	}
	match builtins::call(name, &resolved) {
		Ok(node) => Outcome::Resolved(node),
		Err(issue) => Outcome::Failed(issue),
	}
}

pub(super) fn call_lambda(lambda: &Lambda, args: &[Expression], binding: &Binding) -> Outcome {
	match bind_call_args(lambda, args, binding) {
		Ok(CallBinding::Ready(bindings)) => call_with(lambda, bindings, binding),
		Ok(CallBinding::Partial { bound, remaining }) => {
			let substituted = substitute(&lambda.body, &bound);
			let partial = Lambda { params: remaining, body: std::rc::Rc::new(substituted) };
			Outcome::Resolved(Node::new(Value::Lambda(partial)))
		}
		Err(outcome) => outcome,
	}
}

/// Replaces each bound parameter name with its literal value throughout
/// `body`, producing the residual expression a partial application closes
/// over (spec §4.D "produce a partially applied lambda"). Recurses into
/// every sub-expression; a nested lambda that redeclares one of the bound
/// names shadows it, so substitution stops at that nested parameter.
fn substitute(body: &Expression, bound: &[(String, Expression)]) -> Expression {
	if bound.is_empty() {
		return body.clone();
	}
	let sub = |e: &Expression| Box::new(substitute(e, bound));
	match body {
		Expression::Reference(path) if path.len() == 1 => {
			bound.iter().find(|(name, _)| name == &path[0]).map(|(_, value)| value.clone()).unwrap_or_else(|| body.clone())
		}
		Expression::Addition(a, b) => Expression::Addition(sub(a), sub(b)),
		Expression::Subtraction(a, b) => Expression::Subtraction(sub(a), sub(b)),
		Expression::Multiplication(a, b) => Expression::Multiplication(sub(a), sub(b)),
		Expression::Division(a, b) => Expression::Division(sub(a), sub(b)),
		Expression::Modulo(a, b) => Expression::Modulo(sub(a), sub(b)),
		Expression::LogOr(a, b) => Expression::LogOr(sub(a), sub(b)),
		Expression::LogAnd(a, b) => Expression::LogAnd(sub(a), sub(b)),
		Expression::Not(a) => Expression::Not(sub(a)),
		Expression::Or(a, b) => Expression::Or(sub(a), sub(b)),
		Expression::ValidOr(a, b) => Expression::ValidOr(sub(a), sub(b)),
		Expression::Comparison(op, a, b) => Expression::Comparison(*op, sub(a), sub(b)),
		Expression::Conditional { condition, when_true, when_false } => Expression::Conditional {
			condition: sub(condition),
			when_true: sub(when_true),
			when_false: sub(when_false),
		},
		Expression::Concatenation(a, b) => Expression::Concatenation(sub(a), sub(b)),
		Expression::List(items) => Expression::List(items.iter().map(|e| substitute(e, bound)).collect()),
		Expression::CreateMap(entries) => {
			Expression::CreateMap(entries.iter().map(|(k, v)| (k.clone(), substitute(v, bound))).collect())
		}
		Expression::Scope { assignments, body } => Expression::Scope {
			assignments: assignments.iter().map(|(k, v)| (k.clone(), substitute(v, bound))).collect(),
			body: sub(body),
		},
		Expression::Grouped(inner) => Expression::Grouped(sub(inner)),
		Expression::Slice { base, from, to } => Expression::Slice {
			base: sub(base),
			from: from.as_deref().map(|e| sub(e)),
			to: to.as_deref().map(|e| sub(e)),
		},
		Expression::Range(a, b) => Expression::Range(sub(a), sub(b)),
		Expression::Projection(a) => Expression::Projection(sub(a)),
		Expression::Call { function, args } => Expression::Call {
			function: sub(function),
			args: args.iter().map(|e| substitute(e, bound)).collect(),
		},
		Expression::DynamicExpr(a, b) => Expression::DynamicExpr(sub(a), sub(b)),
		Expression::QualifiedExpr(a, field) => Expression::QualifiedExpr(sub(a), field.clone()),
		Expression::Catch(body, lambda) => Expression::Catch(sub(body), substitute_lambda_value(lambda, bound)),
		Expression::Sync { expr, cond, value, timeout } => Expression::Sync {
			expr: sub(expr),
			cond: substitute_lambda_value(cond, bound),
			value: sub(value),
			timeout: timeout.as_deref().map(|e| sub(e)),
		},
		Expression::Prefer(inner) => Expression::Prefer(sub(inner)),
		Expression::MarkerExpression(name, value) => Expression::MarkerExpression(name.clone(), sub(value)),
		Expression::Substitution(inner) => Expression::Substitution(sub(inner)),
		Expression::Assignment(path, value) => Expression::Assignment(path.clone(), sub(value)),
		Expression::Sum { list, init, lambda } => {
			Expression::Sum { list: sub(list), init: sub(init), lambda: substitute_lambda_value(lambda, bound) }
		}
		Expression::Mapping { kind, source, lambda } => {
			Expression::Mapping { kind: *kind, source: sub(source), lambda: substitute_lambda_value(lambda, bound) }
		}
		Expression::LambdaExpr(lambda) => Expression::LambdaExpr(substitute_lambda_value(lambda, bound)),
		// Literals, absolute/multi-segment references, and meta nodes with no
		// sub-expressions carry nothing to substitute into.
		other => other.clone(),
	}
}

/// Substitution into a nested `Lambda`, stopping at any parameter name the
/// lambda itself redeclares (shadowing).
fn substitute_lambda_value(lambda: &Lambda, bound: &[(String, Expression)]) -> Lambda {
	let shadowed: Vec<_> = bound.iter().filter(|(name, _)| !lambda.params.iter().any(|p| &p.name == name)).cloned().collect();
	Lambda { params: lambda.params.clone(), body: std::rc::Rc::new(substitute(&lambda.body, &shadowed)) }
}

pub(super) fn eval_lambda_ref(name: &str, binding: &Binding) -> Outcome {
	match binding.find_reference(&[name.to_string()]) {
		Lookup::Found(node) => match node.value() {
			Value::Lambda(_) => Outcome::Resolved(node),
			other => Outcome::Failed(EvalIssue::WrongKind { expected: "lambda", found: other.scalar_kind() }),
		},
		Lookup::Deferred => Outcome::Deferred,
		Lookup::NotFound => Outcome::Failed(EvalIssue::NotFound { path: name.to_string() }),
	}
}

/// Binds a 2-arity lambda's two positional parameters (or just the second
/// one if the lambda only takes one), calling it and returning the result.
fn call_two(lambda: &Lambda, first: Node, second: Node, binding: &Binding) -> Outcome {
	let bindings = if lambda.params.len() >= 2 {
		vec![(lambda.params[0].name.clone(), first), (lambda.params[1].name.clone(), second)]
	} else if let Some(p) = lambda.params.first() {
		vec![(p.name.clone(), second)]
	} else {
		Vec::new()
	};
	call_with(lambda, bindings, binding)
}

pub(super) fn eval_sum(list: &Expression, init: &Expression, lambda: &Lambda, binding: &Binding) -> Outcome {
	let list_node = resolve!(list, binding);
	let items = match list_node.value() {
		Value::Sequence(items) => items.clone(),
		other => return Outcome::Failed(EvalIssue::WrongKind { expected: "list", found: other.scalar_kind() }),
	};
	let mut acc = resolve!(init, binding);
	for item in items {
		acc = match call_two(lambda, acc, item, binding) {
			Outcome::Resolved(node) => node,
			Outcome::Deferred => return Outcome::Deferred,
			Outcome::Failed(issue) => return Outcome::Failed(issue),
		};
	}
	Outcome::Resolved(acc)
}

pub(super) fn eval_mapping(kind: MappingKind, source: &Expression, lambda: &Lambda, binding: &Binding) -> Outcome {
	let source_node = resolve!(source, binding);
	match kind {
		MappingKind::ListToList | MappingKind::ListToListFilter => {
			let items = match source_node.value() {
				Value::Sequence(items) => items.clone(),
				other => return Outcome::Failed(EvalIssue::WrongKind { expected: "list", found: other.scalar_kind() }),
			};
			map_list(kind, items, lambda, binding)
		}
		MappingKind::MapToList | MappingKind::MapToMap | MappingKind::MapToMapFilter => {
			let entries = match source_node.value() {
				Value::Mapping(entries) => entries.clone(),
				other => return Outcome::Failed(EvalIssue::WrongKind { expected: "map", found: other.scalar_kind() }),
			};
			map_map(kind, entries, lambda, binding)
		}
	}
}

fn call_indexed(lambda: &Lambda, index: usize, item: Node, binding: &Binding) -> Outcome {
	if lambda.params.len() >= 2 {
		call_two(lambda, Node::from(index as i64), item, binding)
	} else {
		call_two(lambda, item.clone(), item, binding)
	}
}

fn map_list(kind: MappingKind, items: Vec<Node>, lambda: &Lambda, binding: &Binding) -> Outcome {
	let mut results = Vec::with_capacity(items.len());
	for (i, item) in items.into_iter().enumerate() {
		match kind {
			MappingKind::ListToList => match call_indexed(lambda, i, item, binding) {
				Outcome::Resolved(node) => results.push(node),
				Outcome::Deferred => return Outcome::Deferred,
				Outcome::Failed(issue) => return Outcome::Failed(issue),
			},
			MappingKind::ListToListFilter => match call_indexed(lambda, i, item.clone(), binding) {
				Outcome::Resolved(node) => {
					if is_truthy(&node) {
						results.push(item);
					}
				}
				Outcome::Deferred => return Outcome::Deferred,
				Outcome::Failed(issue) => return Outcome::Failed(issue),
			},
			_ => unreachable!("map_list only handles list->list variants"),
		}
	}
	Outcome::Resolved(Node::new(Value::Sequence(results)))
}

fn map_map(kind: MappingKind, entries: Vec<(String, Node)>, lambda: &Lambda, binding: &Binding) -> Outcome {
	match kind {
		MappingKind::MapToList => {
			let mut results = Vec::with_capacity(entries.len());
			for (key, value) in entries {
				match call_two(lambda, Node::from(key), value, binding) {
					Outcome::Resolved(node) => results.push(node),
					Outcome::Deferred => return Outcome::Deferred,
					Outcome::Failed(issue) => return Outcome::Failed(issue),
				}
			}
			Outcome::Resolved(Node::new(Value::Sequence(results)))
		}
		MappingKind::MapToMap => {
			let mut results = Vec::with_capacity(entries.len());
			for (key, value) in entries {
				match call_two(lambda, Node::from(key.clone()), value, binding) {
					Outcome::Resolved(node) => results.push((key, node)),
					Outcome::Deferred => return Outcome::Deferred,
					Outcome::Failed(issue) => return Outcome::Failed(issue),
				}
			}
			Outcome::Resolved(Node::new(Value::Mapping(results)))
		}
		MappingKind::MapToMapFilter => {
			let mut results = Vec::with_capacity(entries.len());
			for (key, value) in entries {
				match call_two(lambda, Node::from(key.clone()), value.clone(), binding) {
					Outcome::Resolved(node) => {
						if is_truthy(&node) {
							results.push((key, value));
						}
					}
					Outcome::Deferred => return Outcome::Deferred,
					Outcome::Failed(issue) => return Outcome::Failed(issue),
				}
			}
			Outcome::Resolved(Node::new(Value::Mapping(results)))
		}
		_ => unreachable!("map_map only handles map-sourced variants"),
	}
}

fn is_truthy(node: &Node) -> bool {
	matches!(node.value(), Value::Bool(true))
}

#[cfg(test)]
mod tests {
	use std::rc::Rc;

	use super::*;

	fn binding() -> Binding {
		Binding::new(Rc::new(Node::new(Value::Null)), Rc::from(Vec::new()))
	}

	fn lambda(params: &[&str], body: Expression) -> Lambda {
		Lambda {
			params: params.iter().map(|p| weave_core::LambdaParam { name: p.to_string(), variadic: false }).collect(),
			body: std::rc::Rc::new(body),
		}
	}

	#[test]
	fn sum_reduces_with_accumulator() {
		let b = binding();
		let list = Expression::List(vec![Expression::Integer(1), Expression::Integer(2), Expression::Integer(3)]);
		let add = lambda(
			&["acc", "x"],
			Expression::Addition(
				Box::new(Expression::Reference(vec!["acc".to_string()])),
				Box::new(Expression::Reference(vec!["x".to_string()])),
			),
		);
		match eval_sum(&list, &Expression::Integer(0), &add, &b) {
			Outcome::Resolved(node) => assert_eq!(node.value(), &Value::Int(6)),
			_ => panic!("expected Resolved"),
		}
	}

	#[test]
	fn map_transforms_each_item() {
		let b = binding();
		let list = Expression::List(vec![Expression::Integer(1), Expression::Integer(2)]);
		let double = lambda(
			&["x"],
			Expression::Multiplication(Box::new(Expression::Reference(vec!["x".to_string()])), Box::new(Expression::Integer(2))),
		);
		match eval_mapping(MappingKind::ListToList, &list, &double, &b) {
			Outcome::Resolved(node) => assert_eq!(node.value(), &Value::Sequence(vec![Node::from(2i64), Node::from(4i64)])),
			_ => panic!("expected Resolved"),
		}
	}

	#[test]
	fn select_filters_by_predicate() {
		let b = binding();
		let list = Expression::List(vec![Expression::Integer(1), Expression::Integer(2), Expression::Integer(3)]);
		let is_even = lambda(
			&["x"],
			Expression::Comparison(
				weave_core::CompareOp::Eq,
				Box::new(Expression::Modulo(Box::new(Expression::Reference(vec!["x".to_string()])), Box::new(Expression::Integer(2)))),
				Box::new(Expression::Integer(0)),
			),
		);
		match eval_mapping(MappingKind::ListToListFilter, &list, &is_even, &b) {
			Outcome::Resolved(node) => assert_eq!(node.value(), &Value::Sequence(vec![Node::from(2i64)])),
			_ => panic!("expected Resolved"),
		}
	}

	#[test]
	fn builtin_call_resolves_length() {
		let b = binding();
		let call = Expression::Call {
			function: Box::new(Expression::Reference(vec!["length".to_string()])),
			args: vec![Expression::StringLit("abc".to_string())],
		};
		match evaluate(&call, &b) {
			Outcome::Resolved(node) => assert_eq!(node.value(), &Value::Int(3)),
			_ => panic!("expected Resolved"),
		}
	}

	#[test]
	fn partial_application_leaves_a_residual_lambda() {
		let b = binding();
		let add = lambda(
			&["a", "b"],
			Expression::Addition(
				Box::new(Expression::Reference(vec!["a".to_string()])),
				Box::new(Expression::Reference(vec!["b".to_string()])),
			),
		);
		match call_lambda(&add, &[Expression::Integer(1)], &b) {
			Outcome::Resolved(node) => assert!(matches!(node.value(), Value::Lambda(l) if l.params.len() == 1)),
			_ => panic!("expected a partially applied lambda"),
		}
	}
}
