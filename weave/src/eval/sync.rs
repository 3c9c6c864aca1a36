//! `sync[expr|cond,value,timeout]` (spec §4.D "Sync expression"): re-evaluate
//! `expr` every flow pass, bind it to `cond`'s parameter(s), and emit `value`
//! once `cond` holds. Failing `cond` (or a still-deferred `expr`) defers
//! until `timeout` seconds have elapsed since the first deferral, measured
//! across passes rather than within one evaluation (spec §5).

use weave_core::{Expression, Lambda, Node, Value};

use crate::binding::Binding;
use crate::error::EvalIssue;

use super::{evaluate, resolve, Outcome};

fn bind_cond(cond: &Lambda, bound_value: &Node, binding: &Binding) -> Binding {
	let bindings = if cond.params.len() <= 1 {
		cond.params
			.first()
			.map(|p| vec![(p.name.clone(), bound_value.clone())])
			.unwrap_or_default()
	} else {
		let items: Vec<Node> = match bound_value.value() {
			Value::Sequence(items) => items.clone(),
			_ => vec![bound_value.clone()],
		};
		cond.params
			.iter()
			.enumerate()
			.map(|(i, p)| (p.name.clone(), items.get(i).cloned().unwrap_or_else(Node::null)))
			.collect()
	};
	binding.with_scope(bindings)
}

/// Tracks this position's first-deferral timestamp and compares it against
/// `timeout`. Returns `Deferred` while under timeout, `Failed(Timeout)` once
/// it has elapsed.
fn defer_with_timeout(timeout: std::time::Duration, binding: &Binding) -> Outcome {
	let key = binding.path().to_vec();
	let now = binding.clock().now();
	let mut state = binding.sync_state().borrow_mut();
	let started = *state.entry(key).or_insert(now);
	if now.duration_since(started) >= timeout {
		Outcome::Failed(EvalIssue::Timeout)
	} else {
		Outcome::Deferred
	}
}

fn clear_state(binding: &Binding) {
	binding.sync_state().borrow_mut().remove(binding.path());
}

pub(super) fn eval_sync(
	expr: &Expression,
	cond: &Lambda,
	value: &Expression,
	timeout: Option<&Expression>,
	binding: &Binding,
) -> Outcome {
	let timeout = match timeout {
		Some(expr) => {
			let node = resolve!(expr, binding);
			match node.value() {
				Value::Int(n) => std::time::Duration::from_secs((*n).max(0) as u64),
				Value::Float(n) => std::time::Duration::from_secs_f64(n.max(0.0)),
				other => {
					return Outcome::Failed(EvalIssue::WrongKind { expected: "number", found: other.scalar_kind() })
				}
			}
		}
		None => binding.default_timeout(),
	};

	let bound_value = match evaluate(expr, binding) {
		Outcome::Resolved(node) => node,
		Outcome::Deferred => return defer_with_timeout(timeout, binding),
		Outcome::Failed(issue) => {
			clear_state(binding);
			return Outcome::Failed(issue);
		}
	};

	let extended = bind_cond(cond, &bound_value, binding);
	let holds = match evaluate(&cond.body, &extended) {
		Outcome::Resolved(node) => match node.value() {
			Value::Bool(b) => *b,
			other => {
				return Outcome::Failed(EvalIssue::WrongKind { expected: "boolean", found: other.scalar_kind() })
			}
		},
		Outcome::Deferred => return defer_with_timeout(timeout, binding),
		Outcome::Failed(issue) => {
			clear_state(binding);
			return Outcome::Failed(issue);
		}
	};

	if !holds {
		return defer_with_timeout(timeout, binding);
	}

	match evaluate(value, &extended) {
		Outcome::Resolved(node) => {
			clear_state(binding);
			Outcome::Resolved(node)
		}
		Outcome::Deferred => Outcome::Deferred,
		Outcome::Failed(issue) => {
			clear_state(binding);
			Outcome::Failed(issue)
		}
	}
}

#[cfg(test)]
mod tests {
	use std::rc::Rc;
	use std::time::{Duration, Instant};

	use weave_core::LambdaParam;

	use super::*;
	use crate::diagnostics::Clock;

	struct FixedClock(Instant);
	impl Clock for FixedClock {
		fn now(&self) -> Instant {
			self.0
		}
	}

	fn lambda(param: &str, body: Expression) -> Lambda {
		Lambda { params: vec![LambdaParam { name: param.to_string(), variadic: false }], body: Rc::new(body) }
	}

	#[test]
	fn sync_emits_value_once_condition_holds() {
		let binding = Binding::new(Rc::new(Node::new(Value::Null)), Rc::from(Vec::new()));
		let cond = lambda("x", Expression::Boolean(true));
		let outcome = eval_sync(&Expression::Integer(1), &cond, &Expression::StringLit("done".to_string()), None, &binding);
		match outcome {
			Outcome::Resolved(node) => assert_eq!(node.value(), &Value::String("done".to_string())),
			_ => panic!("expected Resolved"),
		}
	}

	#[test]
	fn sync_defers_while_condition_is_false() {
		let binding = Binding::new(Rc::new(Node::new(Value::Null)), Rc::from(Vec::new()));
		let cond = lambda("x", Expression::Boolean(false));
		let outcome = eval_sync(&Expression::Integer(1), &cond, &Expression::StringLit("done".to_string()), None, &binding);
		assert!(matches!(outcome, Outcome::Deferred));
	}

	#[test]
	fn sync_times_out_after_elapsed_duration() {
		let start = Instant::now();
		let clock: Rc<dyn Clock> = Rc::new(FixedClock(start));
		let binding = Binding::new(Rc::new(Node::new(Value::Null)), Rc::from(Vec::new())).with_clock(clock.clone());
		let cond = lambda("x", Expression::Boolean(false));

		let first = eval_sync(&Expression::Integer(1), &cond, &Expression::Nil, Some(&Expression::Integer(0)), &binding);
		assert!(matches!(first, Outcome::Deferred));

		let later_clock: Rc<dyn Clock> = Rc::new(FixedClock(start + Duration::from_secs(1)));
		let binding = binding.with_clock(later_clock);
		let second = eval_sync(&Expression::Integer(1), &cond, &Expression::Nil, Some(&Expression::Integer(0)), &binding);
		assert!(matches!(second, Outcome::Failed(EvalIssue::Timeout)));
	}
}
