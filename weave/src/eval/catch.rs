//! `catch[body|lambda]` (spec §4.D "Catch"): evaluates `body`; on failure,
//! invokes `lambda` with the failure's message as a string argument. A
//! deferral passes straight through — only evaluation failures are
//! intercepted (spec §7 "`catch` intercepts; `||`/`ValidOr` intercept only
//! evaluation failures, not deferrals" applies here too).

use weave_core::{Expression, Lambda, Node, Value};

use crate::binding::Binding;

use super::{evaluate, Outcome};

pub(super) fn eval_catch(body: &Expression, lambda: &Lambda, binding: &Binding) -> Outcome {
	match evaluate(body, binding) {
		Outcome::Resolved(node) => Outcome::Resolved(node),
		Outcome::Deferred => Outcome::Deferred,
		Outcome::Failed(issue) => {
			let message = Node::new(Value::String(issue.to_string()));
			let bindings = lambda
				.params
				.first()
				.map(|p| vec![(p.name.clone(), message)])
				.unwrap_or_default();
			let extended = binding.with_scope(bindings);
			evaluate(&lambda.body, &extended)
		}
	}
}

#[cfg(test)]
mod tests {
	use std::rc::Rc;

	use weave_core::LambdaParam;

	use super::*;

	fn binding() -> Binding {
		Binding::new(Rc::new(Node::new(Value::Null)), Rc::from(Vec::new()))
	}

	#[test]
	fn catch_passes_through_a_resolved_body() {
		let lambda = Lambda { params: vec![LambdaParam { name: "msg".to_string(), variadic: false }], body: Rc::new(Expression::StringLit("caught".to_string())) };
		match eval_catch(&Expression::Integer(1), &lambda, &binding()) {
			Outcome::Resolved(node) => assert_eq!(node.value(), &Value::Int(1)),
			_ => panic!("expected Resolved"),
		}
	}

	#[test]
	fn catch_invokes_lambda_with_failure_message() {
		let lambda = Lambda {
			params: vec![LambdaParam { name: "msg".to_string(), variadic: false }],
			body: Rc::new(Expression::Reference(vec!["msg".to_string()])),
		};
		let divide_by_zero = Expression::Division(Box::new(Expression::Integer(1)), Box::new(Expression::Integer(0)));
		match eval_catch(&divide_by_zero, &lambda, &binding()) {
			Outcome::Resolved(node) => assert_eq!(node.value(), &Value::String("division by zero".to_string())),
			other => panic!("expected Resolved with the caught message, got {}", matches!(other, Outcome::Failed(_))),
		}
	}
}
