//! `Expression::Reference` resolution (spec §4.D "Reference resolution").

use crate::binding::{Binding, Lookup};
use crate::error::EvalIssue;

use super::Outcome;

pub(super) fn eval_reference(path: &[String], binding: &Binding) -> Outcome {
	match binding.find_reference(path) {
		Lookup::Found(node) => Outcome::Resolved(node),
		Lookup::Deferred => Outcome::Deferred,
		Lookup::NotFound => Outcome::Failed(EvalIssue::NotFound { path: dotted(path) }),
	}
}

/// Renders a reference path the way the CLI-visible `'<path>' not found`
/// error expects: dot-joined, absolute references keeping their leading dot.
fn dotted(path: &[String]) -> String {
	path.join(".")
}

#[cfg(test)]
mod tests {
	use std::rc::Rc;

	use weave_core::{Node, Value};

	use super::*;

	#[test]
	fn missing_reference_reports_dotted_path() {
		let root = Node::new(Value::Mapping(Vec::new()));
		let binding = Binding::new(Rc::new(root), Rc::from(Vec::new()));
		match eval_reference(&["foo".to_string(), "bar".to_string()], &binding) {
			Outcome::Failed(EvalIssue::NotFound { path }) => assert_eq!(path, "foo.bar"),
			_ => panic!("expected NotFound"),
		}
	}
}
