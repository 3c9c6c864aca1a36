//! Meta constructs: the explicit `(( merge ))` expression, `prefer`, `auto`,
//! markers, and assignment (spec §3 "Meta", §4.D "Merge semantics").
//!
//! Automatic structural combination of plain (non-expression) `Mapping`/
//! `Sequence` positions is [`crate::merge::merge_tree`]'s job, run once
//! before the first flow pass (spec §8 scenario 4 merges a keyed sequence
//! with no `(( merge ))` in sight). This module only handles a document
//! position whose template value literally *is* a `(( merge ))` expression:
//! there is no competing template-side structural content to combine at
//! that position, so the leaf fetch is a plain stub lookup.
//!
//! `replace` and `on <key>` are preserved on [`MergeOptions`] for round-trip
//! fidelity (they parse and re-render) but are accepted-and-ignored here:
//! `merge_tree` has already run, once, structurally, before any expression is
//! evaluated, and it's the only place keyed/recursive combination happens.
//! By the time `eval_merge` sees an expression-valued position there is
//! nothing left to suppress recursion into or re-key — see DESIGN.md's Open
//! Question entry for the full reasoning.

use weave_core::{Expression, MergeOptions, Node};

use crate::binding::{Binding, Lookup};
use crate::error::EvalIssue;

use super::{evaluate, Outcome};

fn dotted(path: &[String]) -> String {
	path.join(".")
}

pub(super) fn eval_merge(opts: &MergeOptions, binding: &Binding) -> Outcome {
	if opts.none {
		return Outcome::Resolved(Node::null());
	}

	let effective_path = if opts.redirect { opts.path.clone() } else { binding.stub_path().to_vec() };

	match binding.find_in_stubs(&effective_path) {
		Lookup::Found(node) => Outcome::Resolved(node),
		Lookup::Deferred => Outcome::Deferred,
		Lookup::NotFound => {
			if opts.required {
				Outcome::Failed(EvalIssue::MergeRequired { path: dotted(&effective_path) })
			} else {
				Outcome::Resolved(Node::null())
			}
		}
	}
}

/// `(( prefer <expr> ))`: evaluates `expr` and marks the result `preferred`,
/// so a later structural merge keeps this value over a stub's on conflict.
pub(super) fn eval_prefer(inner: &Expression, binding: &Binding) -> Outcome {
	match evaluate(inner, binding) {
		Outcome::Resolved(node) => {
			let mut annotations = node.annotations();
			annotations.preferred = true;
			Outcome::Resolved(node.with_annotations(annotations))
		}
		other => other,
	}
}

/// `(( auto ))`: infers the current sequence index from the node's own path
/// (spec §3 "Meta"); only meaningful as an element of a sequence.
pub(super) fn eval_auto(binding: &Binding) -> Outcome {
	match binding.path().last().and_then(|segment| segment.parse::<i64>().ok()) {
		Some(index) => Outcome::Resolved(Node::from(index)),
		None => Outcome::Failed(EvalIssue::Custom("'auto' used outside a list context".to_string())),
	}
}

/// `(( marker ))`: a bare annotation with no value of its own.
pub(super) fn eval_marker(_name: &str) -> Outcome {
	Outcome::Resolved(Node::null())
}

/// `(( marker-expr:value ))`: the marker name carries no evaluable effect in
/// this engine; the attached value is evaluated normally.
pub(super) fn eval_marker_expression(_name: &str, value: &Expression, binding: &Binding) -> Outcome {
	evaluate(value, binding)
}

/// `(( foo.bar = 1 ))`: reachable only inside a `scope`/lambda assignment
/// list, where the parser already threads the name through
/// `Expression::Scope`'s assignment pairs; the path here is informational
/// and not re-resolved.
pub(super) fn eval_assignment(_path: &[String], value: &Expression, binding: &Binding) -> Outcome {
	evaluate(value, binding)
}

#[cfg(test)]
mod tests {
	use std::rc::Rc;

	use weave_core::Value;

	use super::*;

	#[test]
	fn merge_fetches_stub_value_at_the_node_position() {
		let stub = Node::new(Value::Mapping(vec![("x".to_string(), Node::from(7i64))]));
		let binding = Binding::new(Rc::new(Node::null()), Rc::from(vec![stub])).child("x");
		let opts = MergeOptions::default();
		match eval_merge(&opts, &binding) {
			Outcome::Resolved(node) => assert_eq!(node.value(), &Value::Int(7)),
			_ => panic!("expected Resolved"),
		}
	}

	#[test]
	fn required_merge_fails_when_stub_has_nothing() {
		let binding = Binding::new(Rc::new(Node::null()), Rc::from(Vec::new())).child("x");
		let opts = MergeOptions { required: true, ..Default::default() };
		match eval_merge(&opts, &binding) {
			Outcome::Failed(EvalIssue::MergeRequired { path }) => assert_eq!(path, "x"),
			_ => panic!("expected MergeRequired"),
		}
	}

	#[test]
	fn replace_and_key_name_do_not_change_a_leaf_merge_fetch() {
		let stub = Node::new(Value::Mapping(vec![("x".to_string(), Node::from(7i64))]));
		let binding = Binding::new(Rc::new(Node::null()), Rc::from(vec![stub])).child("x");
		let plain = eval_merge(&MergeOptions::default(), &binding);
		let replace_on_key = eval_merge(&MergeOptions { replace: true, key_name: Some("id".to_string()), ..Default::default() }, &binding);
		match (plain, replace_on_key) {
			(Outcome::Resolved(a), Outcome::Resolved(b)) => assert_eq!(a.value(), b.value()),
			_ => panic!("expected both to resolve"),
		}
	}

	#[test]
	fn merge_none_resolves_to_null_without_a_stub_lookup() {
		let binding = Binding::new(Rc::new(Node::null()), Rc::from(Vec::new())).child("x");
		let opts = MergeOptions { none: true, ..Default::default() };
		match eval_merge(&opts, &binding) {
			Outcome::Resolved(node) => assert_eq!(node.value(), &Value::Null),
			_ => panic!("expected Resolved(null)"),
		}
	}

	#[test]
	fn auto_reads_the_current_sequence_index() {
		let binding = Binding::new(Rc::new(Node::null()), Rc::from(Vec::new())).child("3");
		match eval_auto(&binding) {
			Outcome::Resolved(node) => assert_eq!(node.value(), &Value::Int(3)),
			_ => panic!("expected Resolved"),
		}
	}

	#[test]
	fn prefer_marks_the_result_preferred() {
		let binding = Binding::new(Rc::new(Node::null()), Rc::from(Vec::new()));
		match eval_prefer(&Expression::Integer(5), &binding) {
			Outcome::Resolved(node) => assert!(node.annotations().preferred),
			_ => panic!("expected Resolved"),
		}
	}
}
