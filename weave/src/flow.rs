//! The flow engine (spec §4.E): repeatedly walks a document tree, invoking
//! the evaluator on every unresolved `Expression`, until a pass changes
//! nothing or every node is resolved. Classifies whatever is left over on a
//! no-progress stop, and drives stub preparation and the final cleanup pass.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::time::Duration;

use weave_core::{Expression, Node, Value};

use crate::binding::{Binding, SyncState};
use crate::cleanup::{cleanup, local, temporary_or_local};
use crate::diagnostics::{Clock, Diagnostics, NullDiagnostics, SystemClock};
use crate::error::{Classified, EvalIssue, FlowError, Mark};
use crate::eval::{evaluate, Outcome};
use crate::merge::merge_tree;

/// Tunables for one `prepare_stubs`/`apply`/`cascade` invocation (spec §4.E,
/// §5, §9 "Design Notes" — the original engine's CLI flags, carried here as
/// a plain config struct per the ambient config layer rather than globals).
#[derive(Clone, Debug)]
pub struct FlowOptions {
	/// If true, a flow that cannot fully resolve terminates with its current
	/// best-effort tree (unresolved nodes reserialized) instead of failing.
	pub partial: bool,
	/// The `sync[...]` timeout used when an expression omits its own.
	pub sync_timeout_default: Duration,
	/// The field used to key sequence-of-maps merges when a `(( merge on
	/// <key> ))` doesn't override it.
	pub merge_key: String,
	/// Safety valve bounding how many passes a single flow may take, in case
	/// an implementation defect caused `progress` to report true forever.
	pub max_passes: usize,
}

impl Default for FlowOptions {
	fn default() -> Self {
		FlowOptions {
			partial: false,
			sync_timeout_default: Duration::from_secs(60),
			merge_key: "name".to_string(),
			max_passes: 1000,
		}
	}
}

/// Runs `apply` with a silent diagnostics sink and the system clock.
pub fn apply(template: &Node, prepared_stubs: &[Node], options: &FlowOptions) -> Result<Node, FlowError> {
	apply_with(template, prepared_stubs, options, Rc::new(NullDiagnostics), Rc::new(SystemClock))
}

/// Merges `prepared_stubs` into `template` (spec §4.D "Merge semantics"),
/// flows the result to a fixpoint, and strips `temporary`/`local` nodes from
/// the output (spec §4.E, §4.F).
pub fn apply_with(
	template: &Node,
	prepared_stubs: &[Node],
	options: &FlowOptions,
	diagnostics: Rc<dyn Diagnostics>,
	clock: Rc<dyn Clock>,
) -> Result<Node, FlowError> {
	let merged = merge_tree(template, prepared_stubs, &options.merge_key);
	let stubs: Rc<[Node]> = Rc::from(prepared_stubs.to_vec());
	let flowed = run_flow(merged, stubs, options, diagnostics, clock)?;
	Ok(cleanup(&flowed, &temporary_or_local))
}

/// Runs `prepare_stubs` with a silent diagnostics sink and the system clock.
pub fn prepare_stubs(stubs: &[Node], options: &FlowOptions) -> Result<Vec<Node>, FlowError> {
	prepare_stubs_with(stubs, options, Rc::new(NullDiagnostics), Rc::new(SystemClock))
}

/// Prepares a stub chain for use against a template (spec §4.E "Stub
/// preparation"): processes stubs from last to first, each flowed against
/// the stubs after it, with `local`-annotated nodes stripped before it is
/// exposed to earlier stubs.
pub fn prepare_stubs_with(
	stubs: &[Node],
	options: &FlowOptions,
	diagnostics: Rc<dyn Diagnostics>,
	clock: Rc<dyn Clock>,
) -> Result<Vec<Node>, FlowError> {
	let mut prepared: Vec<Node> = Vec::with_capacity(stubs.len());
	for stub in stubs.iter().rev() {
		let later: Rc<[Node]> = Rc::from(prepared.clone());
		let flowed = run_flow(stub.clone(), later, options, diagnostics.clone(), clock.clone())?;
		prepared.insert(0, cleanup(&flowed, &local));
	}
	Ok(prepared)
}

/// `prepare_stubs` followed by `apply` (spec §6 Flow API).
pub fn cascade(template: &Node, stubs: &[Node], options: &FlowOptions) -> Result<Node, FlowError> {
	cascade_with(template, stubs, options, Rc::new(NullDiagnostics), Rc::new(SystemClock))
}

pub fn cascade_with(
	template: &Node,
	stubs: &[Node],
	options: &FlowOptions,
	diagnostics: Rc<dyn Diagnostics>,
	clock: Rc<dyn Clock>,
) -> Result<Node, FlowError> {
	let prepared = prepare_stubs_with(stubs, options, diagnostics.clone(), clock.clone())?;
	apply_with(template, &prepared, options, diagnostics, clock)
}

/// The fixed-point loop itself: repeatedly walks `tree`, rebinding it each
/// pass to the result (spec §9 "the flow engine holds a single 'current
/// tree' reference and rebinds it each pass").
fn run_flow(
	mut tree: Node,
	stubs: Rc<[Node]>,
	options: &FlowOptions,
	diagnostics: Rc<dyn Diagnostics>,
	clock: Rc<dyn Clock>,
) -> Result<Node, FlowError> {
	let mut failed: HashMap<Vec<String>, EvalIssue> = HashMap::new();
	let sync_state: SyncState = Rc::new(RefCell::new(HashMap::new()));

	for _ in 0..options.max_passes {
		let root = Rc::new(tree.clone());
		let binding = Binding::new(root, stubs.clone())
			.with_diagnostics(diagnostics.clone())
			.with_clock(clock.clone())
			.with_sync_state(sync_state.clone())
			.with_default_timeout(options.sync_timeout_default);

		let (new_tree, progress) = walk(&tree, &binding, &mut failed);
		tree = new_tree;

		if tree.is_resolved() {
			return Ok(tree);
		}
		if !progress {
			break;
		}
	}

	if options.partial {
		Ok(reset_unresolved(&tree))
	} else {
		Err(FlowError { report: classify(&tree, &failed) })
	}
}

/// One pass over the tree: recurses into every `Mapping`/`Sequence`
/// position, invoking the evaluator on each unresolved `Expression` it finds
/// (spec §4.E step 2). A position already in `failed` from an earlier pass
/// is a permanent local error and is skipped rather than re-evaluated.
fn walk(node: &Node, binding: &Binding, failed: &mut HashMap<Vec<String>, EvalIssue>) -> (Node, bool) {
	if failed.contains_key(binding.path()) {
		return (node.clone(), false);
	}
	match node.value() {
		Value::Mapping(entries) => {
			let mut progress = false;
			let mut rewritten = Vec::with_capacity(entries.len());
			for (key, value) in entries {
				let child = binding.child(key.clone());
				let (new_value, changed) = walk(value, &child, failed);
				progress |= changed;
				rewritten.push((key.clone(), new_value));
			}
			(node.with_value(Value::Mapping(rewritten)), progress)
		}
		Value::Sequence(items) => {
			let mut progress = false;
			let mut rewritten = Vec::with_capacity(items.len());
			for (index, item) in items.iter().enumerate() {
				let child = binding.child(index.to_string());
				let (new_item, changed) = walk(item, &child, failed);
				progress |= changed;
				rewritten.push(new_item);
			}
			(node.with_value(Value::Sequence(rewritten)), progress)
		}
		Value::Expression(expr) => match evaluate(expr, binding) {
			Outcome::Resolved(resolved) => {
				let annotations = node.annotations().union(&resolved.annotations());
				(node.with_value(resolved.value().clone()).with_annotations(annotations), true)
			}
			Outcome::Deferred => (node.clone(), false),
			Outcome::Failed(issue) => {
				binding.diagnostics().trace(binding.path(), &issue.to_string());
				failed.insert(binding.path().to_vec(), issue);
				(node.clone(), false)
			}
		},
		_ => (node.clone(), false),
	}
}

/// Replaces each still-unresolved `Expression` node with a string holding
/// its re-parseable textual form (spec §4.E "Partial mode", §9 Open
/// Question on `reset_unresolved`). Reserialization is AST pretty-printing
/// via `Expression`'s `Display` impl; exotic nodes (nested sync/catch with
/// captured scope) are best-effort, as the spec allows.
pub fn reset_unresolved(node: &Node) -> Node {
	match node.value() {
		Value::Expression(expr) => node.with_value(Value::String(format!("(( {expr} ))"))),
		Value::Mapping(entries) => {
			let rewritten = entries.iter().map(|(k, v)| (k.clone(), reset_unresolved(v))).collect();
			node.with_value(Value::Mapping(rewritten))
		}
		Value::Sequence(items) => {
			let rewritten = items.iter().map(reset_unresolved).collect();
			node.with_value(Value::Sequence(rewritten))
		}
		_ => node.clone(),
	}
}

/// Classifies every node left unresolved at a no-progress stop (spec §4.E
/// "Classification on termination"). A node that failed evaluation directly
/// is `Local`; a node whose expression reaches one transitively (through
/// any chain of references) is `Transitive`; everything else remaining is
/// `Cycle`, per "no progress in a pass" being the universal cycle signal
/// (spec §9).
fn classify(tree: &Node, failed: &HashMap<Vec<String>, EvalIssue>) -> Vec<Classified> {
	let mut report: Vec<Classified> = failed
		.iter()
		.map(|(path, issue)| Classified { path: path.join("."), mark: Mark::Local, issue: issue.clone() })
		.collect();

	let mut pending = Vec::new();
	collect_pending(tree, &mut Vec::new(), failed, &mut pending);

	let mut deps: HashMap<Vec<String>, Vec<Vec<String>>> = HashMap::new();
	for (path, expr) in &pending {
		deps.insert(path.clone(), direct_dependencies(expr, path));
	}

	let mut transitive: HashSet<Vec<String>> = HashSet::new();
	loop {
		let mut changed = false;
		for (path, dep_list) in &deps {
			if transitive.contains(path) {
				continue;
			}
			if dep_list.iter().any(|dep| failed.contains_key(dep) || transitive.contains(dep)) {
				transitive.insert(path.clone());
				changed = true;
			}
		}
		if !changed {
			break;
		}
	}

	for (path, _) in &pending {
		let (mark, message) = if transitive.contains(path) {
			(Mark::Transitive, "depends on a failed node")
		} else {
			(Mark::Cycle, "participates in an unresolved reference cycle")
		};
		report.push(Classified { path: path.join("."), mark, issue: EvalIssue::Custom(message.to_string()) });
	}

	report.sort_by(|a, b| a.path.cmp(&b.path));
	report
}

fn collect_pending(
	node: &Node,
	path: &mut Vec<String>,
	failed: &HashMap<Vec<String>, EvalIssue>,
	out: &mut Vec<(Vec<String>, Rc<Expression>)>,
) {
	match node.value() {
		Value::Expression(expr) => {
			if !failed.contains_key(path.as_slice()) {
				out.push((path.clone(), expr.clone()));
			}
		}
		Value::Mapping(entries) => {
			for (key, value) in entries {
				path.push(key.clone());
				collect_pending(value, path, failed, out);
				path.pop();
			}
		}
		Value::Sequence(items) => {
			for (index, item) in items.iter().enumerate() {
				path.push(index.to_string());
				collect_pending(item, path, failed, out);
				path.pop();
			}
		}
		_ => {}
	}
}

/// Every absolute path a relative reference inside `node_path`'s expression
/// could plausibly resolve to, in the same search order `Binding::find_reference`
/// uses — deepest prefix first. Used only to test set membership against
/// `failed`/pending paths, so over-including unrelated candidates costs
/// nothing; it never causes a real dependency to be missed.
fn candidate_absolute_paths(node_path: &[String], relative: &[String]) -> Vec<Vec<String>> {
	if relative.first().map(String::is_empty).unwrap_or(false) {
		return vec![relative[1..].to_vec()];
	}
	(0..=node_path.len().saturating_sub(1))
		.rev()
		.map(|depth| {
			let mut candidate = node_path[..depth].to_vec();
			candidate.extend_from_slice(relative);
			candidate
		})
		.collect()
}

fn direct_dependencies(expr: &Expression, node_path: &[String]) -> Vec<Vec<String>> {
	let mut refs = Vec::new();
	collect_reference_paths(expr, &mut refs);
	refs.into_iter().flat_map(|relative| candidate_absolute_paths(node_path, &relative)).collect()
}

/// Collects every `Reference` appearing anywhere inside `expr`, recursing
/// into every sub-expression (including lambda bodies) so arithmetic- or
/// call-wrapped references still count towards the dependency graph used by
/// [`classify`].
fn collect_reference_paths(expr: &Expression, out: &mut Vec<Vec<String>>) {
	match expr {
		Expression::Reference(path) => out.push(path.clone()),
		Expression::Addition(a, b)
		| Expression::Subtraction(a, b)
		| Expression::Multiplication(a, b)
		| Expression::Division(a, b)
		| Expression::Modulo(a, b)
		| Expression::LogOr(a, b)
		| Expression::LogAnd(a, b)
		| Expression::Or(a, b)
		| Expression::ValidOr(a, b)
		| Expression::Concatenation(a, b)
		| Expression::Range(a, b)
		| Expression::DynamicExpr(a, b) => {
			collect_reference_paths(a, out);
			collect_reference_paths(b, out);
		}
		Expression::Comparison(_, a, b) => {
			collect_reference_paths(a, out);
			collect_reference_paths(b, out);
		}
		Expression::Not(a)
		| Expression::Grouped(a)
		| Expression::Projection(a)
		| Expression::Prefer(a)
		| Expression::Substitution(a) => collect_reference_paths(a, out),
		Expression::Conditional { condition, when_true, when_false } => {
			collect_reference_paths(condition, out);
			collect_reference_paths(when_true, out);
			collect_reference_paths(when_false, out);
		}
		Expression::List(items) => items.iter().for_each(|e| collect_reference_paths(e, out)),
		Expression::CreateMap(entries) => entries.iter().for_each(|(_, v)| collect_reference_paths(v, out)),
		Expression::Scope { assignments, body } => {
			assignments.iter().for_each(|(_, v)| collect_reference_paths(v, out));
			collect_reference_paths(body, out);
		}
		Expression::Slice { base, from, to } => {
			collect_reference_paths(base, out);
			if let Some(e) = from {
				collect_reference_paths(e, out);
			}
			if let Some(e) = to {
				collect_reference_paths(e, out);
			}
		}
		Expression::Call { function, args } => {
			collect_reference_paths(function, out);
			args.iter().for_each(|e| collect_reference_paths(e, out));
		}
		Expression::QualifiedExpr(base, _) => collect_reference_paths(base, out),
		Expression::Catch(body, lambda) => {
			collect_reference_paths(body, out);
			collect_reference_paths(&lambda.body, out);
		}
		Expression::Sync { expr, cond, value, timeout } => {
			collect_reference_paths(expr, out);
			collect_reference_paths(&cond.body, out);
			collect_reference_paths(value, out);
			if let Some(t) = timeout {
				collect_reference_paths(t, out);
			}
		}
		Expression::Sum { list, init, lambda } => {
			collect_reference_paths(list, out);
			collect_reference_paths(init, out);
			collect_reference_paths(&lambda.body, out);
		}
		Expression::Mapping { source, lambda, .. } => {
			collect_reference_paths(source, out);
			collect_reference_paths(&lambda.body, out);
		}
		Expression::LambdaExpr(lambda) => collect_reference_paths(&lambda.body, out),
		Expression::MarkerExpression(_, value) => collect_reference_paths(value, out),
		Expression::Assignment(_, value) => collect_reference_paths(value, out),
		// Literals, `LambdaRef`, `Auto`, `Marker`, `Merge`, `ProjectionValue`:
		// no sub-expressions to recurse into (a merge's stub lookup runs
		// against the stub chain, not the template's reference graph).
		_ => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::rc::Rc as StdRc;

	fn mapping(entries: Vec<(&str, Node)>) -> Node {
		Node::new(Value::Mapping(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()))
	}

	fn expr(e: Expression) -> Node {
		Node::new(Value::Expression(StdRc::new(e)))
	}

	#[test]
	fn apply_resolves_a_simple_forward_reference() {
		let template = mapping(vec![
			("foo", expr(Expression::Reference(vec!["bar".to_string()]))),
			("bar", Node::from(42i64)),
		]);
		let result = apply(&template, &[], &FlowOptions::default()).unwrap();
		assert_eq!(result.get("foo").unwrap().value(), &Value::Int(42));
		assert_eq!(result.get("bar").unwrap().value(), &Value::Int(42));
	}

	#[test]
	fn apply_fails_and_classifies_a_reference_cycle() {
		let template = mapping(vec![
			("a", expr(Expression::Reference(vec!["b".to_string()]))),
			("b", expr(Expression::Reference(vec!["a".to_string()]))),
		]);
		let err = apply(&template, &[], &FlowOptions::default()).unwrap_err();
		assert_eq!(err.report.len(), 2);
		assert!(err.report.iter().all(|c| c.mark == Mark::Cycle));
	}

	#[test]
	fn apply_merges_a_stub_value_at_an_explicit_merge_expression() {
		let template = mapping(vec![("x", expr(Expression::Merge(weave_core::MergeOptions::default())))]);
		let stub = mapping(vec![("x", Node::from(7i64))]);
		let result = apply(&template, &[stub], &FlowOptions::default()).unwrap();
		assert_eq!(result.get("x").unwrap().value(), &Value::Int(7));
	}

	#[test]
	fn apply_merges_a_keyed_sequence_with_no_merge_expression_at_all() {
		let record = |name: &str, v: i64| mapping(vec![("name", Node::from(name)), ("v", Node::from(v))]);
		let template = mapping(vec![("list", Node::new(Value::Sequence(vec![record("a", 1)])))]);
		let stub = mapping(vec![("list", Node::new(Value::Sequence(vec![record("a", 2), record("b", 9)])))]);
		let result = apply(&template, &[stub], &FlowOptions::default()).unwrap();
		let items = result.get("list").unwrap().as_sequence().unwrap();
		assert_eq!(items.len(), 2);
		assert_eq!(items[0].get("v").unwrap().value(), &Value::Int(2));
	}

	#[test]
	fn partial_mode_reserializes_a_locally_failed_node() {
		let divide_by_zero = Expression::Division(Box::new(Expression::Integer(1)), Box::new(Expression::Integer(0)));
		let template = mapping(vec![("r", expr(divide_by_zero))]);
		let options = FlowOptions { partial: true, ..FlowOptions::default() };
		let result = apply(&template, &[], &options).unwrap();
		match result.get("r").unwrap().value() {
			Value::String(s) => assert!(s.contains("1 / 0") || s.contains('/')),
			other => panic!("expected a reserialized string, got {other:?}"),
		}
	}

	#[test]
	fn reset_unresolved_round_trips_word_operators() {
		for source in ["a or b", "a and b", "a orelse b", "undefined"] {
			let parsed = weave_core::parser::parse(source, "test", None).unwrap();
			let node = expr(parsed);
			let reset = reset_unresolved(&node);
			let rendered = reset.as_str().unwrap();
			assert_eq!(rendered, format!("(( {source} ))"));
			let reparsed = weave_core::parser::parse(source, "test", None).unwrap();
			assert_eq!(reparsed.to_string(), source);
		}
	}

	#[test]
	fn cleanup_strips_temporary_and_local_after_apply() {
		use weave_core::Annotations;
		let temp = Node::from(1i64).with_annotations(Annotations { temporary: true, ..Default::default() });
		let template = mapping(vec![("keep", Node::from(2i64)), ("drop", temp)]);
		let result = apply(&template, &[], &FlowOptions::default()).unwrap();
		assert!(result.get("drop").is_none());
		assert_eq!(result.get("keep").unwrap().value(), &Value::Int(2));
	}
}
