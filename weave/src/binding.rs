//! The read-only lookup context threaded through evaluation (spec §4.C).
//!
//! `Binding` is cheap to clone: the document root and the stub chain are
//! `Rc`-shared, and local scope is a singly-linked chain of `Rc<ScopeFrame>`
//! so `scope(...)` extension is O(1), mirroring the way the teacher chains
//! `Scoped::Child { parent: Option<Box<Scoped>>, .. }` rather than copying
//! the whole environment on every nested binding.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use weave_core::{Node, Value};

use crate::diagnostics::{Clock, Diagnostics, NullDiagnostics, SystemClock};

/// Per-position first-deferral timestamps for `sync[...]` expressions,
/// shared across every `Binding` produced from one Flow invocation so the
/// timeout is measured across passes rather than reset each time (spec §5).
pub(crate) type SyncState = Rc<RefCell<HashMap<Vec<String>, Instant>>>;

/// One frame of local bindings introduced by `scope(...)` or a lambda call.
struct ScopeFrame {
	bindings: Vec<(String, Node)>,
	parent: Option<Rc<ScopeFrame>>,
}

impl ScopeFrame {
	fn lookup(&self, name: &str) -> Option<&Node> {
		if let Some((_, node)) = self.bindings.iter().find(|(k, _)| k == name) {
			return Some(node);
		}
		self.parent.as_ref().and_then(|parent| parent.lookup(name))
	}
}

/// The outcome of resolving a reference path against some root.
pub enum Lookup {
	/// The path resolved to a fully resolved node.
	Found(Node),
	/// The path exists but passes through a node that is not yet (locally
	/// or fully) resolved; retry on a later pass.
	Deferred,
	/// No node exists at this path.
	NotFound,
}

#[derive(Clone)]
pub struct Binding {
	root: Rc<Node>,
	path: Vec<String>,
	stub_path: Vec<String>,
	stubs: Rc<[Node]>,
	scope: Option<Rc<ScopeFrame>>,
	diagnostics: Rc<dyn Diagnostics>,
	clock: Rc<dyn Clock>,
	sync_state: SyncState,
	default_timeout: Duration,
}

impl Binding {
	pub fn new(root: Rc<Node>, stubs: Rc<[Node]>) -> Self {
		Binding {
			root,
			path: Vec::new(),
			stub_path: Vec::new(),
			stubs,
			scope: None,
			diagnostics: Rc::new(NullDiagnostics),
			clock: Rc::new(SystemClock),
			sync_state: Rc::new(RefCell::new(HashMap::new())),
			default_timeout: Duration::from_secs(60),
		}
	}

	pub fn with_diagnostics(mut self, diagnostics: Rc<dyn Diagnostics>) -> Self {
		self.diagnostics = diagnostics;
		self
	}

	pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
		self.clock = clock;
		self
	}

	pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
		self.default_timeout = timeout;
		self
	}

	/// Shares one `sync_state` map across every `Binding` derived from this
	/// one, so `sync[...]`'s first-deferral timestamp survives across flow
	/// passes instead of resetting every time a fresh `Binding` is built.
	pub(crate) fn with_sync_state(mut self, sync_state: SyncState) -> Self {
		self.sync_state = sync_state;
		self
	}

	pub(crate) fn sync_state(&self) -> &SyncState {
		&self.sync_state
	}

	pub fn default_timeout(&self) -> Duration {
		self.default_timeout
	}

	pub fn root(&self) -> &Node {
		&self.root
	}

	pub fn stubs(&self) -> &[Node] {
		&self.stubs
	}

	pub fn path(&self) -> &[String] {
		&self.path
	}

	pub fn stub_path(&self) -> &[String] {
		&self.stub_path
	}

	pub fn diagnostics(&self) -> &dyn Diagnostics {
		self.diagnostics.as_ref()
	}

	pub fn clock(&self) -> &dyn Clock {
		self.clock.as_ref()
	}

	/// A binding positioned one segment deeper, for visiting a child node.
	pub fn child(&self, segment: impl Into<String>) -> Binding {
		let segment = segment.into();
		let mut path = self.path.clone();
		path.push(segment.clone());
		let mut stub_path = self.stub_path.clone();
		stub_path.push(segment);
		Binding { path, stub_path, ..self.clone() }
	}

	/// A binding repositioned to an explicit stub lookup path, as `(( merge
	/// <path> ))`'s redirect modifier requires.
	pub fn with_stub_path(&self, stub_path: Vec<String>) -> Binding {
		Binding { stub_path, ..self.clone() }
	}

	/// A binding carrying a different stub chain, used when descending into
	/// a nested flow (spec §4.E stub preparation).
	pub fn with_stubs(&self, stubs: Rc<[Node]>) -> Binding {
		Binding { stubs, ..self.clone() }
	}

	/// A binding with new local bindings pushed in front of the current
	/// scope chain (spec §4.C `scope(assignments)`).
	pub fn with_scope(&self, assignments: Vec<(String, Node)>) -> Binding {
		let frame = Rc::new(ScopeFrame { bindings: assignments, parent: self.scope.clone() });
		Binding { scope: Some(frame), ..self.clone() }
	}

	/// Resolves a relative path from the current position: scope bindings
	/// shadow document positions, and an unqualified reference is searched
	/// for starting at the current node's *enclosing* container and walking
	/// up through ancestors to the root (spec §4.C "lookups walk the current
	/// path prefix"). The search never tries the full current path including
	/// the node's own final segment — that candidate would mean "look inside
	/// my own value", which can never resolve a sibling and, when the node's
	/// own value is still an unresolved expression, would defer forever.
	pub fn find_reference(&self, path: &[String]) -> Lookup {
		if path.first().map(String::is_empty).unwrap_or(false) {
			return self.find_from_root(&path[1..]);
		}
		if let Some(first) = path.first() {
			if let Some(scope) = &self.scope {
				if let Some(node) = scope.lookup(first) {
					return descend_from(node, &path[1..]);
				}
			}
		}
		for depth in (0..=self.path.len().saturating_sub(1)).rev() {
			let mut candidate = self.path[..depth].to_vec();
			candidate.extend_from_slice(path);
			match descend_from(&self.root, &candidate) {
				Lookup::NotFound => continue,
				other => return other,
			}
		}
		Lookup::NotFound
	}

	/// Absolute lookup from the root of the current document (spec §4.C).
	pub fn find_from_root(&self, path: &[String]) -> Lookup {
		descend_from(&self.root, path)
	}

	/// Ordered search through the stub stack (spec §4.C), first match wins;
	/// a path still pending in an earlier stub defers the whole lookup
	/// rather than silently falling through to a later one.
	pub fn find_in_stubs(&self, path: &[String]) -> Lookup {
		let mut deferred = false;
		for stub in self.stubs.iter() {
			match descend_from(stub, path) {
				Lookup::Found(node) => return Lookup::Found(node),
				Lookup::Deferred => deferred = true,
				Lookup::NotFound => {}
			}
		}
		if deferred {
			Lookup::Deferred
		} else {
			Lookup::NotFound
		}
	}
}

/// Walks `path` segment by segment from `start`. A mapping segment looks up
/// by key; a sequence segment parses as an index. Each intermediate node
/// must be locally resolved to know how to descend further; the terminal
/// node must be fully resolved to count as `Found` (spec §4.D reference
/// resolution algorithm).
fn descend_from(start: &Node, path: &[String]) -> Lookup {
	let mut current = start.clone();
	for segment in path {
		if !current.is_locally_resolved() {
			return Lookup::Deferred;
		}
		let next = match current.value() {
			Value::Mapping(_) => current.get(segment).cloned(),
			Value::Sequence(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i).cloned()),
			_ => None,
		};
		match next {
			Some(node) => current = node,
			None => return Lookup::NotFound,
		}
	}
	if current.is_resolved() {
		Lookup::Found(current.referenced())
	} else {
		Lookup::Deferred
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use weave_core::{Annotations, Node, Value};

	fn mapping(entries: Vec<(&str, Node)>) -> Node {
		Node::new(Value::Mapping(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()))
	}

	#[test]
	fn find_from_root_descends_mappings() {
		let root = mapping(vec![("foo", mapping(vec![("bar", Node::from(42i64))]))]);
		let binding = Binding::new(Rc::new(root), Rc::from(Vec::new()));
		match binding.find_from_root(&["foo".to_string(), "bar".to_string()]) {
			Lookup::Found(node) => assert_eq!(node.value(), &Value::Int(42)),
			_ => panic!("expected Found"),
		}
	}

	#[test]
	fn find_reference_climbs_enclosing_scopes() {
		let root = mapping(vec![("shared", Node::from(1i64)), ("child", mapping(vec![("x", Node::from(2i64))]))]);
		let binding = Binding::new(Rc::new(root), Rc::from(Vec::new())).child("child").child("x");
		match binding.find_reference(&["shared".to_string()]) {
			Lookup::Found(node) => assert_eq!(node.value(), &Value::Int(1)),
			_ => panic!("expected Found via ancestor climb"),
		}
	}

	#[test]
	fn scope_binding_shadows_document_position() {
		let root = mapping(vec![("x", Node::from(1i64))]);
		let binding = Binding::new(Rc::new(root), Rc::from(Vec::new()))
			.with_scope(vec![("x".to_string(), Node::from(99i64))]);
		match binding.find_reference(&["x".to_string()]) {
			Lookup::Found(node) => assert_eq!(node.value(), &Value::Int(99)),
			_ => panic!("expected scope binding to shadow"),
		}
	}

	#[test]
	fn unresolved_intermediate_defers() {
		let expr_node = Node::new(Value::Expression(Rc::new(weave_core::Expression::Nil)));
		let root = mapping(vec![("pending", expr_node)]);
		let binding = Binding::new(Rc::new(root), Rc::from(Vec::new()));
		assert!(matches!(binding.find_from_root(&["pending".to_string(), "x".to_string()]), Lookup::Deferred));
	}

	#[test]
	fn missing_key_is_not_found() {
		let root = mapping(vec![("x", Node::from(1i64))]);
		let binding = Binding::new(Rc::new(root), Rc::from(Vec::new()));
		assert!(matches!(binding.find_from_root(&["missing".to_string()]), Lookup::NotFound));
	}

	#[test]
	fn referenced_strips_transient_annotations_on_the_way_out() {
		let local_node = Node::new(Value::Int(1)).with_annotations(Annotations { local: true, ..Default::default() });
		let root = mapping(vec![("x", local_node)]);
		let binding = Binding::new(Rc::new(root), Rc::from(Vec::new()));
		match binding.find_from_root(&["x".to_string()]) {
			Lookup::Found(node) => assert!(!node.annotations().local),
			_ => panic!("expected Found"),
		}
	}
}
