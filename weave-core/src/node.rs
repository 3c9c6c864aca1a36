//! The document tree: [`Node`], its [`Value`], and its [`Annotations`].
//!
//! A `Node` is treated as immutable: every transformation (`with_value`,
//! `with_annotations`, ...) produces a new `Node` that shares the old one's
//! position unless told otherwise. Identity is structural — two `Node`s with
//! the same value, span and annotations compare equal.

use std::fmt;
use std::rc::Rc;

use crate::ast::{Expression, Lambda};
use crate::span::Span;

/// Boolean flags a `Node` carries through merging and flow.
///
/// "Annotations propagate through merges by union" (spec §3 invariant): see
/// [`Annotations::union`].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Annotations {
	/// Removed before the final output (but still visible to later stubs).
	pub temporary: bool,
	/// Removed before stubs are exposed to earlier stages in the stub chain.
	pub local: bool,
	/// Carries merge semantics (this node's value is itself a `(( merge ))`).
	pub merged: bool,
	/// Overrides the stub's value on scalar merge conflicts.
	pub preferred: bool,
	/// Persisted verbatim across invocations instead of being re-evaluated.
	pub state: bool,
	/// Marks a node as a fallback only used when nothing else provides a value.
	pub default: bool,
}

impl Annotations {
	pub fn union(&self, other: &Annotations) -> Annotations {
		Annotations {
			temporary: self.temporary || other.temporary,
			local: self.local || other.local,
			merged: self.merged || other.merged,
			preferred: self.preferred || other.preferred,
			state: self.state || other.state,
			default: self.default || other.default,
		}
	}

	/// Annotations that must not survive a node crossing into another
	/// position via reference or merge (spec §4.A `ReferencedNode`).
	pub fn stripped_for_reference(&self) -> Annotations {
		Annotations {
			temporary: false,
			local: false,
			default: false,
			..*self
		}
	}
}

/// The value held by a [`Node`].
#[derive(Clone, Debug)]
pub enum Value {
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	String(String),
	Sequence(Vec<Node>),
	Mapping(Vec<(String, Node)>),
	/// A resolved first-class function value, produced by evaluating a
	/// lambda literal or a partial application. Distinct from
	/// `Expression`: a `Lambda` is a terminal, already-resolved value, not
	/// something awaiting further evaluation.
	Lambda(Lambda),
	/// An embedded dynaml expression awaiting evaluation.
	Expression(Rc<Expression>),
}

impl Value {
	pub fn scalar_kind(&self) -> &'static str {
		match self {
			Value::Null => "null",
			Value::Bool(_) => "boolean",
			Value::Int(_) => "integer",
			Value::Float(_) => "float",
			Value::String(_) => "string",
			Value::Sequence(_) => "list",
			Value::Mapping(_) => "map",
			Value::Lambda(_) => "lambda",
			Value::Expression(_) => "expression",
		}
	}

	pub fn is_expression(&self) -> bool {
		matches!(self, Value::Expression(_))
	}
}

impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Value::Null, Value::Null) => true,
			(Value::Bool(a), Value::Bool(b)) => a == b,
			(Value::Int(a), Value::Int(b)) => a == b,
			(Value::Float(a), Value::Float(b)) => a == b,
			(Value::String(a), Value::String(b)) => a == b,
			(Value::Sequence(a), Value::Sequence(b)) => a == b,
			(Value::Mapping(a), Value::Mapping(b)) => a == b,
			(Value::Lambda(a), Value::Lambda(b)) => a == b,
			(Value::Expression(a), Value::Expression(b)) => Rc::ptr_eq(a, b) || a == b,
			_ => false,
		}
	}
}

/// A position in the document tree: a value, a source span, and annotations.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	value: Value,
	span: Option<Span>,
	annotations: Annotations,
}

impl Node {
	pub fn new(value: Value) -> Self {
		Node {
			value,
			span: None,
			annotations: Annotations::default(),
		}
	}

	pub fn null() -> Self {
		Node::new(Value::Null)
	}

	pub fn value(&self) -> &Value {
		&self.value
	}

	pub fn span(&self) -> Option<&Span> {
		self.span.as_ref()
	}

	pub fn annotations(&self) -> Annotations {
		self.annotations
	}

	pub fn at(mut self, span: Span) -> Self {
		self.span = Some(span);
		self
	}

	pub fn with_annotations(mut self, annotations: Annotations) -> Self {
		self.annotations = annotations;
		self
	}

	/// Returns a new `Node` with the same position and annotations but a
	/// replaced value, as required by spec §4.A.
	pub fn with_value(&self, value: Value) -> Self {
		Node {
			value,
			span: self.span.clone(),
			annotations: self.annotations,
		}
	}

	/// A copy stripped of annotations that must not survive a node being
	/// substituted for a reference elsewhere in the tree (spec §4.A).
	pub fn referenced(&self) -> Self {
		Node {
			value: self.value.clone(),
			span: self.span.clone(),
			annotations: self.annotations.stripped_for_reference(),
		}
	}

	/// True if this node's value is not an unresolved expression and none of
	/// its transitive children are either (spec §3 invariant).
	pub fn is_resolved(&self) -> bool {
		match &self.value {
			Value::Expression(_) => false,
			Value::Sequence(items) => items.iter().all(Node::is_resolved),
			Value::Mapping(entries) => entries.iter().all(|(_, n)| n.is_resolved()),
			_ => true,
		}
	}

	/// "Locally resolved": this node itself is not an unresolved expression,
	/// though its children may still contain one (spec §3 invariant).
	pub fn is_locally_resolved(&self) -> bool {
		!self.value.is_expression()
	}

	pub fn as_str(&self) -> Option<&str> {
		match &self.value {
			Value::String(s) => Some(s.as_str()),
			_ => None,
		}
	}

	pub fn as_sequence(&self) -> Option<&[Node]> {
		match &self.value {
			Value::Sequence(items) => Some(items),
			_ => None,
		}
	}

	pub fn as_mapping(&self) -> Option<&[(String, Node)]> {
		match &self.value {
			Value::Mapping(entries) => Some(entries),
			_ => None,
		}
	}

	pub fn get(&self, key: &str) -> Option<&Node> {
		self.as_mapping()?.iter().find(|(k, _)| k == key).map(|(_, v)| v)
	}
}

impl From<bool> for Node {
	fn from(value: bool) -> Self {
		Node::new(Value::Bool(value))
	}
}

impl From<i64> for Node {
	fn from(value: i64) -> Self {
		Node::new(Value::Int(value))
	}
}

impl From<f64> for Node {
	fn from(value: f64) -> Self {
		Node::new(Value::Float(value))
	}
}

impl From<&str> for Node {
	fn from(value: &str) -> Self {
		Node::new(Value::String(value.to_string()))
	}
}

impl From<String> for Node {
	fn from(value: String) -> Self {
		Node::new(Value::String(value))
	}
}

impl fmt::Display for Node {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.value {
			Value::Null => write!(f, "null"),
			Value::Bool(b) => write!(f, "{b}"),
			Value::Int(n) => write!(f, "{n}"),
			Value::Float(n) => write!(f, "{n}"),
			Value::String(s) => write!(f, "{s}"),
			Value::Sequence(items) => {
				write!(f, "[")?;
				for (i, it) in items.iter().enumerate() {
					if i > 0 {
						write!(f, ", ")?;
					}
					write!(f, "{it}")?;
				}
				write!(f, "]")
			}
			Value::Mapping(entries) => {
				write!(f, "{{")?;
				for (i, (k, v)) in entries.iter().enumerate() {
					if i > 0 {
						write!(f, ", ")?;
					}
					write!(f, "{k}: {v}")?;
				}
				write!(f, "}}")
			}
			Value::Lambda(lambda) => write!(f, "{lambda}"),
			Value::Expression(expr) => write!(f, "(( {expr} ))"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn with_value_preserves_span_and_annotations() {
		let span = Span::default();
		let annotations = Annotations { local: true, ..Default::default() };
		let node = Node::new(Value::Int(1)).at(span.clone()).with_annotations(annotations);
		let replaced = node.with_value(Value::Int(2));
		assert_eq!(replaced.span(), Some(&span));
		assert_eq!(replaced.annotations(), annotations);
		assert_eq!(replaced.value(), &Value::Int(2));
	}

	#[test]
	fn annotations_union_is_commutative_per_field() {
		let a = Annotations { local: true, ..Default::default() };
		let b = Annotations { temporary: true, ..Default::default() };
		let merged = a.union(&b);
		assert!(merged.local && merged.temporary);
		assert_eq!(merged, b.union(&a));
	}

	#[test]
	fn is_resolved_checks_transitive_children() {
		let expr = Expression::Nil;
		let leaf = Node::new(Value::Expression(Rc::new(expr)));
		let seq = Node::new(Value::Sequence(vec![Node::from(1i64), leaf]));
		assert!(!seq.is_resolved());
		assert!(Node::from(1i64).is_resolved());
	}

	#[test]
	fn referenced_strips_transient_annotations() {
		let annotations = Annotations { local: true, temporary: true, merged: true, ..Default::default() };
		let node = Node::new(Value::Int(1)).with_annotations(annotations);
		let referenced = node.referenced();
		assert!(!referenced.annotations().local);
		assert!(!referenced.annotations().temporary);
		assert!(referenced.annotations().merged);
	}
}
