//! Automatic structural merge between a template and its stub chain (spec
//! §4.D "Merge semantics", scenario 4 in spec §8 — a plain sequence-of-maps
//! position merges by key with no `(( merge ))` expression in sight).
//!
//! This runs once, before the first flow pass, folding the prepared stub
//! chain into the template tree. It only ever recurses into `Mapping`/
//! `Sequence` values; a position whose template value is itself an
//! unresolved `Expression` is left untouched; the explicit `(( merge ))`
//! expression ([`crate::eval::evaluate`] dispatching to `eval_meta::eval_merge`)
//! owns leaf-level stub fetches for those positions instead. Scalar and
//! non-keyed sequence conflicts go to the stub, unless the template node
//! carries the `preferred` annotation (`(( prefer ... ))`).

use weave_core::{Node, Value};

/// Folds `stubs` into `template`, stub-by-stub, in order.
pub fn merge_tree(template: &Node, stubs: &[Node], key_name: &str) -> Node {
	stubs.iter().fold(template.clone(), |acc, stub| merge_pair(&acc, stub, key_name))
}

fn merge_pair(template: &Node, stub: &Node, key_name: &str) -> Node {
	if template.value().is_expression() {
		return template.clone();
	}

	let annotations = template.annotations().union(&stub.annotations());

	match (template.value(), stub.value()) {
		(Value::Mapping(t_entries), Value::Mapping(s_entries)) => {
			let mut merged = Vec::with_capacity(t_entries.len());
			for (key, t_value) in t_entries {
				let value = match s_entries.iter().find(|(k, _)| k == key) {
					Some((_, s_value)) => merge_pair(t_value, s_value, key_name),
					None => t_value.clone(),
				};
				merged.push((key.clone(), value));
			}
			for (key, s_value) in s_entries {
				if !t_entries.iter().any(|(k, _)| k == key) {
					merged.push((key.clone(), s_value.referenced()));
				}
			}
			Node::new(Value::Mapping(merged)).with_annotations(annotations)
		}
		(Value::Sequence(t_items), Value::Sequence(s_items))
			if is_keyed(t_items, key_name) && is_keyed(s_items, key_name) =>
		{
			Node::new(Value::Sequence(merge_keyed(t_items, s_items, key_name))).with_annotations(annotations)
		}
		(Value::Sequence(_), Value::Sequence(_)) => {
			if template.annotations().preferred {
				template.clone()
			} else {
				stub.referenced()
			}
		}
		_ => {
			if template.annotations().preferred {
				template.clone()
			} else {
				stub.referenced()
			}
		}
	}
}

fn key_of<'a>(node: &'a Node, key_name: &str) -> Option<&'a str> {
	node.get(key_name)?.as_str()
}

fn is_keyed(items: &[Node], key_name: &str) -> bool {
	!items.is_empty() && items.iter().all(|item| matches!(item.value(), Value::Mapping(_)) && key_of(item, key_name).is_some())
}

/// Merges two sequences of maps keyed by `key_name`: template order first,
/// recursively merging entries present in both, followed by stub-only
/// entries in the stub's order (spec §4.D, §8 scenario 4).
fn merge_keyed(t_items: &[Node], s_items: &[Node], key_name: &str) -> Vec<Node> {
	let mut merged = Vec::with_capacity(t_items.len());
	for t_item in t_items {
		let t_key = key_of(t_item, key_name);
		match s_items.iter().find(|s_item| key_of(s_item, key_name) == t_key) {
			Some(s_item) => merged.push(merge_pair(t_item, s_item, key_name)),
			None => merged.push(t_item.clone()),
		}
	}
	for s_item in s_items {
		let s_key = key_of(s_item, key_name);
		if !t_items.iter().any(|t_item| key_of(t_item, key_name) == s_key) {
			merged.push(s_item.referenced());
		}
	}
	merged
}

#[cfg(test)]
mod tests {
	use super::*;
	use weave_core::Annotations;

	fn mapping(entries: Vec<(&str, Node)>) -> Node {
		Node::new(Value::Mapping(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()))
	}

	fn record(name: &str, v: i64) -> Node {
		mapping(vec![("name", Node::from(name)), ("v", Node::from(v))])
	}

	#[test]
	fn mapping_union_recurses_into_common_keys() {
		let template = mapping(vec![("a", Node::from(1i64))]);
		let stub = mapping(vec![("a", Node::from(2i64)), ("b", Node::from(3i64))]);
		let merged = merge_tree(&template, std::slice::from_ref(&stub), "name");
		assert_eq!(merged.get("a").unwrap().value(), &Value::Int(2));
		assert_eq!(merged.get("b").unwrap().value(), &Value::Int(3));
	}

	#[test]
	fn prefer_annotation_keeps_the_template_value() {
		let preferred = Node::from(1i64).with_annotations(Annotations { preferred: true, ..Default::default() });
		let template = mapping(vec![("a", preferred)]);
		let stub = mapping(vec![("a", Node::from(2i64))]);
		let merged = merge_tree(&template, std::slice::from_ref(&stub), "name");
		assert_eq!(merged.get("a").unwrap().value(), &Value::Int(1));
	}

	#[test]
	fn keyed_sequence_merge_preserves_template_order_then_stub_only() {
		let template = Node::new(Value::Sequence(vec![record("a", 1)]));
		let stub = Node::new(Value::Sequence(vec![record("a", 2), record("b", 9)]));
		let merged = merge_tree(&template, std::slice::from_ref(&stub), "name");
		let items = merged.as_sequence().unwrap();
		assert_eq!(items.len(), 2);
		assert_eq!(items[0].get("v").unwrap().value(), &Value::Int(2));
		assert_eq!(items[1].get("name").unwrap().value(), &Value::String("b".to_string()));
	}

	#[test]
	fn expression_positions_are_left_untouched() {
		let expr_node = Node::new(Value::Expression(std::rc::Rc::new(weave_core::Expression::Nil)));
		let template = mapping(vec![("x", expr_node.clone())]);
		let stub = mapping(vec![("x", Node::from(7i64))]);
		let merged = merge_tree(&template, std::slice::from_ref(&stub), "name");
		assert_eq!(merged.get("x").unwrap().value(), expr_node.value());
	}
}
