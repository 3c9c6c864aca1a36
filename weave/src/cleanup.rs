//! Post-pass tree pruning (spec §4.F): a structural walk that, given a
//! predicate on `Node`s, produces a new tree omitting any mapping entry or
//! sequence element for which the predicate holds, preserving order and
//! leaving non-matching subtrees verbatim.

use weave_core::{Node, Value};

/// Removes every mapping entry or sequence element for which `predicate`
/// holds, recursing into everything kept.
pub fn cleanup<P: Fn(&Node) -> bool>(node: &Node, predicate: &P) -> Node {
	match node.value() {
		Value::Mapping(entries) => {
			let filtered = entries
				.iter()
				.filter(|(_, value)| !predicate(value))
				.map(|(key, value)| (key.clone(), cleanup(value, predicate)))
				.collect();
			node.with_value(Value::Mapping(filtered))
		}
		Value::Sequence(items) => {
			let filtered = items
				.iter()
				.filter(|item| !predicate(item))
				.map(|item| cleanup(item, predicate))
				.collect();
			node.with_value(Value::Sequence(filtered))
		}
		_ => node.clone(),
	}
}

/// Used during stub preparation: strips nodes that must not survive past the
/// stub that introduced them (spec §4.E "`local`-annotated nodes are
/// removed before it is exposed to earlier stubs").
pub fn local(node: &Node) -> bool {
	node.annotations().local
}

/// Used after the final `apply`: strips both `temporary` and `local` nodes
/// from the output document.
pub fn temporary_or_local(node: &Node) -> bool {
	let annotations = node.annotations();
	annotations.temporary || annotations.local
}

#[cfg(test)]
mod tests {
	use super::*;

	fn mapping(entries: Vec<(&str, Node)>) -> Node {
		Node::new(Value::Mapping(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()))
	}

	#[test]
	fn cleanup_drops_matching_mapping_entries() {
		use weave_core::Annotations;
		let local_node = Node::from(1i64).with_annotations(Annotations { local: true, ..Default::default() });
		let tree = mapping(vec![("a", local_node), ("b", Node::from(2i64))]);
		let cleaned = cleanup(&tree, &local);
		let entries = cleaned.as_mapping().unwrap();
		assert_eq!(entries.len(), 1);
		assert_eq!(entries[0].0, "b");
	}

	#[test]
	fn cleanup_preserves_order_and_recurses_into_sequences() {
		use weave_core::Annotations;
		let temp = Node::from(9i64).with_annotations(Annotations { temporary: true, ..Default::default() });
		let tree = Node::new(Value::Sequence(vec![Node::from(1i64), temp, Node::from(3i64)]));
		let cleaned = cleanup(&tree, &temporary_or_local);
		assert_eq!(cleaned.as_sequence().unwrap().len(), 2);
		assert_eq!(cleaned.as_sequence().unwrap()[1].value(), &Value::Int(3));
	}

	#[test]
	fn cleanup_leaves_scalars_untouched() {
		let scalar = Node::from(42i64);
		assert_eq!(cleanup(&scalar, &local).value(), &Value::Int(42));
	}
}
