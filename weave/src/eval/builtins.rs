//! Builtin functions reachable from dynaml call expressions.
//!
//! The spec's Binding contract (§4.C) exposes "builtin functions" alongside
//! document lookups without enumerating them — the original engine ships a
//! modest fixed library of pure, deterministic string/list helpers alongside
//! the merge-aware builtins. We ground this set in that shape rather than
//! inventing an open-ended stdlib: each function is pure, total on well-typed
//! input, and fails with [`EvalIssue::WrongKind`] otherwise.

use weave_core::{Node, Value};

use crate::error::EvalIssue;

pub(super) fn is_builtin(name: &str) -> bool {
	matches!(name, "length" | "join" | "split" | "trim" | "upper" | "lower" | "keys" | "element")
}

pub(super) fn call(name: &str, args: &[Node]) -> Result<Node, EvalIssue> {
	match name {
		"length" => length(args),
		"join" => join(args),
		"split" => split(args),
		"trim" => trim(args),
		"upper" => case(args, str::to_uppercase),
		"lower" => case(args, str::to_lowercase),
		"keys" => keys(args),
		"element" => element(args),
		other => Err(EvalIssue::Custom(format!("unknown function '{other}'"))),
	}
}

fn arity(args: &[Node], expected: usize) -> Result<(), EvalIssue> {
	if args.len() != expected {
		Err(EvalIssue::Arity { expected, got: args.len() })
	} else {
		Ok(())
	}
}

fn length(args: &[Node]) -> Result<Node, EvalIssue> {
	arity(args, 1)?;
	let n = match args[0].value() {
		Value::String(s) => s.chars().count(),
		Value::Sequence(items) => items.len(),
		Value::Mapping(entries) => entries.len(),
		other => return Err(EvalIssue::WrongKind { expected: "string, list or map", found: other.scalar_kind() }),
	};
	Ok(Node::from(n as i64))
}

fn join(args: &[Node]) -> Result<Node, EvalIssue> {
	arity(args, 2)?;
	let sep = match args[0].value() {
		Value::String(s) => s.as_str(),
		other => return Err(EvalIssue::WrongKind { expected: "string", found: other.scalar_kind() }),
	};
	let items = match args[1].value() {
		Value::Sequence(items) => items,
		other => return Err(EvalIssue::WrongKind { expected: "list", found: other.scalar_kind() }),
	};
	let joined = items.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(sep);
	Ok(Node::from(joined))
}

fn split(args: &[Node]) -> Result<Node, EvalIssue> {
	arity(args, 2)?;
	let sep = match args[0].value() {
		Value::String(s) => s.as_str(),
		other => return Err(EvalIssue::WrongKind { expected: "string", found: other.scalar_kind() }),
	};
	let text = match args[1].value() {
		Value::String(s) => s.as_str(),
		other => return Err(EvalIssue::WrongKind { expected: "string", found: other.scalar_kind() }),
	};
	let parts = text.split(sep).map(Node::from).collect();
	Ok(Node::new(Value::Sequence(parts)))
}

fn trim(args: &[Node]) -> Result<Node, EvalIssue> {
	arity(args, 1)?;
	match args[0].value() {
		Value::String(s) => Ok(Node::from(s.trim().to_string())),
		other => Err(EvalIssue::WrongKind { expected: "string", found: other.scalar_kind() }),
	}
}

fn case(args: &[Node], f: impl Fn(&str) -> String) -> Result<Node, EvalIssue> {
	arity(args, 1)?;
	match args[0].value() {
		Value::String(s) => Ok(Node::from(f(s))),
		other => Err(EvalIssue::WrongKind { expected: "string", found: other.scalar_kind() }),
	}
}

fn keys(args: &[Node]) -> Result<Node, EvalIssue> {
	arity(args, 1)?;
	match args[0].value() {
		Value::Mapping(entries) => Ok(Node::new(Value::Sequence(entries.iter().map(|(k, _)| Node::from(k.clone())).collect()))),
		other => Err(EvalIssue::WrongKind { expected: "map", found: other.scalar_kind() }),
	}
}

fn element(args: &[Node]) -> Result<Node, EvalIssue> {
	arity(args, 2)?;
	let items = match args[0].value() {
		Value::Sequence(items) => items,
		other => return Err(EvalIssue::WrongKind { expected: "list", found: other.scalar_kind() }),
	};
	let index = match args[1].value() {
		Value::Int(n) => *n,
		other => return Err(EvalIssue::WrongKind { expected: "integer", found: other.scalar_kind() }),
	};
	let len = items.len();
	let idx = if index < 0 { index + len as i64 } else { index };
	if idx < 0 || idx >= len as i64 {
		return Err(EvalIssue::IndexOutOfBounds { index, len });
	}
	Ok(items[idx as usize].referenced())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn length_counts_chars_not_bytes() {
		let result = call("length", &[Node::from("hé")]).unwrap();
		assert_eq!(result.value(), &Value::Int(2));
	}

	#[test]
	fn join_renders_each_item() {
		let list = Node::new(Value::Sequence(vec![Node::from(1i64), Node::from(2i64)]));
		let result = call("join", &[Node::from(","), list]).unwrap();
		assert_eq!(result.value(), &Value::String("1,2".to_string()));
	}

	#[test]
	fn split_respects_separator() {
		let result = call("split", &[Node::from(","), Node::from("a,b,c")]).unwrap();
		assert_eq!(
			result.value(),
			&Value::Sequence(vec![Node::from("a"), Node::from("b"), Node::from("c")])
		);
	}

	#[test]
	fn unknown_function_is_an_error() {
		assert!(call("nope", &[]).is_err());
	}
}
