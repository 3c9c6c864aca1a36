//! Literal expressions: these never depend on a binding and always resolve
//! immediately.

use weave_core::{Expression, Node, Value};

use super::Outcome;

pub(super) fn eval_literal(expr: &Expression) -> Outcome {
	let value = match expr {
		Expression::Integer(n) => Value::Int(*n),
		Expression::Float(n) => Value::Float(*n),
		Expression::StringLit(s) => Value::String(s.clone()),
		Expression::Boolean(b) => Value::Bool(*b),
		Expression::Nil => Value::Null,
		// `~~` renders as null in the result tree; the distinction from `nil`
		// only matters to `||`'s fallback rule (spec §4.D), handled there.
		Expression::Undefined => Value::Null,
		Expression::Ip(octets) => Value::String(format!("{}.{}.{}.{}", octets[0], octets[1], octets[2], octets[3])),
		// `(( ~ ))` standing alone (not consumed by `||`) resolves to null.
		Expression::Default => Value::Null,
		_ => unreachable!("eval_literal called with a non-literal expression"),
	};
	Outcome::Resolved(Node::new(value))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn integer_resolves_to_int() {
		match eval_literal(&Expression::Integer(7)) {
			Outcome::Resolved(node) => assert_eq!(node.value(), &Value::Int(7)),
			_ => panic!("expected Resolved"),
		}
	}

	#[test]
	fn ip_renders_as_dotted_string() {
		match eval_literal(&Expression::Ip([10, 0, 0, 1])) {
			Outcome::Resolved(node) => assert_eq!(node.value(), &Value::String("10.0.0.1".to_string())),
			_ => panic!("expected Resolved"),
		}
	}
}
