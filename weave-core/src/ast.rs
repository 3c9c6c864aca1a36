//! The dynaml abstract syntax tree.
//!
//! `Expression` is a closed sum type: one variant per grammar production in
//! spec §3/§4.B. Each variant carries only its syntactic parts — no
//! evaluation state lives here, that belongs to the evaluator in the `weave`
//! crate.

use std::fmt;
use std::rc::Rc;

/// `==`, `!=`, `<`, `<=`, `>`, `>=`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CompareOp {
	Eq,
	Ne,
	Lt,
	Le,
	Gt,
	Ge,
}

impl fmt::Display for CompareOp {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			CompareOp::Eq => "==",
			CompareOp::Ne => "!=",
			CompareOp::Lt => "<",
			CompareOp::Le => "<=",
			CompareOp::Gt => ">",
			CompareOp::Ge => ">=",
		};
		write!(f, "{s}")
	}
}

/// One segment of a [`Expression::Reference`] path.
///
/// The first segment of a reference is empty when the path is absolute
/// (`.foo.bar`, anchored at the root of the current document).
pub type PathSegment = String;

/// The flavor of a [`Expression::Mapping`] comprehension — `list->list`
/// (`map`), `list->list-filter` (`select` over a list),
/// `map->list` (`map` over a map's values), `map->map` (`map[key]`), or
/// `map->map-filter` (`select[key]`).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MappingKind {
	ListToList,
	ListToListFilter,
	MapToList,
	MapToMap,
	MapToMapFilter,
}

/// `(( merge ))` and its modifiers.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MergeOptions {
	/// Explicit stub lookup path; empty means "use the current document path".
	pub path: Vec<PathSegment>,
	/// True when `path` differs from the node's natural position (`redirect`).
	pub redirect: bool,
	/// `merge replace`: take the stub value wholesale, skipping deep merge.
	pub replace: bool,
	/// `merge required`: fail if no stub provides a value at this path.
	pub required: bool,
	/// `merge on <key>`: the field used to key sequence-of-map merges.
	pub key_name: Option<String>,
	/// `merge none`: disables merging for this node entirely.
	pub none: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LambdaParam {
	pub name: String,
	/// The last parameter may be marked variadic (`...name`), collecting
	/// excess call arguments into a list.
	pub variadic: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Lambda {
	pub params: Vec<LambdaParam>,
	pub body: Rc<Expression>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expression {
	// --- Literals ---
	Integer(i64),
	Float(f64),
	StringLit(String),
	Boolean(bool),
	Nil,
	Undefined,
	Ip([u8; 4]),
	/// The `(( ~ ))` default-value placeholder.
	Default,

	/// `foo.bar`, `.foo.bar` (absolute), `[0]`.
	Reference(Vec<PathSegment>),

	// --- Arithmetic ---
	Addition(Box<Expression>, Box<Expression>),
	Subtraction(Box<Expression>, Box<Expression>),
	Multiplication(Box<Expression>, Box<Expression>),
	Division(Box<Expression>, Box<Expression>),
	Modulo(Box<Expression>, Box<Expression>),

	// --- Logical ---
	LogOr(Box<Expression>, Box<Expression>),
	LogAnd(Box<Expression>, Box<Expression>),
	Not(Box<Expression>),
	/// `a || b`: value fallback, not boolean-or.
	Or(Box<Expression>, Box<Expression>),
	/// `a || b` that additionally falls back on evaluation failure, not just nil.
	ValidOr(Box<Expression>, Box<Expression>),
	Comparison(CompareOp, Box<Expression>, Box<Expression>),
	Conditional {
		condition: Box<Expression>,
		when_true: Box<Expression>,
		when_false: Box<Expression>,
	},

	// --- Structural ---
	Concatenation(Box<Expression>, Box<Expression>),
	List(Vec<Expression>),
	CreateMap(Vec<(String, Expression)>),
	/// `scope(a: 1, b: 2)(body)` — a body evaluated with extra local bindings.
	Scope {
		assignments: Vec<(String, Expression)>,
		body: Box<Expression>,
	},
	Grouped(Box<Expression>),
	Slice {
		base: Box<Expression>,
		from: Option<Box<Expression>>,
		to: Option<Box<Expression>>,
	},
	Range(Box<Expression>, Box<Expression>),
	/// `a.[*]` — project every element of a list expression.
	Projection(Box<Expression>),
	/// The implicit `*` placeholder inside a projection body.
	ProjectionValue,

	// --- Call / lambda ---
	Call {
		function: Box<Expression>,
		args: Vec<Expression>,
	},
	LambdaExpr(Lambda),
	/// A named reference to a lambda bound elsewhere (e.g. a builtin name).
	LambdaRef(String),
	/// `list.(idx)` — a computed, not literal, index.
	DynamicExpr(Box<Expression>, Box<Expression>),
	/// `a.b.c` chained field access, distinct from [`Expression::Reference`]
	/// when the base is itself an arbitrary expression rather than a path root.
	QualifiedExpr(Box<Expression>, String),
	/// `sum[list|init,lambda]`.
	Sum {
		list: Box<Expression>,
		init: Box<Expression>,
		lambda: Lambda,
	},
	Mapping {
		kind: MappingKind,
		source: Box<Expression>,
		lambda: Lambda,
	},
	Catch(Box<Expression>, Lambda),
	Sync {
		expr: Box<Expression>,
		cond: Lambda,
		value: Box<Expression>,
		timeout: Option<Box<Expression>>,
	},

	// --- Meta ---
	Merge(MergeOptions),
	Prefer(Box<Expression>),
	/// `(( auto ))` — infer a value from context (e.g. autogenerated index).
	Auto,
	/// `(( marker ))` — a bare marker annotation with no value.
	Marker(String),
	/// `(( marker-expr:value ))` — a marker annotation attached to a value.
	MarkerExpression(String, Box<Expression>),
	/// `(( foo.bar = 1 ))` inside a `scope`/lambda assignment list.
	Substitution(Box<Expression>),
	Assignment(Vec<PathSegment>, Box<Expression>),
}

impl fmt::Display for Expression {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Expression::Integer(n) => write!(f, "{n}"),
			Expression::Float(n) => write!(f, "{n}"),
			Expression::StringLit(s) => write!(f, "{s:?}"),
			Expression::Boolean(b) => write!(f, "{b}"),
			Expression::Nil => write!(f, "nil"),
			Expression::Undefined => write!(f, "undefined"),
			Expression::Ip(octets) => write!(f, "{}.{}.{}.{}", octets[0], octets[1], octets[2], octets[3]),
			Expression::Default => write!(f, "~"),
			Expression::Reference(path) => write!(f, "{}", path.join(".")),
			Expression::Addition(a, b) => write!(f, "{a} + {b}"),
			Expression::Subtraction(a, b) => write!(f, "{a} - {b}"),
			Expression::Multiplication(a, b) => write!(f, "{a} * {b}"),
			Expression::Division(a, b) => write!(f, "{a} / {b}"),
			Expression::Modulo(a, b) => write!(f, "{a} % {b}"),
			Expression::LogOr(a, b) => write!(f, "{a} or {b}"),
			Expression::LogAnd(a, b) => write!(f, "{a} and {b}"),
			Expression::Not(a) => write!(f, "!{a}"),
			Expression::Or(a, b) => write!(f, "{a} || {b}"),
			Expression::ValidOr(a, b) => write!(f, "{a} orelse {b}"),
			Expression::Comparison(op, a, b) => write!(f, "{a} {op} {b}"),
			Expression::Conditional { condition, when_true, when_false } => {
				write!(f, "{condition} ? {when_true} : {when_false}")
			}
			Expression::Concatenation(a, b) => write!(f, "{a} {b}"),
			Expression::List(items) => {
				write!(f, "[")?;
				for (i, it) in items.iter().enumerate() {
					if i > 0 {
						write!(f, ", ")?;
					}
					write!(f, "{it}")?;
				}
				write!(f, "]")
			}
			Expression::CreateMap(entries) => {
				write!(f, "{{")?;
				for (i, (k, v)) in entries.iter().enumerate() {
					if i > 0 {
						write!(f, ", ")?;
					}
					write!(f, "{k:?} = {v}")?;
				}
				write!(f, "}}")
			}
			Expression::Scope { assignments, body } => {
				write!(f, "scope(")?;
				for (i, (k, v)) in assignments.iter().enumerate() {
					if i > 0 {
						write!(f, ", ")?;
					}
					write!(f, "{k} = {v}")?;
				}
				write!(f, ")({body})")
			}
			Expression::Grouped(inner) => write!(f, "({inner})"),
			Expression::Slice { base, from, to } => {
				write!(f, "{base}[")?;
				if let Some(from) = from {
					write!(f, "{from}")?;
				}
				write!(f, "..")?;
				if let Some(to) = to {
					write!(f, "{to}")?;
				}
				write!(f, "]")
			}
			Expression::Range(from, to) => write!(f, "{from}..{to}"),
			Expression::Projection(base) => write!(f, "{base}.[*]"),
			Expression::ProjectionValue => write!(f, "*"),
			Expression::Call { function, args } => {
				write!(f, "{function}(")?;
				for (i, a) in args.iter().enumerate() {
					if i > 0 {
						write!(f, ", ")?;
					}
					write!(f, "{a}")?;
				}
				write!(f, ")")
			}
			Expression::LambdaExpr(lambda) => write!(f, "{lambda}"),
			Expression::LambdaRef(name) => write!(f, "{name}"),
			Expression::DynamicExpr(base, index) => write!(f, "{base}.({index})"),
			Expression::QualifiedExpr(base, field) => write!(f, "{base}.{field}"),
			Expression::Sum { list, init, lambda } => write!(f, "sum[{list}|{init},{lambda}]"),
			Expression::Mapping { kind, source, lambda } => {
				let name = match kind {
					MappingKind::ListToList => "map",
					MappingKind::ListToListFilter => "select",
					MappingKind::MapToList => "map",
					MappingKind::MapToMap => "map",
					MappingKind::MapToMapFilter => "select",
				};
				write!(f, "{name}[{source}|{lambda}]")
			}
			Expression::Catch(body, lambda) => write!(f, "catch[{body}|{lambda}]"),
			Expression::Sync { expr, cond, value, timeout } => {
				write!(f, "sync[{expr}|{cond},{value}")?;
				if let Some(timeout) = timeout {
					write!(f, ",{timeout}")?;
				}
				write!(f, "]")
			}
			Expression::Merge(opts) => {
				write!(f, "merge")?;
				if opts.none {
					write!(f, " none")?;
				}
				if opts.replace {
					write!(f, " replace")?;
				}
				if opts.required {
					write!(f, " required")?;
				}
				if let Some(key) = &opts.key_name {
					write!(f, " on {key}")?;
				}
				if !opts.path.is_empty() {
					write!(f, " {}", opts.path.join("."))?;
				}
				Ok(())
			}
			Expression::Prefer(inner) => write!(f, "prefer {inner}"),
			Expression::Auto => write!(f, "auto"),
			Expression::Marker(name) => write!(f, "{name}"),
			Expression::MarkerExpression(name, value) => write!(f, "{name}:{value}"),
			Expression::Substitution(inner) => write!(f, "{inner}"),
			Expression::Assignment(path, value) => write!(f, "{} = {value}", path.join(".")),
		}
	}
}

impl fmt::Display for Lambda {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "|")?;
		for (i, p) in self.params.iter().enumerate() {
			if i > 0 {
				write!(f, ",")?;
			}
			if p.variadic {
				write!(f, "...")?;
			}
			write!(f, "{}", p.name)?;
		}
		write!(f, "|->{}", self.body)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reference_round_trips_through_display() {
		let expr = Expression::Reference(vec!["".to_string(), "foo".to_string(), "bar".to_string()]);
		assert_eq!(expr.to_string(), ".foo.bar");
	}

	#[test]
	fn arithmetic_renders_infix() {
		let expr = Expression::Addition(Box::new(Expression::Integer(1)), Box::new(Expression::Integer(2)));
		assert_eq!(expr.to_string(), "1 + 2");
	}

	#[test]
	fn merge_renders_modifiers_in_order() {
		let opts = MergeOptions {
			replace: true,
			required: true,
			key_name: Some("id".to_string()),
			..Default::default()
		};
		assert_eq!(Expression::Merge(opts).to_string(), "merge replace required on id");
	}
}
