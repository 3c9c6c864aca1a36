//! Evaluation and flow errors (spec §7 taxonomy).
//!
//! `EvalIssue` is the per-evaluation failure reason; it renders the exact
//! CLI-visible strings the merge/override protocol requires. `FlowError`
//! wraps the classified report a non-partial flow fails with: one
//! `(path, mark, issue)` triple per node still unresolved at termination.

use std::fmt;

use thiserror::Error;

/// Why a single `evaluate` call failed.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum EvalIssue {
	#[error("'{path}' not found")]
	NotFound { path: String },
	#[error("division by zero")]
	DivisionByZero,
	#[error("index {index} out of bounds for a {len}-element list")]
	IndexOutOfBounds { index: i64, len: usize },
	#[error("cannot {op} a {lhs} and a {rhs}")]
	TypeMismatch { op: &'static str, lhs: &'static str, rhs: &'static str },
	#[error("expected a {expected}, found a {found}")]
	WrongKind { expected: &'static str, found: &'static str },
	#[error("merge required at '{path}' but no stub provided a value")]
	MergeRequired { path: String },
	#[error("timeout")]
	Timeout,
	#[error("wrong number of arguments: expected {expected}, got {got}")]
	Arity { expected: usize, got: usize },
	#[error("{0}")]
	Custom(String),
}

/// Which of the three termination marks a node that never resolved gets
/// assigned: local error, cycle participant, or transitively dependent on
/// one of the other two (spec §4.E, §7).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Mark {
	Local,
	Cycle,
	Transitive,
}

impl fmt::Display for Mark {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let symbol = match self {
			Mark::Local => '*',
			Mark::Cycle => '@',
			Mark::Transitive => '-',
		};
		write!(f, "{symbol}")
	}
}

/// The legend printed alongside a classified report at the CLI boundary.
pub const LEGEND: &str = "* - local evaluation error\n@ - unresolved reference cycle\n- - depends on a failed node";

/// One unresolved node at flow termination: its dotted path, its mark, and
/// the issue that earned it that mark.
#[derive(Clone, Debug, PartialEq)]
pub struct Classified {
	pub path: String,
	pub mark: Mark,
	pub issue: EvalIssue,
}

/// Returned by `apply`/`cascade` when a non-partial flow terminates with
/// unresolved nodes remaining.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("flow failed to resolve {} node(s)", .report.len())]
pub struct FlowError {
	pub report: Vec<Classified>,
}

impl FlowError {
	pub fn render(&self) -> String {
		let mut out = String::new();
		for entry in &self.report {
			out.push_str(&format!("{} {}: {}\n", entry.mark, entry.path, entry.issue));
		}
		out.push_str(LEGEND);
		out
	}
}
