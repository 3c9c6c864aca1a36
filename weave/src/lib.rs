//! Flow engine: stub merging and fixed-point dynaml evaluation over a
//! document tree built on [`weave_core`]'s Node model and grammar.
//!
//! This crate owns components C-G of the design: the read-only [`Binding`]
//! lookup context, the dynaml [`eval`]uator, the [`flow`] engine that drives
//! both to a fixed point, [`merge`]/[`cleanup`] (the structural halves of the
//! merge/override protocol and post-pass pruning), and the ambient
//! [`diagnostics`]/[`error`] stack. Surface document parsing (YAML/JSON) and
//! serialization are deliberately out of scope — see [`NodeSource`].

pub mod binding;
pub mod cleanup;
pub mod diagnostics;
pub mod error;
pub mod eval;
pub mod flow;
pub mod merge;

pub use binding::Binding;
pub use diagnostics::{Clock, Diagnostics, NullDiagnostics, PrintDiagnostics, SystemClock};
pub use error::{Classified, EvalIssue, FlowError, Mark, LEGEND};
pub use flow::{apply, apply_with, cascade, cascade_with, prepare_stubs, prepare_stubs_with, reset_unresolved, FlowOptions};

use weave_core::Node;

/// The Node provider contract the core consumes but never implements (spec
/// §1 "deliberately out of scope", §6 "Node provider contract"). A caller
/// wires up a real document format (YAML, JSON, ...) behind this trait; this
/// crate's own tests and demo binary build `Node` trees directly instead of
/// going through a `NodeSource`.
pub trait NodeSource {
	type Error: std::error::Error;

	/// Parses a single document.
	fn parse(&self, bytes: &[u8]) -> Result<Node, Self::Error>;

	/// Parses a multi-document stream (e.g. `---`-separated YAML).
	fn parse_multi(&self, bytes: &[u8]) -> Result<Vec<Node>, Self::Error>;

	/// Serializes a fully resolved (or partial-mode reserialized) `Node`.
	fn marshal(&self, node: &Node) -> Result<Vec<u8>, Self::Error>;
}
