//! A thin demo CLI: flows a single dynaml expression (or, with no argument,
//! a small built-in document) against an empty stub chain and prints the
//! resolved document. Surface parsing of a real document format is out of
//! scope for the core crate (spec §1), so this binary only ever builds
//! `Node` trees directly or from a single embedded expression string.

use std::env;
use std::rc::Rc;

use anyhow::Context;

use weave::flow::{apply_with, FlowOptions};
use weave::{Diagnostics, NullDiagnostics, PrintDiagnostics, SystemClock};
use weave_core::{parser, Expression, Node, Value};

fn demo_document() -> Node {
	Node::new(Value::Mapping(vec![
		("foo".to_string(), Node::new(Value::Expression(Rc::new(Expression::Reference(vec!["bar".to_string()]))))),
		("bar".to_string(), Node::from(42i64)),
	]))
}

fn main() -> anyhow::Result<()> {
	let mut args: Vec<String> = env::args().skip(1).collect();
	let trace = args.iter().position(|a| a == "--trace").map(|i| args.remove(i)).is_some();

	let diagnostics: Rc<dyn Diagnostics> = if trace { Rc::new(PrintDiagnostics) } else { Rc::new(NullDiagnostics) };
	let clock = Rc::new(SystemClock);
	let options = FlowOptions::default();

	let document = match args.first() {
		Some(source) => {
			let expr = parser::parse(source, "<arg>", None).context("parsing the dynaml expression argument")?;
			Node::new(Value::Mapping(vec![("result".to_string(), Node::new(Value::Expression(Rc::new(expr))))]))
		}
		None => demo_document(),
	};

	match apply_with(&document, &[], &options, diagnostics, clock) {
		Ok(resolved) => {
			println!("{resolved}");
			Ok(())
		}
		Err(err) => {
			eprintln!("{}", err.render());
			std::process::exit(1)
		}
	}
}
