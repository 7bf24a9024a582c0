mod check;
mod clean;
mod commands;
mod deps;
mod query;
mod question;
mod rules;
mod targets;

use crate::error::PynError;
use pyn::graph::Graph;
use pyn::host::Host;
use std::path::Path;

/// Everything a subtool needs: the host, the already-analyzed graph, the
/// path `.pyn.db` lives at, and its own trailing command-line arguments.
pub struct ToolContext<'a> {
	pub host: &'a (dyn Host + Sync),
	pub graph: &'a Graph,
	pub db_path: &'a Path,
	pub args: &'a [String],
}

type ToolFn = fn(&ToolContext) -> Result<i32, PynError>;

static SUBTOOLS: &[(&str, ToolFn)] = &[
	("check", check::main),
	("clean", clean::main),
	("commands", commands::main),
	("deps", deps::main),
	("query", query::main),
	("question", question::main),
	("rules", rules::main),
	("targets", targets::main),
	("list", list),
];

pub fn run_subtool(tool: &str, ctx: &ToolContext) -> Result<i32, PynError> {
	match SUBTOOLS.iter().find(|(name, _)| *name == tool) {
		Some((_, main)) => main(ctx),
		None => Err(PynError::Argument(format!("unknown tool: {:?}", tool))),
	}
}

fn list(ctx: &ToolContext) -> Result<i32, PynError> {
	ctx.host.print_out("subtools:\n");
	for (name, _) in SUBTOOLS {
		ctx.host.print_out(&format!("  {}\n", name));
	}
	Ok(0)
}
