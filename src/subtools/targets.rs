//! `pyn -t targets {rule [NAME] | all | depth [N]}`.

use crate::error::PynError;
use crate::subtools::ToolContext;
use pyn::graph::{Graph, NodeId};
use pyn::host::Host;
use std::collections::BTreeSet;

pub(super) fn main(ctx: &ToolContext) -> Result<i32, PynError> {
	match ctx.args.first().map(String::as_str) {
		Some("rule") => rule(ctx, ctx.args.get(1).map(String::as_str)),
		Some("all") => all(ctx),
		Some("depth") => {
			let depth = match ctx.args.get(1) {
				Some(n) => n
					.parse::<usize>()
					.map_err(|_| PynError::Argument(format!("targets depth: not a number: {:?}", n)))?,
				None => 1,
			};
			Ok(depth_tree(ctx, depth))
		}
		None => Ok(depth_tree(ctx, 1)),
		Some(other) => Err(PynError::Argument(format!("targets: unknown mode: {:?}", other))),
	}
}

fn rule(ctx: &ToolContext, name: Option<&str>) -> Result<i32, PynError> {
	match name {
		None => {
			let mut names: BTreeSet<&str> = BTreeSet::new();
			for node in &ctx.graph.node_arena {
				if !node.is_phony() {
					names.insert(node.rule_name.as_str());
				}
			}
			for name in names {
				ctx.host.print_out(&format!("{}\n", name));
			}
		}
		Some(name) => {
			for node in &ctx.graph.node_arena {
				if node.rule_name == name {
					for output in &node.outputs {
						ctx.host.print_out(&format!("{}\n", output));
					}
				}
			}
		}
	}
	Ok(0)
}

fn all(ctx: &ToolContext) -> Result<i32, PynError> {
	for node in &ctx.graph.node_arena {
		for output in &node.outputs {
			ctx.host.print_out(&format!("{}: {}\n", output, node.rule_name));
		}
	}
	Ok(0)
}

/// Print a dependency tree rooted at the graph's roots, indented two spaces
/// per level. `depth` of `0` means unlimited.
fn depth_tree(ctx: &ToolContext, depth: usize) -> i32 {
	let mut seen: BTreeSet<NodeId> = BTreeSet::new();
	for root in ctx.graph.roots() {
		print_node(ctx.graph, ctx.host, root, 0, depth, &mut seen);
	}
	0
}

fn print_node(
	graph: &Graph,
	host: &dyn Host,
	id: NodeId,
	level: usize,
	depth: usize,
	seen: &mut BTreeSet<NodeId>,
) {
	let node = graph.node(id);
	host.print_out(&format!("{}{}\n", "  ".repeat(level), node.name));
	if depth != 0 && level + 1 >= depth {
		return;
	}
	if !seen.insert(id) {
		return;
	}
	for dep in node.deps() {
		if let Some(dep_id) = graph.lookup_node(dep) {
			print_node(graph, host, dep_id, level + 1, depth, seen);
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::subtools::ToolContext;
	use pyn::analyzer::Analyzer;
	use pyn::host::FakeHost;
	use std::path::Path;

	fn ctx<'a>(host: &'a FakeHost, graph: &'a Graph, args: &'a [String]) -> ToolContext<'a> {
		ToolContext { host, graph, db_path: Path::new(".pyn.db"), args }
	}

	const BUILD_NINJA: &[u8] =
		b"rule cc\n  command = cc $in -o $out\nrule ar\n  command = ar $out $in\nbuild a.o: cc a.c\nbuild b.o: cc b.c\nbuild lib.a: ar a.o b.o\n";

	#[test]
	fn targets_rule_with_no_name_lists_used_rules() {
		let host = FakeHost::new();
		host.put_file("build.ninja", BUILD_NINJA.to_vec());
		let graph = Analyzer::new(&host).analyze(Path::new("build.ninja")).unwrap();
		let args = vec!["rule".to_string()];
		let c = ctx(&host, &graph, &args);

		assert_eq!(main(&c).unwrap(), 0);
		assert_eq!(String::from_utf8(host.stdout()).unwrap(), "ar\ncc\n");
	}

	#[test]
	fn targets_rule_with_name_lists_its_outputs() {
		let host = FakeHost::new();
		host.put_file("build.ninja", BUILD_NINJA.to_vec());
		let graph = Analyzer::new(&host).analyze(Path::new("build.ninja")).unwrap();
		let args = vec!["rule".to_string(), "cc".to_string()];
		let c = ctx(&host, &graph, &args);

		assert_eq!(main(&c).unwrap(), 0);
		assert_eq!(String::from_utf8(host.stdout()).unwrap(), "a.o\nb.o\n");
	}

	#[test]
	fn targets_all_lists_every_output_with_its_rule() {
		let host = FakeHost::new();
		host.put_file("build.ninja", BUILD_NINJA.to_vec());
		let graph = Analyzer::new(&host).analyze(Path::new("build.ninja")).unwrap();
		let args = vec!["all".to_string()];
		let c = ctx(&host, &graph, &args);

		assert_eq!(main(&c).unwrap(), 0);
		let out = String::from_utf8(host.stdout()).unwrap();
		assert!(out.contains("a.o: cc\n"));
		assert!(out.contains("lib.a: ar\n"));
	}

	#[test]
	fn targets_depth_tree_indents_by_level_and_stops_at_depth() {
		let host = FakeHost::new();
		host.put_file("build.ninja", BUILD_NINJA.to_vec());
		let graph = Analyzer::new(&host).analyze(Path::new("build.ninja")).unwrap();
		let args = vec!["depth".to_string(), "2".to_string()];
		let c = ctx(&host, &graph, &args);

		assert_eq!(main(&c).unwrap(), 0);
		let out = String::from_utf8(host.stdout()).unwrap();
		assert!(out.starts_with("lib.a\n"));
		assert!(out.contains("  a.o\n"));
		assert!(!out.contains("a.c"));
	}

	#[test]
	fn targets_rejects_unknown_mode() {
		let host = FakeHost::new();
		host.put_file("build.ninja", BUILD_NINJA.to_vec());
		let graph = Analyzer::new(&host).analyze(Path::new("build.ninja")).unwrap();
		let args = vec!["bogus".to_string()];
		let c = ctx(&host, &graph, &args);

		assert!(main(&c).is_err());
	}
}
