//! `pyn -t commands [TARGET...]`: print the expanded command of every
//! non-phony node needed to build the given targets (or the defaults, or
//! the graph's roots), in dependency order.

use crate::error::PynError;
use crate::subtools::ToolContext;

pub(super) fn main(ctx: &ToolContext) -> Result<i32, PynError> {
	let graph = ctx.graph;
	let targets = if !ctx.args.is_empty() {
		graph.resolve_targets(ctx.args)?
	} else if !graph.defaults.is_empty() {
		graph.resolve_targets(&graph.defaults)?
	} else {
		graph.roots()
	};

	let order = graph.tsort(&graph.closure(&targets))?;
	for id in order {
		let node = graph.node(id);
		if node.is_phony() {
			continue;
		}
		if let Some(command) = graph.commands.get(&node.name) {
			ctx.host.print_out(&format!("{}\n", command));
		}
	}
	Ok(0)
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::subtools::ToolContext;
	use pyn::analyzer::Analyzer;
	use pyn::host::FakeHost;
	use std::path::Path;

	#[test]
	fn commands_prints_deps_before_dependents() {
		let host = FakeHost::new();
		host.put_file(
			"build.ninja",
			b"rule cat\n  command = cat $in > $out\nbuild ab: cat a b\nbuild cd: cat c d\nbuild abcd: cat ab cd\n"
				.to_vec(),
		);
		let graph = Analyzer::new(&host).analyze(Path::new("build.ninja")).unwrap();
		let ctx = ToolContext { host: &host, graph: &graph, db_path: Path::new(".pyn.db"), args: &[] };
		main(&ctx).unwrap();
		let out = String::from_utf8(host.stdout()).unwrap();
		let ab = out.find("cat a b > ab").unwrap();
		let abcd = out.find("cat ab cd > abcd").unwrap();
		assert!(ab < abcd);
	}
}
