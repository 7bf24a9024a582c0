//! `pyn -t check`: confirms the graph parsed and analyzed cleanly and
//! reports its size. By the time a subtool runs, analysis has already
//! succeeded (or `main` would have exited before dispatch), so this is
//! mostly a sanity report rather than a check in its own right.

use crate::error::PynError;
use crate::subtools::ToolContext;

pub(super) fn main(ctx: &ToolContext) -> Result<i32, PynError> {
	let phony = ctx.graph.node_arena.iter().filter(|n| n.is_phony()).count();
	ctx.host.print_out(&format!(
		"{}: {} nodes ({} phony), {} rules, {} pools\n",
		ctx.graph.root_file.display(),
		ctx.graph.node_arena.len(),
		phony,
		ctx.graph.rule_arena.len(),
		ctx.graph.pools.len(),
	));
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
	fn check_reports_node_and_rule_counts() {
		let host = FakeHost::new();
		host.put_file(
			"build.ninja",
			b"rule cc\n  command = cc $in -o $out\nbuild out: cc in\nbuild alias: phony out\n".to_vec(),
		);
		let graph = Analyzer::new(&host).analyze(Path::new("build.ninja")).unwrap();
		let ctx = ToolContext { host: &host, graph: &graph, db_path: Path::new(".pyn.db"), args: &[] };

		assert_eq!(main(&ctx).unwrap(), 0);
		let out = String::from_utf8(host.stdout()).unwrap();
		assert!(out.contains("build.ninja"));
		assert!(out.contains("1 phony"));
		assert!(out.contains("1 rules"));
	}
}
