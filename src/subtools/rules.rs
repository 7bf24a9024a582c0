//! `pyn -t rules`: list the rule names actually referenced by the graph,
//! sorted. Unlike ninja itself, this only reports rules that are used by
//! at least one node, not every `rule` block parsed from the file.

use crate::error::PynError;
use crate::subtools::ToolContext;
use std::collections::BTreeSet;

pub(super) fn main(ctx: &ToolContext) -> Result<i32, PynError> {
	let mut names: BTreeSet<&str> = BTreeSet::new();
	for node in &ctx.graph.node_arena {
		names.insert(node.rule_name.as_str());
	}
	for name in names {
		ctx.host.print_out(&format!("{}\n", name));
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
	fn rules_lists_referenced_rules_sorted_and_deduped() {
		let host = FakeHost::new();
		host.put_file(
			"build.ninja",
			b"rule cc\n  command = cc $in -o $out\nrule ar\n  command = ar $out $in\nbuild a.o: cc a.c\nbuild b.o: cc b.c\nbuild lib.a: ar a.o b.o\n"
				.to_vec(),
		);
		let graph = Analyzer::new(&host).analyze(Path::new("build.ninja")).unwrap();
		let ctx = ToolContext { host: &host, graph: &graph, db_path: Path::new(".pyn.db"), args: &[] };

		assert_eq!(main(&ctx).unwrap(), 0);
		assert_eq!(String::from_utf8(host.stdout()).unwrap(), "ar\ncc\n");
	}
}
