//! `pyn -t clean [-g]`: remove every output file built by a non-phony rule.
//! With `-g`, also remove outputs of `generator` rules and the `.pyn.db`
//! snapshot itself.

use crate::error::PynError;
use crate::subtools::ToolContext;

pub(super) fn main(ctx: &ToolContext) -> Result<i32, PynError> {
	let clean_generators = ctx.args.iter().any(|a| a == "-g");

	let mut removed = 0usize;
	for node in &ctx.graph.node_arena {
		if node.is_phony() {
			continue;
		}
		let is_generator = ctx
			.graph
			.lookup_rule(&node.rule_name)
			.map(|rule| rule.flag("generator"))
			.unwrap_or(false);
		if is_generator && !clean_generators {
			continue;
		}
		for output in &node.outputs {
			let path = std::path::Path::new(output);
			if ctx.host.exists(path) && ctx.host.remove_file(path).is_ok() {
				removed += 1;
			}
		}
	}

	if clean_generators && ctx.host.exists(ctx.db_path) {
		if ctx.host.remove_file(ctx.db_path).is_ok() {
			removed += 1;
		}
	}

	ctx.host.print_out(&format!("cleaned {} files\n", removed));
	Ok(0)
}

#[cfg(test)]
mod test {
	use super::*;
	use pyn::analyzer::Analyzer;
	use pyn::host::FakeHost;
	use std::path::Path;

	#[test]
	fn clean_removes_non_generator_outputs_only_by_default() {
		let host = FakeHost::new();
		host.put_file("out", b"built".to_vec());
		host.put_file("gen.h", b"generated".to_vec());
		host.put_file(
			"build.ninja",
			b"rule cc\n  command = cc -o $out\nrule codegen\n  command = gen\n  generator = 1\nbuild out: cc\nbuild gen.h: codegen\n"
				.to_vec(),
		);
		let graph = Analyzer::new(&host).analyze(Path::new("build.ninja")).unwrap();
		let db_path = Path::new(".pyn.db");
		let ctx = ToolContext { host: &host, graph: &graph, db_path, args: &[] };

		main(&ctx).unwrap();
		assert!(!host.exists(Path::new("out")));
		assert!(host.exists(Path::new("gen.h")));
	}

	#[test]
	fn clean_dash_g_also_removes_generator_outputs_and_db() {
		let host = FakeHost::new();
		host.put_file("gen.h", b"generated".to_vec());
		host.put_file(".pyn.db", b"stale".to_vec());
		host.put_file(
			"build.ninja",
			b"rule codegen\n  command = gen\n  generator = 1\nbuild gen.h: codegen\n".to_vec(),
		);
		let graph = Analyzer::new(&host).analyze(Path::new("build.ninja")).unwrap();
		let db_path = Path::new(".pyn.db");
		let ctx = ToolContext { host: &host, graph: &graph, db_path, args: &["-g".to_string()] };

		main(&ctx).unwrap();
		assert!(!host.exists(Path::new("gen.h")));
		assert!(!host.exists(db_path));
	}
}
