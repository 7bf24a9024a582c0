//! `pyn -t query TARGET...`: show a target's explicit/implicit inputs and
//! the other targets that depend on it.

use crate::error::PynError;
use crate::subtools::ToolContext;
use indexmap::IndexSet;

pub(super) fn main(ctx: &ToolContext) -> Result<i32, PynError> {
	if ctx.args.is_empty() {
		return Err(PynError::Argument("query: expected at least one target".to_string()));
	}

	for target in ctx.args {
		let id = ctx
			.graph
			.lookup_node(target)
			.ok_or_else(|| PynError::Argument(format!("unknown target: {:?}", target)))?;
		let node = ctx.graph.node(id);

		ctx.host.print_out(&format!("{}\n", target));

		ctx.host.print_out("  inputs:\n");
		for dep in node.explicit_deps.iter().chain(&node.implicit_deps) {
			ctx.host.print_out(&format!("    {}\n", dep));
		}

		ctx.host.print_out("  outputs:\n");
		let mut seen: IndexSet<&str> = IndexSet::new();
		for other in &ctx.graph.node_arena {
			let depends_on_target = other
				.explicit_deps
				.iter()
				.chain(&other.implicit_deps)
				.any(|d| node.outputs.iter().any(|o| o == d));
			if depends_on_target {
				for output in &other.outputs {
					if seen.insert(output.as_str()) {
						ctx.host.print_out(&format!("    {}\n", output));
					}
				}
			}
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

	// S6: `-t query ab` against the S3 `cat` chain graph.
	#[test]
	fn query_reports_inputs_and_outputs() {
		let host = FakeHost::new();
		host.put_file(
			"build.ninja",
			b"rule cat\n  command = cat $in > $out\nbuild ab: cat a b\nbuild cd: cat c d\nbuild abcd: cat ab cd\n"
				.to_vec(),
		);
		let graph = Analyzer::new(&host).analyze(Path::new("build.ninja")).unwrap();

		let ctx = ToolContext {
			host: &host,
			graph: &graph,
			db_path: Path::new(".pyn.db"),
			args: &["ab".to_string()],
		};
		let code = main(&ctx).unwrap();
		assert_eq!(code, 0);
		assert_eq!(
			String::from_utf8(host.stdout()).unwrap(),
			"ab\n  inputs:\n    a\n    b\n  outputs:\n    abcd\n",
		);
	}

	#[test]
	fn query_rejects_unknown_target() {
		let host = FakeHost::new();
		host.put_file("build.ninja", b"".to_vec());
		let graph = Analyzer::new(&host).analyze(Path::new("build.ninja")).unwrap();
		let ctx = ToolContext {
			host: &host,
			graph: &graph,
			db_path: Path::new(".pyn.db"),
			args: &["nope".to_string()],
		};
		assert!(main(&ctx).is_err());
	}
}
