//! `pyn -t question [TARGET...]`: exit 1 if anything would be rebuilt,
//! 0 if the requested targets are already up to date. Prints nothing on
//! success, matching ninja's own behavior.

use crate::error::PynError;
use crate::subtools::ToolContext;
use pyn::builder::{BuildOptions, Builder};

pub(super) fn main(ctx: &ToolContext) -> Result<i32, PynError> {
	let builder = Builder::new(ctx.host, BuildOptions::default());
	let stale = builder.stale_nodes(ctx.graph, ctx.args, None)?;
	if stale.is_empty() {
		Ok(0)
	} else {
		for id in &stale {
			ctx.host.print_err(&format!("{}: not up to date\n", ctx.graph.node(*id).name));
		}
		Ok(1)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use pyn::analyzer::Analyzer;
	use pyn::host::FakeHost;
	use std::path::Path;

	#[test]
	fn question_exits_nonzero_when_stale() {
		let host = FakeHost::new();
		host.put_file("build.ninja", b"rule cc\n  command = cc $in -o $out\nbuild out: cc\n".to_vec());
		let graph = Analyzer::new(&host).analyze(Path::new("build.ninja")).unwrap();
		let ctx = ToolContext { host: &host, graph: &graph, db_path: Path::new(".pyn.db"), args: &[] };
		assert_eq!(main(&ctx).unwrap(), 1);
	}

	#[test]
	fn question_exits_zero_when_fresh() {
		let host = FakeHost::new();
		host.put_file("a", b"x".to_vec());
		host.put_file("out", b"y".to_vec());
		host.put_file("build.ninja", b"rule cc\n  command = cc $in -o $out\nbuild out: cc a\n".to_vec());
		let graph = Analyzer::new(&host).analyze(Path::new("build.ninja")).unwrap();
		let ctx = ToolContext { host: &host, graph: &graph, db_path: Path::new(".pyn.db"), args: &[] };
		assert_eq!(main(&ctx).unwrap(), 0);
	}
}
