//! `pyn -t deps`: print every node's depfile-discovered dependencies, in
//! the format ninja itself uses (`name: #deps N` followed by an indented
//! list).

use crate::error::PynError;
use crate::subtools::ToolContext;

pub(super) fn main(ctx: &ToolContext) -> Result<i32, PynError> {
	for node in &ctx.graph.node_arena {
		if node.depsfile_deps.is_empty() {
			continue;
		}
		ctx.host.print_out(&format!("{}: #deps {}\n", node.name, node.depsfile_deps.len()));
		for dep in &node.depsfile_deps {
			ctx.host.print_out(&format!("    {}\n", dep));
		}
	}
	Ok(0)
}
