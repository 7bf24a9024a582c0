//! Turns a parsed `build.ninja` file (plus everything it `include`s or
//! `subninja`s) into a single assembled [`Graph`].

use crate::depfile::read_deps_file;
use crate::error::{ErrorWithLocation, Location};
use crate::graph::{Graph, Node, NodeId, PHONY, ScopeId};
use crate::host::Host;
use crate::spec::error::{AnalysisError, ExpansionError};
use crate::spec::expand::{expand_str, expand_var};
use crate::spec::parse::{Decl, Parser};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// Walks a `build.ninja` file and everything it references, populating a
/// [`Graph`].
pub struct Analyzer<'h, H: Host> {
	host: &'h H,
}

impl<'h, H: Host> Analyzer<'h, H> {
	pub fn new(host: &'h H) -> Self {
		Analyzer { host }
	}

	pub fn analyze(&self, file_name: &Path) -> Result<Graph, ErrorWithLocation<AnalysisError>> {
		let mut graph = Graph::new(file_name.to_path_buf());
		let root_scope = graph.new_scope(None);
		graph.scopes.insert(file_name.to_path_buf(), root_scope);
		self.analyze_file(&mut graph, file_name, root_scope)?;
		self.load_all_depfiles(&mut graph)?;
		self.compute_commands(&mut graph)?;
		Ok(graph)
	}

	fn analyze_file(
		&self,
		graph: &mut Graph,
		file_name: &Path,
		scope: ScopeId,
	) -> Result<(), ErrorWithLocation<AnalysisError>> {
		let source = self.host.read_to_string(file_name).map_err(|error| {
			Location::UNKNOWN.error(AnalysisError::Io {
				file_name: file_name.to_path_buf(),
				error,
			})
		})?;

		let mut parser = Parser::new(file_name, &source);
		while let Some(decl) = parser.next_decl().map_err(|e| e.convert::<AnalysisError>())? {
			let loc = parser.location();
			match decl {
				Decl::Var { name, value } => {
					let expanded = expand_str(value, &graph.scope_lookup(scope))
						.map_err(|e| loc.error(AnalysisError::from(e)))?;
					graph.scope_arena[scope].vars.insert(name.to_string(), expanded);
				}

				Decl::Rule { name, vars } => {
					if graph.rules.contains_key(name) {
						return Err(loc.error(AnalysisError::DuplicateRule(name.to_string())));
					}
					let mut rule_vars = IndexMap::new();
					for v in vars {
						rule_vars.insert(v.name.to_string(), v.value.to_string());
					}
					let id = graph.rule_arena.len();
					graph.rule_arena.push(crate::graph::Rule {
						name: name.to_string(),
						vars: rule_vars,
					});
					graph.rules.insert(name.to_string(), id);
				}

				Decl::Pool { name, vars } => {
					if graph.pools.contains_key(name) {
						return Err(loc.error(AnalysisError::DuplicatePool(name.to_string())));
					}
					if vars.len() != 1 || vars[0].name != "depth" {
						return Err(loc.error(AnalysisError::ExpectedPoolDepth));
					}
					let depth: u32 = vars[0]
						.value
						.trim()
						.parse()
						.map_err(|_| loc.error(AnalysisError::InvalidPoolDepth))?;
					if depth == 0 {
						return Err(loc.error(AnalysisError::InvalidPoolDepth));
					}
					graph.pools.insert(name.to_string(), depth);
				}

				Decl::Build {
					outputs,
					rule_name,
					explicit_deps,
					implicit_deps,
					order_only_deps,
					vars,
				} => {
					let outputs = expand_all(graph, scope, &outputs, loc)?;
					let explicit_deps = expand_all(graph, scope, &explicit_deps, loc)?;
					let implicit_deps = expand_all(graph, scope, &implicit_deps, loc)?;
					let order_only_deps = expand_all(graph, scope, &order_only_deps, loc)?;

					let build_scope = graph.new_scope(Some(scope));
					graph.scope_arena[build_scope]
						.vars
						.insert("in".to_string(), join_shell_escaped(&explicit_deps));
					graph.scope_arena[build_scope]
						.vars
						.insert("out".to_string(), join_shell_escaped(&outputs));

					for v in &vars {
						let expanded = expand_str(v.value, &graph.scope_lookup(build_scope))
							.map_err(|e| loc.error(AnalysisError::from(e)))?;
						graph.scope_arena[build_scope].vars.insert(v.name.to_string(), expanded);
					}

					if rule_name != PHONY && !graph.rules.contains_key(rule_name) {
						return Err(loc.error(AnalysisError::UndefinedRule(rule_name.to_string())));
					}

					let name = outputs.join(" ");
					let node = Node {
						name,
						scope: build_scope,
						outputs: outputs.clone(),
						rule_name: rule_name.to_string(),
						explicit_deps,
						implicit_deps,
						order_only_deps,
						depsfile_deps: Vec::new(),
						running: false,
					};
					let node_id = graph.push_node(node);
					for output in &outputs {
						if graph.nodes.contains_key(output) {
							return Err(loc.error(AnalysisError::DuplicateOutput(output.clone())));
						}
						graph.nodes.insert(output.clone(), node_id);
					}
				}

				Decl::Default { paths } => {
					for p in expand_all(graph, scope, &paths, loc)? {
						graph.defaults.push(p);
					}
				}

				Decl::Include { path } => {
					let expanded = expand_str(path, &graph.scope_lookup(scope))
						.map_err(|e| loc.error(AnalysisError::from(e)))?;
					let full = resolve_relative(file_name, &expanded);
					graph.includes.push(full.clone());
					self.analyze_file(graph, &full, scope)?;
				}

				Decl::SubNinja { path } => {
					let expanded = expand_str(path, &graph.scope_lookup(scope))
						.map_err(|e| loc.error(AnalysisError::from(e)))?;
					let full = resolve_relative(file_name, &expanded);
					if graph.scopes.contains_key(&full) {
						return Err(loc.error(AnalysisError::DuplicateScope(full.display().to_string())));
					}
					graph.subninjas.push(full.clone());
					let child_scope = graph.new_scope(Some(scope));
					graph.scopes.insert(full.clone(), child_scope);
					self.analyze_file(graph, &full, child_scope)?;
				}
			}
		}
		Ok(())
	}

	/// Reads every non-phony node's `depfile` (if its rule declares one and
	/// the file happens to exist) and folds the discovered deps in.
	fn load_all_depfiles(&self, graph: &mut Graph) -> Result<(), ErrorWithLocation<AnalysisError>> {
		let node_ids: Vec<NodeId> = (0..graph.node_arena.len()).collect();
		for id in node_ids {
			self.load_depfile(graph, id, false)?;
		}
		Ok(())
	}

	/// Read `node_id`'s depfile, if its rule has one and it exists, folding
	/// the deps it lists into `depsfile_deps`. Returns whether the deps
	/// changed. If `remove_after` is set, the depfile is deleted once read
	/// (done after a command runs, not during initial analysis).
	pub fn load_depfile(
		&self,
		graph: &mut Graph,
		node_id: NodeId,
		remove_after: bool,
	) -> Result<bool, ErrorWithLocation<AnalysisError>> {
		let node = graph.node(node_id);
		if node.is_phony() {
			return Ok(false);
		}
		let rule = match graph.lookup_rule(&node.rule_name) {
			Some(rule) => rule,
			None => return Ok(false),
		};
		if rule.var("deps") != Some("gcc") {
			return Ok(false);
		}
		let depfile_template = match rule.var("depfile") {
			Some(d) => d.to_string(),
			None => return Ok(false),
		};
		let depfile_path = expand_str(&depfile_template, &graph.node_scope(node_id))
			.map_err(|e| Location::UNKNOWN.error(AnalysisError::from(e)))?;
		let path = PathBuf::from(&depfile_path);
		if !self.host.exists(&path) {
			return Ok(false);
		}
		let bytes = self.host.read_bytes(&path).map_err(|error| {
			Location::UNKNOWN.error(AnalysisError::Io { file_name: path.clone(), error })
		})?;
		let mut deps = Vec::new();
		read_deps_file(&bytes, |_target, file_deps| deps = file_deps).map_err(|error| {
			Location::UNKNOWN.error(AnalysisError::Io { file_name: path.clone(), error })
		})?;
		let changed = graph.node(node_id).depsfile_deps != deps;
		graph.node_mut(node_id).depsfile_deps = deps;
		if remove_after {
			let _ = self.host.remove_file(&path);
		}
		Ok(changed)
	}

	fn compute_commands(&self, graph: &mut Graph) -> Result<(), ErrorWithLocation<AnalysisError>> {
		let node_ids: Vec<NodeId> = (0..graph.node_arena.len()).collect();
		for id in node_ids {
			if graph.node(id).is_phony() {
				continue;
			}
			let command = expand_var("command", &graph.node_scope(id))
				.map_err(|e| Location::UNKNOWN.error(AnalysisError::from(e)))?;
			let name = graph.node(id).name.clone();
			graph.commands.insert(name, command);
		}
		Ok(())
	}
}

fn expand_all(
	graph: &Graph,
	scope: ScopeId,
	items: &[&str],
	loc: crate::error::Location,
) -> Result<Vec<String>, ErrorWithLocation<AnalysisError>> {
	items
		.iter()
		.map(|p| {
			expand_str(p, &graph.scope_lookup(scope)).map_err(|e: ExpansionError| loc.error(e.into()))
		})
		.collect()
}

/// Join paths with spaces, wrapping any path that itself contains a space in
/// single quotes (escaping embedded quotes). Used for `$in`/`$out`.
fn join_shell_escaped(paths: &[String]) -> String {
	paths
		.iter()
		.map(|p| {
			if p.contains(' ') {
				format!("'{}'", p.replace('\'', "'\\''"))
			} else {
				p.clone()
			}
		})
		.collect::<Vec<_>>()
		.join(" ")
}

fn resolve_relative(file_name: &Path, rel: &str) -> PathBuf {
	match file_name.parent() {
		Some(dir) if !dir.as_os_str().is_empty() => dir.join(rel),
		_ => PathBuf::from(rel),
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::host::FakeHost;

	fn analyze(build_ninja: &str) -> Graph {
		let host = FakeHost::new();
		host.put_file("build.ninja", build_ninja.as_bytes().to_vec());
		Analyzer::new(&host).analyze(Path::new("build.ninja")).unwrap()
	}

	#[test]
	fn simple_build_edge() {
		let g = analyze("rule cc\n  command = gcc -c $in -o $out\nbuild out.o: cc in.c\n");
		let id = g.lookup_node("out.o").unwrap();
		assert_eq!(g.node(id).explicit_deps, vec!["in.c".to_string()]);
		assert_eq!(g.commands["out.o"], "gcc -c in.c -o out.o");
	}

	#[test]
	fn undefined_rule_is_an_error() {
		let host = FakeHost::new();
		host.put_file("build.ninja", b"build out: nope in\n".to_vec());
		assert!(Analyzer::new(&host).analyze(Path::new("build.ninja")).is_err());
	}

	#[test]
	fn duplicate_output_is_an_error() {
		let host = FakeHost::new();
		host.put_file(
			"build.ninja",
			b"rule cc\n  command = x\nbuild out: cc a\nbuild out: cc b\n".to_vec(),
		);
		assert!(Analyzer::new(&host).analyze(Path::new("build.ninja")).is_err());
	}

	#[test]
	fn include_shares_scope_with_includer() {
		let host = FakeHost::new();
		host.put_file("defs.ninja", b"v = from_include\n".to_vec());
		host.put_file(
			"build.ninja",
			b"include defs.ninja\nrule cc\n  command = echo $v\nbuild out: cc\n".to_vec(),
		);
		let g = Analyzer::new(&host).analyze(Path::new("build.ninja")).unwrap();
		assert_eq!(g.commands["out"], "echo from_include");
	}

	#[test]
	fn variable_expansion_across_builds() {
		let g = analyze(
			"v = foo\nrule echo\n  command = echo $out\nbuild $v: echo\nv = bar\nbuild $v: echo\ndefault foo bar\n",
		);
		assert!(g.lookup_node("foo").is_some());
		assert!(g.lookup_node("bar").is_some());
		assert_eq!(g.defaults, vec!["foo".to_string(), "bar".to_string()]);
	}

	#[test]
	fn pool_depth_must_be_positive_integer() {
		let host = FakeHost::new();
		host.put_file("build.ninja", b"pool link_pool\n  depth = 0\n".to_vec());
		assert!(Analyzer::new(&host).analyze(Path::new("build.ninja")).is_err());
	}
}
