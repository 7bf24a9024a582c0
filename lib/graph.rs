//! The assembled build graph: scopes, rules, and nodes, plus the DAG
//! algorithms the scheduler needs.
//!
//! Scopes, rules, and nodes live in arenas owned by the [`Graph`] and are
//! addressed by index (`ScopeId`/`RuleId`/`NodeId`) rather than by reference,
//! so the graph has no internal borrows and can be built up incrementally
//! (and, eventually, persisted) without fighting the borrow checker.

use crate::spec::scope::{FoundVar, VarScope};
use indexmap::{IndexMap, IndexSet};
use std::collections::VecDeque;
use std::fmt;
use std::path::PathBuf;

pub type ScopeId = usize;
pub type RuleId = usize;
pub type NodeId = usize;

/// The sentinel rule name that performs no action.
pub const PHONY: &str = "phony";

/// A layer of variable definitions with an optional parent.
///
/// Values held here are always fully expanded; only [`Rule`] bodies store
/// unexpanded text.
#[derive(Debug, Default)]
pub struct Scope {
	pub parent: Option<ScopeId>,
	pub vars: IndexMap<String, String>,
}

/// A `rule` definition. Its variables (`command`, `description`, `depfile`,
/// `deps`, ...) are stored unexpanded; they're resolved against a node's
/// scope at the point of use.
#[derive(Debug)]
pub struct Rule {
	pub name: String,
	pub vars: IndexMap<String, String>,
}

impl Rule {
	pub fn var(&self, name: &str) -> Option<&str> {
		self.vars.get(name).map(String::as_str)
	}

	pub fn flag(&self, name: &str) -> bool {
		self.var(name).map(|v| v == "1" || v == "true").unwrap_or(false)
	}
}

/// A single build edge: one or more outputs produced from a rule and a set
/// of dependencies.
#[derive(Debug)]
pub struct Node {
	/// Stable identity: the space-joined list of outputs, as written.
	pub name: String,
	pub scope: ScopeId,
	pub outputs: Vec<String>,
	pub rule_name: String,
	pub explicit_deps: Vec<String>,
	pub implicit_deps: Vec<String>,
	pub order_only_deps: Vec<String>,
	pub depsfile_deps: Vec<String>,
	pub running: bool,
}

impl Node {
	pub fn is_phony(&self) -> bool {
		self.rule_name == PHONY
	}

	/// The semantic dependency set used for staleness and closure: explicit,
	/// implicit, and depfile-discovered deps (not order-only).
	pub fn deps(&self) -> impl Iterator<Item = &str> {
		self.explicit_deps
			.iter()
			.chain(&self.implicit_deps)
			.chain(&self.depsfile_deps)
			.map(String::as_str)
	}

	/// The full dependency set used for scheduling order, including
	/// order-only deps.
	pub fn deps_including_order_only(&self) -> impl Iterator<Item = &str> {
		self.deps().chain(self.order_only_deps.iter().map(String::as_str))
	}
}

/// An error from one of the graph algorithms below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
	/// `tsort` found a dependency cycle involving this node.
	Cycle(String),
	/// A requested build target isn't produced by any node.
	UnknownTarget(String),
}

impl fmt::Display for GraphError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			GraphError::Cycle(n) => write!(f, "dependency cycle involving {}", n),
			GraphError::UnknownTarget(n) => write!(f, "unknown target: {}", n),
		}
	}
}

impl std::error::Error for GraphError {}

/// The fully assembled build graph for one invocation.
#[derive(Debug)]
pub struct Graph {
	pub root_file: PathBuf,
	pub defaults: Vec<String>,
	/// Output name -> node. Multiple outputs of the same node appear as
	/// separate entries pointing at the same `NodeId`.
	pub nodes: IndexMap<String, NodeId>,
	pub node_arena: Vec<Node>,
	pub rules: IndexMap<String, RuleId>,
	pub rule_arena: Vec<Rule>,
	pub pools: IndexMap<String, u32>,
	/// File name -> that file's root scope.
	pub scopes: IndexMap<PathBuf, ScopeId>,
	pub scope_arena: Vec<Scope>,
	pub subninjas: Vec<PathBuf>,
	pub includes: Vec<PathBuf>,
	pub is_dirty: bool,
	/// Node name -> its fully expanded command. Absent for phony nodes.
	pub commands: IndexMap<String, String>,
}

impl Graph {
	pub fn new(root_file: PathBuf) -> Self {
		Graph {
			root_file,
			defaults: Vec::new(),
			nodes: IndexMap::new(),
			node_arena: Vec::new(),
			rules: IndexMap::new(),
			rule_arena: Vec::new(),
			pools: IndexMap::new(),
			scopes: IndexMap::new(),
			scope_arena: Vec::new(),
			subninjas: Vec::new(),
			includes: Vec::new(),
			is_dirty: false,
			commands: IndexMap::new(),
		}
	}

	pub fn new_scope(&mut self, parent: Option<ScopeId>) -> ScopeId {
		self.scope_arena.push(Scope {
			parent,
			vars: IndexMap::new(),
		});
		self.scope_arena.len() - 1
	}

	pub fn push_node(&mut self, node: Node) -> NodeId {
		self.node_arena.push(node);
		self.node_arena.len() - 1
	}

	pub fn node(&self, id: NodeId) -> &Node {
		&self.node_arena[id]
	}

	pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
		&mut self.node_arena[id]
	}

	pub fn rule(&self, id: RuleId) -> &Rule {
		&self.rule_arena[id]
	}

	pub fn lookup_rule(&self, name: &str) -> Option<&Rule> {
		self.rules.get(name).map(|&id| self.rule(id))
	}

	pub fn lookup_node(&self, name: &str) -> Option<NodeId> {
		self.nodes.get(name).copied()
	}

	/// A view of a scope chain (own entries, then parent chain) for plain
	/// variable lookup — used while analyzing `var`/`default`/path
	/// expansions.
	pub fn scope_lookup(&self, scope: ScopeId) -> ScopeLookup {
		ScopeLookup { graph: self, scope }
	}

	/// A view used to expand a node's rule body (`command`, `description`,
	/// ...): the node's own build-local vars, then the rule's own vars, then
	/// the build scope's parent chain. See the variable expander's lookup
	/// order.
	pub fn node_scope(&self, node: NodeId) -> NodeScope {
		NodeScope { graph: self, node }
	}

	/// Resolve target names to node ids. Fails on the first name that isn't
	/// produced by any node.
	pub fn resolve_targets(&self, names: &[String]) -> Result<Vec<NodeId>, GraphError> {
		names
			.iter()
			.map(|n| self.lookup_node(n).ok_or_else(|| GraphError::UnknownTarget(n.clone())))
			.collect()
	}

	/// All nodes transitively reachable from `targets` via `deps()`, plus the
	/// targets themselves. Names that aren't graph nodes are treated as
	/// source files and not followed further.
	pub fn closure(&self, targets: &[NodeId]) -> Vec<NodeId> {
		let mut seen: IndexSet<NodeId> = IndexSet::new();
		let mut queue: VecDeque<NodeId> = targets.iter().copied().collect();
		for &t in targets {
			seen.insert(t);
		}
		while let Some(id) = queue.pop_front() {
			for dep in self.node(id).deps() {
				if let Some(dep_id) = self.lookup_node(dep) {
					if seen.insert(dep_id) {
						queue.push_back(dep_id);
					}
				}
			}
		}
		seen.into_iter().collect()
	}

	/// A post-order (leaves-first) traversal of `nodes` over
	/// `deps_including_order_only()`. Errors if a cycle is found, naming one
	/// of the nodes on it.
	pub fn tsort(&self, nodes: &[NodeId]) -> Result<Vec<NodeId>, GraphError> {
		#[derive(Clone, Copy, PartialEq)]
		enum State {
			InProgress,
			Done,
		}
		let mut state: IndexMap<NodeId, State> = IndexMap::new();
		let mut order = Vec::with_capacity(nodes.len());

		fn visit(
			graph: &Graph,
			id: NodeId,
			state: &mut IndexMap<NodeId, State>,
			order: &mut Vec<NodeId>,
		) -> Result<(), GraphError> {
			match state.get(&id) {
				Some(State::Done) => return Ok(()),
				Some(State::InProgress) => {
					return Err(GraphError::Cycle(graph.node(id).name.clone()));
				}
				None => {}
			}
			state.insert(id, State::InProgress);
			for dep in graph.node(id).deps_including_order_only() {
				if let Some(dep_id) = graph.lookup_node(dep) {
					visit(graph, dep_id, state, order)?;
				}
			}
			state.insert(id, State::Done);
			order.push(id);
			Ok(())
		}

		for &id in nodes {
			visit(self, id, &mut state, &mut order)?;
		}
		Ok(order)
	}

	/// Outputs that are not in any other node's explicit deps.
	pub fn roots(&self) -> Vec<NodeId> {
		let mut has_dependent: IndexSet<NodeId> = IndexSet::new();
		for node in &self.node_arena {
			for dep in &node.explicit_deps {
				if let Some(id) = self.lookup_node(dep) {
					has_dependent.insert(id);
				}
			}
		}
		let mut seen = IndexSet::new();
		let mut roots = Vec::new();
		for (_, &id) in &self.nodes {
			if seen.insert(id) && !has_dependent.contains(&id) {
				roots.push(id);
			}
		}
		roots
	}
}

pub struct ScopeLookup<'g> {
	graph: &'g Graph,
	scope: ScopeId,
}

impl<'g> VarScope for ScopeLookup<'g> {
	fn lookup_var(&self, var_name: &str) -> Option<FoundVar> {
		let mut cur = Some(self.scope);
		while let Some(id) = cur {
			let scope = &self.graph.scope_arena[id];
			if let Some(v) = scope.vars.get(var_name) {
				return Some(FoundVar::Expanded(v));
			}
			cur = scope.parent;
		}
		None
	}
}

pub struct NodeScope<'g> {
	graph: &'g Graph,
	node: NodeId,
}

impl<'g> VarScope for NodeScope<'g> {
	fn lookup_var(&self, var_name: &str) -> Option<FoundVar> {
		let node = self.graph.node(self.node);
		let build_scope = &self.graph.scope_arena[node.scope];
		if let Some(v) = build_scope.vars.get(var_name) {
			return Some(FoundVar::Expanded(v));
		}
		if let Some(rule) = self.graph.lookup_rule(&node.rule_name) {
			if let Some(v) = rule.var(var_name) {
				return Some(FoundVar::Unexpanded(v));
			}
		}
		let mut cur = build_scope.parent;
		while let Some(id) = cur {
			let scope = &self.graph.scope_arena[id];
			if let Some(v) = scope.vars.get(var_name) {
				return Some(FoundVar::Expanded(v));
			}
			cur = scope.parent;
		}
		None
	}
}
