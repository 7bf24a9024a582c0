//! The incremental build scheduler: works out which nodes are stale, then
//! drives a worker pool to rebuild them with bounded concurrency.

use crate::analyzer::Analyzer;
use crate::graph::{Graph, GraphError, NodeId};
use crate::host::Host;
use crate::persist::GraphSnapshot;
use crate::pool::{Job, JobResult};
use indexmap::{IndexMap, IndexSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
	Quiet,
	V,
	VV,
}

pub struct BuildOptions {
	pub jobs: usize,
	pub failure_budget: usize,
	pub dry_run: bool,
	pub verbosity: Verbosity,
	pub overwrite_status: bool,
	pub status_format: String,
}

impl Default for BuildOptions {
	fn default() -> Self {
		BuildOptions {
			jobs: 1,
			failure_budget: 1,
			dry_run: false,
			verbosity: Verbosity::Quiet,
			overwrite_status: false,
			status_format: crate::stats::DEFAULT_STATUS_FORMAT.to_string(),
		}
	}
}

#[derive(Debug)]
pub enum BuilderError {
	Graph(GraphError),
	/// A dependency that isn't produced by any rule, and doesn't exist on
	/// disk, was needed by `needed_by`.
	MissingSource { missing: String, needed_by: String },
}

impl fmt::Display for BuilderError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			BuilderError::Graph(e) => write!(f, "{}", e),
			BuilderError::MissingSource { missing, needed_by } => {
				write!(f, "{}, needed by {}, missing and no known rule to make it", missing, needed_by)
			}
		}
	}
}

impl std::error::Error for BuilderError {}

impl From<GraphError> for BuilderError {
	fn from(e: GraphError) -> Self {
		BuilderError::Graph(e)
	}
}

pub struct BuildOutcome {
	pub success: bool,
	pub commands_run: usize,
}

pub struct Builder<'h, H: Host> {
	host: &'h H,
	options: BuildOptions,
}

impl<'h, H: Host + Sync> Builder<'h, H> {
	pub fn new(host: &'h H, options: BuildOptions) -> Self {
		Builder { host, options }
	}

	/// Resolve the set of nodes that need rebuilding: the requested targets
	/// (or the defaults, or the graph's roots), restricted to their closure,
	/// in dependency order, with `phony` nodes and already-up-to-date nodes
	/// dropped.
	pub fn stale_nodes(
		&self,
		graph: &Graph,
		target_names: &[String],
		old_snapshot: Option<&GraphSnapshot>,
	) -> Result<Vec<NodeId>, BuilderError> {
		let targets = if !target_names.is_empty() {
			graph.resolve_targets(target_names)?
		} else if !graph.defaults.is_empty() {
			graph.resolve_targets(&graph.defaults)?
		} else {
			graph.roots()
		};

		let closure = graph.closure(&targets);
		let order = graph.tsort(&closure)?;

		let mut stat_cache: IndexMap<String, Option<std::time::SystemTime>> = IndexMap::new();
		let mut stat_of = |name: &str, cache: &mut IndexMap<String, Option<std::time::SystemTime>>| {
			if let Some(&cached) = cache.get(name) {
				return cached;
			}
			let value = self.host.mtime(std::path::Path::new(name));
			cache.insert(name.to_string(), value);
			value
		};

		let mut stale = Vec::new();
		for id in order {
			let node = graph.node(id);
			if node.is_phony() {
				continue;
			}

			let own_stat = node
				.outputs
				.iter()
				.map(|o| stat_of(o, &mut stat_cache))
				.fold(Some(None), |acc, s| match (acc, s) {
					(Some(Some(a)), Some(b)) => Some(Some(std::cmp::min(a, b))),
					(Some(None), Some(b)) => Some(Some(b)),
					_ => Some(None),
				})
				.unwrap();

			let mut is_stale = own_stat.is_none();
			if !is_stale {
				for dep in node.deps() {
					if let Some(dep_stat) = stat_of(dep, &mut stat_cache) {
						if dep_stat > own_stat.unwrap() {
							is_stale = true;
							break;
						}
					}
				}
			}
			if !is_stale {
				if let Some(snapshot) = old_snapshot {
					if let Some(old_node) = snapshot.nodes.get(&node.name) {
						if let Some(new_command) = graph.commands.get(&node.name) {
							if &old_node.command != new_command {
								is_stale = true;
							}
						}
					}
				}
			}

			if is_stale {
				stale.push(id);
			}
		}
		Ok(stale)
	}

	/// Run the build. `interrupted` is polled between dispatch decisions;
	/// setting it (from a signal handler, say) makes the builder stop
	/// starting new jobs, drain in-flight ones, and return early.
	pub fn build(
		&self,
		graph: &mut Graph,
		target_names: &[String],
		old_snapshot: Option<&GraphSnapshot>,
		interrupted: &AtomicBool,
	) -> Result<BuildOutcome, BuilderError> {
		let stale = self.stale_nodes(graph, target_names, old_snapshot)?;
		let total = stale.len();

		match old_snapshot {
			None => graph.is_dirty = true,
			Some(snapshot) => {
				for (name, command) in &graph.commands {
					if snapshot.nodes.get(name).map(|n| &n.command) != Some(command) {
						graph.is_dirty = true;
						break;
					}
				}
			}
		}

		let mut completed: IndexSet<NodeId> = IndexSet::new();
		{
			let all_targets = if !target_names.is_empty() {
				graph.resolve_targets(target_names)?
			} else if !graph.defaults.is_empty() {
				graph.resolve_targets(&graph.defaults)?
			} else {
				graph.roots()
			};
			for id in graph.closure(&all_targets) {
				if !stale.contains(&id) {
					completed.insert(id);
				}
			}
		}

		let analyzer = Analyzer::new(self.host);
		let printer_out = |s: &str| self.host.print_out(s);
		let printer_err = |s: &str| self.host.print_err(s);
		let mut printer = crate::printer::Printer::new(self.options.overwrite_status);

		let start = Instant::now();
		let mut pending: Vec<NodeId> = stale;
		let mut started = 0usize;
		let mut finished = 0usize;
		let mut failures = 0usize;

		let run_dispatch_loop = |job_tx: crossbeam_channel::Sender<Job>, result_rx: crossbeam_channel::Receiver<JobResult>| {
			let mut in_flight: IndexMap<String, NodeId> = IndexMap::new();

			while !pending.is_empty() || !in_flight.is_empty() {
				let stopped =
					failures >= self.options.failure_budget || interrupted.load(Ordering::SeqCst);

				if !stopped {
					while started - finished < self.options.jobs && !pending.is_empty() {
						let ready_index = pending.iter().position(|&id| self.node_ready(graph, id, &completed));
						let id = match ready_index {
							Some(i) => pending.remove(i),
							None => break,
						};

						if let Err(e) = self.check_sources_exist(graph, id) {
							return Err(e);
						}

						graph.node_mut(id).running = true;
						started += 1;

						let name = graph.node(id).name.clone();
						let line = self.status_line(started, finished, total, start.elapsed(), &format!("building {}", name));
						printer.update(&line, &printer_out);

						if self.options.dry_run {
							finished += 1;
							graph.node_mut(id).running = false;
							completed.insert(id);
							continue;
						}

						for output in &graph.node(id).outputs {
							let _ = self.host.maybe_mkdir_for(std::path::Path::new(output));
						}

						let command = graph.commands.get(&name).cloned().unwrap_or_default();
						in_flight.insert(name.clone(), id);
						job_tx.send(Job { node_name: name, command }).expect("workers outlive dispatch");
					}
				}

				if in_flight.is_empty() {
					// Nothing left to drain: either there's no more work, or
					// we've stopped dispatching and everything already in
					// flight has been accounted for.
					if stopped || pending.is_empty() {
						break;
					}
					continue;
				}

				let result = match result_rx.try_recv() {
					Ok(r) => r,
					Err(_) => match result_rx.recv() {
						Ok(r) => r,
						Err(_) => break,
					},
				};

				let id = match in_flight.shift_remove(&result.node_name) {
					Some(id) => id,
					None => continue,
				};
				graph.node_mut(id).running = false;
				finished += 1;

				if analyzer.load_depfile(graph, id, true).unwrap_or(false) {
					graph.is_dirty = true;
				}

				let node_name = graph.node(id).name.clone();
				if !result.output.success {
					failures += 1;
					let command = graph.commands.get(&node_name).cloned().unwrap_or_default();
					printer.print_sticky(&format!("FAILED: {}", command), &printer_err);
				} else if self.options.verbosity == Verbosity::VV {
					let command = graph.commands.get(&node_name).cloned().unwrap_or_default();
					printer.print_sticky(&command, &printer_out);
				} else if self.options.verbosity == Verbosity::V {
					printer.print_sticky(&format!("building {}", node_name), &printer_out);
				} else if self.options.overwrite_status {
					let line = self.status_line(started, finished, total, start.elapsed(), &node_name);
					printer.update(&line, &printer_out);
				}

				if !result.output.stdout.is_empty() {
					self.host.print_out(&String::from_utf8_lossy(&result.output.stdout));
				}
				if !result.output.stderr.is_empty() {
					self.host.print_err(&String::from_utf8_lossy(&result.output.stderr));
				}

				if result.output.success {
					completed.insert(id);
				}
			}
			Ok(())
		};

		let outcome = if self.options.dry_run {
			let (job_tx, _job_rx) = crossbeam_channel::unbounded();
			let (_result_tx, result_rx) = crossbeam_channel::unbounded();
			run_dispatch_loop(job_tx, result_rx)
		} else {
			crate::pool::run_with_pool(self.host, self.options.jobs, run_dispatch_loop)
		};
		outcome?;

		printer.flush(&printer_out);

		Ok(BuildOutcome {
			success: failures == 0 && !interrupted.load(Ordering::SeqCst),
			commands_run: finished,
		})
	}

	fn node_ready(&self, graph: &Graph, id: NodeId, completed: &IndexSet<NodeId>) -> bool {
		graph.node(id).deps_including_order_only().all(|dep| match graph.lookup_node(dep) {
			Some(dep_id) => completed.contains(&dep_id),
			None => true,
		})
	}

	/// A dependency that isn't a graph node must already exist on disk; this
	/// is checked only once we're about to actually run the command.
	fn check_sources_exist(&self, graph: &Graph, id: NodeId) -> Result<(), BuilderError> {
		let node = graph.node(id);
		for dep in node.deps() {
			if graph.lookup_node(dep).is_none() && !self.host.exists(std::path::Path::new(dep)) {
				return Err(BuilderError::MissingSource {
					missing: dep.to_string(),
					needed_by: node.name.clone(),
				});
			}
		}
		Ok(())
	}

	fn status_line(
		&self,
		started: usize,
		finished: usize,
		total: usize,
		elapsed: std::time::Duration,
		description: &str,
	) -> String {
		let stats = crate::stats::BuildStats { started, finished, total, elapsed };
		format!("{}{}", stats.format(&self.options.status_format), description)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::analyzer::Analyzer;
	use crate::host::{CommandOutput, FakeHost};
	use std::path::Path;

	fn analyze(host: &FakeHost, text: &str) -> Graph {
		host.put_file("build.ninja", text.as_bytes().to_vec());
		Analyzer::new(host).analyze(Path::new("build.ninja")).unwrap()
	}

	fn ok(stdout: &str) -> CommandOutput {
		CommandOutput {
			success: true,
			stdout: stdout.as_bytes().to_vec(),
			stderr: Vec::new(),
		}
	}

	fn failed(stderr: &str) -> CommandOutput {
		CommandOutput {
			success: false,
			stdout: Vec::new(),
			stderr: stderr.as_bytes().to_vec(),
		}
	}

	// S3: a chain of `cat` builds all get scheduled and run to completion.
	#[test]
	fn cat_chain_runs_every_node() {
		let host = FakeHost::new();
		host.put_file("a", "hello ".as_bytes().to_vec());
		host.put_file("b", "world\n".as_bytes().to_vec());
		host.put_file("c", "how are ".as_bytes().to_vec());
		host.put_file("d", "you?\n".as_bytes().to_vec());
		let mut graph = analyze(
			&host,
			"rule cat\n  command = cat $in > $out\nbuild ab: cat a b\nbuild cd: cat c d\nbuild abcd: cat ab cd\n",
		);
		host.script_command("cat a b > ab", ok(""));
		host.script_command("cat c d > cd", ok(""));
		host.script_command("cat ab cd > abcd", ok(""));

		let builder = Builder::new(&host, BuildOptions { jobs: 2, ..BuildOptions::default() });
		let interrupted = AtomicBool::new(false);
		let outcome = builder.build(&mut graph, &[], None, &interrupted).unwrap();
		assert!(outcome.success);
		assert_eq!(outcome.commands_run, 3);
	}

	// S5: a failing command is reported and the build exits unsuccessfully.
	#[test]
	fn failing_command_is_reported_and_fails_the_build() {
		let host = FakeHost::new();
		host.put_file("foo.c", "int main() {}".as_bytes().to_vec());
		let mut graph = analyze(&host, "rule falsify\n  command = false\nbuild foo.o: falsify foo.c\n");
		host.script_command("false", failed(""));

		let builder = Builder::new(&host, BuildOptions::default());
		let interrupted = AtomicBool::new(false);
		let outcome = builder.build(&mut graph, &[], None, &interrupted).unwrap();
		assert!(!outcome.success);
		assert!(String::from_utf8(host.stderr()).unwrap().contains("FAILED: false"));
	}

	// Invariant 7: with `-k 2` and three always-failing independent nodes,
	// exactly two commands run before the dispatcher stops starting new ones.
	#[test]
	fn failure_budget_stops_after_k_failures() {
		let host = FakeHost::new();
		let mut graph = analyze(
			&host,
			"rule falsify\n  command = false\nbuild a: falsify\nbuild b: falsify\nbuild c: falsify\n",
		);
		host.script_command("false", failed(""));

		let builder = Builder::new(&host, BuildOptions { jobs: 1, failure_budget: 2, ..BuildOptions::default() });
		let interrupted = AtomicBool::new(false);
		let outcome = builder.build(&mut graph, &[], None, &interrupted).unwrap();
		assert!(!outcome.success);
		assert_eq!(outcome.commands_run, 2);
	}

	// §5: when the failure budget is hit while more than one job is in
	// flight, already-dispatched jobs are drained (their results counted)
	// rather than abandoned the instant the budget is exceeded.
	#[test]
	fn drains_in_flight_jobs_after_failure_budget_is_hit() {
		let host = FakeHost::new();
		let mut graph = analyze(
			&host,
			"rule falsify\n  command = false\nbuild a: falsify\nbuild b: falsify\nbuild c: falsify\n",
		);
		host.script_command("false", failed(""));

		let builder = Builder::new(&host, BuildOptions { jobs: 2, failure_budget: 1, ..BuildOptions::default() });
		let interrupted = AtomicBool::new(false);
		let outcome = builder.build(&mut graph, &[], None, &interrupted).unwrap();
		assert!(!outcome.success);
		assert_eq!(outcome.commands_run, 2);
	}

	// Invariant 8: once outputs are newer than their inputs, a second build
	// performs zero commands.
	#[test]
	fn idempotent_when_outputs_are_already_fresh() {
		let host = FakeHost::new();
		host.put_file("a", "src".as_bytes().to_vec());
		host.put_file("out", "built".as_bytes().to_vec());
		let mut graph = analyze(&host, "rule cc\n  command = cc $in -o $out\nbuild out: cc a\n");

		let builder = Builder::new(&host, BuildOptions::default());
		let interrupted = AtomicBool::new(false);
		let outcome = builder.build(&mut graph, &[], None, &interrupted).unwrap();
		assert!(outcome.success);
		assert_eq!(outcome.commands_run, 0);
	}

	// Dry run never calls the host, but still marks every stale node done.
	#[test]
	fn dry_run_does_not_invoke_commands() {
		let host = FakeHost::new();
		host.put_file("in", "src".as_bytes().to_vec());
		let mut graph = analyze(&host, "rule cc\n  command = cc -o out in\nbuild out: cc in\n");

		let builder = Builder::new(&host, BuildOptions { dry_run: true, ..BuildOptions::default() });
		let interrupted = AtomicBool::new(false);
		let outcome = builder.build(&mut graph, &[], None, &interrupted).unwrap();
		assert!(outcome.success);
		assert_eq!(outcome.commands_run, 1);
		assert!(host.stdout().is_empty() && host.stderr().is_empty());
	}

	// §4.5 condition (c): a node whose output is newer than its inputs is
	// still reported stale if its command changed since the snapshot
	// captured by an actual prior build (not a hand-built `GraphSnapshot`).
	#[test]
	fn stale_nodes_detects_a_changed_command_against_a_real_snapshot() {
		let host = FakeHost::new();
		host.put_file("a", "src".as_bytes().to_vec());
		let prior_graph = analyze(&host, "rule cc\n  command = cc -O2 $in -o $out\nbuild out: cc a\n");
		let snapshot = GraphSnapshot::capture(&prior_graph);

		host.put_file("out", "stale binary".as_bytes().to_vec());
		let new_graph = analyze(&host, "rule cc\n  command = cc -O3 $in -o $out\nbuild out: cc a\n");

		let builder = Builder::new(&host, BuildOptions::default());
		let stale = builder.stale_nodes(&new_graph, &[], Some(&snapshot)).unwrap();
		assert_eq!(stale.len(), 1);
		assert_eq!(new_graph.node(stale[0]).name, "out");
	}

	// Rebuilding .pyn.db's own round trip: a first build with no depfile
	// rules still marks the graph dirty, so the snapshot actually gets
	// written (and is then usable by the next invocation).
	#[test]
	fn first_build_marks_graph_dirty_even_without_depfiles() {
		let host = FakeHost::new();
		host.put_file("a", "src".as_bytes().to_vec());
		let mut graph = analyze(&host, "rule cc\n  command = cc $in -o $out\nbuild out: cc a\n");
		host.script_command("cc a -o out", ok(""));

		let builder = Builder::new(&host, BuildOptions::default());
		let interrupted = AtomicBool::new(false);
		let outcome = builder.build(&mut graph, &[], None, &interrupted).unwrap();
		assert!(outcome.success);
		assert!(graph.is_dirty);
	}

	// §4.5: a dependency that is neither a graph node nor present on disk is
	// a fatal error at dispatch time, not a staleness-time one.
	#[test]
	fn missing_non_node_source_is_a_dispatch_error() {
		let host = FakeHost::new();
		let mut graph = analyze(&host, "rule cc\n  command = cc $in -o $out\nbuild out: cc missing.c\n");

		let builder = Builder::new(&host, BuildOptions::default());
		let interrupted = AtomicBool::new(false);
		let result = builder.build(&mut graph, &[], None, &interrupted);
		assert!(matches!(result, Err(BuilderError::MissingSource { .. })));
	}
}
