mod error;
mod logger;
mod subtools;

use error::PynError;
use pyn::analyzer::Analyzer;
use pyn::builder::{BuildOptions, Builder, Verbosity};
use pyn::graph::Graph;
use pyn::host::{Host, RealHost};
use pyn::persist::{GraphSnapshot, DEFAULT_PATH};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(name = "pyn", about = "A from-scratch ninja-compatible build executor.")]
struct Options {
	#[structopt(long = "version")]
	version: bool,

	/// Change to DIR before doing anything else.
	#[structopt(short = "C")]
	chdir: Option<PathBuf>,

	/// The build file to read.
	#[structopt(short = "f", default_value = "build.ninja")]
	file: PathBuf,

	/// Run N jobs in parallel; defaults to the CPU count.
	#[structopt(short = "j")]
	jobs: Option<usize>,

	/// Keep going until N failures (0 means never stop early).
	#[structopt(short = "k", default_value = "1")]
	keep_going: usize,

	/// Load-average cap; accepted for compatibility, has no effect.
	#[structopt(short = "l")]
	load_average: Option<f64>,

	/// Dry run: show what would be built without running anything.
	#[structopt(short = "n")]
	dry_run: bool,

	#[structopt(short = "v", parse(from_occurrences))]
	verbose: u8,

	/// Debugging mode; no modes are currently implemented.
	#[structopt(short = "d")]
	debug_mode: Option<String>,

	/// Run the named subtool instead of building.
	#[structopt(short = "t")]
	tool: Option<String>,

	#[structopt(long = "overwrite-status")]
	overwrite_status: bool,

	#[structopt(long = "no-overwrite-status")]
	no_overwrite_status: bool,

	/// Build targets, or (with `-t`) the subtool's own arguments.
	targets: Vec<String>,
}

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_sigint(_: i32) {
	INTERRUPTED.store(true, Ordering::SeqCst);
}

fn install_sigint_handler() {
	use nix::sys::signal::{signal, SigHandler, Signal};
	unsafe {
		let _ = signal(Signal::SIGINT, SigHandler::Handler(handle_sigint));
	}
}

fn main() {
	let options = Options::from_args();
	let code = match run(options) {
		Ok(code) => code,
		Err(e) => {
			eprintln!("pyn: {}", e);
			e.exit_code()
		}
	};
	std::process::exit(code);
}

fn run(options: Options) -> Result<i32, PynError> {
	if options.version {
		println!("pyn {}", env!("CARGO_PKG_VERSION"));
		return Ok(0);
	}

	if let Some(mode) = &options.debug_mode {
		return Err(PynError::Argument(format!("-d {}: no debug modes are implemented", mode)));
	}

	let host = RealHost;

	if let Some(dir) = &options.chdir {
		if !host.exists(dir) {
			return Err(error::missing_dir(dir));
		}
		host.chdir(dir)?;
	}

	if !host.exists(&options.file) {
		return Err(error::missing_file(&options.file));
	}

	logger::init(options.verbose);
	install_sigint_handler();

	let analyzer = Analyzer::new(&host);
	let graph = analyzer.analyze(&options.file)?;

	let db_path = PathBuf::from(DEFAULT_PATH);

	if let Some(tool) = &options.tool {
		let ctx = subtools::ToolContext {
			host: &host,
			graph: &graph,
			db_path: &db_path,
			args: &options.targets,
		};
		return subtools::run_subtool(tool, &ctx);
	}

	build(&host, graph, &options, &db_path)
}

fn build(host: &RealHost, mut graph: Graph, options: &Options, db_path: &PathBuf) -> Result<i32, PynError> {
	let old_snapshot = load_fresh_snapshot(host, db_path);

	let verbosity = match options.verbose {
		0 => Verbosity::Quiet,
		1 => Verbosity::V,
		_ => Verbosity::VV,
	};

	let overwrite_status = if options.overwrite_status {
		true
	} else if options.no_overwrite_status {
		false
	} else {
		term_size::dimensions_stderr().is_some()
	};

	let status_format = host
		.getenv("NINJA_STATUS")
		.unwrap_or_else(|| pyn::stats::DEFAULT_STATUS_FORMAT.to_string());

	let build_options = BuildOptions {
		jobs: options.jobs.unwrap_or_else(|| host.cpu_count()),
		failure_budget: if options.keep_going == 0 { usize::max_value() } else { options.keep_going },
		dry_run: options.dry_run,
		verbosity,
		overwrite_status,
		status_format,
	};

	let builder = Builder::new(host, build_options);
	let outcome = builder.build(&mut graph, &options.targets, old_snapshot.as_ref(), &INTERRUPTED)?;

	if graph.is_dirty {
		let snapshot = GraphSnapshot::capture(&graph);
		let _ = host.write(db_path, &snapshot.encode());
	}

	if INTERRUPTED.load(Ordering::SeqCst) {
		return Err(PynError::Interrupted);
	}

	Ok(if outcome.success { 0 } else { 1 })
}

/// Load `.pyn.db`, but only if it's newer than every source file it recorded
/// last time around; a snapshot that might be stale is worse than no
/// snapshot, since it would wrongly mark freshly-edited commands as clean.
fn load_fresh_snapshot(host: &RealHost, db_path: &PathBuf) -> Option<GraphSnapshot> {
	let bytes = host.read_bytes(db_path).ok()?;
	let snapshot = GraphSnapshot::decode(&bytes).ok()?;
	let db_mtime = host.mtime(db_path)?;
	for source in &snapshot.source_files {
		match host.mtime(source) {
			Some(mtime) if mtime <= db_mtime => {}
			_ => return None,
		}
	}
	Some(snapshot)
}
