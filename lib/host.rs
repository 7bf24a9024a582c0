//! The collaborators the core depends on but does not implement itself:
//! the filesystem, process invocation, the clock, and the environment.
//!
//! Everything the parser, analyzer, and builder need from the outside world
//! goes through this one trait, so tests can swap in [`FakeHost`] instead of
//! touching the real filesystem or spawning real processes.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Instant, SystemTime};

/// The result of running a command through [`Host::call`].
#[derive(Debug, Clone)]
pub struct CommandOutput {
	pub success: bool,
	pub stdout: Vec<u8>,
	pub stderr: Vec<u8>,
}

pub trait Host {
	fn exists(&self, path: &Path) -> bool;
	fn read_to_string(&self, path: &Path) -> io::Result<String>;
	fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>>;
	fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
	fn remove_file(&self, path: &Path) -> io::Result<()>;
	fn mtime(&self, path: &Path) -> Option<SystemTime>;
	/// Create the parent directory of `path`, if it doesn't exist.
	fn maybe_mkdir_for(&self, path: &Path) -> io::Result<()>;
	/// Run `command` through `sh -c`, capturing stdout/stderr.
	fn call(&self, command: &str) -> io::Result<CommandOutput>;
	fn cpu_count(&self) -> usize;
	fn getenv(&self, name: &str) -> Option<String>;
	fn now(&self) -> Instant;
	fn chdir(&self, path: &Path) -> io::Result<()>;
	fn print_out(&self, s: &str);
	fn print_err(&self, s: &str);
}

/// The real, filesystem- and process-backed [`Host`].
pub struct RealHost;

impl Host for RealHost {
	fn exists(&self, path: &Path) -> bool {
		path.exists()
	}

	fn read_to_string(&self, path: &Path) -> io::Result<String> {
		std::fs::read_to_string(path)
	}

	fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>> {
		std::fs::read(path)
	}

	fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
		std::fs::write(path, contents)
	}

	fn remove_file(&self, path: &Path) -> io::Result<()> {
		std::fs::remove_file(path)
	}

	fn mtime(&self, path: &Path) -> Option<SystemTime> {
		std::fs::metadata(path).and_then(|m| m.modified()).ok()
	}

	fn maybe_mkdir_for(&self, path: &Path) -> io::Result<()> {
		match path.parent() {
			Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir),
			_ => Ok(()),
		}
	}

	fn call(&self, command: &str) -> io::Result<CommandOutput> {
		let output = std::process::Command::new("sh").arg("-c").arg(command).output()?;
		Ok(CommandOutput {
			success: output.status.success(),
			stdout: output.stdout,
			stderr: output.stderr,
		})
	}

	fn cpu_count(&self) -> usize {
		std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
	}

	fn getenv(&self, name: &str) -> Option<String> {
		std::env::var(name).ok()
	}

	fn now(&self) -> Instant {
		Instant::now()
	}

	fn chdir(&self, path: &Path) -> io::Result<()> {
		std::env::set_current_dir(path)
	}

	fn print_out(&self, s: &str) {
		print!("{}", s);
		use std::io::Write;
		let _ = std::io::stdout().flush();
	}

	fn print_err(&self, s: &str) {
		eprint!("{}", s);
		use std::io::Write;
		let _ = std::io::stderr().flush();
	}
}

/// An in-memory [`Host`] for tests: files live in a map, commands are looked
/// up in a scripted table instead of actually being run.
pub struct FakeHost {
	files: Mutex<BTreeMap<PathBuf, (Vec<u8>, SystemTime)>>,
	commands: Mutex<BTreeMap<String, CommandOutput>>,
	clock: Mutex<SystemTime>,
	out: Mutex<Vec<u8>>,
	err: Mutex<Vec<u8>>,
	cpus: usize,
}

impl FakeHost {
	pub fn new() -> Self {
		FakeHost {
			files: Mutex::new(BTreeMap::new()),
			commands: Mutex::new(BTreeMap::new()),
			clock: Mutex::new(SystemTime::UNIX_EPOCH),
			out: Mutex::new(Vec::new()),
			err: Mutex::new(Vec::new()),
			cpus: 1,
		}
	}

	pub fn with_cpus(mut self, cpus: usize) -> Self {
		self.cpus = cpus;
		self
	}

	/// Seed a file with the given contents, stamped with the current virtual
	/// clock time, then advance the clock by one tick so later writes sort
	/// after it.
	pub fn put_file(&self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
		let mut clock = self.clock.lock().unwrap();
		*clock += std::time::Duration::from_secs(1);
		self.files.lock().unwrap().insert(path.into(), (contents.into(), *clock));
	}

	/// Script the result of calling `command` verbatim.
	pub fn script_command(&self, command: impl Into<String>, output: CommandOutput) {
		self.commands.lock().unwrap().insert(command.into(), output);
	}

	pub fn stdout(&self) -> Vec<u8> {
		self.out.lock().unwrap().clone()
	}

	pub fn stderr(&self) -> Vec<u8> {
		self.err.lock().unwrap().clone()
	}
}

impl Host for FakeHost {
	fn exists(&self, path: &Path) -> bool {
		self.files.lock().unwrap().contains_key(path)
	}

	fn read_to_string(&self, path: &Path) -> io::Result<String> {
		self.read_bytes(path).and_then(|b| {
			String::from_utf8(b).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
		})
	}

	fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>> {
		self.files
			.lock()
			.unwrap()
			.get(path)
			.map(|(contents, _)| contents.clone())
			.ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{}", path.display())))
	}

	fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
		let mut clock = self.clock.lock().unwrap();
		*clock += std::time::Duration::from_secs(1);
		self.files
			.lock()
			.unwrap()
			.insert(path.to_path_buf(), (contents.to_vec(), *clock));
		Ok(())
	}

	fn remove_file(&self, path: &Path) -> io::Result<()> {
		self.files
			.lock()
			.unwrap()
			.remove(path)
			.map(|_| ())
			.ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{}", path.display())))
	}

	fn mtime(&self, path: &Path) -> Option<SystemTime> {
		self.files.lock().unwrap().get(path).map(|(_, t)| *t)
	}

	fn maybe_mkdir_for(&self, _path: &Path) -> io::Result<()> {
		Ok(())
	}

	fn call(&self, command: &str) -> io::Result<CommandOutput> {
		Ok(self.commands.lock().unwrap().get(command).cloned().unwrap_or(CommandOutput {
			success: true,
			stdout: Vec::new(),
			stderr: Vec::new(),
		}))
	}

	fn cpu_count(&self) -> usize {
		self.cpus
	}

	fn getenv(&self, _name: &str) -> Option<String> {
		None
	}

	fn now(&self) -> Instant {
		Instant::now()
	}

	fn chdir(&self, _path: &Path) -> io::Result<()> {
		Ok(())
	}

	fn print_out(&self, s: &str) {
		self.out.lock().unwrap().extend_from_slice(s.as_bytes());
	}

	fn print_err(&self, s: &str) {
		self.err.lock().unwrap().extend_from_slice(s.as_bytes());
	}
}
