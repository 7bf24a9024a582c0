//! A small `log`-crate facade for internal diagnostics (parsing, analysis,
//! and dispatch decisions). Distinct from the user-facing status line and
//! `FAILED:` messages, which always go straight through `Host::print_out`/
//! `print_err` rather than through here.

use log::{LevelFilter, Metadata, Record};

pub struct Logger;

impl log::Log for Logger {
	fn enabled(&self, metadata: &Metadata) -> bool {
		metadata.level() <= log::max_level()
	}

	fn log(&self, record: &Record) {
		if self.enabled(record.metadata()) {
			eprintln!("[{}] {}: {}", record.level(), record.target(), record.args());
		}
	}

	fn flush(&self) {}
}

static LOGGER: Logger = Logger;

/// Install the logger, picking a level from `PYN_LOG` if set, falling back
/// to one derived from `-v`/`-vv`.
pub fn init(verbosity_level: u8) {
	let level = std::env::var("PYN_LOG")
		.ok()
		.and_then(|v| v.parse::<LevelFilter>().ok())
		.unwrap_or_else(|| match verbosity_level {
			0 => LevelFilter::Warn,
			1 => LevelFilter::Info,
			_ => LevelFilter::Trace,
		});
	log::set_max_level(level);
	let _ = log::set_logger(&LOGGER);
}
