//! Formats the `NINJA_STATUS` progress template.
//!
//! The template language is the same handful of `%`-escapes Ninja itself
//! understands; see the environment variable's documentation in the CLI
//! help text for the full list.

use std::time::Duration;

pub const DEFAULT_STATUS_FORMAT: &str = "[%s/%t] ";

/// A snapshot of the scheduler's counters at the moment a status line is
/// produced.
#[derive(Debug, Clone, Copy)]
pub struct BuildStats {
	pub started: usize,
	pub finished: usize,
	pub total: usize,
	pub elapsed: Duration,
}

impl BuildStats {
	/// Render `format` (a `NINJA_STATUS`-style template) against this
	/// snapshot.
	pub fn format(&self, format: &str) -> String {
		let mut out = String::with_capacity(format.len());
		let mut chars = format.chars().peekable();
		while let Some(c) = chars.next() {
			if c != '%' {
				out.push(c);
				continue;
			}
			match chars.next() {
				Some('s') => out.push_str(&self.started.to_string()),
				Some('f') => out.push_str(&self.finished.to_string()),
				Some('t') => out.push_str(&self.total.to_string()),
				Some('r') => out.push_str(&(self.started - self.finished).to_string()),
				Some('e') => out.push_str(&format!("{:.3}", self.elapsed.as_secs_f64())),
				Some('o') => {
					if self.started == 0 {
						out.push_str(" --- ");
					} else {
						let rate = self.finished as f64 / self.elapsed.as_secs_f64();
						out.push_str(&format!("{:.1}", rate));
					}
				}
				Some('p') => {
					if self.total == 0 {
						out.push_str(" --- ");
					} else {
						let pct = 100.0 * self.started as f64 / self.total as f64;
						out.push_str(&format!("{:.1}", pct));
					}
				}
				Some('%') => out.push('%'),
				Some(other) => {
					out.push('%');
					out.push(other);
				}
				None => out.push('%'),
			}
		}
		out
	}
}
