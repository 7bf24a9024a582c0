//! The single status line printed during a build: either overwritten in
//! place (when stderr is a terminal) or appended line by line otherwise.

const DEFAULT_WIDTH: usize = 80;

/// Tracks the length of the previously printed line so it can be blanked
/// out before the next one is written.
pub struct Printer {
	overwrite: bool,
	prior_len: usize,
}

impl Printer {
	pub fn new(overwrite: bool) -> Self {
		Printer {
			overwrite,
			prior_len: 0,
		}
	}

	/// Print `line` as the current status, replacing whatever status line is
	/// currently on screen (in overwrite mode).
	pub fn update(&mut self, line: &str, out: &dyn Fn(&str)) {
		let line = if self.overwrite { elide(line, terminal_width()) } else { line.to_string() };
		if self.overwrite {
			out(&format!("\r{}\r", " ".repeat(self.prior_len)));
			out(&line);
			self.prior_len = line.chars().count();
		} else {
			out(&line);
			out("\n");
		}
	}

	/// Print a line that should stick around (a `FAILED:` message, a
	/// `-v`/`-vv` echo): always un-elided, and on its own line.
	pub fn print_sticky(&mut self, line: &str, out: &dyn Fn(&str)) {
		if self.overwrite {
			out(&format!("\r{}\r", " ".repeat(self.prior_len)));
		}
		out(line);
		out("\n");
		self.prior_len = 0;
	}

	/// Finish the current status line with a trailing newline.
	pub fn flush(&mut self, out: &dyn Fn(&str)) {
		if self.overwrite && self.prior_len > 0 {
			out("\n");
			self.prior_len = 0;
		}
	}
}

fn elide(line: &str, width: usize) -> String {
	let len = line.chars().count();
	if len <= width {
		return line.to_string();
	}
	if width <= 3 {
		return line.chars().take(width).collect();
	}
	let keep = width - 2;
	let truncated: String = line.chars().take(keep).collect();
	format!("{} …", truncated)
}

fn terminal_width() -> usize {
	term_size::dimensions().map(|(w, _)| w).unwrap_or(DEFAULT_WIDTH)
}

#[cfg(test)]
mod test {
	use super::*;
	use std::cell::RefCell;

	#[test]
	fn elides_long_lines_to_width() {
		let elided = elide(&"x".repeat(100), 10);
		assert_eq!(elided.chars().count(), 10);
		assert!(elided.ends_with(" …"));
	}

	#[test]
	fn short_lines_are_untouched() {
		assert_eq!(elide("short", 80), "short");
	}

	#[test]
	fn overwrite_mode_blanks_the_prior_line_first() {
		let buf = RefCell::new(String::new());
		let mut printer = Printer::new(true);
		printer.update("[1/2] a", &|s| buf.borrow_mut().push_str(s));
		printer.update("x", &|s| buf.borrow_mut().push_str(s));
		let out = buf.borrow();
		assert!(out.contains(&" ".repeat("[1/2] a".len())));
	}

	#[test]
	fn non_overwrite_mode_never_elides_and_always_newlines() {
		let buf = RefCell::new(String::new());
		let mut printer = Printer::new(false);
		printer.update(&"x".repeat(200), &|s| buf.borrow_mut().push_str(s));
		assert_eq!(buf.borrow().chars().filter(|&c| c == 'x').count(), 200);
		assert!(buf.borrow().ends_with('\n'));
	}
}
