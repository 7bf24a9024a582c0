//! Reading of gcc-style (Makefile fragment) dependency files.
//!
//! These are written by compilers alongside their real output, listing the
//! headers (or other files) they ended up reading, so that a rebuild can be
//! triggered when any of them change even though they're not written
//! anywhere in the `build.ninja` file itself.

use std::io;

/// Read a gcc-style dependency file.
///
/// `f` is called once per `target: dep dep dep` line with the target name
/// and its dependency list. Backslash-newline continuations are joined
/// before splitting; anything past that is whitespace-separated tokens, with
/// no further escaping understood.
pub fn read_deps_file(bytes: &[u8], mut f: impl FnMut(String, Vec<String>)) -> io::Result<()> {
	let text = std::str::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
	let joined = text.replace("\\\r\n", " ").replace("\\\n", " ");
	for line in joined.lines() {
		let mut tokens = line.split_whitespace().peekable();
		let first = match tokens.next() {
			Some(t) => t,
			None => continue,
		};
		let target = match first.strip_suffix(':') {
			Some(stripped) => stripped.to_string(),
			None => first.to_string(),
		};
		if tokens.peek() == Some(&":") {
			tokens.next();
		}
		let deps: Vec<String> = tokens.map(str::to_string).collect();
		f(target, deps);
	}
	Ok(())
}
