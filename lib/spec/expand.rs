//! `$`-expansion, as used both by variable definitions and by rule commands.

use super::error::ExpansionError;
use super::scope::{FoundVar, VarScope};

/// How many nested variable expansions to follow before giving up.
///
/// A real cycle (`a` expands to something containing `$a`) would otherwise
/// recurse forever; this catches that without having to track the exact
/// chain of names involved.
const MAX_EXPANSION_DEPTH: u32 = 64;

/// Expand a string containing `$`-references against `scope`.
pub fn expand_str<S: VarScope>(source: &str, scope: &S) -> Result<String, ExpansionError> {
	let mut out = String::with_capacity(source.len());
	expand_str_to(source, scope, &mut out, 0)?;
	Ok(out)
}

/// Expand the value of a single variable, such as a rule's `command`.
///
/// Takes the variable name without the leading `$`. Variables that are not
/// found expand to the empty string.
pub fn expand_var<S: VarScope>(var_name: &str, scope: &S) -> Result<String, ExpansionError> {
	let mut out = String::new();
	expand_var_to(var_name, scope, &mut out, 0)?;
	Ok(out)
}

fn expand_var_to<S: VarScope>(
	var_name: &str,
	scope: &S,
	out: &mut String,
	depth: u32,
) -> Result<(), ExpansionError> {
	match scope.lookup_var(var_name) {
		Some(FoundVar::Expanded(v)) => out.push_str(v),
		Some(FoundVar::Unexpanded(v)) => {
			if depth >= MAX_EXPANSION_DEPTH {
				return Err(ExpansionError::RecursionTooDeep {
					var_name: var_name.to_string(),
				});
			}
			expand_str_to(v, scope, out, depth + 1)?;
		}
		None => {}
	}
	Ok(())
}

fn expand_str_to<S: VarScope>(
	mut source: &str,
	scope: &S,
	out: &mut String,
	depth: u32,
) -> Result<(), ExpansionError> {
	loop {
		match source.find('$') {
			None => {
				out.push_str(source);
				return Ok(());
			}
			Some(i) => {
				out.push_str(&source[..i]);
				source = &source[i + 1..];
			}
		}
		let mut chars = source.chars();
		match chars.next() {
			None => return Err(ExpansionError::DanglingDollar),
			Some('$') => {
				out.push('$');
				source = chars.as_str();
			}
			Some(' ') => {
				out.push(' ');
				source = chars.as_str();
			}
			Some(':') => {
				out.push(':');
				source = chars.as_str();
			}
			Some('\n') => {
				source = chars.as_str().trim_start_matches(|c| c == ' ' || c == '\t');
			}
			Some('{') => {
				let rest = chars.as_str();
				let end = rest
					.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
					.unwrap_or(rest.len());
				let (name, after) = rest.split_at(end);
				if name.is_empty() || !after.starts_with('}') {
					return Err(ExpansionError::UnterminatedBrace);
				}
				expand_var_to(name, scope, out, depth)?;
				source = &after[1..];
			}
			Some(c) if c.is_ascii_alphabetic() || c == '_' => {
				let end = source
					.find(|c: char| !(c.is_ascii_alphabetic() || c == '_'))
					.unwrap_or(source.len());
				let (name, rest) = source.split_at(end);
				expand_var_to(name, scope, out, depth)?;
				source = rest;
			}
			Some(_) => return Err(ExpansionError::InvalidVariableName),
		}
	}
}
