//! The lookup contract used by [`expand`](super::expand) to resolve
//! `$`-references.
//!
//! This module only defines the trait; the actual scope storage (an arena of
//! named variable maps with a parent chain) lives in [`crate::graph`], which
//! is the thing that actually owns a build's scope tree.

/// What a variable lookup found.
pub enum FoundVar<'a> {
	/// The value is already fully expanded; use it as-is.
	Expanded(&'a str),
	/// The value still contains `$`-references (this is how `rule` bodies
	/// are stored) and must be expanded before use.
	Unexpanded(&'a str),
}

/// A scope that [`expand::expand_str`](super::expand::expand_str) can resolve
/// variable references against.
pub trait VarScope {
	fn lookup_var(&self, var_name: &str) -> Option<FoundVar>;
}
