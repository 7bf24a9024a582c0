//! The `build.ninja` grammar: lexing/parsing and `$`-expansion.
//!
//! > source text → [`parse::Parser`] → [`parse::Decl`] → (resolved by
//! > [`crate::analyzer`]) → [`crate::graph::Graph`]
//!
//! This module only knows about syntax; it has no notion of a node, a rule,
//! or a dependency graph. Those live in [`crate::graph`] and are assembled by
//! [`crate::analyzer`].

mod eat;

pub mod error;
pub mod expand;
pub mod parse;
pub mod scope;
