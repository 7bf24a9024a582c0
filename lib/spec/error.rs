//! Errors that can occur while parsing or analyzing `build.ninja` files.

use crate::error::ErrorWithLocation;
use std::error::Error;
use std::fmt;

/// A syntax error in a single file, as produced by the [`Parser`][super::parse::Parser].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ParseError {
	ExpectedStatement,
	ExpectedVarDef,
	UnexpectedIndent,
	ExpectedPath,
	ExpectedColon,
	ExpectedName,
	ExpectedRuleName,
	ExpectedEndOfLine,
	Expansion(ExpansionError),
}

impl fmt::Display for ParseError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		use self::ParseError::*;
		match self {
			ExpectedStatement => write!(
				f,
				"expected `build', `rule', `pool', `default', `include', `subninja', or `var = value'"
			),
			ExpectedVarDef => write!(f, "expected `var = value'"),
			UnexpectedIndent => write!(f, "unexpected indent"),
			ExpectedPath => write!(f, "missing path"),
			ExpectedColon => write!(f, "missing `:'"),
			ExpectedName => write!(f, "missing name of definition"),
			ExpectedRuleName => write!(f, "missing rule name"),
			ExpectedEndOfLine => write!(f, "garbage at end of line"),
			Expansion(e) => write!(f, "{}", e),
		}
	}
}

impl Error for ParseError {}

impl From<ExpansionError> for ParseError {
	fn from(src: ExpansionError) -> ParseError {
		ParseError::Expansion(src)
	}
}

/// An error while expanding `$`-references in a string.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ExpansionError {
	/// A `$` at the end of the input, with nothing to escape.
	DanglingDollar,
	/// `${` was not followed by a valid name and a closing `}`.
	UnterminatedBrace,
	/// `$` was followed by something that can't start a name (such as a digit).
	InvalidVariableName,
	/// A variable's value refers back to itself, directly or indirectly.
	RecursionTooDeep { var_name: String },
}

impl fmt::Display for ExpansionError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			ExpansionError::DanglingDollar => write!(f, "`$' at end of input"),
			ExpansionError::UnterminatedBrace => write!(f, "missing closing `}}' in `${{...}}'"),
			ExpansionError::InvalidVariableName => {
				write!(f, "`$' not followed by a valid variable name")
			}
			ExpansionError::RecursionTooDeep { var_name } => {
				write!(f, "variable `{}' refers to itself while expanding", var_name)
			}
		}
	}
}

impl Error for ExpansionError {}

/// An error while analyzing a parsed `build.ninja` file into a [`Graph`][crate::graph::Graph].
#[derive(Debug)]
pub enum AnalysisError {
	/// Some syntax error.
	Parse(ParseError),
	/// A `build` statement refers to a `rule` which doesn't exist.
	UndefinedRule(String),
	/// A rule with this name was already defined in this graph.
	DuplicateRule(String),
	/// A pool with this name was already defined in this graph.
	DuplicatePool(String),
	/// An output with this name was already produced by another node.
	DuplicateOutput(String),
	/// A scope with this name was already registered (two files with the same name).
	DuplicateScope(String),
	/// The `depth` value of a `pool` is not a positive integer.
	InvalidPoolDepth,
	/// A `pool` definition is missing its `depth = ` variable, or has more than one variable.
	ExpectedPoolDepth,
	/// An `include` or `subninja` path could not be read.
	Io { file_name: std::path::PathBuf, error: std::io::Error },
	/// Variable expansion encountered a cycle.
	Expansion(ExpansionError),
}

impl fmt::Display for AnalysisError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			AnalysisError::Parse(e) => write!(f, "{}", e),
			AnalysisError::UndefinedRule(n) => write!(f, "undefined rule name: {}", n),
			AnalysisError::DuplicateRule(n) => write!(f, "duplicate rule: {}", n),
			AnalysisError::DuplicatePool(n) => write!(f, "duplicate pool: {}", n),
			AnalysisError::DuplicateOutput(n) => write!(f, "multiple rules generate {}", n),
			AnalysisError::DuplicateScope(n) => write!(f, "file read more than once: {}", n),
			AnalysisError::InvalidPoolDepth => write!(f, "invalid pool depth"),
			AnalysisError::ExpectedPoolDepth => write!(f, "missing `depth = ' line"),
			AnalysisError::Io { file_name, error } => {
				write!(f, "unable to read {}: {}", file_name.display(), error)
			}
			AnalysisError::Expansion(e) => write!(f, "{}", e),
		}
	}
}

impl Error for AnalysisError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			AnalysisError::Io { error, .. } => Some(error),
			_ => None,
		}
	}
}

impl From<ParseError> for AnalysisError {
	fn from(src: ParseError) -> AnalysisError {
		AnalysisError::Parse(src)
	}
}

impl From<ExpansionError> for AnalysisError {
	fn from(src: ExpansionError) -> AnalysisError {
		AnalysisError::Expansion(src)
	}
}

impl From<ErrorWithLocation<ParseError>> for ErrorWithLocation<AnalysisError> {
	fn from(src: ErrorWithLocation<ParseError>) -> Self {
		src.convert()
	}
}

impl From<ErrorWithLocation<ExpansionError>> for ErrorWithLocation<AnalysisError> {
	fn from(src: ErrorWithLocation<ExpansionError>) -> Self {
		src.convert()
	}
}
