//! The top-level error type `main` formats to stderr and maps to an exit
//! code. Every other fallible function in this crate returns something more
//! specific; this is where those funnel together.

use pyn::builder::BuilderError;
use pyn::error::ErrorWithLocation;
use pyn::graph::GraphError;
use pyn::spec::error::AnalysisError;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum PynError {
	/// A bad flag, unknown subtool, or missing `-C`/`-f` target.
	Argument(String),
	Analysis(ErrorWithLocation<AnalysisError>),
	Graph(GraphError),
	Builder(BuilderError),
	Io(std::io::Error),
	Interrupted,
}

impl PynError {
	pub fn exit_code(&self) -> i32 {
		match self {
			PynError::Argument(_) => 2,
			PynError::Analysis(_) | PynError::Graph(_) | PynError::Builder(_) | PynError::Io(_) => 1,
			PynError::Interrupted => 130,
		}
	}
}

impl fmt::Display for PynError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			PynError::Argument(msg) => write!(f, "{}", msg),
			PynError::Analysis(e) => write!(f, "{}", e),
			PynError::Graph(e) => write!(f, "{}", e),
			PynError::Builder(e) => write!(f, "{}", e),
			PynError::Io(e) => write!(f, "{}", e),
			PynError::Interrupted => write!(f, "Interrupted"),
		}
	}
}

impl std::error::Error for PynError {}

impl From<ErrorWithLocation<AnalysisError>> for PynError {
	fn from(e: ErrorWithLocation<AnalysisError>) -> Self {
		PynError::Analysis(e)
	}
}

impl From<GraphError> for PynError {
	fn from(e: GraphError) -> Self {
		PynError::Graph(e)
	}
}

impl From<BuilderError> for PynError {
	fn from(e: BuilderError) -> Self {
		PynError::Builder(e)
	}
}

impl From<std::io::Error> for PynError {
	fn from(e: std::io::Error) -> Self {
		PynError::Io(e)
	}
}

/// Fail with an argument error naming a missing directory.
pub fn missing_dir(path: &std::path::Path) -> PynError {
	PynError::Argument(format!("{}: no such directory", path.display()))
}

/// Fail with an argument error naming a missing build file.
pub fn missing_file(path: &PathBuf) -> PynError {
	PynError::Argument(format!("{}: no such file", path.display()))
}
