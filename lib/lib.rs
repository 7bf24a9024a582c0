//! This library crate contains the reusable parts of `pyn`, an
//! implementation of the Ninja build system.
//!
//! # Pipeline
//!
//! ```text
//! source text -> spec::parse -> analyzer -> graph::Graph -> builder -> host
//! ```
//!
//! - The [`spec`] module is the `build.ninja` grammar: parsing and
//!   `$`-expansion, with no notion of a node or a dependency graph.
//! - [`analyzer`] walks a parsed file (and everything it `include`s or
//!   `subninja`s) into a single assembled [`graph::Graph`].
//! - [`graph`] holds the DAG itself (scopes, rules, nodes) and the
//!   algorithms (`closure`, `tsort`, `roots`) the scheduler needs.
//! - [`builder`] is the incremental scheduler: it figures out what's stale
//!   and drives a [`pool`] of workers to rebuild it.
//! - [`host`] is the trait that gathers every external effect (filesystem,
//!   process invocation, the clock) the rest of the crate depends on.
//! - [`depfile`] reads the gcc-style dependency files compilers emit.
//! - [`persist`] reads and writes the `.pyn.db` incremental-build snapshot.
//! - [`stats`] and [`printer`] implement the `NINJA_STATUS` progress line.
//!
//! # Error handling
//!
//! [`error::ErrorWithLocation`] adds location information (file name and
//! line number) to an error, so the user can be told where in a build file
//! something went wrong.

pub mod analyzer;
pub mod builder;
pub mod depfile;
pub mod error;
pub mod graph;
pub mod host;
pub mod persist;
pub mod pool;
pub mod printer;
pub mod spec;
pub mod stats;
