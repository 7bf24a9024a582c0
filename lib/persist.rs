//! Reading and writing `.pyn.db`, the incremental-build snapshot.
//!
//! This is deliberately not the pickle format of the tool this one is
//! modeled on: it's a small length-prefixed binary encoding, private to this
//! crate, with no ambition of being read by anything else.

use crate::graph::Graph;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use indexmap::IndexMap;
use std::io::{self, Cursor, Read, Write};
use std::path::PathBuf;

const MAGIC: &[u8; 4] = b"PYN1";

pub const DEFAULT_PATH: &str = ".pyn.db";

/// One non-phony node's persisted state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSnapshot {
	pub command: String,
	pub depsfile_deps: Vec<String>,
}

/// Everything needed to decide, on the next run, whether the build file (or
/// anything it pulled in) changed, and whether each node's command changed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GraphSnapshot {
	pub source_files: Vec<PathBuf>,
	pub nodes: IndexMap<String, NodeSnapshot>,
}

impl GraphSnapshot {
	/// Capture the parts of `graph` that need to survive to the next run.
	pub fn capture(graph: &Graph) -> Self {
		let mut source_files = vec![graph.root_file.clone()];
		source_files.extend(graph.includes.iter().cloned());
		source_files.extend(graph.subninjas.iter().cloned());

		let mut nodes = IndexMap::new();
		for (name, command) in &graph.commands {
			let node_id = graph.lookup_node(name).expect("commands are keyed by known node names");
			nodes.insert(
				name.clone(),
				NodeSnapshot {
					command: command.clone(),
					depsfile_deps: graph.node(node_id).depsfile_deps.clone(),
				},
			);
		}

		GraphSnapshot { source_files, nodes }
	}

	pub fn encode(&self) -> Vec<u8> {
		let mut out = Vec::new();
		out.extend_from_slice(MAGIC);
		write_u32(&mut out, self.source_files.len() as u32);
		for f in &self.source_files {
			write_string(&mut out, &f.display().to_string());
		}
		write_u32(&mut out, self.nodes.len() as u32);
		for (name, snapshot) in &self.nodes {
			write_string(&mut out, name);
			write_string(&mut out, &snapshot.command);
			write_u32(&mut out, snapshot.depsfile_deps.len() as u32);
			for dep in &snapshot.depsfile_deps {
				write_string(&mut out, dep);
			}
		}
		out
	}

	pub fn decode(bytes: &[u8]) -> io::Result<Self> {
		let mut cursor = Cursor::new(bytes);
		let mut magic = [0u8; 4];
		cursor.read_exact(&mut magic)?;
		if &magic != MAGIC {
			return Err(io::Error::new(io::ErrorKind::InvalidData, "bad .pyn.db magic"));
		}

		let file_count = cursor.read_u32::<LittleEndian>()?;
		let mut source_files = Vec::with_capacity(file_count as usize);
		for _ in 0..file_count {
			source_files.push(PathBuf::from(read_string(&mut cursor)?));
		}

		let node_count = cursor.read_u32::<LittleEndian>()?;
		let mut nodes = IndexMap::with_capacity(node_count as usize);
		for _ in 0..node_count {
			let name = read_string(&mut cursor)?;
			let command = read_string(&mut cursor)?;
			let dep_count = cursor.read_u32::<LittleEndian>()?;
			let mut depsfile_deps = Vec::with_capacity(dep_count as usize);
			for _ in 0..dep_count {
				depsfile_deps.push(read_string(&mut cursor)?);
			}
			nodes.insert(name, NodeSnapshot { command, depsfile_deps });
		}

		Ok(GraphSnapshot { source_files, nodes })
	}
}

fn write_u32(out: &mut Vec<u8>, n: u32) {
	out.write_u32::<LittleEndian>(n).expect("writing to a Vec cannot fail");
}

fn write_string(out: &mut Vec<u8>, s: &str) {
	write_u32(out, s.len() as u32);
	out.extend_from_slice(s.as_bytes());
}

fn read_string(cursor: &mut Cursor<&[u8]>) -> io::Result<String> {
	let len = cursor.read_u32::<LittleEndian>()? as usize;
	let mut buf = vec![0u8; len];
	cursor.read_exact(&mut buf)?;
	String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn encode_decode_roundtrip() {
		let mut nodes = IndexMap::new();
		nodes.insert(
			"out.o".to_string(),
			NodeSnapshot {
				command: "gcc -c in.c -o out.o".to_string(),
				depsfile_deps: vec!["a.h".to_string(), "b.h".to_string()],
			},
		);
		let snapshot = GraphSnapshot {
			source_files: vec![PathBuf::from("build.ninja"), PathBuf::from("sub/build.ninja")],
			nodes,
		};
		let decoded = GraphSnapshot::decode(&snapshot.encode()).unwrap();
		assert_eq!(decoded, snapshot);
	}

	#[test]
	fn rejects_bad_magic() {
		assert!(GraphSnapshot::decode(b"nope").is_err());
	}

	#[test]
	fn empty_snapshot_roundtrips() {
		let snapshot = GraphSnapshot::default();
		assert_eq!(GraphSnapshot::decode(&snapshot.encode()).unwrap(), snapshot);
	}
}
