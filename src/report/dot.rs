//! Graphviz writer.
//!
//! Nodes are the reachable files keyed by path. Include edges are solid,
//! header-to-implementation pairings are dashed. With `collapse` set, each
//! header that has an implementation is folded into it so the picture
//! shows one node per module.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

use crate::error::Result;
use crate::graph::{DependencyGraph, FileId, FileKind, ReachableSet};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DotOptions {
    /// Fold paired headers into their implementation node.
    pub collapse: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeKind {
    Include,
    Pairing,
}

/// Render the reachable part of `graph` as a `digraph`.
pub fn render(graph: &DependencyGraph, set: &ReachableSet, options: &DotOptions) -> Result<String> {
    let node_of = |id: FileId| -> Result<FileId> {
        if !options.collapse {
            return Ok(id);
        }
        Ok(match graph.implementation_of(id)? {
            Some(implementation) if set.contains(implementation) => implementation,
            _ => id,
        })
    };

    let mut nodes: BTreeSet<&str> = BTreeSet::new();
    let mut kinds: BTreeMap<&str, FileKind> = BTreeMap::new();
    let mut edges: BTreeMap<(&str, &str), EdgeKind> = BTreeMap::new();

    for &id in set.files() {
        let from = graph.record(node_of(id)?);
        nodes.insert(from.display_path());
        kinds.insert(from.display_path(), from.kind());

        for &header in graph.headers(id)? {
            let to = graph.record(node_of(header)?);
            if to.display_path() != from.display_path() {
                edges.insert((from.display_path(), to.display_path()), EdgeKind::Include);
            }
        }

        if !options.collapse {
            if let Some(implementation) = graph.implementation_of(id)? {
                if set.contains(implementation) {
                    let to = graph.record(implementation);
                    edges
                        .entry((from.display_path(), to.display_path()))
                        .or_insert(EdgeKind::Pairing);
                }
            }
        }
    }

    let root = graph.record(node_of(set.root())?).display_path();

    let mut out = String::new();
    let _ = writeln!(out, "digraph cdeps {{");
    let _ = writeln!(out, "  rankdir=LR;");
    let _ = writeln!(out, "  node [fontname=\"monospace\", fontsize=10];");
    for &path in &nodes {
        let label = path.rsplit('/').next().unwrap_or(path);
        let shape = match kinds.get(path) {
            Some(FileKind::Implementation) => "box",
            _ => "ellipse",
        };
        let _ = write!(
            out,
            "  {} [label={}, shape={shape}",
            quote(path),
            quote(label)
        );
        if path == root {
            out.push_str(", style=bold");
        }
        out.push_str("];\n");
    }
    for ((from, to), kind) in &edges {
        match kind {
            EdgeKind::Include => {
                let _ = writeln!(out, "  {} -> {};", quote(from), quote(to));
            }
            EdgeKind::Pairing => {
                let _ = writeln!(out, "  {} -> {} [style=dashed];", quote(from), quote(to));
            }
        }
    }
    out.push_str("}\n");
    Ok(out)
}

fn quote(id: &str) -> String {
    let mut quoted = String::with_capacity(id.len() + 2);
    quoted.push('"');
    for c in id.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
