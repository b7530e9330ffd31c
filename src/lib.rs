//! # cdeps
//!
//! Build dependencies for C, C++ and Objective-C trees, inferred from
//! `#include` directives.
//!
//! cdeps indexes every header and implementation file under a directory,
//! pairs each header with the implementation that shares its module name,
//! and collects everything reachable from an entry file. The result can be
//! rendered as a Makefile or as a Graphviz graph.
//!
//! ## Key Features
//!
//! - **Lazy**: files are read only when the traversal reaches them, and at most once
//! - **Deterministic**: every list is sorted, so output is byte-stable
//! - **Strict**: duplicate base names and ambiguous pairings are errors, not guesses
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cdeps::{analyze, makefile, BuildReport, CdepsConfig};
//! use std::path::Path;
//!
//! let config = CdepsConfig::default();
//! let analysis = analyze(Path::new("."), &config.scan, "main").unwrap();
//! let report = BuildReport::new(&analysis.graph, &analysis.reachable).unwrap();
//! print!("{}", makefile::render(&report, &config.make));
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod graph;
pub mod report;

use std::path::Path;

// Re-exports for convenience
pub use config::{CdepsConfig, DotConfig, MakeConfig, ScanConfig};
pub use error::{CdepsError, Result};

pub use graph::{
    build_index, scan_includes, scan_stats, traverse, DependencyGraph, FileId, FileIndex,
    FileKind, FileRecord, ReachableSet, ScanStats,
};
pub use report::{dot, makefile, BuildReport};

/// A built graph together with the files reachable from one entry.
#[derive(Debug)]
pub struct Analysis {
    pub graph: DependencyGraph,
    pub reachable: ReachableSet,
}

/// Index `root` and compute everything reachable from `entry`.
pub fn analyze(root: &Path, scan: &ScanConfig, entry: &str) -> Result<Analysis> {
    let graph = DependencyGraph::new(build_index(root, scan)?);
    let reachable = graph.reachable_from(entry)?;
    Ok(Analysis { graph, reachable })
}
