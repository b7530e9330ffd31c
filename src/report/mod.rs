//! Report views derived from a reachable set.
//!
//! [`BuildReport`] holds the three tables the writers render: compile
//! units, include directories, and per-file direct dependencies. Every list
//! is sorted so the rendered artifact is byte-stable across runs.

pub mod dot;
pub mod makefile;

use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;

use crate::error::{CdepsError, Result};
use crate::graph::{DependencyGraph, FileKind, ReachableSet};

/// Everything a build-file writer needs, as plain `/`-separated paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    /// Path of the traversal root.
    pub root: String,
    /// Reachable implementation files, one object file each.
    pub compile_units: Vec<CompileUnit>,
    /// Directories containing reachable headers.
    pub include_dirs: Vec<String>,
    /// Direct dependencies of every reachable file.
    pub dependencies: Vec<FileDependencies>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileUnit {
    pub source: String,
    pub module: String,
    pub extension: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDependencies {
    pub file: String,
    pub kind: FileKind,
    /// Direct includes, sorted.
    pub headers: Vec<String>,
    /// Paired implementation, for headers that have one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implementation: Option<String>,
}

impl BuildReport {
    pub fn new(graph: &DependencyGraph, set: &ReachableSet) -> Result<Self> {
        let mut compile_units = Vec::new();
        let mut include_dirs = BTreeSet::new();
        let mut dependencies = Vec::with_capacity(set.len());

        for &id in set.files() {
            let record = graph.record(id);
            match record.kind() {
                FileKind::Implementation => compile_units.push(CompileUnit {
                    source: record.display_path().to_string(),
                    module: record.module_name().to_string(),
                    extension: record.extension().to_string(),
                }),
                FileKind::Header => {
                    include_dirs.insert(record.directory().to_string());
                }
            }

            let headers = graph
                .sorted_headers(id)?
                .into_iter()
                .map(|h| graph.record(h).display_path().to_string())
                .collect();
            let implementation = graph
                .implementation_of(id)?
                .map(|i| graph.record(i).display_path().to_string());
            dependencies.push(FileDependencies {
                file: record.display_path().to_string(),
                kind: record.kind(),
                headers,
                implementation,
            });
        }

        check_objects(&compile_units)?;

        Ok(Self {
            root: graph.record(set.root()).display_path().to_string(),
            compile_units,
            include_dirs: include_dirs.into_iter().collect(),
            dependencies,
        })
    }

    /// Dependencies of reachable files of `kind` that include something.
    pub fn dependencies_of_kind(&self, kind: FileKind) -> impl Iterator<Item = &FileDependencies> {
        self.dependencies
            .iter()
            .filter(move |d| d.kind == kind && !d.headers.is_empty())
    }
}

/// Objects are named after modules, and `foo.c` and `foo.cpp` share one.
fn check_objects(units: &[CompileUnit]) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::new();
    for unit in units {
        if !seen.insert(unit.module.as_str()) {
            return Err(CdepsError::DuplicateObject {
                object: unit.module.clone(),
                sources: units
                    .iter()
                    .filter(|u| u.module == unit.module)
                    .map(|u| PathBuf::from(&u.source))
                    .collect(),
            });
        }
    }
    Ok(())
}
