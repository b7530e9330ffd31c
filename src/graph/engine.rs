//! The dependency engine for cdeps.
//!
//! Edges are never stored up front: a file's direct includes, the
//! implementation paired with a header, and the resulting neighbor list
//! are computed the first time they are asked for and memoized on the
//! record. [`traverse`] walks any neighbor relation to a fixpoint.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::path::PathBuf;
use tracing::{debug, trace};

use super::index::FileIndex;
use super::scanner::scan_includes;
use super::types::{FileId, FileRecord};
use crate::error::Result;

/// Collect every node reachable from `root` by repeatedly applying
/// `neighbors`, `root` included.
///
/// Each node is expanded exactly once, so `neighbors` is called once per
/// reachable node and the walk terminates on cyclic graphs. The returned
/// order is discovery order; callers that need a stable order sort it.
pub fn traverse<N, E, F, I>(root: N, mut neighbors: F) -> std::result::Result<Vec<N>, E>
where
    N: Copy + Eq + Hash,
    F: FnMut(N) -> std::result::Result<I, E>,
    I: IntoIterator<Item = N>,
{
    let mut visited: HashSet<N> = HashSet::from([root]);
    let mut found = vec![root];
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        for next in neighbors(node)? {
            if visited.insert(next) {
                found.push(next);
                stack.push(next);
            }
        }
    }

    Ok(found)
}

/// Files reachable from one root, sorted by path. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReachableSet {
    root: FileId,
    files: Vec<FileId>,
    members: HashSet<FileId>,
}

impl ReachableSet {
    fn new(root: FileId, mut files: Vec<FileId>, index: &FileIndex) -> Self {
        files.sort_by(|a, b| index[*a].path().cmp(index[*b].path()));
        let members = files.iter().copied().collect();
        Self {
            root,
            files,
            members,
        }
    }

    pub fn root(&self) -> FileId {
        self.root
    }

    /// Reachable files sorted by path.
    pub fn files(&self) -> &[FileId] {
        &self.files
    }

    pub fn contains(&self, id: FileId) -> bool {
        self.members.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Dependency graph over a [`FileIndex`].
#[derive(Debug)]
pub struct DependencyGraph {
    index: FileIndex,
}

impl DependencyGraph {
    pub fn new(index: FileIndex) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &FileIndex {
        &self.index
    }

    pub fn record(&self, id: FileId) -> &FileRecord {
        &self.index[id]
    }

    // ─── Edges ──────────────────────────────────────────────────

    /// Files directly included by `id` that exist in the index.
    ///
    /// Unresolved includes are dropped, as are repeats and self-includes.
    /// Order is first-seen; use [`sorted_headers`](Self::sorted_headers)
    /// for output.
    pub fn headers(&self, id: FileId) -> Result<&[FileId]> {
        let record = &self.index[id];
        if let Some(headers) = record.headers.get() {
            return Ok(headers);
        }

        let content = self.index.content(id)?;
        let mut seen = HashSet::new();
        let mut headers = Vec::new();
        for name in scan_includes(content) {
            match self.index.lookup_include(&name) {
                Some(target) if target == id => {
                    trace!(file = record.display_path(), "ignoring self-include");
                }
                Some(target) => {
                    if seen.insert(target) {
                        headers.push(target);
                    }
                }
                None => {
                    trace!(file = record.display_path(), include = %name, "unresolved include");
                }
            }
        }

        Ok(record.headers.get_or_init(|| headers))
    }

    /// Direct includes of `id`, sorted by path.
    pub fn sorted_headers(&self, id: FileId) -> Result<Vec<FileId>> {
        let mut headers = self.headers(id)?.to_vec();
        headers.sort_by(|a, b| self.index[*a].path().cmp(self.index[*b].path()));
        Ok(headers)
    }

    /// The implementation paired with header `id`, memoized.
    pub fn implementation_of(&self, id: FileId) -> Result<Option<FileId>> {
        let record = &self.index[id];
        if let Some(&implementation) = record.implementation.get() {
            return Ok(implementation);
        }
        let implementation = self.index.resolve_implementation(id)?;
        Ok(*record.implementation.get_or_init(|| implementation))
    }

    /// Direct includes of `id` plus the implementations paired with them.
    pub fn neighbors(&self, id: FileId) -> Result<&[FileId]> {
        let record = &self.index[id];
        if let Some(neighbors) = record.neighbors.get() {
            return Ok(neighbors);
        }

        let headers = self.headers(id)?;
        let mut seen: HashSet<FileId> = headers.iter().copied().collect();
        let mut neighbors = headers.to_vec();
        for &header in headers {
            if let Some(implementation) = self.implementation_of(header)? {
                if seen.insert(implementation) {
                    neighbors.push(implementation);
                }
            }
        }

        Ok(record.neighbors.get_or_init(|| neighbors))
    }

    // ─── Reachability ───────────────────────────────────────────

    /// Every file reachable from `root` through [`neighbors`](Self::neighbors).
    pub fn reachable(&self, root: FileId) -> Result<ReachableSet> {
        let files = traverse(root, |id| {
            trace!(file = self.index[id].display_path(), "expanding");
            self.neighbors(id).map(|n| n.iter().copied())
        })?;
        let set = ReachableSet::new(root, files, &self.index);
        debug!(
            root = self.index[root].display_path(),
            files = set.len(),
            "computed reachable set"
        );
        Ok(set)
    }

    /// Resolve `designator` with [`FileIndex::find_root`] and traverse from it.
    pub fn reachable_from(&self, designator: &str) -> Result<ReachableSet> {
        let root = self.index.find_root(designator)?;
        self.reachable(root)
    }

    /// Include cycles among the files in `set`, as sorted path lists.
    ///
    /// Cycles are legal in C; this is a diagnostic, not an error.
    pub fn include_cycles(&self, set: &ReachableSet) -> Result<Vec<Vec<PathBuf>>> {
        let mut graph: DiGraph<FileId, ()> = DiGraph::new();
        let nodes: HashMap<FileId, NodeIndex> = set
            .files()
            .iter()
            .map(|&id| (id, graph.add_node(id)))
            .collect();

        for &id in set.files() {
            for header in self.headers(id)? {
                if let Some(&target) = nodes.get(header) {
                    graph.add_edge(nodes[&id], target, ());
                }
            }
        }

        let mut cycles: Vec<Vec<PathBuf>> = tarjan_scc(&graph)
            .into_iter()
            .filter(|component| component.len() > 1)
            .map(|component| {
                let ids: Vec<FileId> = component.into_iter().map(|n| graph[n]).collect();
                self.index.paths_of(&ids)
            })
            .collect();
        cycles.sort();
        Ok(cycles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use crate::error::CdepsError;
    use crate::graph::index::MemoryLoader;
    use crate::graph::types::{FileKind, FileRecord};
    use std::path::Path;
    use std::rc::Rc;

    fn graph_of(files: &[(&str, &str)]) -> DependencyGraph {
        DependencyGraph::new(
            FileIndex::from_sources(files.iter().copied(), &ScanConfig::default()).unwrap(),
        )
    }

    fn paths(graph: &DependencyGraph, ids: &[FileId]) -> Vec<String> {
        ids.iter()
            .map(|&id| graph.record(id).display_path().to_string())
            .collect()
    }

    fn id(graph: &DependencyGraph, name: &str) -> FileId {
        graph.index().lookup(name).unwrap()
    }

    #[test]
    fn test_traverse_generic_cycle() {
        let edges: HashMap<u32, Vec<u32>> =
            HashMap::from([(1, vec![2]), (2, vec![3]), (3, vec![1, 4]), (4, vec![])]);
        let mut calls = 0;
        let mut found = traverse(1, |n| {
            calls += 1;
            Ok::<_, ()>(edges[&n].clone())
        })
        .unwrap();
        found.sort();
        assert_eq!(found, vec![1, 2, 3, 4]);
        assert_eq!(calls, 4);
    }

    #[test]
    fn test_traverse_propagates_error() {
        let result = traverse(1u32, |n| if n == 2 { Err("boom") } else { Ok(vec![n + 1]) });
        assert_eq!(result, Err("boom"));
    }

    #[test]
    fn test_headers_only_contains_indexed_records() {
        let graph = graph_of(&[
            ("main.c", "#include <stdio.h>\n#include \"a.h\"\n#include \"missing.h\"\n"),
            ("a.h", ""),
        ]);
        let main = id(&graph, "main.c");
        let headers = graph.headers(main).unwrap();
        assert_eq!(paths(&graph, headers), vec!["a.h"]);
        for &h in headers {
            assert!(graph.index().get(h).is_some());
        }
    }

    #[test]
    fn test_no_includes_no_headers() {
        let graph = graph_of(&[("komugiko.h", "struct flour { int grams; };\n")]);
        let komugiko = id(&graph, "komugiko.h");
        assert!(graph.headers(komugiko).unwrap().is_empty());
        assert_eq!(graph.implementation_of(komugiko).unwrap(), None);
        assert!(graph.neighbors(komugiko).unwrap().is_empty());
    }

    #[test]
    fn test_header_only_module_stays_reachable() {
        let graph = graph_of(&[
            ("main.c", "#include \"komugiko.h\"\n"),
            ("komugiko.h", ""),
        ]);
        let set = graph.reachable_from("main").unwrap();
        assert_eq!(paths(&graph, set.files()), vec!["komugiko.h", "main.c"]);
    }

    #[test]
    fn test_neighbors_include_paired_implementations() {
        let graph = graph_of(&[
            ("main.c", "#include \"list.h\"\n#include \"list.h\"\n#include \"log.h\"\n"),
            ("list.h", ""),
            ("list.c", "#include \"list.h\"\n"),
            ("log.h", ""),
        ]);
        let main = id(&graph, "main.c");
        assert_eq!(
            paths(&graph, graph.neighbors(main).unwrap()),
            vec!["list.h", "log.h", "list.c"]
        );
    }

    #[test]
    fn test_three_header_cycle() {
        let graph = graph_of(&[
            ("a.h", "#include \"b.h\"\n"),
            ("b.h", "#include \"c.h\"\n"),
            ("c.h", "#include \"a.h\"\n"),
        ]);
        let set = graph.reachable_from("a.h").unwrap();
        assert_eq!(paths(&graph, set.files()), vec!["a.h", "b.h", "c.h"]);

        let cycles = graph.include_cycles(&set).unwrap();
        assert_eq!(
            cycles,
            vec![vec![
                PathBuf::from("a.h"),
                PathBuf::from("b.h"),
                PathBuf::from("c.h")
            ]]
        );
    }

    #[test]
    fn test_cycle_with_implementations() {
        let graph = graph_of(&[
            ("a.h", "#include \"b.h\"\n"),
            ("a.c", "#include \"a.h\"\n"),
            ("b.h", "#include \"c.h\"\n"),
            ("c.h", "#include \"a.h\"\n"),
            ("c.c", "#include \"c.h\"\n"),
        ]);
        let set = graph.reachable_from("a").unwrap();
        assert_eq!(
            paths(&graph, set.files()),
            vec!["a.c", "a.h", "b.h", "c.c", "c.h"]
        );
    }

    #[test]
    fn test_diamond_reads_shared_once() {
        let mut loader = MemoryLoader::new();
        let files = [
            ("main.c", "#include \"a.h\"\n#include \"b.h\"\n"),
            ("a.h", "#include \"shared.h\"\n"),
            ("b.h", "#include \"shared.h\"\n"),
            ("shared.h", "typedef int shared_t;\n"),
        ];
        let mut records = Vec::new();
        for (path, content) in files {
            loader.insert(path, content);
            records.push(FileRecord::new(
                path,
                FileKind::classify(Path::new(path), &ScanConfig::default()).unwrap(),
            ));
        }
        let loader = Rc::new(loader);
        let graph = DependencyGraph::new(FileIndex::from_records(records, Rc::clone(&loader)).unwrap());

        let set = graph.reachable_from("main").unwrap();
        let listed = paths(&graph, set.files());
        assert_eq!(listed, vec!["a.h", "b.h", "main.c", "shared.h"]);
        assert_eq!(listed.iter().filter(|p| *p == "shared.h").count(), 1);
        assert_eq!(loader.read_count("shared.h"), 1);

        // A second traversal reuses every memo.
        let again = graph.reachable_from("main").unwrap();
        assert_eq!(again, set);
        for (path, _) in files {
            assert_eq!(loader.read_count(path), 1, "{path} read more than once");
        }
    }

    #[test]
    fn test_reachable_is_closed_under_neighbors() {
        let graph = graph_of(&[
            ("main.c", "#include \"app.h\"\n"),
            ("app.h", "#include \"net.h\"\n"),
            ("app.c", "#include \"app.h\"\n#include \"db.h\"\n"),
            ("net.h", ""),
            ("net.c", "#include \"net.h\"\n#include \"log.h\"\n"),
            ("db.h", ""),
            ("log.h", ""),
            ("unused.h", ""),
            ("unused.c", "#include \"unused.h\"\n"),
        ]);
        let set = graph.reachable_from("main").unwrap();
        for &file in set.files() {
            for &n in graph.neighbors(file).unwrap() {
                assert!(
                    set.contains(n),
                    "{} missing from closure",
                    graph.record(n).display_path()
                );
            }
        }
        assert!(!set.contains(id(&graph, "unused.c")));
        assert!(set.contains(id(&graph, "log.h")));
        assert!(set.contains(id(&graph, "db.h")));
    }

    #[test]
    fn test_idempotent_results() {
        let graph = graph_of(&[
            ("main.c", "#include \"z.h\"\n#include \"a.h\"\n"),
            ("z.h", "#include \"a.h\"\n"),
            ("a.h", ""),
            ("a.c", "#include \"a.h\"\n"),
        ]);
        let first = graph.reachable_from("main").unwrap();
        let second = graph.reachable_from("main").unwrap();
        assert_eq!(first, second);

        let main = id(&graph, "main.c");
        let sorted = graph.sorted_headers(main).unwrap();
        assert_eq!(paths(&graph, &sorted), vec!["a.h", "z.h"]);
        assert_eq!(graph.sorted_headers(main).unwrap(), sorted);
    }

    #[test]
    fn test_root_not_found() {
        let graph = graph_of(&[("lib.c", "")]);
        assert!(matches!(
            graph.reachable_from("main"),
            Err(CdepsError::RootNotFound(name)) if name == "main"
        ));
    }

    #[test]
    fn test_ambiguous_implementation_aborts_traversal() {
        let graph = graph_of(&[
            ("main.c", "#include \"util.h\"\n"),
            ("util.h", ""),
            ("util.c", ""),
            ("util.cpp", ""),
        ]);
        assert!(matches!(
            graph.reachable_from("main"),
            Err(CdepsError::AmbiguousImplementation { .. })
        ));
    }

    #[test]
    fn test_self_include_ignored() {
        let graph = graph_of(&[("loop.h", "#include \"loop.h\"\n")]);
        let lp = id(&graph, "loop.h");
        assert!(graph.headers(lp).unwrap().is_empty());
        let set = graph.reachable(lp).unwrap();
        assert!(graph.include_cycles(&set).unwrap().is_empty());
    }

    #[test]
    fn test_include_with_directory_resolves_by_base_name() {
        let graph = graph_of(&[
            ("src/main.c", "#include \"../include/proj/api.h\"\n#include <proj/config.h>\n"),
            ("include/proj/api.h", ""),
            ("include/proj/config.h", ""),
        ]);
        let main = id(&graph, "main.c");
        assert_eq!(
            paths(&graph, &graph.sorted_headers(main).unwrap()),
            vec!["include/proj/api.h", "include/proj/config.h"]
        );
    }
}
