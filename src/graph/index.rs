//! The file index: every scanned record plus the lookup tables that
//! resolve names, paths and modules to records.
//!
//! Base names are the single namespace for pairing headers with their
//! implementations, so the index refuses to hold two files with the same
//! base name.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::ops::Index;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use super::types::{decode_source, normalize_path, FileId, FileKind, FileRecord};
use crate::config::ScanConfig;
use crate::error::{CdepsError, Result};

// ─── Source Loading ──────────────────────────────────────────────

/// Where record content comes from.
pub trait SourceLoader {
    fn load(&self, path: &Path) -> std::io::Result<Vec<u8>>;
}

/// Reads content from the filesystem, resolving record paths against `root`.
#[derive(Debug, Clone, Default)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SourceLoader for FsLoader {
    fn load(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        fs::read(self.root.join(path))
    }
}

/// Serves content from memory and counts how often each path is read.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    files: HashMap<PathBuf, String>,
    reads: RefCell<HashMap<PathBuf, usize>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        self.files
            .insert(normalize_path(path.as_ref()), content.into());
    }

    /// Number of times `path` has been loaded.
    pub fn read_count(&self, path: impl AsRef<Path>) -> usize {
        self.reads
            .borrow()
            .get(&normalize_path(path.as_ref()))
            .copied()
            .unwrap_or(0)
    }
}

impl SourceLoader for MemoryLoader {
    fn load(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        let key = normalize_path(path);
        *self.reads.borrow_mut().entry(key.clone()).or_default() += 1;
        self.files
            .get(&key)
            .map(|s| s.clone().into_bytes())
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "not in memory"))
    }
}

impl<L: SourceLoader + ?Sized> SourceLoader for std::rc::Rc<L> {
    fn load(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        (**self).load(path)
    }
}

// ─── Index ───────────────────────────────────────────────────────

/// Result of resolving a designator against the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resolution {
    Found(FileId),
    NotFound,
    Ambiguous(Vec<FileId>),
}

pub struct FileIndex {
    records: Vec<FileRecord>,
    by_path: HashMap<PathBuf, FileId>,
    by_base_name: HashMap<String, FileId>,
    by_module: HashMap<String, Vec<FileId>>,
    loader: Box<dyn SourceLoader>,
}

impl fmt::Debug for FileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileIndex")
            .field("records", &self.records.len())
            .field("modules", &self.by_module.len())
            .finish()
    }
}

impl FileIndex {
    /// Create an empty index reading content through `loader`.
    pub fn new(loader: impl SourceLoader + 'static) -> Self {
        Self {
            records: Vec::new(),
            by_path: HashMap::new(),
            by_base_name: HashMap::new(),
            by_module: HashMap::new(),
            loader: Box::new(loader),
        }
    }

    /// Build an index from ready-made records.
    pub fn from_records(
        records: impl IntoIterator<Item = FileRecord>,
        loader: impl SourceLoader + 'static,
    ) -> Result<Self> {
        let mut index = Self::new(loader);
        for record in records {
            index.insert(record)?;
        }
        Ok(index)
    }

    /// Build an index from in-memory `(path, content)` pairs. Files whose
    /// extension is in neither set of `scan` are skipped.
    pub fn from_sources<P, S>(
        files: impl IntoIterator<Item = (P, S)>,
        scan: &ScanConfig,
    ) -> Result<Self>
    where
        P: AsRef<Path>,
        S: Into<String>,
    {
        scan.validate()?;
        let mut loader = MemoryLoader::new();
        let mut records = Vec::new();
        for (path, content) in files {
            let path = path.as_ref();
            loader.insert(path, content);
            if let Some(kind) = FileKind::classify(path, scan) {
                records.push(FileRecord::new(path, kind));
            }
        }
        Self::from_records(records, loader)
    }

    /// Add a record. Fails if another record already has the same base name.
    /// Re-inserting the same normalized path returns the existing id.
    pub fn insert(&mut self, record: FileRecord) -> Result<FileId> {
        if let Some(&existing) = self.by_path.get(record.path()) {
            return Ok(existing);
        }
        if let Some(&existing) = self.by_base_name.get(record.base_name()) {
            return Err(CdepsError::DuplicateName {
                name: record.base_name().to_string(),
                first: self[existing].path().to_path_buf(),
                second: record.path().to_path_buf(),
            });
        }

        let id = FileId(self.records.len());
        self.by_path.insert(record.path().to_path_buf(), id);
        self.by_base_name.insert(record.base_name().to_string(), id);
        self.by_module
            .entry(record.module_name().to_string())
            .or_default()
            .push(id);
        trace!(file = record.display_path(), kind = %record.kind(), "indexed");
        self.records.push(record);
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: FileId) -> Option<&FileRecord> {
        self.records.get(id.0)
    }

    /// All records in arena order.
    pub fn records(&self) -> impl Iterator<Item = (FileId, &FileRecord)> {
        self.records
            .iter()
            .enumerate()
            .map(|(i, record)| (FileId(i), record))
    }

    /// Count of header and implementation records.
    pub fn kind_counts(&self) -> (usize, usize) {
        let headers = self.records.iter().filter(|r| r.is_header()).count();
        (headers, self.records.len() - headers)
    }

    // ─── Content ────────────────────────────────────────────────

    /// Text of a record. Read through the loader on first call, cached after.
    pub fn content(&self, id: FileId) -> Result<&str> {
        let record = &self[id];
        if let Some(text) = record.content.get() {
            return Ok(text);
        }
        let bytes = self
            .loader
            .load(record.path())
            .map_err(|e| CdepsError::io(record.path(), e))?;
        let text = decode_source(bytes);
        debug!(file = record.display_path(), bytes = text.len(), "read content");
        Ok(record.content.get_or_init(|| text))
    }

    // ─── Lookup ─────────────────────────────────────────────────

    /// Resolve a path, base name or bare module name to a record.
    ///
    /// Order: exact normalized path, then base name of the final segment,
    /// then module name of the final segment, preferring the implementation
    /// when a header and an implementation share it. Module names may
    /// contain dots (`parser.tab`).
    pub fn lookup(&self, s: &str) -> Option<FileId> {
        match self.resolve(s) {
            Resolution::Found(id) => Some(id),
            Resolution::NotFound => None,
            Resolution::Ambiguous(ids) => {
                debug!(designator = s, candidates = ids.len(), "ambiguous lookup");
                None
            }
        }
    }

    /// Resolve an include directive target: exact path or base name only.
    pub fn lookup_include(&self, name: &str) -> Option<FileId> {
        let norm = normalize_path(Path::new(name.trim()));
        if let Some(&id) = self.by_path.get(&norm) {
            return Some(id);
        }
        let base = norm.file_name()?.to_str()?;
        self.by_base_name.get(base).copied()
    }

    /// Resolve the traversal entry point.
    pub fn find_root(&self, designator: &str) -> Result<FileId> {
        match self.resolve(designator) {
            Resolution::Found(id) => Ok(id),
            Resolution::NotFound => Err(CdepsError::RootNotFound(designator.to_string())),
            Resolution::Ambiguous(ids) => Err(CdepsError::AmbiguousRoot {
                designator: designator.to_string(),
                candidates: self.paths_of(&ids),
            }),
        }
    }

    pub(crate) fn resolve(&self, s: &str) -> Resolution {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Resolution::NotFound;
        }
        if let Some(id) = self.lookup_include(trimmed) {
            return Resolution::Found(id);
        }
        let norm = normalize_path(Path::new(trimmed));
        match norm.file_name().and_then(|n| n.to_str()) {
            Some(module) => self.resolve_module(module),
            None => Resolution::NotFound,
        }
    }

    fn resolve_module(&self, module: &str) -> Resolution {
        let Some(ids) = self.by_module.get(module) else {
            return Resolution::NotFound;
        };
        let implementations: Vec<FileId> = ids
            .iter()
            .copied()
            .filter(|&id| self[id].is_implementation())
            .collect();
        match (implementations.as_slice(), ids.as_slice()) {
            ([only], _) => Resolution::Found(*only),
            ([], [only]) => Resolution::Found(*only),
            ([], []) => Resolution::NotFound,
            ([], all) => Resolution::Ambiguous(all.to_vec()),
            (many, _) => Resolution::Ambiguous(many.to_vec()),
        }
    }

    // ─── Header / Implementation Pairing ────────────────────────

    /// Find the implementation paired with `header` by module name.
    ///
    /// `None` for header-only modules and for records that are not headers.
    /// More than one candidate is a fatal ambiguity.
    pub fn resolve_implementation(&self, header: FileId) -> Result<Option<FileId>> {
        let record = &self[header];
        if !record.is_header() {
            return Ok(None);
        }
        let candidates: Vec<FileId> = self
            .by_module
            .get(record.module_name())
            .into_iter()
            .flatten()
            .copied()
            .filter(|&id| self[id].is_implementation())
            .collect();
        match candidates.as_slice() {
            [] => Ok(None),
            [only] => Ok(Some(*only)),
            many => Err(CdepsError::AmbiguousImplementation {
                module: record.module_name().to_string(),
                candidates: self.paths_of(many),
            }),
        }
    }

    pub(crate) fn paths_of(&self, ids: &[FileId]) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = ids.iter().map(|&id| self[id].path().to_path_buf()).collect();
        paths.sort();
        paths
    }
}

impl Index<FileId> for FileIndex {
    type Output = FileRecord;

    fn index(&self, id: FileId) -> &FileRecord {
        &self.records[id.0]
    }
}
