//! Index builder. Walks a source tree and builds the file index.
//!
//! Walks files respecting .gitignore, keeps those with a recognized header
//! or source extension, and assembles a [`FileIndex`] reading content from
//! disk on demand.

use ignore::WalkBuilder;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::index::{FileIndex, FsLoader};
use super::types::{FileKind, FileRecord};
use crate::config::ScanConfig;
use crate::error::{CdepsError, Result};

/// Build a file index from every header and source file under `root`.
///
/// Record paths are relative to `root`. Paths are sorted before insertion,
/// so the arena order and any duplicate-name report are the same on every
/// run.
pub fn build_index(root: &Path, scan: &ScanConfig) -> Result<FileIndex> {
    scan.validate()?;
    let mut files: Vec<(PathBuf, FileKind)> = walk_files(root, scan)?
        .into_iter()
        .filter_map(|path| FileKind::classify(&path, scan).map(|kind| (path, kind)))
        .map(|(path, kind)| match path.strip_prefix(root) {
            Ok(relative) => (relative.to_path_buf(), kind),
            Err(_) => (path, kind),
        })
        .collect();
    files.sort_by(|a, b| a.0.cmp(&b.0));

    let records = files
        .into_iter()
        .map(|(path, kind)| FileRecord::new(path, kind));
    let index = FileIndex::from_records(records, FsLoader::new(root))?;

    let (headers, implementations) = index.kind_counts();
    info!(
        root = %root.display(),
        headers,
        implementations,
        "indexed source tree"
    );
    Ok(index)
}

/// Get statistics about what files would be indexed under `root`.
pub fn scan_stats(root: &Path, scan: &ScanConfig) -> Result<ScanStats> {
    let mut stats = ScanStats::default();
    for path in walk_files(root, scan)? {
        stats.total_files += 1;
        match FileKind::classify(&path, scan) {
            Some(FileKind::Header) => stats.headers += 1,
            Some(FileKind::Implementation) => stats.implementations += 1,
            None => stats.skipped += 1,
        }
    }
    Ok(stats)
}

fn walk_files(root: &Path, scan: &ScanConfig) -> Result<Vec<PathBuf>> {
    let meta = fs::metadata(root).map_err(|e| CdepsError::io(root, e))?;
    if !meta.is_dir() {
        return Err(CdepsError::io(
            root,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a directory"),
        ));
    }

    let mut files = Vec::new();
    for entry in WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(scan.git_ignore)
        .git_global(scan.git_ignore)
        .git_exclude(scan.git_ignore)
        .require_git(false)
        .build()
    {
        match entry {
            Ok(entry) if entry.file_type().is_some_and(|ft| ft.is_file()) => {
                files.push(entry.into_path());
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "skipping unreadable entry"),
        }
    }
    Ok(files)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub total_files: usize,
    pub headers: usize,
    pub implementations: usize,
    pub skipped: usize,
}

impl std::fmt::Display for ScanStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Found {} files (headers: {}, sources: {}, skipped: {})",
            self.total_files, self.headers, self.implementations, self.skipped
        )
    }
}
