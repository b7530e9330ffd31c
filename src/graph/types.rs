//! Core types for the dependency graph.
//!
//! A [`FileRecord`] is one scanned header or implementation file. Its
//! identity is fixed at construction; its content and resolved edges are
//! filled lazily into write-once cells and never change afterwards.

use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::config::ScanConfig;

/// Index of a record in the [`FileIndex`](super::FileIndex) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileId(pub usize);

/// Whether a file is a header or an implementation file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    /// `.h`, `.hpp`, ...: included by other files.
    Header,
    /// `.c`, `.cpp`, ...: each becomes one object file.
    Implementation,
}

impl FileKind {
    /// Classify a path by its extension. `None` means the file is not part
    /// of the graph.
    pub fn classify(path: &Path, scan: &ScanConfig) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if scan.is_header_ext(ext) {
            Some(FileKind::Header)
        } else if scan.is_source_ext(ext) {
            Some(FileKind::Implementation)
        } else {
            None
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Header => write!(f, "header"),
            FileKind::Implementation => write!(f, "implementation"),
        }
    }
}

/// One scanned file.
#[derive(Debug)]
pub struct FileRecord {
    path: PathBuf,
    display: String,
    base_name: String,
    module_name: String,
    extension: String,
    directory: String,
    kind: FileKind,

    pub(crate) content: OnceCell<String>,
    pub(crate) headers: OnceCell<Vec<FileId>>,
    pub(crate) implementation: OnceCell<Option<FileId>>,
    pub(crate) neighbors: OnceCell<Vec<FileId>>,
}

impl FileRecord {
    pub fn new(path: impl AsRef<Path>, kind: FileKind) -> Self {
        let path = normalize_path(path.as_ref());
        let display = path_to_slash(&path);
        let base_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        let module_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => path_to_slash(parent),
            _ => ".".to_string(),
        };

        Self {
            path,
            display,
            base_name,
            module_name,
            extension,
            directory,
            kind,
            content: OnceCell::new(),
            headers: OnceCell::new(),
            implementation: OnceCell::new(),
            neighbors: OnceCell::new(),
        }
    }

    /// Normalized path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Normalized path with `/` separators.
    pub fn display_path(&self) -> &str {
        &self.display
    }

    /// Final path segment, e.g. `foo.h`.
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Base name without its extension, e.g. `foo`.
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Containing directory with `/` separators; `.` for top-level files.
    pub fn directory(&self) -> &str {
        &self.directory
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn is_header(&self) -> bool {
        self.kind == FileKind::Header
    }

    pub fn is_implementation(&self) -> bool {
        self.kind == FileKind::Implementation
    }

    /// Content, if it has been loaded already.
    pub fn cached_content(&self) -> Option<&str> {
        self.content.get().map(String::as_str)
    }
}

/// Lexically normalize a path: drop `.` segments and fold `..` into the
/// preceding normal segment. Idempotent. Does not touch the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.iter().collect()
}

/// Render a path with `/` separators regardless of platform.
pub fn path_to_slash(path: &Path) -> String {
    let s = path.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        s.into_owned()
    } else {
        s.replace(std::path::MAIN_SEPARATOR, "/")
    }
}

/// Decode raw file bytes to text. UTF-8 with invalid sequences replaced;
/// a leading byte-order mark is dropped.
pub fn decode_source(bytes: Vec<u8>) -> String {
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    };
    match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}
