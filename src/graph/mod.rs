//! Dependency graph module, the core of cdeps.
//!
//! Provides the file record model, the include scanner, the file index
//! with header/implementation pairing, and the reachability engine.

pub mod builder;
pub mod engine;
pub mod index;
pub mod scanner;
pub mod types;

pub use builder::{build_index, scan_stats, ScanStats};
pub use engine::{traverse, DependencyGraph, ReachableSet};
pub use index::{FileIndex, FsLoader, MemoryLoader, SourceLoader};
pub use scanner::scan_includes;
pub use types::{normalize_path, FileId, FileKind, FileRecord};
