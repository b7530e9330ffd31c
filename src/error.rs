//! Error types for cdeps.
//!
//! Every variant is fatal: the run aborts and nothing is written.
//! Includes that do not resolve inside the scanned tree are not errors
//! and never show up here.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CdepsError>;

#[derive(Debug, Error)]
pub enum CdepsError {
    /// Two indexed files share a base name.
    #[error("duplicate file name '{name}': {} and {}", .first.display(), .second.display())]
    DuplicateName {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// A header's module name matches more than one implementation file.
    #[error("module '{module}' has more than one implementation: {}", join_paths(.candidates))]
    AmbiguousImplementation {
        module: String,
        candidates: Vec<PathBuf>,
    },

    /// The entry file designator does not match anything in the index.
    #[error("entry file '{0}' not found in the scanned tree")]
    RootNotFound(String),

    /// Two reachable implementation files would compile to the same object.
    #[error("object file '{object}.o' would be built from several sources: {}", join_paths(.sources))]
    DuplicateObject {
        object: String,
        sources: Vec<PathBuf>,
    },

    /// The entry designator matches several records and no preference applies.
    #[error("entry '{designator}' is ambiguous: {}", join_paths(.candidates))]
    AmbiguousRoot {
        designator: String,
        candidates: Vec<PathBuf>,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

impl CdepsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CdepsError::Io {
            path: path.into(),
            source,
        }
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
