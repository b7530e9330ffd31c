//! Configuration for cdeps, loaded from `cdeps.toml`.
//!
//! Every key is optional. A missing `<root>/cdeps.toml` yields the defaults;
//! a missing explicit config file, or one that fails to parse, is an error.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::{CdepsError, Result};

/// Default config file name, looked up in the project root.
pub const CONFIG_FILE: &str = "cdeps.toml";

/// Entry file used when none is given on the command line.
pub const DEFAULT_ENTRY: &str = "main";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CdepsConfig {
    pub scan: ScanConfig,
    pub make: MakeConfig,
    pub dot: DotConfig,
}

/// Which files are indexed and how the entry point is found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Extensions (without the dot) treated as headers.
    pub header_extensions: Vec<String>,
    /// Extensions (without the dot) treated as implementation files.
    pub source_extensions: Vec<String>,
    /// Entry file designator: path, base name, or bare module name.
    pub entry: String,
    /// Honour `.gitignore` files while walking.
    pub git_ignore: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            header_extensions: ["h", "hh", "hpp", "hxx", "inc"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            source_extensions: ["c", "cc", "cpp", "cxx", "m"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            entry: DEFAULT_ENTRY.to_string(),
            git_ignore: true,
        }
    }
}

impl ScanConfig {
    pub fn is_header_ext(&self, ext: &str) -> bool {
        self.header_extensions.iter().any(|e| e == ext)
    }

    pub fn is_source_ext(&self, ext: &str) -> bool {
        self.source_extensions.iter().any(|e| e == ext)
    }

    /// An extension must belong to at most one of the two sets.
    pub fn validate(&self) -> Result<()> {
        let headers: HashSet<&str> = self.header_extensions.iter().map(String::as_str).collect();
        let mut overlap: Vec<&str> = self
            .source_extensions
            .iter()
            .map(String::as_str)
            .filter(|ext| headers.contains(ext))
            .collect();
        if overlap.is_empty() {
            return Ok(());
        }
        overlap.sort_unstable();
        Err(CdepsError::InvalidConfig(format!(
            "extension(s) listed as both header and source: {}",
            overlap.join(", ")
        )))
    }
}

/// Settings for the Makefile writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MakeConfig {
    pub cc: String,
    pub cxx: String,
    pub cflags: String,
    pub cxxflags: String,
    pub ldflags: String,
    pub libs: String,
    pub target: String,
    /// Directory object files are placed in, relative to the Makefile.
    pub object_dir: String,
    /// Recipe for C and Objective-C compile units.
    pub c_compile: String,
    /// Recipe for C++ compile units.
    pub cxx_compile: String,
}

impl Default for MakeConfig {
    fn default() -> Self {
        Self {
            cc: "cc".to_string(),
            cxx: "c++".to_string(),
            cflags: "-O2 -Wall".to_string(),
            cxxflags: "-O2 -Wall".to_string(),
            ldflags: String::new(),
            libs: String::new(),
            target: "a.out".to_string(),
            object_dir: ".".to_string(),
            c_compile: "$(CC) $(CFLAGS) $(INCLUDES) -c -o $@ $<".to_string(),
            cxx_compile: "$(CXX) $(CXXFLAGS) $(INCLUDES) -c -o $@ $<".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DotConfig {
    /// Fold header -> implementation edges into source -> source edges.
    pub collapse: bool,
}

impl CdepsConfig {
    /// Load config from `path`, which must exist.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| CdepsError::io(path, e))?;
        let config = Self::parse(&text).map_err(|source| CdepsError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        config.scan.validate()?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    /// Used for the implicit `<root>/cdeps.toml`.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn parse(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}
