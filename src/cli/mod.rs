//! CLI module for cdeps.
//!
//! Commands:
//! - Build files: make, dot
//! - Inspection: deps, list, cycles
//! - System: stats
//!
//! Every command renders its whole output into a string before anything is
//! written, so a failed run leaves no partial file behind.

use clap::{Parser, Subcommand};
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::{CdepsConfig, CONFIG_FILE};
use crate::error::Result;
use crate::graph::types::path_to_slash;
use crate::graph::{build_index, scan_stats, DependencyGraph, ReachableSet};
use crate::report::{dot, makefile, BuildReport};

#[derive(Parser)]
#[command(name = "cdeps")]
#[command(about = "Build dependencies for C/C++ source trees")]
#[command(override_help = HELP_TEXT)]
pub struct Cli {
    /// Source tree root (default: current directory)
    #[arg(short, long, default_value = ".", global = true)]
    pub root: PathBuf,

    /// Config file (default: <root>/cdeps.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log resolution details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

const HELP_TEXT: &str = "
cdeps - build dependencies for C/C++ source trees

Build files:
  make [ENTRY]          Makefile for everything ENTRY needs
  dot [ENTRY]           Graphviz graph of the same files

Inspect:
  deps [ENTRY]          Dependency tables as JSON
  list [ENTRY]          Reachable files, one per line
  cycles [ENTRY]        Include cycles among reachable files
  stats                 Files found by the scan

Options:
  -r, --root <PATH>     Source tree root (default: .)
  -c, --config <FILE>   Config file (default: <root>/cdeps.toml)
  -o, --output <FILE>   Write to FILE instead of stdout (make, dot)
  -v, --verbose         Log resolution details to stderr

ENTRY is a path, a file name, or a bare module name (default: main).
";

#[derive(Subcommand)]
pub enum Commands {
    // ─── Build Files ──────────────────────────────────────────────
    /// Emit a Makefile for the files reachable from ENTRY
    Make {
        /// Entry file: path, file name, or module name
        entry: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Name of the linked binary
        #[arg(long)]
        target: Option<String>,
    },

    /// Emit a Graphviz graph of the files reachable from ENTRY
    Dot {
        entry: Option<String>,

        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fold headers into their implementation nodes
        #[arg(long)]
        collapse: bool,
    },

    // ─── Inspection ───────────────────────────────────────────────
    /// Print the dependency tables as JSON
    Deps { entry: Option<String> },

    /// List reachable files
    List { entry: Option<String> },

    /// Report include cycles among reachable files
    Cycles { entry: Option<String> },

    // ─── System ───────────────────────────────────────────────────
    /// Show what the scan finds under the root
    Stats,
}

/// Rendered command output and where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    /// `None` means stdout.
    pub output: Option<PathBuf>,
}

impl Cli {
    /// Explicit `--config`, else `cdeps.toml` in the root.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| self.root.join(CONFIG_FILE))
    }

    /// An explicit `--config` must exist; the implicit one is optional.
    pub fn load_config(&self) -> Result<CdepsConfig> {
        match &self.config {
            Some(path) => CdepsConfig::load(path),
            None => CdepsConfig::load_or_default(&self.root.join(CONFIG_FILE)),
        }
    }
}

/// Run `command` against the tree at `root` and render its output.
pub fn render(command: &Commands, root: &Path, config: &CdepsConfig) -> Result<Rendered> {
    let (text, output) = match command {
        Commands::Make {
            entry,
            output,
            target,
        } => {
            let (graph, set) = reachable(root, config, entry.as_deref())?;
            let report = BuildReport::new(&graph, &set)?;
            let mut make = config.make.clone();
            if let Some(target) = target {
                make.target = target.clone();
            }
            (makefile::render(&report, &make), output.clone())
        }
        Commands::Dot {
            entry,
            output,
            collapse,
        } => {
            let (graph, set) = reachable(root, config, entry.as_deref())?;
            let options = dot::DotOptions {
                collapse: *collapse || config.dot.collapse,
            };
            (dot::render(&graph, &set, &options)?, output.clone())
        }
        Commands::Deps { entry } => {
            let (graph, set) = reachable(root, config, entry.as_deref())?;
            let report = BuildReport::new(&graph, &set)?;
            let mut json = serde_json::to_string_pretty(&report)?;
            json.push('\n');
            (json, None)
        }
        Commands::List { entry } => {
            let (graph, set) = reachable(root, config, entry.as_deref())?;
            let mut text = String::new();
            for &id in set.files() {
                let _ = writeln!(text, "{}", graph.record(id).display_path());
            }
            (text, None)
        }
        Commands::Cycles { entry } => {
            let (graph, set) = reachable(root, config, entry.as_deref())?;
            let mut text = String::new();
            for cycle in graph.include_cycles(&set)? {
                let paths: Vec<String> = cycle.iter().map(|p| path_to_slash(p)).collect();
                let _ = writeln!(text, "{}", paths.join(" "));
            }
            (text, None)
        }
        Commands::Stats => {
            let stats = scan_stats(root, &config.scan)?;
            (format!("{stats}\n"), None)
        }
    };
    Ok(Rendered { text, output })
}

fn reachable(
    root: &Path,
    config: &CdepsConfig,
    entry: Option<&str>,
) -> Result<(DependencyGraph, ReachableSet)> {
    let entry = entry.unwrap_or(&config.scan.entry);
    debug!(root = %root.display(), entry, "resolving entry");
    let graph = DependencyGraph::new(build_index(root, &config.scan)?);
    let set = graph.reachable_from(entry)?;
    Ok((graph, set))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CdepsError;
    use std::fs;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "main.c", "#include \"util.h\"\n");
        write(dir.path(), "util.h", "#include \"loop.h\"\n");
        write(dir.path(), "util.c", "#include \"util.h\"\n");
        write(dir.path(), "loop.h", "#include \"util.h\"\n");
        write(dir.path(), "notes.txt", "");
        dir
    }

    fn run(args: &[&str], root: &Path) -> Result<Rendered> {
        let cli = Cli::try_parse_from(args).unwrap();
        render(&cli.command, root, &CdepsConfig::default())
    }

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::try_parse_from(["cdeps", "make", "app", "-r", "src", "-v", "--target", "app"])
            .unwrap();
        assert_eq!(cli.root, PathBuf::from("src"));
        assert!(cli.verbose);
        assert_eq!(cli.config_path(), PathBuf::from("src").join(CONFIG_FILE));
        match cli.command {
            Commands::Make { entry, output, target } => {
                assert_eq!(entry.as_deref(), Some("app"));
                assert_eq!(output, None);
                assert_eq!(target.as_deref(), Some("app"));
            }
            _ => panic!("expected make"),
        }

        let cli = Cli::try_parse_from(["cdeps", "-c", "other.toml", "stats"]).unwrap();
        assert_eq!(cli.config_path(), PathBuf::from("other.toml"));
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let dir = project();
        let root = dir.path().to_str().unwrap();

        let cli = Cli::try_parse_from(["cdeps", "-r", root, "stats"]).unwrap();
        assert_eq!(cli.load_config().unwrap(), CdepsConfig::default());

        let missing = dir.path().join("cdeps.tmol");
        let cli = Cli::try_parse_from(["cdeps", "-r", root, "-c", missing.to_str().unwrap(), "stats"])
            .unwrap();
        assert!(matches!(cli.load_config(), Err(CdepsError::Io { .. })));
    }

    #[test]
    fn test_list_command() {
        let dir = project();
        let out = run(&["cdeps", "list"], dir.path()).unwrap();
        assert_eq!(out.text, "loop.h\nmain.c\nutil.c\nutil.h\n");
        assert_eq!(out.output, None);
    }

    #[test]
    fn test_make_command_with_output() {
        let dir = project();
        let out = run(&["cdeps", "make", "-o", "Makefile", "--target", "demo"], dir.path()).unwrap();
        assert_eq!(out.output, Some(PathBuf::from("Makefile")));
        assert!(out.text.contains("TARGET = demo\n"));
        assert!(out.text.contains("main.c: util.h\n"));
    }

    #[test]
    fn test_cycles_command() {
        let dir = project();
        let out = run(&["cdeps", "cycles", "main.c"], dir.path()).unwrap();
        assert_eq!(out.text, "loop.h util.h\n");
    }

    #[test]
    fn test_deps_command_is_json() {
        let dir = project();
        let out = run(&["cdeps", "deps"], dir.path()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&out.text).unwrap();
        assert_eq!(json["root"], "main.c");
        assert_eq!(json["compile_units"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_dot_collapse_from_config() {
        let dir = project();
        let cli = Cli::try_parse_from(["cdeps", "dot"]).unwrap();
        let mut config = CdepsConfig::default();
        config.dot.collapse = true;
        let out = render(&cli.command, dir.path(), &config).unwrap();
        assert!(out.text.contains("\"main.c\" -> \"util.c\";"));
    }

    #[test]
    fn test_stats_command() {
        let dir = project();
        let out = run(&["cdeps", "stats"], dir.path()).unwrap();
        assert_eq!(
            out.text,
            "Found 5 files (headers: 2, sources: 2, skipped: 1)\n"
        );
    }

    #[test]
    fn test_unknown_entry_is_error() {
        let dir = project();
        let err = run(&["cdeps", "list", "nope"], dir.path()).unwrap_err();
        assert!(matches!(err, CdepsError::RootNotFound(name) if name == "nope"));
    }
}
