// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::types::ItemErrorPolicy;

/// Command-line arguments for `buildscan`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "buildscan",
    version,
    about = "Bounded-concurrency directory scanning and incremental build checks.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Buildscan.toml` in the current working directory, if present.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BUILDSCAN_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Walk directory trees and print every file with its sequence number.
    Scan(ScanArgs),
    /// Report whether the build outputs are stale.
    Stale(ProjectArgs),
    /// Compile the project if its outputs are stale.
    Build(BuildArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ScanArgs {
    /// Directories to scan.
    #[arg(required = true, value_name = "ROOT")]
    pub roots: Vec<PathBuf>,

    /// Maximum number of scan tasks in flight.
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// How to treat directories that cannot be listed.
    #[arg(long, value_enum, value_name = "POLICY")]
    pub item_errors: Option<ItemErrorPolicy>,
}

#[derive(Debug, Clone, Args)]
pub struct ProjectArgs {
    /// Source directory (repeatable, paired with `--out` by position).
    #[arg(long = "source", value_name = "DIR")]
    pub source: Vec<PathBuf>,

    /// Output directory (repeatable).
    #[arg(long = "out", value_name = "DIR")]
    pub out: Vec<PathBuf>,

    /// Directory name to leave out of the staleness check (repeatable).
    #[arg(long = "exclude", value_name = "NAME")]
    pub exclude: Vec<String>,

    /// Log why outputs are stale at info level.
    #[arg(long)]
    pub verbose: bool,

    /// Maximum number of scan tasks in flight.
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,
}

#[derive(Debug, Clone, Args)]
pub struct BuildArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Compiler executable.
    #[arg(long, value_name = "PATH")]
    pub tsc: Option<String>,

    /// Project file passed to the compiler as `-p`.
    #[arg(long, value_name = "PATH")]
    pub tsconfig: Option<PathBuf>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_build_flags() {
        let args = CliArgs::try_parse_from([
            "buildscan",
            "build",
            "--source",
            "src",
            "--out",
            "dist",
            "--exclude",
            "fixtures",
            "--tsconfig",
            "src/tsconfig.json",
            "--log-level",
            "debug",
        ])
        .unwrap();

        match args.command {
            Command::Build(build) => {
                assert_eq!(build.project.source, vec![PathBuf::from("src")]);
                assert_eq!(build.project.out, vec![PathBuf::from("dist")]);
                assert_eq!(build.project.exclude, vec!["fixtures".to_string()]);
                assert_eq!(build.tsconfig, Some(PathBuf::from("src/tsconfig.json")));
            }
            other => panic!("expected build command, got {other:?}"),
        }
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    }

    #[test]
    fn scan_requires_a_root() {
        assert!(CliArgs::try_parse_from(["buildscan", "scan"]).is_err());

        let args =
            CliArgs::try_parse_from(["buildscan", "scan", "a", "b", "--item-errors", "ignore"])
                .unwrap();
        match args.command {
            Command::Scan(scan) => {
                assert_eq!(scan.roots.len(), 2);
                assert_eq!(scan.item_errors, Some(ItemErrorPolicy::Ignore));
            }
            other => panic!("expected scan command, got {other:?}"),
        }
    }
}
