// src/lib.rs

pub mod build;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod scan;
pub mod stale;
pub mod types;

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::build::{BuildOptions, BuildOutcome, ProcessCompiler, compile_project};
use crate::cli::{BuildArgs, CliArgs, Command, ProjectArgs, ScanArgs};
use crate::config::{ConfigFile, load_or_default};
use crate::errors::BuildscanError;
use crate::fs::{FileSystem, RealFileSystem};
use crate::scan::scan_directory_tree;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (flags override config values)
/// - the real filesystem
/// - the selected subcommand
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_or_default(args.config.as_deref())?;
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    match args.command {
        Command::Scan(scan) => run_scan(fs, &cfg, scan).await,
        Command::Stale(project) => run_stale(fs, &cfg, &project).await,
        Command::Build(build) => run_build(fs, &cfg, build).await,
    }
}

async fn run_scan(fs: Arc<dyn FileSystem>, cfg: &ConfigFile, args: ScanArgs) -> Result<()> {
    let mut options = cfg.scan_options();
    if let Some(concurrency) = args.concurrency {
        options.concurrency = concurrency;
    }
    if let Some(policy) = args.item_errors {
        options.item_errors = policy;
    }

    let summary = scan_directory_tree(fs, &args.roots, &options, |path, seq| async move {
        println!("{seq}\t{}", path.display());
        Ok(())
    })
    .await?;

    debug!(?summary, "scan command finished");
    Ok(())
}

async fn run_stale(fs: Arc<dyn FileSystem>, cfg: &ConfigFile, args: &ProjectArgs) -> Result<()> {
    let options = project_options(cfg, args)?;
    let verdict = options
        .checker(fs)?
        .check_pairs(&options.source, &options.out)
        .await?;

    match verdict.reason() {
        Some(reason) => {
            info!(%reason, "outputs are stale");
            println!("stale");
        }
        None => println!("up-to-date"),
    }
    Ok(())
}

async fn run_build(fs: Arc<dyn FileSystem>, cfg: &ConfigFile, args: BuildArgs) -> Result<()> {
    let mut options = project_options(cfg, &args.project)?;
    if let Some(tsc) = args.tsc {
        options.tsc = tsc;
    }
    if let Some(tsconfig) = args.tsconfig {
        options.tsconfig = tsconfig;
    }

    match compile_project(fs, &ProcessCompiler, &options).await? {
        BuildOutcome::UpToDate => println!("up-to-date"),
        BuildOutcome::Compiled {
            declarations_copied,
            ..
        } => println!("compiled ({declarations_copied} declaration files copied)"),
    }
    Ok(())
}

/// Merge project flags over the `[build]` section.
///
/// Non-empty flag lists replace the configured lists; `--verbose` can only
/// turn verbosity on.
fn project_options(cfg: &ConfigFile, args: &ProjectArgs) -> Result<BuildOptions> {
    let mut options = cfg.build_options();

    if !args.source.is_empty() {
        options.source = args.source.clone();
    }
    if !args.out.is_empty() {
        options.out = args.out.clone();
    }
    if !args.exclude.is_empty() {
        options.exclude = args.exclude.clone();
    }
    if let Some(concurrency) = args.concurrency {
        options.scan.concurrency = concurrency;
    }
    options.verbose |= args.verbose;

    if options.source.is_empty() {
        return Err(BuildscanError::InvalidArgument(
            "no source directories given (use --source or [build].source)".to_string(),
        )
        .into());
    }

    Ok(options)
}
