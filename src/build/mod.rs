// src/build/mod.rs

//! Incremental build orchestration.
//!
//! `compile_project` skips the compiler when every output directory is up to
//! date. Otherwise it runs the compiler once for the whole project and then
//! copies every declaration file of each source directory to its output
//! directory, so the next staleness check sees them as present.

pub mod compiler;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::{BuildscanError, Result};
use crate::fs::{self, FileSystem};
use crate::scan::{ScanOptions, collect_files};
use crate::stale::{CompileRules, StaleChecker, StaleReason, Staleness, exclude_dir_pattern};

pub use compiler::{CompileRequest, CompilerBackend, ProcessCompiler};

/// Default compiler executable.
pub const DEFAULT_TSC: &str = "node_modules/.bin/tsc";
/// Default project file.
pub const DEFAULT_TSCONFIG: &str = "./tsconfig.json";

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub tsc: String,
    pub tsconfig: PathBuf,
    /// Source directories, paired index-wise with `out`.
    pub source: Vec<PathBuf>,
    pub out: Vec<PathBuf>,
    /// Directory names to leave out of the staleness check.
    pub exclude: Vec<String>,
    pub verbose: bool,
    pub scan: ScanOptions,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            tsc: DEFAULT_TSC.to_string(),
            tsconfig: PathBuf::from(DEFAULT_TSCONFIG),
            source: Vec::new(),
            out: Vec::new(),
            exclude: Vec::new(),
            verbose: false,
            scan: ScanOptions::default(),
        }
    }
}

impl BuildOptions {
    /// Exclude globs derived from the excluded directory names.
    pub fn exclude_patterns(&self) -> Vec<String> {
        self.exclude.iter().map(|name| exclude_dir_pattern(name)).collect()
    }

    /// Staleness checker configured from these options.
    pub fn checker(&self, fs: Arc<dyn FileSystem>) -> Result<StaleChecker> {
        Ok(StaleChecker::new(fs, &self.exclude_patterns())?
            .verbose(self.verbose)
            .scan_options(self.scan))
    }

    fn validate(&self) -> Result<()> {
        if self.source.len() != self.out.len() {
            return Err(BuildscanError::InvalidArgument(format!(
                "source and out must have the same length ({} != {})",
                self.source.len(),
                self.out.len()
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Nothing changed; the compiler was not invoked.
    UpToDate,
    Compiled {
        reason: StaleReason,
        declarations_copied: usize,
    },
}

/// Compile the project if any output directory is stale.
pub async fn compile_project(
    fs: Arc<dyn FileSystem>,
    compiler: &dyn CompilerBackend,
    options: &BuildOptions,
) -> Result<BuildOutcome> {
    options.validate()?;

    let checker = options.checker(Arc::clone(&fs))?;
    let reason = match checker.check_pairs(&options.source, &options.out).await? {
        Staleness::Fresh => {
            if options.verbose {
                info!(tsconfig = %options.tsconfig.display(), "project has no changes");
            } else {
                debug!(tsconfig = %options.tsconfig.display(), "project has no changes");
            }
            return Ok(BuildOutcome::UpToDate);
        }
        Staleness::Stale(reason) => reason,
    };

    let request = CompileRequest {
        tsc: options.tsc.clone(),
        tsconfig: options.tsconfig.clone(),
    };
    info!(tsconfig = %request.tsconfig.display(), %reason, "compiling project");

    let code = compiler.compile(&request).await?;
    if code != 0 {
        return Err(BuildscanError::CompilerFailed(code));
    }

    let mut declarations_copied = 0;
    for (source, out) in options.source.iter().zip(&options.out) {
        declarations_copied +=
            copy_declarations(&fs, checker.rules(), source, out, &options.scan).await?;
    }

    info!(declarations_copied, "build finished");
    Ok(BuildOutcome::Compiled {
        reason,
        declarations_copied,
    })
}

/// Copy every declaration file under `source` to the same relative path under
/// `out`. Returns the number of files copied.
async fn copy_declarations(
    fs: &Arc<dyn FileSystem>,
    rules: &CompileRules,
    source: &Path,
    out: &Path,
    scan: &ScanOptions,
) -> Result<usize> {
    let files = collect_files(Arc::clone(fs), source, scan).await?;
    let mut copied = 0;

    for file in files {
        let Ok(rel) = file.strip_prefix(source) else {
            continue;
        };
        if !rules.is_declaration(rel) {
            continue;
        }

        let target = out.join(rel);
        debug!(from = %file.display(), to = %target.display(), "copying declaration");

        let (from, to) = (file.clone(), target);
        fs::blocking(fs, move |fs| fs.copy_file(&from, &to))
            .await
            .map_err(|err| BuildscanError::io(&file, err))?;
        copied += 1;
    }

    Ok(copied)
}
