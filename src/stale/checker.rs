// src/stale/checker.rs

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::{BuildscanError, Result};
use crate::fs::{self, EntryKind, FileSystem};
use crate::scan::{ScanOptions, collect_files};

use super::rules::{CompileRules, SourceFilter, rel_path_str};
use super::{StaleReason, Staleness};

/// Compares source trees against output trees.
///
/// Stat failures are returned as errors rather than read as "fresh": a wrong
/// fresh verdict would silently skip a needed compilation. The only tolerated
/// failure is a source file that vanished between listing and stat.
#[derive(Debug, Clone)]
pub struct StaleChecker {
    fs: Arc<dyn FileSystem>,
    rules: CompileRules,
    filter: SourceFilter,
    scan: ScanOptions,
    verbose: bool,
}

impl StaleChecker {
    /// Checker with the default [`CompileRules`]. `excludes` are glob
    /// patterns matched against paths relative to the source directory.
    pub fn new(fs: Arc<dyn FileSystem>, excludes: &[String]) -> Result<Self> {
        Self::with_rules(fs, CompileRules::default(), excludes)
    }

    pub fn with_rules(
        fs: Arc<dyn FileSystem>,
        rules: CompileRules,
        excludes: &[String],
    ) -> Result<Self> {
        let filter = SourceFilter::new(&rules, excludes)?;
        Ok(Self {
            fs,
            rules,
            filter,
            scan: ScanOptions::default(),
            verbose: false,
        })
    }

    /// Log staleness reasons at `info` instead of `debug`.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn scan_options(mut self, scan: ScanOptions) -> Self {
        self.scan = scan;
        self
    }

    pub fn rules(&self) -> &CompileRules {
        &self.rules
    }

    /// Check a single source/output directory pair.
    pub async fn check(&self, source: &Path, output: &Path) -> Result<Staleness> {
        self.ensure_source_dir(source).await?;

        if !self.is_dir(output).await? {
            return Ok(self.stale(StaleReason::OutputDirMissing {
                output: output.to_path_buf(),
            }));
        }

        let files = collect_files(Arc::clone(&self.fs), source, &self.scan).await?;

        for source_file in files {
            let Ok(rel) = source_file.strip_prefix(source) else {
                continue;
            };
            if !self.filter.matches(&rel_path_str(rel)) {
                continue;
            }

            let output_file = output.join(self.rules.output_path(rel));
            if let Some(reason) = self.compare(source_file, output_file).await? {
                return Ok(self.stale(reason));
            }
        }

        debug!(
            source = %source.display(),
            output = %output.display(),
            "output directory is up to date"
        );
        Ok(Staleness::Fresh)
    }

    /// Check parallel lists of source/output directories pair by pair,
    /// stopping at the first stale pair.
    pub async fn check_pairs(&self, sources: &[PathBuf], outputs: &[PathBuf]) -> Result<Staleness> {
        if sources.len() != outputs.len() {
            return Err(BuildscanError::InvalidArgument(format!(
                "source and output lists must have the same length ({} != {})",
                sources.len(),
                outputs.len()
            )));
        }

        for (source, output) in sources.iter().zip(outputs) {
            let verdict = self.check(source, output).await?;
            if verdict.is_stale() {
                return Ok(verdict);
            }
        }

        Ok(Staleness::Fresh)
    }

    async fn ensure_source_dir(&self, source: &Path) -> Result<()> {
        let path = source.to_path_buf();
        match fs::blocking(&self.fs, move |fs| fs.kind(&path)).await {
            Ok(EntryKind::Dir) => Ok(()),
            Ok(_) => Err(BuildscanError::InvalidArgument(format!(
                "source {} is not a directory",
                source.display()
            ))),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(BuildscanError::NotFound(source.to_path_buf()))
            }
            Err(err) => Err(BuildscanError::io(source, err)),
        }
    }

    async fn is_dir(&self, path: &Path) -> Result<bool> {
        let target = path.to_path_buf();
        match fs::blocking(&self.fs, move |fs| fs.kind(&target)).await {
            Ok(kind) => Ok(kind == EntryKind::Dir),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(BuildscanError::io(path, err)),
        }
    }

    /// Compare one source file against its expected output.
    ///
    /// The output must be a regular file; a directory (or anything else) at
    /// the mapped path counts as missing.
    async fn compare(&self, source: PathBuf, output: PathBuf) -> Result<Option<StaleReason>> {
        let target = output.clone();
        let output_mtime = match fs::blocking(&self.fs, move |fs| {
            match fs.kind(&target)? {
                EntryKind::File => fs.modified(&target).map(Some),
                _ => Ok(None),
            }
        })
        .await
        {
            Ok(Some(mtime)) => mtime,
            Ok(None) => {
                debug!(output = %output.display(), "mapped output is not a regular file");
                return Ok(Some(StaleReason::OutputMissing { source, output }));
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(Some(StaleReason::OutputMissing { source, output }));
            }
            Err(err) => return Err(BuildscanError::io(output, err)),
        };

        let target = source.clone();
        let source_mtime = match fs::blocking(&self.fs, move |fs| fs.modified(&target)).await {
            Ok(mtime) => mtime,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(source = %source.display(), "source vanished during staleness check");
                return Ok(None);
            }
            Err(err) => return Err(BuildscanError::io(source, err)),
        };

        if source_mtime > output_mtime {
            return Ok(Some(StaleReason::SourceNewer { source, output }));
        }

        Ok(None)
    }

    fn stale(&self, reason: StaleReason) -> Staleness {
        if self.verbose {
            info!(%reason, "output is stale");
        } else {
            debug!(%reason, "output is stale");
        }
        Staleness::Stale(reason)
    }
}

/// Whether `output_dir` must be rebuilt from `source_dir`.
pub async fn is_stale(
    fs: Arc<dyn FileSystem>,
    source_dir: &Path,
    output_dir: &Path,
    excludes: &[String],
    verbose: bool,
) -> Result<bool> {
    let checker = StaleChecker::new(fs, excludes)?.verbose(verbose);
    Ok(checker.check(source_dir, output_dir).await?.is_stale())
}

/// Logical OR of [`is_stale`] across parallel source/output lists,
/// short-circuiting at the first stale pair.
pub async fn any_stale(
    fs: Arc<dyn FileSystem>,
    sources: &[PathBuf],
    outputs: &[PathBuf],
    excludes: &[String],
    verbose: bool,
) -> Result<bool> {
    let checker = StaleChecker::new(fs, excludes)?.verbose(verbose);
    Ok(checker.check_pairs(sources, outputs).await?.is_stale())
}
