// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::build::{BuildOptions, DEFAULT_TSC, DEFAULT_TSCONFIG};
use crate::scan::{DEFAULT_CONCURRENCY, ScanOptions};
use crate::types::ItemErrorPolicy;

/// Configuration exactly as read from a TOML file, before validation.
///
/// ```toml
/// [scan]
/// concurrency = 16
/// item_errors = "ignore_vanished"
///
/// [build]
/// tsc = "node_modules/.bin/tsc"
/// tsconfig = "./tsconfig.json"
/// source = ["src"]
/// out = ["dist"]
/// exclude = ["fixtures"]
/// verbose = false
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub scan: ScanSection,

    #[serde(default)]
    pub build: BuildSection,
}

/// Validated configuration. Build one with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    scan: ScanSection,
    build: BuildSection,
}

impl ConfigFile {
    /// Wrap sections without validating them; used by `TryFrom`.
    pub(crate) fn new_unchecked(scan: ScanSection, build: BuildSection) -> Self {
        Self { scan, build }
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            concurrency: self.scan.concurrency,
            item_errors: self.scan.item_errors,
        }
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            tsc: self.build.tsc.clone(),
            tsconfig: self.build.tsconfig.clone(),
            source: self.build.source.clone(),
            out: self.build.out.clone(),
            exclude: self.build.exclude.clone(),
            verbose: self.build.verbose,
            scan: self.scan_options(),
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(ScanSection::default(), BuildSection::default())
    }
}

/// `[scan]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanSection {
    /// Maximum number of scan tasks in flight at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// `"ignore"` or `"ignore_vanished"` (default).
    #[serde(default)]
    pub item_errors: ItemErrorPolicy,
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

impl Default for ScanSection {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            item_errors: ItemErrorPolicy::default(),
        }
    }
}

/// `[build]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSection {
    #[serde(default = "default_tsc")]
    pub tsc: String,

    #[serde(default = "default_tsconfig")]
    pub tsconfig: PathBuf,

    /// Source directories; `source[i]` compiles into `out[i]`.
    #[serde(default)]
    pub source: Vec<PathBuf>,

    #[serde(default)]
    pub out: Vec<PathBuf>,

    /// Directory names skipped by the staleness check (any depth).
    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default)]
    pub verbose: bool,
}

fn default_tsc() -> String {
    DEFAULT_TSC.to_string()
}

fn default_tsconfig() -> PathBuf {
    PathBuf::from(DEFAULT_TSCONFIG)
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            tsc: default_tsc(),
            tsconfig: default_tsconfig(),
            source: Vec::new(),
            out: Vec::new(),
            exclude: Vec::new(),
            verbose: false,
        }
    }
}
