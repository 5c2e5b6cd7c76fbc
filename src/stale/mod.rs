// src/stale/mod.rs

//! Incremental-build staleness detection.
//!
//! A build output directory is stale relative to its source directory when
//! it is missing, when the mapped output of some source file is missing, or
//! when a source file is strictly newer than its mapped output. Source files
//! are enumerated with the bounded tree scanner; which files count and how
//! they map to outputs is described by [`CompileRules`].

use std::fmt;
use std::path::PathBuf;

pub mod checker;
pub mod rules;

pub use checker::{StaleChecker, any_stale, is_stale};
pub use rules::{CompileRules, SourceFilter, exclude_dir_pattern};

/// Why an output directory needs rebuilding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    OutputDirMissing { output: PathBuf },
    OutputMissing { source: PathBuf, output: PathBuf },
    SourceNewer { source: PathBuf, output: PathBuf },
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaleReason::OutputDirMissing { output } => {
                write!(f, "output directory {} does not exist", output.display())
            }
            StaleReason::OutputMissing { output, .. } => {
                write!(f, "file {} does not exist", output.display())
            }
            StaleReason::SourceNewer { source, .. } => {
                write!(f, "file {} was modified", source.display())
            }
        }
    }
}

/// Verdict for one (source, output) pair or a list of pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staleness {
    Fresh,
    Stale(StaleReason),
}

impl Staleness {
    pub fn is_stale(&self) -> bool {
        matches!(self, Staleness::Stale(_))
    }

    pub fn reason(&self) -> Option<&StaleReason> {
        match self {
            Staleness::Fresh => None,
            Staleness::Stale(reason) => Some(reason),
        }
    }
}
