// src/stale/rules.rs

use std::fmt;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::errors::Result;

/// Which source files are compiled and where their output lands.
///
/// Defaults describe a TypeScript project:
///
/// - `src/a.ts`   -> `out/a.js`
/// - `src/a.d.ts` -> `out/a.d.ts` (declarations are copied, not compiled)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRules {
    /// Glob (relative to the source dir) selecting compilable files.
    pub source_pattern: String,
    /// File-name suffix of declaration-like files.
    pub declaration_suffix: String,
    /// Extension (without dot) of compiled artifacts.
    pub output_extension: String,
}

impl Default for CompileRules {
    fn default() -> Self {
        Self {
            source_pattern: "**/*.ts".to_string(),
            declaration_suffix: ".d.ts".to_string(),
            output_extension: "js".to_string(),
        }
    }
}

impl CompileRules {
    pub fn is_declaration(&self, rel_path: &Path) -> bool {
        rel_path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(&self.declaration_suffix))
    }

    /// Relative output path for a relative source path.
    pub fn output_path(&self, rel_path: &Path) -> PathBuf {
        if self.is_declaration(rel_path) {
            rel_path.to_path_buf()
        } else {
            rel_path.with_extension(&self.output_extension)
        }
    }
}

/// Turn an excluded directory name into a glob, e.g. `fixtures` ->
/// `**/fixtures/**`.
pub fn exclude_dir_pattern(name: &str) -> String {
    format!("**/{}/**", name.trim_matches('/'))
}

/// Compiled include/exclude globs for source files.
///
/// Paths passed to [`SourceFilter::matches`] are relative to the source
/// directory and use `/` separators.
#[derive(Clone)]
pub struct SourceFilter {
    include: GlobSet,
    exclude: Option<GlobSet>,
}

impl fmt::Debug for SourceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFilter")
            .field("include", &self.include.len())
            .field("exclude", &self.exclude.as_ref().map(GlobSet::len))
            .finish()
    }
}

impl SourceFilter {
    pub fn new(rules: &CompileRules, excludes: &[String]) -> Result<Self> {
        let include = build_globset(std::slice::from_ref(&rules.source_pattern))?;
        let exclude = if excludes.is_empty() {
            None
        } else {
            Some(build_globset(excludes)?)
        };
        Ok(Self { include, exclude })
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.include.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(rel_path) {
                return false;
            }
        }
        true
    }
}

/// Relative path as a `/`-separated string, for glob matching.
pub fn rel_path_str(rel_path: &Path) -> String {
    rel_path.to_string_lossy().replace('\\', "/")
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(Glob::new(pat)?);
    }
    Ok(builder.build()?)
}
