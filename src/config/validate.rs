// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{BuildscanError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::BuildscanError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.scan, raw.build))
    }
}

/// Check the semantic invariants serde cannot express.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    validate_scan(cfg)?;
    validate_build_pairs(cfg)?;
    validate_excludes(cfg)?;
    Ok(())
}

fn validate_scan(cfg: &RawConfigFile) -> Result<()> {
    if cfg.scan.concurrency == 0 {
        return Err(BuildscanError::ConfigError(
            "[scan].concurrency must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_build_pairs(cfg: &RawConfigFile) -> Result<()> {
    let (source, out) = (&cfg.build.source, &cfg.build.out);
    if source.len() != out.len() {
        return Err(BuildscanError::ConfigError(format!(
            "[build].source and [build].out must have the same length ({} != {})",
            source.len(),
            out.len()
        )));
    }
    Ok(())
}

fn validate_excludes(cfg: &RawConfigFile) -> Result<()> {
    for name in cfg.build.exclude.iter() {
        if name.trim_matches('/').is_empty() {
            return Err(BuildscanError::ConfigError(
                "[build].exclude entries must name a directory".to_string(),
            ));
        }
    }
    Ok(())
}
