use std::str::FromStr;
use clap::ValueEnum;
use serde::Deserialize;

/// What the scanner does when a single directory cannot be listed mid-scan.
///
/// - `Ignore`: drop the subtree and keep going, whatever the error was. The
///   failure is logged and counted but never reaches the caller.
/// - `IgnoreVanished`: only tolerate entries that disappeared between being
///   discovered and being listed (`NotFound`). Any other error (permission
///   denied, not a directory, ...) still lets the scan finish, but is then
///   returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ItemErrorPolicy {
    Ignore,
    IgnoreVanished,
}

impl Default for ItemErrorPolicy {
    fn default() -> Self {
        ItemErrorPolicy::IgnoreVanished
    }
}

impl FromStr for ItemErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "ignore" => Ok(ItemErrorPolicy::Ignore),
            "ignore_vanished" => Ok(ItemErrorPolicy::IgnoreVanished),
            other => Err(format!(
                "invalid item_errors: {other} (expected \"ignore\" or \"ignore_vanished\")"
            )),
        }
    }
}
