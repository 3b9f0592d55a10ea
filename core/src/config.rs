#![deny(missing_docs)]

//! # Compile Options
//!
//! Caller-supplied overrides for a single compile invocation.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Overrides applied when compiling a route document.
///
/// Deserializable (camelCase) so hosts can embed it in their own config files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptions {
    /// Directory relative includes are resolved against.
    /// Defaults to the parent directory of a file source.
    pub config_dir: Option<PathBuf>,
    /// Prefix prepended to handler method names by consumers.
    pub method_prefix: Option<String>,
}

impl CompileOptions {
    /// Creates options with no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration directory override.
    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = Some(dir.into());
        self
    }

    /// Sets the method-name prefix override.
    pub fn with_method_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.method_prefix = Some(prefix.into());
        self
    }

    /// Picks the effective configuration directory: the explicit override wins,
    /// otherwise the directory of the source file (if any).
    pub(crate) fn effective_config_dir(&self, source_dir: Option<&Path>) -> Option<PathBuf> {
        self.config_dir
            .clone()
            .or_else(|| source_dir.map(Path::to_path_buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins_over_source_dir() {
        let opts = CompileOptions::new().with_config_dir("/etc/routes");
        assert_eq!(
            opts.effective_config_dir(Some(Path::new("/srv/api"))),
            Some(PathBuf::from("/etc/routes"))
        );
    }

    #[test]
    fn test_source_dir_used_without_override() {
        let opts = CompileOptions::new();
        assert_eq!(
            opts.effective_config_dir(Some(Path::new("/srv/api"))),
            Some(PathBuf::from("/srv/api"))
        );
        assert_eq!(opts.effective_config_dir(None), None);
    }

    #[test]
    fn test_deserialize_camel_case() {
        let opts: CompileOptions =
            serde_yaml::from_str("configDir: conf\nmethodPrefix: action").unwrap();
        assert_eq!(opts.config_dir, Some(PathBuf::from("conf")));
        assert_eq!(opts.method_prefix.as_deref(), Some("action"));
    }
}
