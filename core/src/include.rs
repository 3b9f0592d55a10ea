#![deny(missing_docs)]

//! # Include Resolution
//!
//! `!include` / `!includePath` splice another YAML file into the tree. Each
//! file contributes once per compile: later references to the same path
//! evaluate to nothing, unless the file marks itself reusable with
//! `.includePoly`, in which case its expanded content is returned every time.

use crate::error::AppResult;
use crate::expand::Expander;
use crate::files::normalize;
use crate::yaml::parse_text;
use indexmap::IndexMap;
use serde_yaml::Value;
use std::path::{Path, PathBuf};

/// Marker making an included file reusable.
pub const POLY_MARKER: &str = ".includePoly";

/// Include bookkeeping for one compile.
#[derive(Debug, Clone, Default)]
pub struct IncludeMemo {
    /// Path → whether the file has been fully expanded.
    /// `false` while its expansion is still in progress (or for poly files).
    consumed: IndexMap<PathBuf, bool>,
    /// Expanded content of poly files.
    retained: IndexMap<PathBuf, Value>,
}

impl IncludeMemo {
    /// Whether `path` has been seen at all.
    pub fn is_known(&self, path: &Path) -> bool {
        self.consumed.contains_key(path)
    }

    /// Whether `path` was fully expanded as a single-use include.
    pub fn is_consumed(&self, path: &Path) -> bool {
        self.consumed.get(path).copied().unwrap_or(false)
    }

    /// Retained content of a poly include.
    pub fn retained(&self, path: &Path) -> Option<&Value> {
        self.retained.get(path)
    }

    /// Included paths in first-seen order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.consumed.keys().map(PathBuf::as_path)
    }

    fn begin(&mut self, path: &Path) {
        self.consumed.insert(path.to_path_buf(), false);
    }

    fn finish(&mut self, path: &Path) {
        self.consumed.insert(path.to_path_buf(), true);
    }

    fn retain(&mut self, path: &Path, value: Value) {
        self.retained.insert(path.to_path_buf(), value);
    }
}

/// Joins a relative filename onto `base_dir`.
pub(crate) fn include_path(filename: &str, base_dir: Option<&Path>) -> PathBuf {
    let file = Path::new(filename);
    match base_dir {
        Some(dir) if file.is_relative() => normalize(&dir.join(file)),
        _ => normalize(file),
    }
}

fn is_poly(value: &Value) -> bool {
    matches!(
        value.as_mapping().and_then(|m| m.get(POLY_MARKER)),
        Some(marker) if !matches!(marker, Value::Null | Value::Bool(false))
    )
}

impl Expander<'_> {
    /// Resolves one include reference.
    ///
    /// Returns `None` when the file was already included (or is still being
    /// expanded further up the chain). On first resolution a non-poly mapping
    /// defaults to `virtual: true` and, when `force_pathless`, to `noPath: true`.
    pub fn resolve_include(
        &mut self,
        filename: &str,
        base_dir: Option<&Path>,
        force_pathless: bool,
    ) -> AppResult<Option<Value>> {
        let path = include_path(filename, base_dir);

        if let Some(retained) = self.context().includes.retained(&path) {
            tracing::debug!(path = %path.display(), "reusing poly include");
            return Ok(Some(retained.clone()));
        }
        if self.context().includes.is_known(&path) {
            tracing::debug!(path = %path.display(), "include already consumed");
            return Ok(None);
        }

        tracing::debug!(path = %path.display(), force_pathless, "resolving include");
        self.context_mut().includes.begin(&path);

        let text = self.files().read_to_string(&path)?;
        let raw = parse_text(&text)?;
        let schema = self.schema_for(path.parent());
        let Some(mut expanded) = self.expand(raw, &schema)? else {
            self.context_mut().includes.finish(&path);
            return Ok(None);
        };

        if is_poly(&expanded) {
            if let Some(map) = expanded.as_mapping_mut() {
                map.shift_remove(POLY_MARKER);
            }
            self.context_mut().includes.retain(&path, expanded.clone());
            return Ok(Some(expanded));
        }

        if let Some(map) = expanded.as_mapping_mut() {
            if !map.contains_key("virtual") {
                map.insert(Value::from("virtual"), Value::Bool(true));
            }
            if force_pathless && !map.contains_key("noPath") {
                map.insert(Value::from("noPath"), Value::Bool(true));
            }
        }

        self.context_mut().includes.finish(&path);
        Ok(Some(expanded))
    }
}
