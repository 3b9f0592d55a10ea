#![deny(missing_docs)]

//! # Custom Tags
//!
//! The tag dispatcher consumed by the expander. A [`TagSchema`] binds tag
//! names to [`TagHandler`] implementations for one configuration directory;
//! [`SchemaCache`] keeps one schema per directory for the whole compile.

mod handlers;

pub use handlers::{DefineTag, IncludeTag, MarkerTag, UseTag};

use crate::error::{AppError, AppResult};
use crate::expand::Expander;
use crate::yaml::kind_name;
use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// The node kind a tag accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// A scalar string (e.g. a filename).
    Scalar,
    /// A mapping. Empty nodes are accepted as an empty mapping.
    Mapping,
}

/// A node handed to a tag handler after its children were expanded.
#[derive(Debug, Clone, PartialEq)]
pub enum TagNode {
    /// Scalar text.
    Scalar(String),
    /// Mapping body.
    Mapping(Mapping),
}

impl TagKind {
    /// Checks `value` against this kind.
    pub fn accept(self, tag: &str, value: Value) -> AppResult<TagNode> {
        match (self, value) {
            (TagKind::Scalar, Value::String(text)) => Ok(TagNode::Scalar(text)),
            (TagKind::Mapping, Value::Mapping(map)) => Ok(TagNode::Mapping(map)),
            (TagKind::Mapping, Value::Null) => Ok(TagNode::Mapping(Mapping::new())),
            (TagKind::Mapping, Value::String(text)) if text.is_empty() => {
                Ok(TagNode::Mapping(Mapping::new()))
            }
            (kind, other) => Err(AppError::InvalidTag(format!(
                "!{} expects a {}, found {}",
                tag,
                match kind {
                    TagKind::Scalar => "scalar",
                    TagKind::Mapping => "mapping",
                },
                kind_name(&other)
            ))),
        }
    }
}

/// A construction callback for one custom tag.
pub trait TagHandler {
    /// Tag name without the leading `!`.
    fn name(&self) -> &'static str;

    /// Node kind this tag accepts.
    fn kind(&self) -> TagKind;

    /// Builds the replacement value. `None` removes the node from its parent.
    fn construct(
        &self,
        expander: &mut Expander<'_>,
        schema: &TagSchema,
        node: TagNode,
    ) -> AppResult<Option<Value>>;
}

/// Tag handlers bound to one configuration directory.
pub struct TagSchema {
    base_dir: Option<PathBuf>,
    handlers: IndexMap<&'static str, Box<dyn TagHandler>>,
}

impl TagSchema {
    /// Builds the standard schema: `!include`, `!includePath`, `!define`,
    /// `!use`, `!controller`, `!method` and `!virtual`.
    pub fn new(base_dir: Option<PathBuf>) -> Self {
        let mut schema = Self {
            base_dir,
            handlers: IndexMap::new(),
        };
        schema.register(IncludeTag::pathless());
        schema.register(IncludeTag::with_path());
        schema.register(DefineTag);
        schema.register(UseTag);
        schema.register(MarkerTag::controller());
        schema.register(MarkerTag::method());
        schema.register(MarkerTag::virtual_route());
        schema
    }

    /// Adds (or replaces) a handler.
    pub fn register(&mut self, handler: impl TagHandler + 'static) {
        self.handlers.insert(handler.name(), Box::new(handler));
    }

    /// Directory relative includes resolve against.
    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    /// Looks up a handler by tag name (without `!`).
    pub fn handler(&self, tag: &str) -> Option<&dyn TagHandler> {
        self.handlers.get(tag).map(|h| h.as_ref())
    }

    /// Registered tag names.
    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.keys().copied()
    }
}

impl fmt::Debug for TagSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagSchema")
            .field("base_dir", &self.base_dir)
            .field("tags", &self.tags().collect::<Vec<_>>())
            .finish()
    }
}

/// One [`TagSchema`] per configuration directory (`None` is the default schema).
#[derive(Debug, Default)]
pub struct SchemaCache {
    schemas: HashMap<Option<PathBuf>, Rc<TagSchema>>,
}

impl SchemaCache {
    /// Returns the cached schema for `dir`, building it on first use.
    pub fn get_or_build(&mut self, dir: Option<&Path>) -> Rc<TagSchema> {
        let key = dir.map(Path::to_path_buf);
        self.schemas
            .entry(key)
            .or_insert_with_key(|key| {
                tracing::debug!(dir = ?key, "building tag schema");
                Rc::new(TagSchema::new(key.clone()))
            })
            .clone()
    }

    /// Number of distinct schemas built so far.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether no schema has been built yet.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_schema_tags() {
        let schema = TagSchema::new(None);
        assert_eq!(
            schema.tags().collect::<Vec<_>>(),
            vec![
                "include",
                "includePath",
                "define",
                "use",
                "controller",
                "method",
                "virtual"
            ]
        );
        assert_eq!(schema.handler("include").unwrap().kind(), TagKind::Scalar);
        assert_eq!(schema.handler("use").unwrap().kind(), TagKind::Mapping);
        assert!(schema.handler("template").is_none());
    }

    #[test]
    fn test_cache_reuses_schema_per_directory() {
        let mut cache = SchemaCache::default();
        let a = cache.get_or_build(Some(Path::new("conf")));
        let b = cache.get_or_build(Some(Path::new("conf")));
        let default = cache.get_or_build(None);
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(a.base_dir(), Some(Path::new("conf")));
        assert_eq!(default.base_dir(), None);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_kind_accepts_empty_mapping() {
        assert_eq!(
            TagKind::Mapping.accept("virtual", Value::Null).unwrap(),
            TagNode::Mapping(Mapping::new())
        );
        assert_eq!(
            TagKind::Mapping
                .accept("virtual", Value::String(String::new()))
                .unwrap(),
            TagNode::Mapping(Mapping::new())
        );
    }

    #[test]
    fn test_kind_rejects_mismatch() {
        let err = TagKind::Scalar
            .accept("include", Value::Mapping(Mapping::new()))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid Tag Usage: !include expects a scalar, found mapping"
        );
        assert!(TagKind::Mapping
            .accept("use", Value::from("x"))
            .is_err());
    }
}
