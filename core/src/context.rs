#![deny(missing_docs)]

//! # Document Context
//!
//! Per-compile state shared by every expansion step: the trait registry,
//! the include memo and the tag-schema cache. Owned by the resulting
//! [`Document`](crate::tree::Document) once compilation finishes.

use crate::include::IncludeMemo;
use crate::tags::SchemaCache;
use crate::trait_registry::TraitRegistry;
use std::path::{Path, PathBuf};

/// Mutable state of one compile invocation.
#[derive(Debug, Default)]
pub struct DocumentContext {
    config_dir: Option<PathBuf>,
    method_prefix: Option<String>,
    pub(crate) traits: TraitRegistry,
    pub(crate) includes: IncludeMemo,
    pub(crate) schemas: SchemaCache,
}

impl DocumentContext {
    /// Creates a fresh context.
    pub fn new(config_dir: Option<PathBuf>, method_prefix: Option<String>) -> Self {
        Self {
            config_dir,
            method_prefix,
            ..Self::default()
        }
    }

    /// Directory the root document's includes resolve against.
    pub fn config_dir(&self) -> Option<&Path> {
        self.config_dir.as_deref()
    }

    /// Prefix prepended to handler method names.
    pub fn method_prefix(&self) -> Option<&str> {
        self.method_prefix.as_deref()
    }

    /// Traits registered while expanding.
    pub fn traits(&self) -> &TraitRegistry {
        &self.traits
    }

    /// Include bookkeeping.
    pub fn includes(&self) -> &IncludeMemo {
        &self.includes
    }

    /// Tag schemas built so far, one per configuration directory.
    pub fn schemas(&self) -> &SchemaCache {
        &self.schemas
    }
}
