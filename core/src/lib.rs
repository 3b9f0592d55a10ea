#![deny(missing_docs)]

//! # Routedoc Core
//!
//! Compiles YAML route-description documents into a typed route tree.
//!
//! The document format is plain YAML plus a handful of custom tags:
//! `!include` / `!includePath` splice other files in, `!define` / `!use`
//! register and apply reusable trait fragments with placeholder
//! substitution, and `!controller` / `!method` / `!virtual` mark structural
//! roles. Expansion runs first and produces a plain mapping; the tree
//! builder then turns that mapping into [`Document`] and [`Route`] nodes.

/// Shared error types.
pub mod error;

/// Compile options.
pub mod config;

/// Filesystem seam for includes.
pub mod files;

/// Property allow-lists per entity kind.
pub mod properties;

/// Per-compile shared state.
pub mod context;

/// Tag-aware expansion of raw YAML values.
pub mod expand;

/// `!include` resolution and memoization.
pub mod include;

/// `!define` / `!use` trait fragments.
pub mod trait_registry;

/// Custom tag handlers.
pub mod tags;

/// Typed route tree.
pub mod tree;

/// Compile entry points.
pub mod compile;

mod yaml;

pub use compile::{compile, compile_file, compile_str, compile_with, Source};
pub use config::CompileOptions;
pub use context::DocumentContext;
pub use error::{AppError, AppResult};
pub use expand::Expander;
pub use files::{FileSource, LocalFiles, MemoryFiles};
pub use tags::{SchemaCache, TagHandler, TagKind, TagNode, TagSchema};
pub use trait_registry::TraitRegistry;
pub use tree::{
    Document, Example, Parameter, Request, Response, ResponseCodeEntry, Route, RoutePath,
    RouteVisit, Test, MODEL_VERSION,
};
