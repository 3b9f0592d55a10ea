#![deny(missing_docs)]

//! # Compile
//!
//! Entry points: load a source, expand its custom tags, build the tree.

use crate::config::CompileOptions;
use crate::context::DocumentContext;
use crate::error::{AppError, AppResult};
use crate::expand::Expander;
use crate::files::{FileSource, LocalFiles};
use crate::tree::Document;
use crate::yaml::parse_text;
use serde_yaml::Value;
use std::path::{Path, PathBuf};

/// Where a route document comes from.
#[derive(Debug, Clone)]
pub enum Source {
    /// A YAML file; its directory becomes the default configuration directory.
    File(PathBuf),
    /// YAML text.
    Text(String),
    /// An already-parsed YAML value (may still contain tagged nodes).
    Value(Value),
    /// A plain data tree.
    Json(serde_json::Value),
}

impl Source {
    /// Convenience constructor for [`Source::File`].
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Source::File(path.into())
    }

    /// Convenience constructor for [`Source::Text`].
    pub fn text(text: impl Into<String>) -> Self {
        Source::Text(text.into())
    }

    fn load(self, files: &dyn FileSource) -> AppResult<(Value, Option<PathBuf>)> {
        match self {
            Source::File(path) => {
                let text = files.read_to_string(&path)?;
                let dir = path.parent().map(Path::to_path_buf);
                Ok((parse_text(&text)?, dir))
            }
            Source::Text(text) => Ok((parse_text(&text)?, None)),
            Source::Value(value) => Ok((value, None)),
            Source::Json(json) => {
                let value = serde_yaml::to_value(json).map_err(|e| {
                    AppError::Configuration(format!("Failed to convert data source: {}", e))
                })?;
                Ok((value, None))
            }
        }
    }
}

/// Compiles a route document, reading includes from the local filesystem.
pub fn compile(source: Source, options: &CompileOptions) -> AppResult<Document> {
    compile_with(source, options, &LocalFiles)
}

/// Compiles a route document, reading the source file and includes through `files`.
pub fn compile_with(
    source: Source,
    options: &CompileOptions,
    files: &dyn FileSource,
) -> AppResult<Document> {
    let (raw, source_dir) = source.load(files)?;
    let config_dir = options.effective_config_dir(source_dir.as_deref());
    tracing::debug!(config_dir = ?config_dir, "compiling route document");

    let mut context = DocumentContext::new(config_dir, options.method_prefix.clone());
    let root = Expander::new(&mut context, files).expand_document(raw)?;
    let document = Document::build(root, context)?;

    tracing::debug!(
        routes = document.route_count(),
        traits = document.context().traits().len(),
        "route document compiled"
    );
    Ok(document)
}

/// Compiles the YAML file at `path` with default options.
pub fn compile_file(path: impl AsRef<Path>) -> AppResult<Document> {
    compile(Source::file(path.as_ref()), &CompileOptions::default())
}

/// Compiles YAML text with default options.
pub fn compile_str(text: &str) -> AppResult<Document> {
    compile(Source::text(text), &CompileOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::MemoryFiles;
    use crate::tree::RoutePath;
    use serde_json::json;

    #[test]
    fn test_counts_top_level_routes() {
        let doc = compile_str("title: API\n.v: 1\nusers: {}\nposts: ~\ntags: Tagging").unwrap();
        assert_eq!(doc.routes.len(), 2);
        assert_eq!(doc.route("tags").unwrap().description.as_deref(), Some("Tagging"));
        assert!(doc.option("v").is_some());
    }

    #[test]
    fn test_users_get_example() {
        let doc = compile_str("users:\n  GET: ~").unwrap();
        let users = doc.route("users").unwrap();
        assert_eq!(users.path, Some(RoutePath::Segment("users".into())));
        let get = users.child("GET").unwrap();
        assert_eq!(get.http.as_deref(), Some("GET"));
        assert_eq!(get.path, Some(RoutePath::Inherit));
    }

    #[test]
    fn test_json_source() {
        let doc = compile(
            Source::Json(json!({"title": "Data", "users": {"GET": null}})),
            &CompileOptions::default(),
        )
        .unwrap();
        assert_eq!(doc.title.as_deref(), Some("Data"));
        assert_eq!(doc.route_count(), 2);
    }

    #[test]
    fn test_non_mapping_value_is_configuration_error() {
        let err = compile(Source::Value(Value::from(3)), &CompileOptions::default()).unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[test]
    fn test_file_source_sets_config_dir() {
        let files = MemoryFiles::new()
            .with("api/routes.yaml", "users: !includePath users.yaml")
            .with("api/users.yaml", "GET: ~");
        let doc = compile_with(
            Source::file("api/routes.yaml"),
            &CompileOptions::new().with_method_prefix("on"),
            &files,
        )
        .unwrap();
        assert_eq!(doc.context().config_dir(), Some(Path::new("api")));
        assert_eq!(doc.method_prefix(), Some("on"));
        let users = doc.route("users").unwrap();
        assert!(users.is_virtual);
        assert!(!users.no_path);
        assert_eq!(users.path, Some(RoutePath::Segment("users".into())));
    }

    #[test]
    fn test_config_dir_override() {
        let files = MemoryFiles::new()
            .with("api/routes.yaml", "users: !include users.yaml")
            .with("shared/users.yaml", "GET: ~");
        let doc = compile_with(
            Source::file("api/routes.yaml"),
            &CompileOptions::new().with_config_dir("shared"),
            &files,
        )
        .unwrap();
        let users = doc.route("users").unwrap();
        assert!(users.no_path);
        assert_eq!(users.path, None);
    }
}
