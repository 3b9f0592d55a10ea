#![deny(missing_docs)]

//! # Expansion
//!
//! Walks a raw YAML value in source order and resolves custom tags. Children
//! are expanded before the tag on their parent runs, so a `!define` earlier
//! in the text is visible to any later `!use`, and trait bodies are stored
//! fully expanded.

use crate::context::DocumentContext;
use crate::error::{AppError, AppResult};
use crate::files::FileSource;
use crate::tags::TagSchema;
use crate::yaml::kind_name;
use serde_yaml::value::TaggedValue;
use serde_yaml::{Mapping, Value};
use std::path::Path;
use std::rc::Rc;

/// Tag-resolving walker bound to one compile's context.
pub struct Expander<'a> {
    context: &'a mut DocumentContext,
    files: &'a dyn FileSource,
}

impl<'a> Expander<'a> {
    /// Creates an expander over `context`, reading includes through `files`.
    pub fn new(context: &'a mut DocumentContext, files: &'a dyn FileSource) -> Self {
        Self { context, files }
    }

    /// Shared compile state.
    pub fn context(&self) -> &DocumentContext {
        &*self.context
    }

    /// Mutable compile state, for tag handlers.
    pub fn context_mut(&mut self) -> &mut DocumentContext {
        &mut *self.context
    }

    pub(crate) fn files(&self) -> &'a dyn FileSource {
        self.files
    }

    /// Returns the cached schema for `dir`.
    pub fn schema_for(&mut self, dir: Option<&Path>) -> Rc<TagSchema> {
        self.context.schemas.get_or_build(dir)
    }

    /// Expands the root document against the configuration directory.
    ///
    /// An empty document yields an empty mapping; any other non-mapping root
    /// is a configuration error.
    pub fn expand_document(&mut self, root: Value) -> AppResult<Mapping> {
        let dir = self.context.config_dir().map(Path::to_path_buf);
        let schema = self.schema_for(dir.as_deref());
        match self.expand(root, &schema)? {
            None | Some(Value::Null) => Ok(Mapping::new()),
            Some(Value::Mapping(map)) => Ok(map),
            Some(other) => Err(AppError::Configuration(format!(
                "document root must be a mapping, found {}",
                kind_name(&other)
            ))),
        }
    }

    /// Expands one node. `None` means the node evaluated to nothing.
    pub fn expand(&mut self, node: Value, schema: &TagSchema) -> AppResult<Option<Value>> {
        match node {
            Value::Tagged(tagged) => {
                let TaggedValue { tag, value } = *tagged;
                let tag = tag.to_string();
                let name = tag.trim_start_matches('!');
                let handler = schema
                    .handler(name)
                    .ok_or_else(|| AppError::UnknownTag(tag.clone()))?;
                let inner = self.expand_children(value, schema)?;
                let node = handler.kind().accept(name, inner)?;
                handler.construct(self, schema, node)
            }
            other => self.expand_children(other, schema).map(Some),
        }
    }

    fn expand_children(&mut self, node: Value, schema: &TagSchema) -> AppResult<Value> {
        match node {
            Value::Mapping(map) => {
                let mut expanded = Mapping::with_capacity(map.len());
                for (key, value) in map {
                    if let Some(value) = self.expand(value, schema)? {
                        expanded.insert(key, value);
                    }
                }
                Ok(Value::Mapping(expanded))
            }
            Value::Sequence(items) => {
                let mut expanded = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(item) = self.expand(item, schema)? {
                        expanded.push(item);
                    }
                }
                Ok(Value::Sequence(expanded))
            }
            Value::Tagged(_) => self
                .expand(node, schema)
                .map(|value| value.unwrap_or(Value::Null)),
            scalar => Ok(scalar),
        }
    }
}
