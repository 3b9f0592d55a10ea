//! Handlers for the built-in tags.

use super::{TagHandler, TagKind, TagNode, TagSchema};
use crate::error::{AppError, AppResult};
use crate::expand::Expander;
use crate::properties::{CONTROLLER_MARKER, METHOD_MARKER};
use serde_yaml::{Mapping, Value};

fn expect_scalar(tag: &str, node: TagNode) -> AppResult<String> {
    match node {
        TagNode::Scalar(text) => Ok(text),
        TagNode::Mapping(_) => Err(AppError::InvalidTag(format!("!{} expects a scalar", tag))),
    }
}

fn expect_mapping(tag: &str, node: TagNode) -> AppResult<Mapping> {
    match node {
        TagNode::Mapping(map) => Ok(map),
        TagNode::Scalar(_) => Err(AppError::InvalidTag(format!("!{} expects a mapping", tag))),
    }
}

/// `!include` / `!includePath`: splices another file in place.
#[derive(Debug, Clone, Copy)]
pub struct IncludeTag {
    name: &'static str,
    force_pathless: bool,
}

impl IncludeTag {
    /// `!include`: the included tree defaults to `noPath: true`.
    pub fn pathless() -> Self {
        Self {
            name: "include",
            force_pathless: true,
        }
    }

    /// `!includePath`: the included tree keeps its path.
    pub fn with_path() -> Self {
        Self {
            name: "includePath",
            force_pathless: false,
        }
    }
}

impl TagHandler for IncludeTag {
    fn name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> TagKind {
        TagKind::Scalar
    }

    fn construct(
        &self,
        expander: &mut Expander<'_>,
        schema: &TagSchema,
        node: TagNode,
    ) -> AppResult<Option<Value>> {
        let filename = expect_scalar(self.name, node)?;
        expander.resolve_include(&filename, schema.base_dir(), self.force_pathless)
    }
}

/// `!define`: registers a trait and removes the node.
#[derive(Debug, Clone, Copy)]
pub struct DefineTag;

impl TagHandler for DefineTag {
    fn name(&self) -> &'static str {
        "define"
    }

    fn kind(&self) -> TagKind {
        TagKind::Mapping
    }

    fn construct(
        &self,
        expander: &mut Expander<'_>,
        _schema: &TagSchema,
        node: TagNode,
    ) -> AppResult<Option<Value>> {
        let fragment = expect_mapping(self.name(), node)?;
        expander.context_mut().traits.define(fragment)?;
        Ok(None)
    }
}

/// `!use`: applies registered traits to the mapping.
#[derive(Debug, Clone, Copy)]
pub struct UseTag;

impl TagHandler for UseTag {
    fn name(&self) -> &'static str {
        "use"
    }

    fn kind(&self) -> TagKind {
        TagKind::Mapping
    }

    fn construct(
        &self,
        expander: &mut Expander<'_>,
        _schema: &TagSchema,
        node: TagNode,
    ) -> AppResult<Option<Value>> {
        let using = expect_mapping(self.name(), node)?;
        let expanded = expander.context().traits.apply(using)?;
        Ok(Some(Value::Mapping(expanded)))
    }
}

/// `!controller`, `!method`, `!virtual`: stamp a structural marker.
#[derive(Debug, Clone, Copy)]
pub struct MarkerTag {
    name: &'static str,
    key: &'static str,
}

impl MarkerTag {
    /// The route names a controller after its own key.
    pub fn controller() -> Self {
        Self {
            name: "controller",
            key: CONTROLLER_MARKER,
        }
    }

    /// The route names a handler method after its own key.
    pub fn method() -> Self {
        Self {
            name: "method",
            key: METHOD_MARKER,
        }
    }

    /// The route only groups children and is not documented itself.
    pub fn virtual_route() -> Self {
        Self {
            name: "virtual",
            key: "virtual",
        }
    }
}

impl TagHandler for MarkerTag {
    fn name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> TagKind {
        TagKind::Mapping
    }

    fn construct(
        &self,
        _expander: &mut Expander<'_>,
        _schema: &TagSchema,
        node: TagNode,
    ) -> AppResult<Option<Value>> {
        let mut map = expect_mapping(self.name, node)?;
        map.insert(Value::from(self.key), Value::Bool(true));
        Ok(Some(Value::Mapping(map)))
    }
}
