#![deny(missing_docs)]

//! # Document
//!
//! The root of a compiled route tree, plus depth-first traversal helpers
//! that give consumers the context a route alone does not carry: its
//! effective path, the nearest controller and inherited options.

use super::fields::{FieldSet, Scope};
use super::route::{build_children, Route, RoutePath};
use crate::context::DocumentContext;
use crate::error::AppResult;
use crate::properties::EntityKind;
use indexmap::IndexMap;
use serde::Serialize;
use serde_yaml::{Mapping, Value};

/// Revision of the document model produced by this crate.
pub const MODEL_VERSION: &str = "2.0";

/// A compiled route document.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Short title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Long description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Default controller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
    /// Default handler method.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Default API type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_type: Option<String>,
    /// Default auth type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<String>,
    /// Top-level routes in declaration order.
    pub routes: Vec<Route>,
    /// Document options (`.`-prefixed keys, prefix stripped).
    pub options: IndexMap<String, Value>,
    #[serde(skip)]
    context: DocumentContext,
}

impl Document {
    /// Builds the tree from a fully expanded root mapping and takes ownership
    /// of the compile context.
    pub fn build(mut raw: Mapping, context: DocumentContext) -> AppResult<Self> {
        let scope = Scope::root();
        let mut fields = FieldSet::take(EntityKind::Document, &scope, &mut raw);
        let mut document = Document {
            title: fields.string("title")?,
            description: fields.string("description")?,
            controller: fields.string("controller")?,
            method: fields.string("method")?,
            api_type: fields.string("apiType")?,
            auth_type: fields.string("authType")?,
            routes: Vec::new(),
            options: IndexMap::new(),
            context,
        };
        build_children(raw, &scope, &mut document.routes, &mut document.options)?;
        Ok(document)
    }

    /// The document-model revision.
    pub fn version(&self) -> &'static str {
        MODEL_VERSION
    }

    /// Compile state: traits, include memo, schema cache, configuration.
    pub fn context(&self) -> &DocumentContext {
        &self.context
    }

    /// Prefix prepended to handler method names.
    pub fn method_prefix(&self) -> Option<&str> {
        self.context.method_prefix()
    }

    /// A document option by name.
    pub fn option(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }

    /// Finds a top-level route by name.
    pub fn route(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.name == name)
    }

    /// Total number of routes in the tree.
    pub fn route_count(&self) -> usize {
        self.routes.iter().map(Route::count).sum()
    }

    /// Every route, depth-first in declaration order.
    pub fn walk(&self) -> Vec<RouteVisit<'_>> {
        let mut visits = Vec::new();
        let mut ancestors = Vec::new();
        for route in &self.routes {
            collect(self, route, &mut ancestors, &mut visits);
        }
        visits
    }

    /// The tree as JSON, tagged with the model version.
    pub fn to_json(&self) -> AppResult<serde_json::Value> {
        let mut json = serde_json::to_value(self)?;
        if let Some(map) = json.as_object_mut() {
            map.insert(
                "version".to_string(),
                serde_json::Value::String(MODEL_VERSION.to_string()),
            );
        }
        Ok(json)
    }
}

fn collect<'a>(
    document: &'a Document,
    route: &'a Route,
    ancestors: &mut Vec<&'a Route>,
    visits: &mut Vec<RouteVisit<'a>>,
) {
    visits.push(RouteVisit {
        document,
        ancestors: ancestors.clone(),
        route,
    });
    ancestors.push(route);
    for child in &route.routes {
        collect(document, child, ancestors, visits);
    }
    ancestors.pop();
}

/// A route seen from the root: the route, its ancestors and the document.
#[derive(Debug, Clone)]
pub struct RouteVisit<'a> {
    /// The owning document.
    pub document: &'a Document,
    /// Ancestors, outermost first.
    pub ancestors: Vec<&'a Route>,
    /// The visited route.
    pub route: &'a Route,
}

impl<'a> RouteVisit<'a> {
    /// Ancestors and the route itself, innermost first.
    fn chain(&self) -> impl Iterator<Item = &'a Route> + '_ {
        std::iter::once(self.route).chain(self.ancestors.iter().rev().copied())
    }

    /// Joins the literal path segments from the root down to this route.
    pub fn resolved_path(&self) -> String {
        let segments: Vec<&str> = self
            .ancestors
            .iter()
            .copied()
            .chain(std::iter::once(self.route))
            .filter_map(|r| r.path.as_ref().and_then(RoutePath::segment))
            .map(|s| s.trim_matches('/'))
            .filter(|s| !s.is_empty())
            .collect();
        format!("/{}", segments.join("/"))
    }

    /// Nearest explicit controller, falling back to the document's.
    pub fn controller(&self) -> Option<&'a str> {
        self.chain()
            .find_map(|r| r.controller.as_deref())
            .or(self.document.controller.as_deref())
    }

    /// Nearest HTTP verb on the route or its ancestors.
    pub fn http(&self) -> Option<&'a str> {
        self.chain().find_map(|r| r.http.as_deref())
    }

    /// The route's method name with the document's method prefix applied.
    pub fn handler_method(&self) -> Option<String> {
        let method = self.route.method.as_deref()?;
        Some(match self.document.method_prefix() {
            Some(prefix) => format!("{}{}", prefix, method),
            None => method.to_string(),
        })
    }

    /// Looks an option up on the route, then outward through its ancestors
    /// and finally on the document.
    pub fn option(&self, name: &str) -> Option<&'a Value> {
        self.chain()
            .find_map(|r| r.options.get(name))
            .or_else(|| self.document.options.get(name))
    }

    /// Whether the route or any ancestor is virtual.
    pub fn is_virtual(&self) -> bool {
        self.chain().any(|r| r.is_virtual)
    }

    /// Nesting depth (0 for top-level routes).
    pub fn depth(&self) -> usize {
        self.ancestors.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn document(yaml: &str, prefix: Option<&str>) -> Document {
        let raw: Mapping = serde_yaml::from_str(yaml).unwrap();
        let context = DocumentContext::new(None, prefix.map(str::to_string));
        Document::build(raw, context).unwrap()
    }

    #[test]
    fn test_top_level_fields_options_and_routes() {
        let doc = document(
            "title: Shop API\n.baseUrl: /api\nusers: {}\nposts: {}\nnothing: ~",
            None,
        );
        assert_eq!(doc.title.as_deref(), Some("Shop API"));
        assert_eq!(doc.option("baseUrl"), Some(&Value::from("/api")));
        assert_eq!(doc.routes.len(), 2);
        assert_eq!(doc.version(), MODEL_VERSION);
    }

    #[test]
    fn test_walk_resolves_paths_and_context() {
        let doc = document(
            r#"
controller: Default
.format: json
users:
  controller: Users
  .format: xml
  GET:
    method: list
  item:
    path: "{id}"
    GET:
      method: show
admin:
  noPath: true
  stats:
    .cache: 10
"#,
            Some("action"),
        );

        let visits = doc.walk();
        let summary: Vec<(String, Option<&str>, usize)> = visits
            .iter()
            .map(|v| (v.resolved_path(), v.http(), v.depth()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("/users".to_string(), None, 0),
                ("/users".to_string(), Some("GET"), 1),
                ("/users/{id}".to_string(), None, 1),
                ("/users/{id}".to_string(), Some("GET"), 2),
                ("/".to_string(), None, 0),
                ("/stats".to_string(), None, 1),
            ]
        );

        let show = &visits[3];
        assert_eq!(show.controller(), Some("Users"));
        assert_eq!(show.handler_method().as_deref(), Some("actionshow"));
        assert_eq!(show.option("format"), Some(&Value::from("xml")));

        let stats = &visits[5];
        assert_eq!(stats.controller(), Some("Default"));
        assert_eq!(stats.option("format"), Some(&Value::from("json")));
        assert_eq!(stats.option("cache"), Some(&Value::from(10)));
        assert_eq!(doc.route_count(), 6);
    }

    #[test]
    fn test_virtual_is_inherited_by_descendants() {
        let doc = document("docs:\n  virtual: true\n  GET: ~\nusers:\n  GET: ~", None);
        let flags: Vec<(&str, bool)> = doc
            .walk()
            .iter()
            .map(|v| (v.route.name.as_str(), v.is_virtual()))
            .collect();
        assert_eq!(
            flags,
            vec![("docs", true), ("GET", true), ("users", false), ("GET", false)]
        );
    }

    #[test]
    fn test_to_json_carries_version() {
        let doc = document("users:\n  GET: ~", None);
        let json = doc.to_json().unwrap();
        assert_eq!(json["version"], serde_json::json!(MODEL_VERSION));
        assert_eq!(json["routes"][0]["name"], serde_json::json!("users"));
        assert_eq!(json["routes"][0]["routes"][0]["http"], serde_json::json!("GET"));
    }
}
