//! Route nodes and the recursive tree builder.

use super::entities::{Example, Parameter, ResponseCodeEntry, Test};
use super::fields::{entity_mapping, FieldSet, Scope};
use crate::error::{AppError, AppResult};
use crate::properties::{
    EntityKind, API_TYPES, CONTROLLER_MARKER, HTTP_VERBS, METHOD_MARKER, OPTION_PREFIX,
};
use crate::yaml::{coerce_mapping, key_text, kind_name};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_yaml::{Mapping, Value};

/// A route's own path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutePath {
    /// A literal segment appended to the parent's path.
    Segment(String),
    /// `path: false`: the route shares its parent's path.
    Inherit,
}

impl RoutePath {
    fn from_value(value: Value, name: &str, scope: &Scope<'_>) -> AppResult<Option<Self>> {
        match value {
            Value::Null => Ok(None),
            Value::Bool(false) => Ok(Some(RoutePath::Inherit)),
            Value::Bool(true) => Ok(Some(RoutePath::Segment(name.to_string()))),
            Value::String(s) => Ok(Some(RoutePath::Segment(s))),
            Value::Number(n) => Ok(Some(RoutePath::Segment(n.to_string()))),
            other => Err(AppError::Shape(format!(
                "route field 'path' at '{}' must be a string or false, found {}",
                scope,
                kind_name(&other)
            ))),
        }
    }

    /// The literal segment, if any.
    pub fn segment(&self) -> Option<&str> {
        match self {
            RoutePath::Segment(s) => Some(s),
            RoutePath::Inherit => None,
        }
    }
}

impl Serialize for RoutePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RoutePath::Segment(s) => serializer.serialize_str(s),
            RoutePath::Inherit => serializer.serialize_bool(false),
        }
    }
}

/// One path/handler node of the route tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    /// The key this route was declared under.
    pub name: String,
    /// Path segment. Absent when `no_path` suppressed the default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<RoutePath>,
    /// Short title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Long description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Controller handling this route and its children.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
    /// Handler method name (without the document's method prefix).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// HTTP verb.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http: Option<String>,
    /// API type (`json`, `xml`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_type: Option<String>,
    /// Auth type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<String>,
    /// Request schema reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_schema: Option<Value>,
    /// Response schema reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
    /// Path parameters by name.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub path_params: IndexMap<String, Parameter>,
    /// Query parameters by name.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub query_params: IndexMap<String, Parameter>,
    /// Header parameters by name.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub header_params: IndexMap<String, Parameter>,
    /// Declared response codes.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub response_codes: IndexMap<String, ResponseCodeEntry>,
    /// Documentation examples.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Example>,
    /// Contract tests.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tests: Vec<Test>,
    /// Grouping only; no route is documented for this node itself.
    #[serde(rename = "virtual")]
    pub is_virtual: bool,
    /// Suppresses the default path.
    pub no_path: bool,
    /// Marks the fallback route of its parent.
    pub default_route: bool,
    /// Redirect target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    /// Redirect status code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_code: Option<u64>,
    /// Options declared with `.`-prefixed keys (prefix stripped).
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub options: IndexMap<String, Value>,
    /// Child routes in declaration order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<Route>,
}

impl Route {
    /// Builds the route declared as `name: raw` under `parent`.
    pub fn build(name: &str, mut raw: Mapping, parent: &Scope<'_>) -> AppResult<Self> {
        let scope = parent.child(name);
        let mut fields = FieldSet::take(EntityKind::Route, &scope, &mut raw);

        let mut route = Route {
            name: name.to_string(),
            title: fields.string("title")?,
            description: fields.string("description")?,
            controller: fields.string("controller")?,
            method: fields.string("method")?,
            api_type: fields.string("apiType")?,
            auth_type: fields.string("authType")?,
            http: fields.string("http")?,
            request_schema: fields.value("requestSchema"),
            response_schema: fields.value("responseSchema"),
            path_params: fields.entity_map("pathParams", Parameter::build)?,
            query_params: fields.entity_map("queryParams", Parameter::build)?,
            header_params: fields.entity_map("headerParams", Parameter::build)?,
            response_codes: fields.entity_map("responseCodes", ResponseCodeEntry::build)?,
            examples: fields.entity_list("examples", Example::build)?,
            tests: fields.entity_list("tests", Test::build)?,
            is_virtual: fields.flag("virtual")?.unwrap_or(false),
            no_path: fields.flag("noPath")?.unwrap_or(false),
            default_route: fields.flag("defaultRoute")?.unwrap_or(false),
            redirect: fields.string("redirect")?,
            redirect_code: fields.integer("redirectCode")?,
            ..Route::default()
        };

        if fields.contains("path") {
            route.path = match fields.value("path") {
                Some(value) => RoutePath::from_value(value, name, &scope)?,
                None => None,
            };
        }

        if raw.shift_remove(CONTROLLER_MARKER).is_some() && route.controller.is_none() {
            route.controller = Some(name.to_string());
        }
        if raw.shift_remove(METHOD_MARKER).is_some() && route.method.is_none() {
            route.method = Some(name.to_string());
        }

        if route.path.is_none() && !route.no_path {
            route.path = Some(RoutePath::Segment(name.to_string()));
        }

        promote(&mut raw, HTTP_VERBS, "http", &scope)?;
        promote(&mut raw, API_TYPES, "apiType", &scope)?;

        build_children(raw, &scope, &mut route.routes, &mut route.options)?;
        Ok(route)
    }

    /// Whether this route has child routes.
    pub fn has_children(&self) -> bool {
        !self.routes.is_empty()
    }

    /// Number of routes in this subtree, including this one.
    pub fn count(&self) -> usize {
        1 + self.routes.iter().map(Route::count).sum::<usize>()
    }

    /// Finds a direct child by name.
    pub fn child(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.name == name)
    }
}

/// Turns the value under each of `keys` into a nested route mapping stamped
/// with `stamp_field = key` and `path: false` unless a path is already set.
fn promote(
    raw: &mut Mapping,
    keys: &[&str],
    stamp_field: &str,
    scope: &Scope<'_>,
) -> AppResult<()> {
    for key in keys {
        let Some(slot) = raw.get_mut(*key) else {
            continue;
        };
        let current = std::mem::take(slot);
        let found = kind_name(&current);
        let mut nested = coerce_mapping(current, "description").ok_or_else(|| {
            AppError::Shape(format!(
                "'{}' at '{}' must be a mapping, found {}",
                key, scope, found
            ))
        })?;
        nested.insert(Value::from(stamp_field), Value::from(*key));
        if !nested.contains_key("path") {
            nested.insert(Value::from("path"), Value::Bool(false));
        }
        *slot = Value::Mapping(nested);
    }
    Ok(())
}

/// Splits what remains of a raw mapping into options and child routes.
pub(crate) fn build_children(
    raw: Mapping,
    scope: &Scope<'_>,
    routes: &mut Vec<Route>,
    options: &mut IndexMap<String, Value>,
) -> AppResult<()> {
    for (key, value) in raw {
        let Some(name) = key_text(&key) else {
            return Err(AppError::Shape(format!(
                "route keys at '{}' must be scalars, found {}",
                scope,
                kind_name(&key)
            )));
        };

        if let Some(option) = name.strip_prefix(OPTION_PREFIX) {
            options.insert(option.to_string(), value);
            continue;
        }
        if value.is_null() {
            continue;
        }

        let child_scope = scope.child(&name);
        let mapping = entity_mapping(EntityKind::Route, &child_scope, value, "description")?;
        routes.push(Route::build(&name, mapping, scope)?);
    }
    Ok(())
}
