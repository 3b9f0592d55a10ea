//! Allow-list driven field extraction.

use crate::error::{AppError, AppResult};
use crate::properties::{EntityKind, Shape};
use crate::yaml::{key_text, kind_name, scalar_text};
use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use std::fmt;

/// Breadcrumb of ancestor names, threaded through entity constructors as the
/// parent reference.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    parent: Option<&'a Scope<'a>>,
    name: &'a str,
}

impl<'a> Scope<'a> {
    /// The document root.
    pub fn root() -> Scope<'static> {
        Scope {
            parent: None,
            name: "",
        }
    }

    /// A child scope named `name`.
    pub fn child(&'a self, name: &'a str) -> Scope<'a> {
        Scope {
            parent: Some(self),
            name,
        }
    }
}

impl fmt::Display for Scope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parent {
            None => f.write_str("<root>"),
            Some(parent) if parent.parent.is_none() => f.write_str(self.name),
            Some(parent) => write!(f, "{}/{}", parent, self.name),
        }
    }
}

/// Allow-listed fields taken out of a raw mapping.
pub(crate) struct FieldSet<'s> {
    kind: EntityKind,
    scope: &'s Scope<'s>,
    values: IndexMap<&'static str, Value>,
}

impl<'s> FieldSet<'s> {
    /// Removes every allow-listed field of `kind` from `raw`, in table order.
    pub(crate) fn take(kind: EntityKind, scope: &'s Scope<'s>, raw: &mut Mapping) -> Self {
        let mut values = IndexMap::new();
        for property in kind.properties() {
            if let Some(value) = raw.shift_remove(property.name) {
                values.insert(property.name, value);
            }
        }
        Self {
            kind,
            scope,
            values,
        }
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    fn shape_error(&self, name: &str, expected: &str, found: &Value) -> AppError {
        AppError::Shape(format!(
            "{} field '{}' at '{}' must be {}, found {}",
            self.kind.label(),
            name,
            self.scope,
            expected,
            kind_name(found)
        ))
    }

    /// Raw value; `null` counts as absent.
    pub(crate) fn value(&mut self, name: &str) -> Option<Value> {
        debug_assert_eq!(self.kind.shape_of(name), Some(Shape::Value));
        self.values.shift_remove(name).filter(|v| !v.is_null())
    }

    pub(crate) fn string(&mut self, name: &str) -> AppResult<Option<String>> {
        match self.value(name) {
            None => Ok(None),
            Some(value) => scalar_text(&value)
                .map(Some)
                .ok_or_else(|| self.shape_error(name, "a scalar", &value)),
        }
    }

    pub(crate) fn flag(&mut self, name: &str) -> AppResult<Option<bool>> {
        match self.value(name) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(b)),
            Some(other) => Err(self.shape_error(name, "a boolean", &other)),
        }
    }

    pub(crate) fn integer(&mut self, name: &str) -> AppResult<Option<u64>> {
        match self.value(name) {
            None => Ok(None),
            Some(value) => value
                .as_u64()
                .map(Some)
                .ok_or_else(|| self.shape_error(name, "an unsigned integer", &value)),
        }
    }

    pub(crate) fn mapping(&mut self, name: &str) -> AppResult<Option<Mapping>> {
        match self.value(name) {
            None => Ok(None),
            Some(Value::Mapping(map)) => Ok(Some(map)),
            Some(other) => Err(self.shape_error(name, "a mapping", &other)),
        }
    }

    /// Builds one sub-entity.
    pub(crate) fn entity<T>(
        &mut self,
        name: &'static str,
        build: impl FnOnce(Value, &Scope<'_>) -> AppResult<T>,
    ) -> AppResult<Option<T>> {
        debug_assert_eq!(self.kind.shape_of(name), Some(Shape::Entity));
        match self.values.shift_remove(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => build(value, &self.scope.child(name)).map(Some),
        }
    }

    /// Builds one sub-entity per key.
    pub(crate) fn entity_map<T>(
        &mut self,
        name: &'static str,
        mut build: impl FnMut(Value, &Scope<'_>) -> AppResult<T>,
    ) -> AppResult<IndexMap<String, T>> {
        debug_assert_eq!(self.kind.shape_of(name), Some(Shape::EntityMap));
        let map = match self.values.shift_remove(name) {
            None | Some(Value::Null) => return Ok(IndexMap::new()),
            Some(Value::Mapping(map)) => map,
            Some(other) => return Err(self.shape_error(name, "a mapping", &other)),
        };

        let field_scope = self.scope.child(name);
        let mut entities = IndexMap::with_capacity(map.len());
        for (key, value) in map {
            let key = key_text(&key)
                .ok_or_else(|| self.shape_error(name, "keyed by scalars", &key))?;
            let entity = build(value, &field_scope.child(&key))?;
            entities.insert(key, entity);
        }
        Ok(entities)
    }

    /// Builds one sub-entity per element.
    pub(crate) fn entity_list<T>(
        &mut self,
        name: &'static str,
        mut build: impl FnMut(Value, &Scope<'_>) -> AppResult<T>,
    ) -> AppResult<Vec<T>> {
        debug_assert_eq!(self.kind.shape_of(name), Some(Shape::EntityList));
        let items = match self.values.shift_remove(name) {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Sequence(items)) => items,
            Some(other) => return Err(self.shape_error(name, "a sequence", &other)),
        };

        let field_scope = self.scope.child(name);
        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                let index = index.to_string();
                build(item, &field_scope.child(&index))
            })
            .collect()
    }
}

/// Logs (and drops) fields no allow-list claimed.
pub(crate) fn ignore_residual(kind: EntityKind, scope: &Scope<'_>, residual: Mapping) {
    for key in residual.keys() {
        tracing::trace!(
            entity = kind.label(),
            scope = %scope,
            field = ?key,
            "ignoring unrecognized property"
        );
    }
}

/// Coerces an entity value into its raw mapping or fails with a shape error.
pub(crate) fn entity_mapping(
    kind: EntityKind,
    scope: &Scope<'_>,
    value: Value,
    shorthand: &str,
) -> AppResult<Mapping> {
    let found = kind_name(&value);
    crate::yaml::coerce_mapping(value, shorthand).ok_or_else(|| {
        AppError::Shape(format!(
            "{} at '{}' must be a mapping, found {}",
            kind.label(),
            scope,
            found
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(yaml: &str) -> Mapping {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_take_consumes_only_allow_listed() {
        let root = Scope::root();
        let mut raw = mapping("type: string\nrequired: true\ncolour: red");
        let mut fields = FieldSet::take(EntityKind::Parameter, &root, &mut raw);
        assert_eq!(raw, mapping("colour: red"));
        assert!(fields.contains("type"));
        assert_eq!(fields.string("type").unwrap().as_deref(), Some("string"));
        assert_eq!(fields.flag("required").unwrap(), Some(true));
        assert_eq!(fields.flag("multiple").unwrap(), None);
    }

    #[test]
    fn test_shape_error_names_scope() {
        let root = Scope::root();
        let users = root.child("users");
        let get = users.child("GET");
        let mut raw = mapping("title: [a, b]");
        let mut fields = FieldSet::take(EntityKind::Route, &get, &mut raw);
        let err = fields.string("title").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Shape Error: route field 'title' at 'users/GET' must be a scalar, found sequence"
        );
    }

    #[test]
    fn test_scalar_strings_are_coerced() {
        let root = Scope::root();
        let mut raw = mapping("title: 404\nredirectCode: 301");
        let mut fields = FieldSet::take(EntityKind::Route, &root, &mut raw);
        assert_eq!(fields.string("title").unwrap().as_deref(), Some("404"));
        assert_eq!(fields.integer("redirectCode").unwrap(), Some(301));
    }

    #[test]
    fn test_entity_list_rejects_mapping() {
        let root = Scope::root();
        let mut raw = mapping("tests: {a: 1}");
        let mut fields = FieldSet::take(EntityKind::Route, &root, &mut raw);
        let err = fields.entity_list("tests", |_, _| Ok(())).unwrap_err();
        assert!(matches!(err, AppError::Shape(_)));
    }

    #[test]
    fn test_scope_display() {
        let root = Scope::root();
        assert_eq!(root.to_string(), "<root>");
        let a = root.child("a");
        let b = a.child("b");
        assert_eq!(b.to_string(), "a/b");
    }
}
