#![deny(missing_docs)]

//! # Trait Registry
//!
//! Named, reusable mapping fragments registered with `!define` and applied
//! with `!use`.
//!
//! Applying a trait merges its top-level fields into the using mapping (the
//! using side wins on conflicts) and then runs placeholder substitution:
//! every variable listed under the trait's `.placeholders` is taken from the
//! using mapping's `.vars` and written along one or more `|`-delimited paths.
//! A path either ends in a field name to assign, or passes through a string
//! value whose occurrences of the final segment are replaced.

use crate::error::{AppError, AppResult};
use crate::yaml::{key_text, kind_name, scalar_text};
use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};

/// Key naming the trait inside a `!define` mapping.
pub const TRAIT_KEY: &str = ".trait";
/// Key listing the traits inside a `!use` mapping.
pub const TRAITS_KEY: &str = ".traits";
/// Variable values supplied by the using mapping (or defaulted by the trait).
pub const VARS_KEY: &str = ".vars";
/// Placeholder declarations inside a trait fragment.
pub const PLACEHOLDERS_KEY: &str = ".placeholders";

const PATH_SEPARATOR: char = '|';

/// Registered trait fragments, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct TraitRegistry {
    fragments: IndexMap<String, Mapping>,
}

impl TraitRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the body of a `!define` mapping. Returns the trait name.
    ///
    /// A later definition with the same name replaces the earlier one.
    pub fn define(&mut self, mut fragment: Mapping) -> AppResult<String> {
        let name = match fragment.shift_remove(TRAIT_KEY) {
            Some(Value::String(name)) => name,
            Some(other) => {
                return Err(AppError::InvalidTag(format!(
                    "!define expects '{}' to be a string, found {}",
                    TRAIT_KEY,
                    kind_name(&other)
                )))
            }
            None => {
                return Err(AppError::InvalidTag(format!(
                    "!define requires a '{}' key",
                    TRAIT_KEY
                )))
            }
        };

        if self.fragments.insert(name.clone(), fragment).is_some() {
            tracing::debug!(trait_name = %name, "trait redefined");
        } else {
            tracing::debug!(trait_name = %name, "trait registered");
        }
        Ok(name)
    }

    /// Looks up a registered fragment.
    pub fn get(&self, name: &str) -> Option<&Mapping> {
        self.fragments.get(name)
    }

    /// Registered names in definition order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fragments.keys().map(String::as_str)
    }

    /// Number of registered traits.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Whether no trait has been registered.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Applies the traits named by `.traits` to the body of a `!use` mapping.
    ///
    /// `.traits` and `.vars` are removed from the result.
    pub fn apply(&self, mut using: Mapping) -> AppResult<Mapping> {
        let names = match using.shift_remove(TRAITS_KEY) {
            Some(value) => trait_names(value)?,
            None => {
                return Err(AppError::InvalidTag(format!(
                    "!use requires a '{}' key",
                    TRAITS_KEY
                )))
            }
        };

        for name in names {
            let fragment = self
                .fragments
                .get(&name)
                .cloned()
                .ok_or_else(|| AppError::TraitNotFound(name.clone()))?;
            tracing::debug!(trait_name = %name, "applying trait");
            apply_fragment(&mut using, &name, fragment)?;
        }

        using.shift_remove(VARS_KEY);
        Ok(using)
    }
}

fn trait_names(value: Value) -> AppResult<Vec<String>> {
    match value {
        Value::String(name) => Ok(vec![name]),
        Value::Sequence(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(name) => Ok(name),
                other => Err(AppError::InvalidTag(format!(
                    "'{}' entries must be strings, found {}",
                    TRAITS_KEY,
                    kind_name(&other)
                ))),
            })
            .collect(),
        other => Err(AppError::InvalidTag(format!(
            "'{}' must be a string or a sequence of strings, found {}",
            TRAITS_KEY,
            kind_name(&other)
        ))),
    }
}

/// Merges one (already cloned) fragment into `using` and substitutes its placeholders.
fn apply_fragment(using: &mut Mapping, trait_name: &str, mut fragment: Mapping) -> AppResult<()> {
    let placeholders = fragment.shift_remove(PLACEHOLDERS_KEY);
    if let Some(defaults) = fragment.shift_remove(VARS_KEY) {
        merge_vars(using, defaults)?;
    }

    // true: field contributed by the trait; false: the using mapping kept its own
    let mut consumed: IndexMap<String, bool> = IndexMap::new();
    for (key, value) in fragment {
        let taken = !using.contains_key(&key);
        if let Some(name) = key.as_str() {
            consumed.insert(name.to_string(), taken);
        }
        if taken {
            using.insert(key, value);
        }
    }

    let placeholders = match placeholders {
        None | Some(Value::Null) => return Ok(()),
        Some(Value::Mapping(map)) => map,
        Some(other) => {
            return Err(AppError::PlaceholderPath(format!(
                "'{}' of trait '{}' must be a mapping, found {}",
                PLACEHOLDERS_KEY,
                trait_name,
                kind_name(&other)
            )))
        }
    };

    for (variable, paths) in placeholders {
        let variable = variable.as_str().ok_or_else(|| {
            AppError::PlaceholderPath(format!(
                "placeholder names of trait '{}' must be strings",
                trait_name
            ))
        })?;
        let replacement = lookup_var(using, variable)
            .cloned()
            .ok_or_else(|| AppError::UnfulfilledVariable {
                trait_name: trait_name.to_string(),
                variable: variable.to_string(),
            })?;

        for path in placeholder_paths(trait_name, variable, paths)? {
            let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
            if consumed.get(segments[0]) == Some(&false) {
                tracing::debug!(
                    trait_name,
                    variable,
                    path = %path,
                    "placeholder skipped, using mapping overrides the field"
                );
                continue;
            }
            substitute(using, &segments, &replacement, &path)?;
        }
    }

    Ok(())
}

fn merge_vars(using: &mut Mapping, defaults: Value) -> AppResult<()> {
    let vars_key = Value::from(VARS_KEY);
    match using.get_mut(&vars_key) {
        None => {
            using.insert(vars_key, defaults);
        }
        Some(Value::Mapping(existing)) => {
            if let Value::Mapping(defaults) = defaults {
                for (name, value) in defaults {
                    if !existing.contains_key(&name) {
                        existing.insert(name, value);
                    }
                }
            }
        }
        Some(other) => {
            return Err(AppError::InvalidTag(format!(
                "'{}' must be a mapping, found {}",
                VARS_KEY,
                kind_name(other)
            )))
        }
    }
    Ok(())
}

fn lookup_var<'a>(using: &'a Mapping, variable: &str) -> Option<&'a Value> {
    using.get(VARS_KEY)?.as_mapping()?.get(variable)
}

fn placeholder_paths(trait_name: &str, variable: &str, paths: Value) -> AppResult<Vec<String>> {
    let invalid = || {
        AppError::PlaceholderPath(format!(
            "placeholder '{}' of trait '{}' must map to a path or a sequence of paths",
            variable, trait_name
        ))
    };
    match paths {
        Value::String(path) => Ok(vec![path]),
        Value::Sequence(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(path) => Ok(path),
                _ => Err(invalid()),
            })
            .collect(),
        _ => Err(invalid()),
    }
}

/// Walks `segments` from `node`. Stops at the first string and replaces the
/// final segment's text inside it; otherwise assigns the final segment.
fn substitute(node: &mut Mapping, segments: &[&str], value: &Value, path: &str) -> AppResult<()> {
    match segments {
        [] => Err(AppError::PlaceholderPath(format!("empty path '{}'", path))),
        [field] => {
            match slot_mut(node, field) {
                Some(slot) => *slot = value.clone(),
                None => {
                    node.insert(Value::from(*field), value.clone());
                }
            }
            Ok(())
        }
        [head, rest @ ..] => match slot_mut(node, head) {
            Some(Value::Mapping(child)) => substitute(child, rest, value, path),
            Some(Value::String(text)) => {
                let token = rest[rest.len() - 1];
                let rendered = scalar_text(value).ok_or_else(|| {
                    AppError::PlaceholderPath(format!(
                        "cannot splice a {} into text at '{}'",
                        kind_name(value),
                        path
                    ))
                })?;
                *text = text.replace(token, &rendered);
                Ok(())
            }
            Some(other) => Err(AppError::PlaceholderPath(format!(
                "segment '{}' of '{}' is a {}, expected a mapping or string",
                head,
                path,
                kind_name(other)
            ))),
            None => Err(AppError::PlaceholderPath(format!(
                "segment '{}' of '{}' does not exist",
                head, path
            ))),
        },
    }
}

/// Finds a field by name, also matching non-string keys such as `404`.
fn slot_mut<'m>(node: &'m mut Mapping, segment: &str) -> Option<&'m mut Value> {
    if node.contains_key(segment) {
        return node.get_mut(segment);
    }
    node.iter_mut()
        .find(|(key, _)| key_text(key).as_deref() == Some(segment))
        .map(|(_, slot)| slot)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(yaml: &str) -> Mapping {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn registry_with(defs: &[&str]) -> TraitRegistry {
        let mut registry = TraitRegistry::new();
        for def in defs {
            registry.define(mapping(def)).unwrap();
        }
        registry
    }

    #[test]
    fn test_define_requires_trait_name() {
        let mut registry = TraitRegistry::new();
        let err = registry.define(mapping("header: X")).unwrap_err();
        assert!(matches!(err, AppError::InvalidTag(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_define_strips_trait_key() {
        let registry = registry_with(&[".trait: auth\nheader: X-Token"]);
        let fragment = registry.get("auth").unwrap();
        assert!(!fragment.contains_key(TRAIT_KEY));
        assert_eq!(fragment.get("header"), Some(&Value::from("X-Token")));
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["auth"]);
    }

    #[test]
    fn test_apply_assigns_placeholder_field() {
        let registry = registry_with(&[
            ".trait: auth\nheader: X-Token\n.placeholders:\n  token: header",
        ]);
        let result = registry
            .apply(mapping(".traits: auth\n.vars:\n  token: abc"))
            .unwrap();
        assert_eq!(result, mapping("header: abc"));
    }

    #[test]
    fn test_apply_never_mutates_registry() {
        let registry = registry_with(&[
            ".trait: err\nbody:\n  message: 'Not found: {{what}}'\n.placeholders:\n  what: body|message|{{what}}",
        ]);
        let users = registry
            .apply(mapping(".traits: err\n.vars:\n  what: user"))
            .unwrap();
        let posts = registry
            .apply(mapping(".traits: err\n.vars:\n  what: post"))
            .unwrap();

        assert_eq!(
            users.get("body").unwrap().get("message"),
            Some(&Value::from("Not found: user"))
        );
        assert_eq!(
            posts.get("body").unwrap().get("message"),
            Some(&Value::from("Not found: post"))
        );
        assert_eq!(
            registry.get("err").unwrap().get("body").unwrap().get("message"),
            Some(&Value::from("Not found: {{what}}"))
        );
    }

    #[test]
    fn test_using_field_wins_and_skips_placeholder() {
        let registry = registry_with(&[
            ".trait: auth\nheader: X-Token\n.placeholders:\n  token: header",
        ]);
        let result = registry
            .apply(mapping(".traits: auth\nheader: Mine\n.vars:\n  token: abc"))
            .unwrap();
        assert_eq!(result.get("header"), Some(&Value::from("Mine")));
    }

    #[test]
    fn test_using_field_skips_nested_placeholder_path() {
        let registry = registry_with(&[
            ".trait: err\nbody:\n  message: Missing TOKEN\n.placeholders:\n  token: body|message|TOKEN",
        ]);
        let result = registry
            .apply(mapping(
                ".traits: err\nbody:\n  message: Keep TOKEN as is\n.vars:\n  token: abc",
            ))
            .unwrap();
        assert_eq!(
            result.get("body").unwrap().get("message"),
            Some(&Value::from("Keep TOKEN as is"))
        );
        assert_eq!(
            registry.get("err").unwrap().get("body").unwrap().get("message"),
            Some(&Value::from("Missing TOKEN"))
        );
    }

    #[test]
    fn test_missing_var_is_unfulfilled() {
        let registry = registry_with(&[
            ".trait: auth\nheader: X-Token\n.placeholders:\n  token: header",
        ]);
        let err = registry.apply(mapping(".traits: auth")).unwrap_err();
        match err {
            AppError::UnfulfilledVariable {
                trait_name,
                variable,
            } => {
                assert_eq!(trait_name, "auth");
                assert_eq!(variable, "token");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_trait_vars_act_as_defaults() {
        let registry = registry_with(&[
            ".trait: paged\n.vars:\n  size: 20\n  order: asc\n.placeholders:\n  size: pageSize\n  order: sortOrder",
        ]);
        let result = registry
            .apply(mapping(".traits: paged\n.vars:\n  order: desc"))
            .unwrap();
        assert_eq!(result.get("pageSize"), Some(&Value::from(20)));
        assert_eq!(result.get("sortOrder"), Some(&Value::from("desc")));
        assert!(!result.contains_key(VARS_KEY));
    }

    #[test]
    fn test_multiple_paths_and_traits() {
        let registry = registry_with(&[
            ".trait: a\ntitle: 'Get NAME'\ndescription: 'Returns NAME'\n.placeholders:\n  name: [title|NAME, description|NAME]",
            ".trait: b\nhttp: GET",
        ]);
        let result = registry
            .apply(mapping(".traits: [a, b]\n.vars:\n  name: users"))
            .unwrap();
        assert_eq!(
            result,
            mapping("title: Get users\ndescription: Returns users\nhttp: GET")
        );
    }

    #[test]
    fn test_unknown_trait() {
        let registry = TraitRegistry::new();
        let err = registry.apply(mapping(".traits: nope")).unwrap_err();
        assert!(matches!(err, AppError::TraitNotFound(ref n) if n == "nope"));
    }

    #[test]
    fn test_path_through_non_container_fails() {
        let registry = registry_with(&[
            ".trait: bad\ncount: 3\n.placeholders:\n  v: count|x",
        ]);
        let err = registry
            .apply(mapping(".traits: bad\n.vars:\n  v: 1"))
            .unwrap_err();
        assert!(matches!(err, AppError::PlaceholderPath(_)));
    }

    #[test]
    fn test_numeric_keys_match_path_segments() {
        let registry = registry_with(&[
            ".trait: nf\nresponseCodes:\n  404: No such THING\n.placeholders:\n  thing: responseCodes|404|THING",
        ]);
        let result = registry
            .apply(mapping(".traits: nf\n.vars:\n  thing: user"))
            .unwrap();
        assert_eq!(result, mapping("responseCodes:\n  404: No such user"));
    }

    #[test]
    fn test_nested_field_assignment() {
        let registry = registry_with(&[
            ".trait: hdr\nheaderParams:\n  X-Api-Key:\n    type: string\n.placeholders:\n  desc: headerParams|X-Api-Key|description",
        ]);
        let result = registry
            .apply(mapping(".traits: hdr\n.vars:\n  desc: Key for NAME"))
            .unwrap();
        assert_eq!(
            result,
            mapping("headerParams:\n  X-Api-Key:\n    type: string\n    description: Key for NAME")
        );
    }
}
