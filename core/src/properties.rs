#![deny(missing_docs)]

//! # Property Schemas
//!
//! Static allow-lists describing which fields belong to each entity kind and
//! which of them hold nested sub-entities. The tree builder iterates these
//! tables (never the input mapping) so extraction order is deterministic.

/// How a property's value is turned into the typed model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Copied as a scalar or raw value.
    Value,
    /// A single nested sub-entity.
    Entity,
    /// A mapping of key to sub-entity.
    EntityMap,
    /// A sequence of sub-entities.
    EntityList,
}

/// One allow-listed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Property {
    /// Field name as written in YAML.
    pub name: &'static str,
    /// Value shape.
    pub shape: Shape,
}

const fn value(name: &'static str) -> Property {
    Property {
        name,
        shape: Shape::Value,
    }
}

const fn entity(name: &'static str) -> Property {
    Property {
        name,
        shape: Shape::Entity,
    }
}

const fn entity_map(name: &'static str) -> Property {
    Property {
        name,
        shape: Shape::EntityMap,
    }
}

const fn entity_list(name: &'static str) -> Property {
    Property {
        name,
        shape: Shape::EntityList,
    }
}

/// Entity kinds that own a property table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// The document root.
    Document,
    /// A route node.
    Route,
    /// A path/query/header parameter.
    Parameter,
    /// A declared response status code.
    ResponseCode,
    /// A documentation example.
    Example,
    /// A contract test.
    Test,
    /// The request half of an example or test.
    Request,
    /// The response half of an example or test.
    Response,
}

/// Fields shared by the document root and every route.
pub const COMMON_PROPERTIES: &[Property] = &[
    value("title"),
    value("description"),
    value("controller"),
    value("method"),
    value("apiType"),
    value("authType"),
];

/// Route fields, common fields first.
pub const ROUTE_PROPERTIES: &[Property] = &[
    value("title"),
    value("description"),
    value("controller"),
    value("method"),
    value("apiType"),
    value("authType"),
    value("path"),
    value("http"),
    value("requestSchema"),
    value("responseSchema"),
    entity_map("pathParams"),
    entity_map("queryParams"),
    entity_map("headerParams"),
    entity_map("responseCodes"),
    entity_list("examples"),
    entity_list("tests"),
    value("virtual"),
    value("noPath"),
    value("defaultRoute"),
    value("redirect"),
    value("redirectCode"),
];

/// Parameter fields.
pub const PARAMETER_PROPERTIES: &[Property] = &[
    value("title"),
    value("description"),
    value("type"),
    value("required"),
    value("multiple"),
];

/// Response-code entry fields.
pub const RESPONSE_CODE_PROPERTIES: &[Property] =
    &[value("description"), value("success"), value("body")];

/// Example fields.
pub const EXAMPLE_PROPERTIES: &[Property] = &[
    value("title"),
    value("description"),
    entity("request"),
    entity("response"),
];

/// Test fields: the example set plus validation flags and auth options.
pub const TEST_PROPERTIES: &[Property] = &[
    value("title"),
    value("description"),
    entity("request"),
    entity("response"),
    value("validateRequest"),
    value("validateResponse"),
    value("validateSchema"),
    value("auth"),
];

/// Request fields.
pub const REQUEST_PROPERTIES: &[Property] = &[
    value("http"),
    value("body"),
    value("pathParams"),
    value("queryParams"),
    value("headers"),
    value("apiType"),
    value("authType"),
];

/// Response fields.
pub const RESPONSE_PROPERTIES: &[Property] = &[
    value("code"),
    value("body"),
    value("contentType"),
    value("className"),
];

/// HTTP verbs promoted from route keys into child routes.
pub const HTTP_VERBS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"];

/// API types promoted from route keys into child routes.
pub const API_TYPES: &[&str] = &["json", "xml"];

/// Prefix marking option keys (and internal markers).
pub const OPTION_PREFIX: char = '.';

/// Internal marker left by `!controller`.
pub const CONTROLLER_MARKER: &str = ".controller";

/// Internal marker left by `!method`.
pub const METHOD_MARKER: &str = ".method";

impl EntityKind {
    /// The allow-list for this kind.
    pub fn properties(self) -> &'static [Property] {
        match self {
            EntityKind::Document => COMMON_PROPERTIES,
            EntityKind::Route => ROUTE_PROPERTIES,
            EntityKind::Parameter => PARAMETER_PROPERTIES,
            EntityKind::ResponseCode => RESPONSE_CODE_PROPERTIES,
            EntityKind::Example => EXAMPLE_PROPERTIES,
            EntityKind::Test => TEST_PROPERTIES,
            EntityKind::Request => REQUEST_PROPERTIES,
            EntityKind::Response => RESPONSE_PROPERTIES,
        }
    }

    /// Shape of `name` for this kind, if allow-listed.
    pub fn shape_of(self, name: &str) -> Option<Shape> {
        self.properties()
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.shape)
    }

    /// Human label used in logs and errors.
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Document => "document",
            EntityKind::Route => "route",
            EntityKind::Parameter => "parameter",
            EntityKind::ResponseCode => "response code",
            EntityKind::Example => "example",
            EntityKind::Test => "test",
            EntityKind::Request => "request",
            EntityKind::Response => "response",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_includes_common_fields_first() {
        let names: Vec<_> = ROUTE_PROPERTIES.iter().map(|p| p.name).collect();
        let common: Vec<_> = COMMON_PROPERTIES.iter().map(|p| p.name).collect();
        assert_eq!(&names[..common.len()], &common[..]);
    }

    #[test]
    fn test_test_extends_example() {
        for p in EXAMPLE_PROPERTIES {
            assert_eq!(EntityKind::Test.shape_of(p.name), Some(p.shape));
        }
        assert_eq!(
            EntityKind::Test.shape_of("validateRequest"),
            Some(Shape::Value)
        );
    }

    #[test]
    fn test_entity_shapes() {
        assert_eq!(
            EntityKind::Route.shape_of("pathParams"),
            Some(Shape::EntityMap)
        );
        assert_eq!(EntityKind::Route.shape_of("tests"), Some(Shape::EntityList));
        assert_eq!(EntityKind::Example.shape_of("request"), Some(Shape::Entity));
        // request-level params are plain values, not parameter entities
        assert_eq!(
            EntityKind::Request.shape_of("pathParams"),
            Some(Shape::Value)
        );
        assert_eq!(EntityKind::Route.shape_of("GET"), None);
    }

    #[test]
    fn test_no_duplicate_names() {
        for kind in [
            EntityKind::Document,
            EntityKind::Route,
            EntityKind::Parameter,
            EntityKind::ResponseCode,
            EntityKind::Example,
            EntityKind::Test,
            EntityKind::Request,
            EntityKind::Response,
        ] {
            let props = kind.properties();
            for (i, p) in props.iter().enumerate() {
                assert!(
                    !props[i + 1..].iter().any(|q| q.name == p.name),
                    "duplicate {} in {}",
                    p.name,
                    kind.label()
                );
            }
        }
    }
}
