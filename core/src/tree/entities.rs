//! Leaf entities: parameters, response codes, examples and tests.

use super::fields::{entity_mapping, ignore_residual, FieldSet, Scope};
use crate::error::AppResult;
use crate::properties::EntityKind;
use serde::Serialize;
use serde_yaml::{Mapping, Value};

/// A path, query or header parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    /// Short title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Long description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Declared data type (e.g. `integer`).
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    /// Whether the parameter must be present.
    pub required: bool,
    /// Whether the parameter may repeat.
    pub multiple: bool,
}

impl Parameter {
    /// Builds a parameter; a scalar is shorthand for its `type`.
    pub fn build(value: Value, scope: &Scope<'_>) -> AppResult<Self> {
        let mut raw = entity_mapping(EntityKind::Parameter, scope, value, "type")?;
        let mut fields = FieldSet::take(EntityKind::Parameter, scope, &mut raw);
        let param = Self {
            title: fields.string("title")?,
            description: fields.string("description")?,
            data_type: fields.string("type")?,
            required: fields.flag("required")?.unwrap_or(false),
            multiple: fields.flag("multiple")?.unwrap_or(false),
        };
        ignore_residual(EntityKind::Parameter, scope, raw);
        Ok(param)
    }
}

/// A declared response status code.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseCodeEntry {
    /// What the code means for this route.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the code signals success.
    pub success: bool,
    /// Reference to the body schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl ResponseCodeEntry {
    /// Builds an entry; a scalar is shorthand for its `description`.
    pub fn build(value: Value, scope: &Scope<'_>) -> AppResult<Self> {
        let mut raw = entity_mapping(EntityKind::ResponseCode, scope, value, "description")?;
        let mut fields = FieldSet::take(EntityKind::ResponseCode, scope, &mut raw);
        let entry = Self {
            description: fields.string("description")?,
            success: fields.flag("success")?.unwrap_or(false),
            body: fields.value("body"),
        };
        ignore_residual(EntityKind::ResponseCode, scope, raw);
        Ok(entry)
    }
}

/// The request half of an example or test.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// HTTP verb.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http: Option<String>,
    /// Request body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Path parameter values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_params: Option<Mapping>,
    /// Query parameter values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_params: Option<Mapping>,
    /// Header values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Mapping>,
    /// Forced API type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_type: Option<String>,
    /// Forced auth type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<String>,
}

impl Request {
    /// Builds a request from its raw mapping.
    pub fn build(value: Value, scope: &Scope<'_>) -> AppResult<Self> {
        let mut raw = entity_mapping(EntityKind::Request, scope, value, "http")?;
        let mut fields = FieldSet::take(EntityKind::Request, scope, &mut raw);
        let request = Self {
            http: fields.string("http")?,
            body: fields.value("body"),
            path_params: fields.mapping("pathParams")?,
            query_params: fields.mapping("queryParams")?,
            headers: fields.mapping("headers")?,
            api_type: fields.string("apiType")?,
            auth_type: fields.string("authType")?,
        };
        ignore_residual(EntityKind::Request, scope, raw);
        Ok(request)
    }
}

/// The response half of an example or test.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// Status code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u64>,
    /// Response body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Content type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Class name of the response model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
}

impl Response {
    /// Builds a response; a bare number is shorthand for its `code`.
    pub fn build(value: Value, scope: &Scope<'_>) -> AppResult<Self> {
        let mut raw = entity_mapping(EntityKind::Response, scope, value, "code")?;
        let mut fields = FieldSet::take(EntityKind::Response, scope, &mut raw);
        let response = Self {
            code: fields.integer("code")?,
            body: fields.value("body"),
            content_type: fields.string("contentType")?,
            class_name: fields.string("className")?,
        };
        ignore_residual(EntityKind::Response, scope, raw);
        Ok(response)
    }
}

/// A documentation example.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Example {
    /// Short title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Long description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Example request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<Request>,
    /// Example response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Response>,
}

impl Example {
    /// Builds an example from its raw mapping.
    pub fn build(value: Value, scope: &Scope<'_>) -> AppResult<Self> {
        let mut raw = entity_mapping(EntityKind::Example, scope, value, "title")?;
        let mut fields = FieldSet::take(EntityKind::Example, scope, &mut raw);
        let example = Self {
            title: fields.string("title")?,
            description: fields.string("description")?,
            request: fields.entity("request", Request::build)?,
            response: fields.entity("response", Response::build)?,
        };
        ignore_residual(EntityKind::Example, scope, raw);
        Ok(example)
    }
}

/// A contract test: an example plus validation flags and auth options.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Test {
    /// Short title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Long description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Request to send.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<Request>,
    /// Expected response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Response>,
    /// Validate the request against the route's request schema.
    pub validate_request: bool,
    /// Validate the response against the route's response schema.
    pub validate_response: bool,
    /// Validate bodies against declared response-code schemas.
    pub validate_schema: bool,
    /// Auth options (credentials, roles, ...), passed through as written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<Value>,
}

impl Test {
    /// Builds a test from its raw mapping.
    pub fn build(value: Value, scope: &Scope<'_>) -> AppResult<Self> {
        let mut raw = entity_mapping(EntityKind::Test, scope, value, "title")?;
        let mut fields = FieldSet::take(EntityKind::Test, scope, &mut raw);
        let test = Self {
            title: fields.string("title")?,
            description: fields.string("description")?,
            request: fields.entity("request", Request::build)?,
            response: fields.entity("response", Response::build)?,
            validate_request: fields.flag("validateRequest")?.unwrap_or(false),
            validate_response: fields.flag("validateResponse")?.unwrap_or(false),
            validate_schema: fields.flag("validateSchema")?.unwrap_or(false),
            auth: fields.value("auth"),
        };
        ignore_residual(EntityKind::Test, scope, raw);
        Ok(test)
    }

    /// The example portion of this test.
    pub fn as_example(&self) -> Example {
        Example {
            title: self.title.clone(),
            description: self.description.clone(),
            request: self.request.clone(),
            response: self.response.clone(),
        }
    }
}
