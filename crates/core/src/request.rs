//! Request and response descriptors, and the fixed route table.
//!
//! A caller hands the router a [`RouteRequest`] and always gets a
//! [`RouteResponse`] back. Which persistence action runs is decided by
//! [`Route::resolve`], an exact match on `"<method> <template>"`.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::item::ItemError;
use crate::storage::{repository_error_to_status_code, RepositoryError};

pub const COLLECTION_TEMPLATE: &str = "/items";
pub const ITEM_TEMPLATE: &str = "/items/{id}";
pub const ID_PARAMETER: &str = "id";

pub const CONTENT_TYPE: &str = "Content-Type";
pub const APPLICATION_JSON: &str = "application/json";

/// An incoming request, already split into method, matched template,
/// path parameters and raw body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    #[serde(alias = "httpMethod")]
    pub method: String,
    #[serde(alias = "resource")]
    pub resource_template: String,
    #[serde(default)]
    pub path_parameters: Option<HashMap<String, String>>,
    #[serde(default)]
    pub body: Option<String>,
}

impl RouteRequest {
    pub fn new(method: impl Into<String>, resource_template: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            resource_template: resource_template.into(),
            path_parameters: None,
            body: None,
        }
    }

    pub fn with_path_parameter(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.path_parameters
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// `"<method> <template>"`, the key the route table is matched on.
    pub fn routing_key(&self) -> String {
        format!("{} {}", self.method, self.resource_template)
    }

    pub fn path_parameter(&self, name: &str) -> Option<&str> {
        self.path_parameters
            .as_ref()
            .and_then(|params| params.get(name))
            .map(String::as_str)
    }

    /// The `id` path parameter, required by the single-item routes.
    pub fn item_id(&self) -> Result<&str, RouteError> {
        self.path_parameter(ID_PARAMETER)
            .ok_or(RouteError::MissingPathParameter(ID_PARAMETER))
    }
}

/// The response handed back to the caller.
///
/// `body` is always JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl RouteResponse {
    /// Wraps already-encoded JSON text.
    pub fn new(status_code: u16, body: String) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string());

        Self {
            status_code,
            headers,
            body,
        }
    }

    /// Builds an error response whose body is the message as a JSON string.
    pub fn error(status_code: u16, message: &str) -> Self {
        Self::new(status_code, serde_json::Value::from(message).to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// The persistence action a request maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `DELETE /items/{id}`
    DeleteItem,
    /// `GET /items/{id}`
    GetItem,
    /// `GET /items`
    ListItems,
    /// `PUT /items` and `POST /items`
    PutItem,
}

impl Route {
    /// Exact match of method and template against the route table.
    pub fn parse(method: &str, resource_template: &str) -> Option<Self> {
        match (method, resource_template) {
            ("DELETE", ITEM_TEMPLATE) => Some(Route::DeleteItem),
            ("GET", ITEM_TEMPLATE) => Some(Route::GetItem),
            ("GET", COLLECTION_TEMPLATE) => Some(Route::ListItems),
            ("PUT", COLLECTION_TEMPLATE) | ("POST", COLLECTION_TEMPLATE) => Some(Route::PutItem),
            _ => None,
        }
    }

    pub fn resolve(request: &RouteRequest) -> Result<Self, RouteError> {
        Self::parse(&request.method, &request.resource_template)
            .ok_or_else(|| RouteError::UnsupportedRoute(request.routing_key()))
    }

    /// Short action name used in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::DeleteItem => "delete_item",
            Route::GetItem => "get_item",
            Route::ListItems => "list_items",
            Route::PutItem => "put_item",
        }
    }
}

/// Everything that can go wrong while handling one request.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error(transparent)]
    InvalidBody(#[from] ItemError),
    #[error("Missing request body")]
    MissingBody,
    #[error("Missing path parameter: {0}")]
    MissingPathParameter(&'static str),
    #[error("Unsupported route: \"{0}\"")]
    UnsupportedRoute(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// How failures are turned into status codes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorStatusPolicy {
    /// Every failure is a 400.
    #[default]
    Legacy,
    /// Client mistakes are 400, backend failures map through
    /// [`repository_error_to_status_code`].
    Classified,
}

impl ErrorStatusPolicy {
    pub fn status_code(self, error: &RouteError) -> u16 {
        match (self, error) {
            (ErrorStatusPolicy::Legacy, _) => 400,
            (ErrorStatusPolicy::Classified, RouteError::Repository(repo_error)) => {
                repository_error_to_status_code(repo_error)
            }
            (ErrorStatusPolicy::Classified, _) => 400,
        }
    }
}

impl FromStr for ErrorStatusPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classified" => Ok(ErrorStatusPolicy::Classified),
            "legacy" => Ok(ErrorStatusPolicy::Legacy),
            other => Err(format!("Unknown error status policy: {other}")),
        }
    }
}
