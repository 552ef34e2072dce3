//! RFC 7807 problem documents.

use std::collections::BTreeMap;

use axum::http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

pub const PROBLEM_JSON: &str = "application/problem+json";

/// Wire shape of a problem document, for OpenAPI
#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(example = json!({
    "type": "https://geofeed.dev/probs/not-found",
    "title": "Table Not Found",
    "detail": "No table backs the collection 'Widgets'",
    "instance": "/Widgets",
    "error_code": "TABLE_NOT_FOUND",
    "timestamp": "2024-05-01T12:00:00+00:00"
}))]
pub struct ProblemDetails {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    #[schema(example = "https://geofeed.dev/probs/not-found")]
    pub type_url: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    /// `error_code`, `timestamp` and any other members
    #[schema(additional_properties = true)]
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

/// Error response: a status, the problem members and extra headers
#[derive(Debug, Clone)]
pub struct Problem {
    pub status_code: StatusCode,
    pub body: BTreeMap<String, Value>,
    /// Sent alongside the body, e.g. `WWW-Authenticate` on a 401
    pub headers: HeaderMap,
}

pub fn new(status_code: StatusCode) -> Problem {
    Problem {
        status_code,
        body: BTreeMap::new(),
        headers: HeaderMap::new(),
    }
}

impl Problem {
    /// Set a member of the document, replacing any previous value
    pub fn with_value(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.body.insert(key.to_owned(), value.into());
        self
    }

    /// Attach a response header. Values that are not valid header text are
    /// dropped with a warning.
    pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                self.headers.insert(name, value);
            }
            Err(e) => tracing::warn!("Dropping invalid {} header value: {}", name, e),
        }
        self
    }

    pub fn body_str(&self, key: &str) -> Option<&str> {
        self.body.get(key).and_then(Value::as_str)
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let mut response = if self.body.is_empty() {
            self.status_code.into_response()
        } else {
            (
                self.status_code,
                [(CONTENT_TYPE, HeaderValue::from_static(PROBLEM_JSON))],
                Json(self.body),
            )
                .into_response()
        };

        response.headers_mut().extend(self.headers);
        response
    }
}
