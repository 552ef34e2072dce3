use crate::problemdetails;
use axum::http::header::WWW_AUTHENTICATE;
use axum::http::StatusCode;
use serde::Serialize;
use std::collections::BTreeMap;

pub struct ErrorBuilder {
    status: StatusCode,
    type_: String,
    title: String,
    detail: String,
    instance: Option<String>,
    challenge: Option<String>,
    values: BTreeMap<String, serde_json::Value>,
}

impl ErrorBuilder {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            type_: String::new(),
            title: String::new(),
            detail: String::new(),
            instance: None,
            challenge: None,
            values: BTreeMap::new(),
        }
    }

    pub fn type_(mut self, type_: impl Into<String>) -> Self {
        self.type_ = type_.into();
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// `WWW-Authenticate` challenge sent with the problem.
    pub fn challenge(mut self, challenge: impl Into<String>) -> Self {
        self.challenge = Some(challenge.into());
        self
    }

    pub fn value<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(value) = serde_json::to_value(value) {
            self.values.insert(key.to_string(), value);
        }
        self
    }

    pub fn build(self) -> problemdetails::Problem {
        let mut problem = problemdetails::new(self.status)
            .with_value("type", self.type_)
            .with_value("title", self.title)
            .with_value("detail", self.detail)
            .with_value("timestamp", chrono::Utc::now().to_rfc3339());

        if let Some(instance) = self.instance {
            problem = problem.with_value("instance", instance);
        }

        if let Some(challenge) = self.challenge {
            problem = problem.with_header(WWW_AUTHENTICATE, &challenge);
        }

        for (key, value) in self.values {
            problem = problem.with_value(&key, value);
        }

        problem
    }
}

// Common error builders
pub fn internal_server_error() -> ErrorBuilder {
    ErrorBuilder::new(StatusCode::INTERNAL_SERVER_ERROR)
        .type_("https://geofeed.dev/probs/internal-server-error")
        .title("Internal Server Error")
        .detail("An unexpected error occurred while processing your request")
        .value("error_code", "INTERNAL_SERVER_ERROR")
}

pub fn service_unavailable() -> ErrorBuilder {
    ErrorBuilder::new(StatusCode::SERVICE_UNAVAILABLE)
        .type_("https://geofeed.dev/probs/store-unavailable")
        .title("Store Unavailable")
        .detail("The backing data store could not be reached")
        .value("error_code", "STORE_UNAVAILABLE")
}

pub fn not_found() -> ErrorBuilder {
    ErrorBuilder::new(StatusCode::NOT_FOUND)
        .type_("https://geofeed.dev/probs/not-found")
        .title("Resource Not Found")
        .value("error_code", "NOT_FOUND")
}

/// 401 carrying a Basic challenge for `realm`.
pub fn unauthorized(realm: &str) -> ErrorBuilder {
    ErrorBuilder::new(StatusCode::UNAUTHORIZED)
        .type_("https://geofeed.dev/probs/unauthorized")
        .title("Unauthorized")
        .detail("Incorrect username or password")
        .challenge(format!("Basic realm=\"{}\"", realm.replace('"', "'")))
        .value("error_code", "UNAUTHORIZED")
}
