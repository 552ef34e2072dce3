//! Error types for the OData service

use geofeed_core::error_builder::{
    internal_server_error, not_found, service_unavailable, unauthorized,
};
use geofeed_core::problemdetails::Problem;
use geofeed_query::{DataError, GeometryError};
use thiserror::Error;
use tracing::{debug, error};

#[derive(Error, Debug)]
pub enum ODataError {
    #[error("Incorrect username or password")]
    Unauthorized { realm: String },

    #[error("No table backs the collection '{0}'")]
    UnknownTable(String),

    #[error("Collection '{0}' is not part of the entity model")]
    UnknownEntity(String),

    #[error(transparent)]
    Store(#[from] DataError),

    #[error("Failed to decode geometry: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Failed to render response: {0}")]
    Rendering(String),
}

impl From<ODataError> for Problem {
    fn from(error: ODataError) -> Self {
        match error {
            ODataError::Unauthorized { realm } => {
                debug!("Rejected credentials for realm '{}'", realm);
                unauthorized(&realm).build()
            }

            ODataError::UnknownTable(collection) => not_found()
                .title("Table Not Found")
                .detail(format!("No table backs the collection '{}'", collection))
                .instance(format!("/{}", collection))
                .value("error_code", "TABLE_NOT_FOUND")
                .build(),

            ODataError::UnknownEntity(collection) => not_found()
                .title("Entity Not Found")
                .detail(format!(
                    "Collection '{}' is not part of the entity model",
                    collection
                ))
                .instance(format!("/{}", collection))
                .value("error_code", "ENTITY_NOT_FOUND")
                .build(),

            ODataError::Store(e) if e.is_unavailable() => {
                error!("Store unavailable: {}", e);
                service_unavailable().build()
            }

            ODataError::Store(e) => {
                error!("Store error: {}", e);
                internal_server_error()
                    .title("Store Error")
                    .detail(e.to_string())
                    .value("error_code", "STORE_ERROR")
                    .build()
            }

            ODataError::Geometry(e) => {
                error!("Geometry decoding failed: {}", e);
                internal_server_error()
                    .title("Geometry Error")
                    .detail(e.to_string())
                    .value("error_code", "GEOMETRY_ERROR")
                    .build()
            }

            ODataError::Rendering(msg) => {
                error!("Rendering failed: {}", msg);
                internal_server_error()
                    .title("Rendering Error")
                    .detail(msg)
                    .value("error_code", "RENDERING_ERROR")
                    .build()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::WWW_AUTHENTICATE;
    use axum::http::StatusCode;

    #[test]
    fn test_status_mapping() {
        let cases = vec![
            (
                ODataError::UnknownTable("Widgets".to_string()),
                StatusCode::NOT_FOUND,
                "TABLE_NOT_FOUND",
            ),
            (
                ODataError::UnknownEntity("Widgets".to_string()),
                StatusCode::NOT_FOUND,
                "ENTITY_NOT_FOUND",
            ),
            (
                ODataError::Store(DataError::ConnectionFailed("refused".to_string())),
                StatusCode::SERVICE_UNAVAILABLE,
                "STORE_UNAVAILABLE",
            ),
            (
                ODataError::Store(DataError::QueryFailed("syntax".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
            ),
            (
                ODataError::Geometry(GeometryError::NotAPoint(2)),
                StatusCode::INTERNAL_SERVER_ERROR,
                "GEOMETRY_ERROR",
            ),
        ];

        for (error, status, code) in cases {
            let problem = Problem::from(error);
            assert_eq!(problem.status_code, status);
            assert_eq!(problem.body_str("error_code"), Some(code));
        }
    }

    #[test]
    fn test_unauthorized_carries_challenge() {
        let problem = Problem::from(ODataError::Unauthorized {
            realm: "OData Experiments".to_string(),
        });

        assert_eq!(problem.status_code, StatusCode::UNAUTHORIZED);
        assert_eq!(
            problem.headers.get(WWW_AUTHENTICATE).unwrap(),
            "Basic realm=\"OData Experiments\""
        );
    }
}
