//! Shared state and response types for OData handlers

use std::sync::Arc;

use axum::http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use geofeed_core::problemdetails::Problem;
use geofeed_core::ODataConfig;
use geofeed_model::EntityModelBuilder;
use geofeed_query::{CatalogSource, GeometryDecoder};
use serde::Serialize;

use crate::error::ODataError;
use crate::services::CollectionService;

/// Content type of every OData JSON payload
pub const ODATA_JSON: &str = "application/json; odata.metadata=minimal; odata.streaming=false";

pub const ODATA_VERSION: HeaderName = HeaderName::from_static("odata-version");

/// Application state for OData handlers
pub struct ODataState {
    pub config: Arc<ODataConfig>,
    pub source: Arc<dyn CatalogSource>,
    pub decoder: Arc<dyn GeometryDecoder>,
}

impl ODataState {
    pub fn new(
        config: Arc<ODataConfig>,
        source: Arc<dyn CatalogSource>,
        decoder: Arc<dyn GeometryDecoder>,
    ) -> Self {
        Self {
            config,
            source,
            decoder,
        }
    }

    pub fn model_builder(&self) -> EntityModelBuilder {
        EntityModelBuilder::new(self.source.clone())
    }

    pub fn collection_service(&self) -> CollectionService {
        CollectionService::new(
            self.config.clone(),
            self.source.clone(),
            self.decoder.clone(),
        )
    }
}

/// JSON body sent with the OData content type and version header
pub struct ODataJson<T>(pub T);

impl<T: Serialize> IntoResponse for ODataJson<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.0) {
            Ok(body) => (
                [
                    (CONTENT_TYPE, HeaderValue::from_static(ODATA_JSON)),
                    (ODATA_VERSION, HeaderValue::from_static("4.0")),
                ],
                body,
            )
                .into_response(),
            Err(e) => Problem::from(ODataError::Rendering(e.to_string())).into_response(),
        }
    }
}

/// CSDL document body
pub struct ODataXml(pub String);

impl IntoResponse for ODataXml {
    fn into_response(self) -> Response {
        (
            [
                (CONTENT_TYPE, HeaderValue::from_static("application/xml")),
                (ODATA_VERSION, HeaderValue::from_static("4.0")),
            ],
            self.0,
        )
            .into_response()
    }
}
