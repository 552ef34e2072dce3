//! HTTP handlers for the service root, metadata and collection feeds

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use geofeed_core::problemdetails::Problem;
use geofeed_core::ProblemDetails;
use tracing::{debug, info};
use utoipa::OpenApi;

use super::types::*;
use crate::auth::RequireBasicAuth;
use crate::error::ODataError;
use crate::services::{
    build_service_root, render_metadata, CollectionPage, EntitySetReference, ServiceRoot,
};

/// OpenAPI documentation for OData endpoints
#[derive(OpenApi)]
#[openapi(
    paths(service_root, metadata, collection),
    components(schemas(ServiceRoot, EntitySetReference, CollectionPage, ProblemDetails)),
    tags(
        (name = "OData", description = "Self-describing read access to the store")
    )
)]
pub struct ODataApiDoc;

/// Configure OData routes
pub fn configure_routes() -> Router<Arc<ODataState>> {
    Router::new()
        .route("/", get(service_root))
        .route("/$metadata", get(metadata))
        .route("/openapi.json", get(openapi))
        .route("/{collection}", get(collection))
}

/// List every entity set
#[utoipa::path(
    tag = "OData",
    get,
    path = "/",
    responses(
        (status = 200, description = "Service document", body = ServiceRoot),
        (status = 503, description = "Store unavailable", body = ProblemDetails)
    )
)]
pub async fn service_root(
    State(state): State<Arc<ODataState>>,
) -> Result<impl IntoResponse, Problem> {
    let model = state
        .model_builder()
        .build_entities()
        .await
        .map_err(ODataError::from)?;

    Ok(ODataJson(build_service_root(
        model.entities(),
        &state.config,
    )))
}

/// CSDL metadata document
#[utoipa::path(
    tag = "OData",
    get,
    path = "/$metadata",
    responses(
        (status = 200, description = "EDMX 4.0 document", content_type = "application/xml", body = String),
        (status = 503, description = "Store unavailable", body = ProblemDetails)
    )
)]
pub async fn metadata(State(state): State<Arc<ODataState>>) -> Result<impl IntoResponse, Problem> {
    let model = state
        .model_builder()
        .build_entities()
        .await
        .map_err(ODataError::from)?;

    let document = render_metadata(state.config.namespace(), model.entities())?;
    debug!("Rendered metadata for {} entities", model.entities().len());

    Ok(ODataXml(document))
}

/// Every instance of one collection, ordered by key
#[utoipa::path(
    tag = "OData",
    get,
    path = "/{collection}",
    params(
        ("collection" = String, Path, description = "Entity set name", example = "Depots")
    ),
    responses(
        (status = 200, description = "Collection feed", body = CollectionPage),
        (status = 401, description = "Missing or incorrect credentials", body = ProblemDetails),
        (status = 404, description = "Unknown collection", body = ProblemDetails),
        (status = 503, description = "Store unavailable", body = ProblemDetails)
    ),
    security(("basic_auth" = []))
)]
pub async fn collection(
    RequireBasicAuth(username): RequireBasicAuth,
    State(state): State<Arc<ODataState>>,
    Path(collection): Path<String>,
) -> Result<impl IntoResponse, Problem> {
    let page = state
        .collection_service()
        .fetch_collection(&collection)
        .await?;

    info!(
        "Served {} instances of '{}' to '{}'",
        page.value.len(),
        collection,
        username
    );

    Ok(ODataJson(page))
}

/// OpenAPI document with the Basic auth scheme registered
pub fn openapi_document() -> utoipa::openapi::OpenApi {
    use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
    use utoipa::openapi::ComponentsBuilder;

    let mut document = ODataApiDoc::openapi();
    let mut basic = Http::new(HttpAuthScheme::Basic);
    basic.description = Some("Username and password configured for the service".to_string());

    document
        .components
        .get_or_insert_with(|| ComponentsBuilder::new().build())
        .add_security_scheme("basic_auth", SecurityScheme::Http(basic));

    document
}

async fn openapi() -> impl IntoResponse {
    Json(openapi_document())
}
