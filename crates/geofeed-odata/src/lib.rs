//! # geofeed-odata
//!
//! OData v4 read API over a live store catalog. Every request rebuilds the
//! entity model from the catalog, so the API follows schema changes without a
//! restart.
//!
//! - `GET /` service document
//! - `GET /$metadata` CSDL (EDMX 4.0)
//! - `GET /{collection}` collection feed, behind HTTP Basic auth

pub mod auth;
pub mod error;
pub mod handlers;
pub mod services;

pub use auth::RequireBasicAuth;
pub use error::ODataError;
pub use handlers::{configure_routes, openapi_document, ODataApiDoc, ODataState};
pub use services::{
    build_service_root, render_metadata, CollectionPage, CollectionService, ServiceRoot,
};
