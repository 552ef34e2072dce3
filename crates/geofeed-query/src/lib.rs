//! # geofeed-query
//!
//! Store abstraction behind the Geofeed OData gateway.
//!
//! - **CatalogSource**: introspection (tables, columns, geometry columns,
//!   primary keys) and full ordered table scans
//! - **GeometryDecoder**: binary geometry to coordinate decoding
//!
//! Backend crates:
//! - `geofeed-query-postgres` - PostgreSQL/PostGIS
//! - `geofeed-query-geojson` - a single GeoJSON feature file

pub mod error;
pub mod geometry;
pub mod traits;
pub mod types;

// Re-export commonly used items
pub use error::{DataError, Result};
pub use geometry::{EwkbDecoder, GeometryDecoder, GeometryError};
pub use traits::CatalogSource;
pub use types::{
    CatalogSnapshot, CellValue, ColumnFact, DataRow, GeometryColumnFact, PrimaryKeyFact,
    ScanColumn, ScanOrder, ScanRequest, StoreType,
};
