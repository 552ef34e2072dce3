use async_trait::async_trait;
use geofeed_model::{
    Axis, EdmType, EntityModelBuilder, PropertySource, LATITUDE_PROPERTY, LONGITUDE_PROPERTY,
};
use geofeed_query::{
    CatalogSnapshot, CatalogSource, ColumnFact, DataError, DataRow, GeometryColumnFact,
    PrimaryKeyFact, Result, ScanRequest, StoreType,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

fn column(table: &str, name: &str, store_type: StoreType, ordinal: i32) -> ColumnFact {
    ColumnFact {
        table: table.to_string(),
        name: name.to_string(),
        declared_type: store_type.to_string(),
        store_type,
        nullable: true,
        ordinal,
    }
}

fn point(table: &str, column: &str) -> GeometryColumnFact {
    GeometryColumnFact {
        table: table.to_string(),
        column: column.to_string(),
        geometry_type: "POINT".to_string(),
    }
}

fn pk(table: &str, column: &str, position: i32) -> PrimaryKeyFact {
    PrimaryKeyFact {
        table: table.to_string(),
        column: column.to_string(),
        position,
    }
}

fn snapshot(
    columns: Vec<ColumnFact>,
    geometry_columns: Vec<GeometryColumnFact>,
    primary_keys: Vec<PrimaryKeyFact>,
) -> CatalogSnapshot {
    let mut by_table: BTreeMap<String, Vec<ColumnFact>> = BTreeMap::new();
    for c in columns {
        by_table.entry(c.table.clone()).or_default().push(c);
    }
    CatalogSnapshot {
        tables: by_table.keys().cloned().collect(),
        columns: by_table,
        geometry_columns,
        primary_keys,
    }
}

fn depot_snapshot() -> CatalogSnapshot {
    snapshot(
        vec![
            column("depot", "id", StoreType::Text, 1),
            column("depot", "geom", StoreType::Geometry, 2),
            column("depot", "established_at", StoreType::Date, 3),
        ],
        vec![point("depot", "geom")],
        vec![pk("depot", "id", 1)],
    )
}

fn summary(model: &geofeed_model::EntityModel, collection: &str) -> Vec<(String, String, bool)> {
    model
        .get_entity(collection)
        .unwrap()
        .properties
        .iter()
        .map(|p| (p.name.clone(), p.edm_type.as_edm().to_string(), p.is_key))
        .collect()
}

#[test]
fn test_depot_entity() {
    let model = EntityModelBuilder::from_catalog(&depot_snapshot());

    let depot = model.get_entity("Depots").unwrap();
    assert_eq!(depot.name, "Depot");
    assert_eq!(depot.table, "depot");
    assert_eq!(depot.geometry_column.as_deref(), Some("geom"));
    assert_eq!(depot.key_property(), Some("ID"));
    assert_eq!(depot.key_column(), Some("id"));
    assert!(depot.has_coordinate_properties());

    assert_eq!(
        summary(&model, "Depots"),
        vec![
            ("ID".to_string(), "Edm.String".to_string(), true),
            ("Latitude".to_string(), "Edm.Decimal".to_string(), false),
            ("Longitude".to_string(), "Edm.Decimal".to_string(), false),
            ("Established At".to_string(), "Edm.Date".to_string(), false),
        ]
    );

    assert_eq!(
        depot.property(LONGITUDE_PROPERTY).unwrap().source,
        PropertySource::Coordinate {
            column: "geom".to_string(),
            axis: Axis::Longitude
        }
    );
    assert_eq!(depot.column_of("Established At"), Some("established_at"));
    assert_eq!(depot.properties_of("geom").count(), 2);
    assert!(!depot.property("ID").unwrap().nullable);
}

#[test]
fn test_composite_key_yields_no_key_property() {
    let model = EntityModelBuilder::from_catalog(&snapshot(
        vec![
            column("route_stop", "route_id", StoreType::Integer, 1),
            column("route_stop", "stop", StoreType::Integer, 2),
        ],
        vec![],
        vec![pk("route_stop", "route_id", 1), pk("route_stop", "stop", 2)],
    ));

    let entity = model.get_entity("RouteStops").unwrap();
    assert_eq!(entity.key_property(), None);
    assert!(entity.properties.iter().all(|p| !p.is_key));
}

#[test]
fn test_single_column_key_matches_formatted_column() {
    let model = EntityModelBuilder::from_catalog(&snapshot(
        vec![
            column("vehicle", "fleet_number", StoreType::BigInt, 1),
            column("vehicle", "make", StoreType::Text, 2),
        ],
        vec![],
        vec![pk("vehicle", "fleet_number", 1)],
    ));

    let vehicle = model.get_entity("Vehicles").unwrap();
    assert_eq!(vehicle.key_property(), Some("Fleet Number"));
    assert_eq!(
        vehicle.property("Fleet Number").unwrap().edm_type,
        EdmType::Int64
    );
}

#[test]
fn test_numeric_columns_are_doubles() {
    let model = EntityModelBuilder::from_catalog(&snapshot(
        vec![
            column("reading", "id", StoreType::Integer, 1),
            column("reading", "weight", StoreType::Numeric, 2),
            column("reading", "ratio", StoreType::Float, 3),
        ],
        vec![],
        vec![pk("reading", "id", 1)],
    ));

    assert_eq!(
        summary(&model, "Readings"),
        vec![
            ("ID".to_string(), "Edm.Int32".to_string(), true),
            ("Weight".to_string(), "Edm.Double".to_string(), false),
            ("Ratio".to_string(), "Edm.Double".to_string(), false),
        ]
    );
}

#[test]
fn test_unrecognized_type_is_kept_as_unsupported() {
    let model = EntityModelBuilder::from_catalog(&snapshot(
        vec![
            column("note", "id", StoreType::Integer, 1),
            column(
                "note",
                "body",
                StoreType::Unrecognized("tsvector".to_string()),
                2,
            ),
        ],
        vec![],
        vec![pk("note", "id", 1)],
    ));

    let note = model.get_entity("Notes").unwrap();
    assert_eq!(
        note.property("Body").unwrap().edm_type,
        EdmType::Unsupported {
            declared: "tsvector".to_string()
        }
    );
}

#[test]
fn test_literal_coordinate_columns_win_over_geometry() {
    let model = EntityModelBuilder::from_catalog(&snapshot(
        vec![
            column("site", "id", StoreType::Integer, 1),
            column("site", "geom", StoreType::Geometry, 2),
            column("site", "latitude", StoreType::Float, 3),
            column("site", "longitude", StoreType::Float, 4),
        ],
        vec![point("site", "geom")],
        vec![pk("site", "id", 1)],
    ));

    let site = model.get_entity("Sites").unwrap();
    assert_eq!(site.geometry_column, None);
    assert!(site.has_coordinate_properties());
    assert_eq!(
        site.property(LATITUDE_PROPERTY).unwrap().source,
        PropertySource::Column {
            column: "latitude".to_string()
        }
    );
    assert!(site.property("Geom").is_some());
}

#[test]
fn test_only_first_point_column_is_split() {
    let model = EntityModelBuilder::from_catalog(&snapshot(
        vec![
            column("trip", "id", StoreType::Integer, 1),
            column("trip", "origin", StoreType::Geometry, 2),
            column("trip", "destination", StoreType::Geometry, 3),
        ],
        vec![point("trip", "origin"), point("trip", "destination")],
        vec![pk("trip", "id", 1)],
    ));

    let trip = model.get_entity("Trips").unwrap();
    assert_eq!(trip.geometry_column.as_deref(), Some("origin"));
    assert_eq!(
        trip.property("Destination").unwrap().edm_type.as_edm(),
        "Edm.Untyped"
    );
}

#[test]
fn test_non_point_geometry_is_not_split() {
    let model = EntityModelBuilder::from_catalog(&snapshot(
        vec![column("road", "path", StoreType::Geometry, 1)],
        vec![GeometryColumnFact {
            table: "road".to_string(),
            column: "path".to_string(),
            geometry_type: "LINESTRING".to_string(),
        }],
        vec![],
    ));

    let road = model.get_entity("Roads").unwrap();
    assert!(!road.has_coordinate_properties());
    assert_eq!(road.properties.len(), 1);
}

#[test]
fn test_colliding_display_names_get_ordinal_suffix() {
    let model = EntityModelBuilder::from_catalog(&snapshot(
        vec![
            column("odd", "ID", StoreType::Text, 1),
            column("odd", "id", StoreType::Text, 2),
        ],
        vec![],
        vec![pk("odd", "id", 1)],
    ));

    let odd = model.get_entity("Odds").unwrap();
    let names: Vec<&str> = odd.properties.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["ID", "ID 2"]);
    assert_eq!(odd.key_property(), Some("ID 2"));
    assert_eq!(odd.column_of("ID 2"), Some("id"));
}

#[test]
fn test_duplicate_collection_keeps_first_table() {
    let model = EntityModelBuilder::from_catalog(&snapshot(
        vec![
            column("depot", "id", StoreType::Text, 1),
            column("depots", "id", StoreType::Text, 1),
        ],
        vec![],
        vec![],
    ));

    assert_eq!(model.entities().len(), 1);
    assert_eq!(model.get_entity("Depots").unwrap().table, "depot");
    assert_eq!(model.rejected()[0].table, "depots");
    assert_eq!(model.rejected()[0].conflicts_with, "depot");
}

#[test]
fn test_entities_follow_table_order() {
    let model = EntityModelBuilder::from_catalog(&snapshot(
        vec![
            column("vehicle", "id", StoreType::Integer, 1),
            column("depot", "id", StoreType::Text, 1),
            column("person", "id", StoreType::Integer, 1),
        ],
        vec![],
        vec![],
    ));

    let collections: Vec<&str> = model
        .entities()
        .iter()
        .map(|e| e.collection.as_str())
        .collect();
    assert_eq!(collections, vec!["Depots", "People", "Vehicles"]);
}

#[test]
fn test_table_without_columns_is_still_an_entity() {
    let model = EntityModelBuilder::from_catalog(&CatalogSnapshot {
        tables: BTreeSet::from(["ledger".to_string()]),
        ..Default::default()
    });

    let ledger = model.get_entity("Ledgers").unwrap();
    assert!(ledger.properties.is_empty());
    assert_eq!(ledger.key_property(), None);
}

struct StaticCatalog(CatalogSnapshot);

#[async_trait]
impl CatalogSource for StaticCatalog {
    fn source_type(&self) -> &'static str {
        "static"
    }

    async fn list_tables(&self) -> Result<BTreeSet<String>> {
        Ok(self.0.tables.clone())
    }

    async fn list_columns(&self) -> Result<BTreeMap<String, Vec<ColumnFact>>> {
        Ok(self.0.columns.clone())
    }

    async fn list_geometry_columns(&self) -> Result<Vec<GeometryColumnFact>> {
        Ok(self.0.geometry_columns.clone())
    }

    async fn list_primary_keys(&self) -> Result<Vec<PrimaryKeyFact>> {
        Ok(self.0.primary_keys.clone())
    }

    async fn scan(&self, _request: &ScanRequest) -> Result<Vec<DataRow>> {
        Ok(Vec::new())
    }
}

struct OfflineCatalog;

#[async_trait]
impl CatalogSource for OfflineCatalog {
    fn source_type(&self) -> &'static str {
        "offline"
    }

    async fn list_tables(&self) -> Result<BTreeSet<String>> {
        Err(DataError::ConnectionFailed("connection refused".to_string()))
    }

    async fn list_columns(&self) -> Result<BTreeMap<String, Vec<ColumnFact>>> {
        Err(DataError::ConnectionFailed("connection refused".to_string()))
    }

    async fn list_geometry_columns(&self) -> Result<Vec<GeometryColumnFact>> {
        Err(DataError::ConnectionFailed("connection refused".to_string()))
    }

    async fn list_primary_keys(&self) -> Result<Vec<PrimaryKeyFact>> {
        Err(DataError::ConnectionFailed("connection refused".to_string()))
    }

    async fn scan(&self, _request: &ScanRequest) -> Result<Vec<DataRow>> {
        Err(DataError::ConnectionFailed("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_builder_reads_catalog() {
    let builder = EntityModelBuilder::new(Arc::new(StaticCatalog(depot_snapshot())));

    let model = builder.build_entities().await.unwrap();
    assert_eq!(model.entities().len(), 1);
    assert_eq!(model.entities()[0].collection, "Depots");
}

#[tokio::test]
async fn test_builder_propagates_store_failure() {
    let builder = EntityModelBuilder::new(Arc::new(OfflineCatalog));

    let err = builder.build_entities().await.unwrap_err();
    assert!(err.is_unavailable());
}
