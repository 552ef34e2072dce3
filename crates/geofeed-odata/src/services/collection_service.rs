//! Collection feed: resolve, scan and project one entity set.

use crate::error::ODataError;
use chrono::SecondsFormat;
use geo::Point;
use geofeed_core::ODataConfig;
use geofeed_model::{resolve_table, Axis, EntityDefinition, EntityModelBuilder, PropertySource};
use geofeed_query::{
    CatalogSource, CellValue, DataRow, GeometryDecoder, ScanOrder, ScanRequest,
};
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::fmt::Write;
use std::sync::Arc;
use tracing::{debug, warn};
use utoipa::ToSchema;

/// One page of a collection feed; the whole collection, since nothing pages
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CollectionPage {
    #[serde(rename = "@odata.context")]
    #[schema(example = "http://localhost:8004/$metadata#Depots")]
    pub context: String,
    #[schema(value_type = Vec<Object>)]
    pub value: Vec<Map<String, Value>>,
}

#[derive(Clone)]
pub struct CollectionService {
    config: Arc<ODataConfig>,
    source: Arc<dyn CatalogSource>,
    decoder: Arc<dyn GeometryDecoder>,
}

impl CollectionService {
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

    /// Read every instance of `collection`, ordered by key.
    ///
    /// Fails with `UnknownTable` when no table backs the name, and with
    /// `UnknownEntity` when a table exists but the model does not expose it
    /// under that collection name.
    pub async fn fetch_collection(&self, collection: &str) -> Result<CollectionPage, ODataError> {
        let tables = self.source.list_tables().await?;
        let Some(table) = resolve_table(&tables, collection) else {
            debug!("No table backs collection '{}'", collection);
            return Err(ODataError::UnknownTable(collection.to_string()));
        };

        let model = EntityModelBuilder::new(self.source.clone())
            .build_entities()
            .await?;
        let Some(entity) = model.get_entity(collection) else {
            debug!(
                "Table '{}' resolved for '{}' but the model has no such collection",
                table, collection
            );
            return Err(ODataError::UnknownEntity(collection.to_string()));
        };

        let request = scan_request(entity);
        debug!(
            "Scanning '{}' for '{}' ordered by {:?}",
            entity.table, collection, request.order
        );
        let rows = self.source.scan(&request).await?;

        let value = rows
            .iter()
            .map(|row| self.project(entity, row))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CollectionPage {
            context: format!("{}#{}", self.config.metadata_url(), collection),
            value,
        })
    }

    /// Build one entity instance from a row
    fn project(
        &self,
        entity: &EntityDefinition,
        row: &DataRow,
    ) -> Result<Map<String, Value>, ODataError> {
        let mut instance = Map::new();

        if let Some(key) = entity.key_column().and_then(|column| row.get(column)) {
            if let Some(literal) = key_literal(key) {
                instance.insert(
                    "@odata.id".to_string(),
                    Value::String(format!(
                        "{}({})",
                        self.config.collection_url(&entity.collection),
                        literal
                    )),
                );
            }
        }

        let point = match &entity.geometry_column {
            Some(column) if entity.has_coordinate_properties() => {
                row.get(column).map(|cell| self.decode(cell)).transpose()?.flatten()
            }
            _ => None,
        };

        for property in &entity.properties {
            let value = match &property.source {
                PropertySource::Coordinate { axis, .. } => match (point, axis) {
                    (Some(p), Axis::Latitude) => float(p.y()),
                    (Some(p), Axis::Longitude) => float(p.x()),
                    (None, _) => Value::Null,
                },
                PropertySource::Column { column } => match row.get(column) {
                    Some(cell) => cell_to_json(cell),
                    None => {
                        warn!(
                            "Column '{}' of '{}' missing from scan; skipping",
                            column, entity.table
                        );
                        continue;
                    }
                },
            };
            instance.insert(property.name.clone(), value);
        }

        Ok(instance)
    }

    fn decode(&self, cell: &CellValue) -> Result<Option<Point<f64>>, ODataError> {
        match cell {
            CellValue::Null => Ok(None),
            CellValue::Point(point) => Ok(Some(*point)),
            CellValue::Geometry(bytes) => Ok(Some(self.decoder.decode_point(bytes)?)),
            other => Err(ODataError::Rendering(format!(
                "Expected a geometry value, found {:?}",
                other
            ))),
        }
    }
}

/// Scan of every registered column, ordered by the key column, else the first
/// sortable column, else the store's physical order
pub fn scan_request(entity: &EntityDefinition) -> ScanRequest {
    let order = entity
        .key_column()
        .map(str::to_string)
        .or_else(|| {
            entity
                .columns
                .iter()
                .find(|c| c.store_type.is_orderable())
                .map(|c| c.name.clone())
        })
        .map(ScanOrder::Column)
        .unwrap_or(ScanOrder::Physical);

    ScanRequest {
        table: entity.table.clone(),
        columns: entity.columns.clone(),
        order,
    }
}

/// Key as it appears inside `Collection(...)`: strings quoted with embedded
/// quotes doubled, everything else bare
pub fn key_literal(key: &CellValue) -> Option<String> {
    match key {
        CellValue::Null | CellValue::Geometry(_) | CellValue::Point(_) => None,
        CellValue::Text(s) => Some(format!("'{}'", s.replace('\'', "''"))),
        CellValue::Integer(i) => Some(i.to_string()),
        CellValue::Float(f) => Some(f.to_string()),
        CellValue::Boolean(b) => Some(b.to_string()),
        CellValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        CellValue::Timestamp(ts) => Some(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
    }
}

fn float(value: f64) -> Value {
    Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}

/// JSON form of a cell outside the designated geometry column
pub fn cell_to_json(cell: &CellValue) -> Value {
    match cell {
        CellValue::Null => Value::Null,
        CellValue::Text(s) => Value::String(s.clone()),
        CellValue::Integer(i) => Value::from(*i),
        CellValue::Float(f) => float(*f),
        CellValue::Boolean(b) => Value::Bool(*b),
        CellValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
        CellValue::Timestamp(ts) => {
            Value::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        }
        CellValue::Geometry(bytes) => {
            let mut hex = String::with_capacity(bytes.len() * 2);
            for byte in bytes {
                let _ = write!(hex, "{:02X}", byte);
            }
            Value::String(hex)
        }
        CellValue::Point(p) => Value::String(format!("POINT({} {})", p.x(), p.y())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use geofeed_model::build_entity;
    use geofeed_query::{CatalogSnapshot, ColumnFact, StoreType};
    use std::collections::BTreeMap;

    fn keyless(table: &str, columns: &[(&str, StoreType)]) -> EntityDefinition {
        let facts = columns
            .iter()
            .enumerate()
            .map(|(i, (name, store_type))| ColumnFact {
                table: table.to_string(),
                name: name.to_string(),
                declared_type: store_type.to_string(),
                store_type: store_type.clone(),
                nullable: true,
                ordinal: i as i32 + 1,
            })
            .collect();
        let snapshot = CatalogSnapshot {
            tables: [table.to_string()].into(),
            columns: BTreeMap::from([(table.to_string(), facts)]),
            ..Default::default()
        };
        build_entity(table, &snapshot)
    }

    #[test]
    fn test_keyless_scan_skips_unsortable_columns() {
        let event = keyless(
            "event",
            &[
                ("payload", StoreType::Unrecognized("json".to_string())),
                ("geom", StoreType::Geometry),
                ("name", StoreType::Text),
            ],
        );
        assert_eq!(
            scan_request(&event).order,
            ScanOrder::Column("name".to_string())
        );
        assert_eq!(scan_request(&event).columns.len(), 3);
    }

    #[test]
    fn test_keyless_scan_without_sortable_columns_is_physical() {
        let blob = keyless(
            "blob",
            &[
                ("payload", StoreType::Unrecognized("jsonb".to_string())),
                ("area", StoreType::Unrecognized("geography".to_string())),
            ],
        );
        assert_eq!(scan_request(&blob).order, ScanOrder::Physical);
    }

    #[test]
    fn test_key_literals() {
        assert_eq!(
            key_literal(&CellValue::Text("D1".to_string())),
            Some("'D1'".to_string())
        );
        assert_eq!(
            key_literal(&CellValue::Text("O'Hare".to_string())),
            Some("'O''Hare'".to_string())
        );
        assert_eq!(key_literal(&CellValue::Integer(42)), Some("42".to_string()));
        assert_eq!(key_literal(&CellValue::Null), None);
    }

    #[test]
    fn test_cell_to_json() {
        assert_eq!(
            cell_to_json(&CellValue::Date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap())),
            Value::String("2020-01-01".to_string())
        );
        assert_eq!(
            cell_to_json(&CellValue::Timestamp(
                Utc.with_ymd_and_hms(2021, 6, 15, 8, 30, 0).unwrap()
            )),
            Value::String("2021-06-15T08:30:00Z".to_string())
        );
        assert_eq!(cell_to_json(&CellValue::Float(f64::NAN)), Value::Null);
        assert_eq!(cell_to_json(&CellValue::Integer(7)), Value::from(7));
        assert_eq!(
            cell_to_json(&CellValue::Geometry(vec![0x01, 0xAB])),
            Value::String("01AB".to_string())
        );
    }
}
