//! GeoJSON feature file driver for geofeed-query
//!
//! Serves one table backed by a FeatureCollection on disk. The catalog is
//! inferred from the file itself, which is re-read on every call so edits are
//! visible without a restart.

mod document;

use async_trait::async_trait;
use document::{to_cell, FeatureCollection};
use geofeed_query::{
    CatalogSource, CellValue, ColumnFact, DataError, DataRow, GeometryColumnFact, PrimaryKeyFact,
    Result, ScanOrder, ScanRequest, StoreType,
};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

/// Name of the synthetic geometry column
pub const GEOMETRY_COLUMN: &str = "geom";

#[derive(Debug, Clone)]
pub struct FeatureFileCatalog {
    path: PathBuf,
    table: String,
    key_column: String,
}

impl FeatureFileCatalog {
    /// Serve `path` as table `table`, keyed by the feature property `key_column`
    pub fn new(
        path: impl Into<PathBuf>,
        table: impl Into<String>,
        key_column: impl Into<String>,
    ) -> Result<Self> {
        let table = table.into();
        let key_column = key_column.into();

        if table.is_empty() || key_column.is_empty() {
            return Err(DataError::invalid_configuration(
                "feature table and key column must not be empty",
            ));
        }
        if key_column == GEOMETRY_COLUMN {
            return Err(DataError::invalid_configuration(format!(
                "key column cannot be named '{}'",
                GEOMETRY_COLUMN
            )));
        }

        Ok(Self {
            path: path.into(),
            table,
            key_column,
        })
    }

    async fn load(&self) -> Result<FeatureCollection> {
        debug!("Reading feature file: {}", self.path.display());

        let bytes = fs::read(&self.path).await.map_err(|e| {
            DataError::ConnectionFailed(format!(
                "Cannot read feature file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        FeatureCollection::parse(&bytes)
    }

    /// Key column first, then the geometry, then remaining properties
    fn columns_of(&self, collection: &FeatureCollection) -> Vec<ColumnFact> {
        let mut columns = Vec::new();
        let mut push = |name: &str, store_type: StoreType, nullable: bool| {
            columns.push(ColumnFact {
                table: self.table.clone(),
                name: name.to_string(),
                declared_type: store_type.to_string(),
                store_type,
                nullable,
                ordinal: columns.len() as i32 + 1,
            });
        };

        push(&self.key_column, collection.infer_type(&self.key_column), false);
        push(GEOMETRY_COLUMN, StoreType::Geometry, !collection.all_located());

        for key in collection.property_keys() {
            if key != self.key_column && key != GEOMETRY_COLUMN {
                let store_type = collection.infer_type(&key);
                push(&key, store_type, true);
            }
        }

        columns
    }
}

fn compare_cells(a: &CellValue, b: &CellValue) -> Ordering {
    match (a, b) {
        (CellValue::Null, CellValue::Null) => Ordering::Equal,
        (CellValue::Null, _) => Ordering::Greater,
        (_, CellValue::Null) => Ordering::Less,
        (CellValue::Integer(a), CellValue::Integer(b)) => a.cmp(b),
        (CellValue::Float(a), CellValue::Float(b)) => a.total_cmp(b),
        (CellValue::Text(a), CellValue::Text(b)) => a.cmp(b),
        (CellValue::Boolean(a), CellValue::Boolean(b)) => a.cmp(b),
        (CellValue::Date(a), CellValue::Date(b)) => a.cmp(b),
        (CellValue::Timestamp(a), CellValue::Timestamp(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl CatalogSource for FeatureFileCatalog {
    fn source_type(&self) -> &'static str {
        "geojson"
    }

    async fn list_tables(&self) -> Result<BTreeSet<String>> {
        self.load().await?;
        Ok(BTreeSet::from([self.table.clone()]))
    }

    async fn list_columns(&self) -> Result<BTreeMap<String, Vec<ColumnFact>>> {
        let collection = self.load().await?;
        Ok(BTreeMap::from([(
            self.table.clone(),
            self.columns_of(&collection),
        )]))
    }

    async fn list_geometry_columns(&self) -> Result<Vec<GeometryColumnFact>> {
        Ok(vec![GeometryColumnFact {
            table: self.table.clone(),
            column: GEOMETRY_COLUMN.to_string(),
            geometry_type: "POINT".to_string(),
        }])
    }

    async fn list_primary_keys(&self) -> Result<Vec<PrimaryKeyFact>> {
        Ok(vec![PrimaryKeyFact {
            table: self.table.clone(),
            column: self.key_column.clone(),
            position: 1,
        }])
    }

    async fn scan(&self, request: &ScanRequest) -> Result<Vec<DataRow>> {
        if request.table != self.table {
            return Err(DataError::QueryFailed(format!(
                "Table '{}' does not exist",
                request.table
            )));
        }

        let collection = self.load().await?;

        let mut rows = Vec::with_capacity(collection.features.len());
        for feature in &collection.features {
            let mut row = DataRow::new();
            for column in &request.columns {
                let cell = if column.name == GEOMETRY_COLUMN {
                    feature
                        .point()?
                        .map(CellValue::Point)
                        .unwrap_or(CellValue::Null)
                } else {
                    to_cell(
                        &column.name,
                        feature.property(&column.name),
                        &column.store_type,
                    )?
                };
                row.push(column.name.clone(), cell);
            }
            rows.push(row);
        }

        if let ScanOrder::Column(order_by) = &request.order {
            rows.sort_by(|a, b| match (a.get(order_by), b.get(order_by)) {
                (Some(a), Some(b)) => compare_cells(a, b),
                _ => Ordering::Equal,
            });
        }

        debug!(
            "Read {} features from {}",
            rows.len(),
            self.path.display()
        );

        Ok(rows)
    }
}
