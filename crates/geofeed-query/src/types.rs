use chrono::{DateTime, NaiveDate, Utc};
use geo::Point;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Storage types recognized by the catalog.
///
/// Anything else is carried as `Unrecognized` with the declared type name so
/// it can be surfaced instead of dropped.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreType {
    /// Character data of any length
    Text,
    /// 16/32-bit signed integer
    Integer,
    /// 64-bit signed integer
    BigInt,
    /// Boolean true/false
    Boolean,
    /// Binary floating point
    Float,
    /// Arbitrary precision numeric
    Numeric,
    /// Calendar date
    Date,
    /// Timestamp with or without zone
    Timestamp,
    /// Spatial geometry
    Geometry,
    /// Declared type with no mapping
    Unrecognized(String),
}

impl StoreType {
    pub fn is_geometry(&self) -> bool {
        matches!(self, StoreType::Geometry)
    }

    /// Whether the store can sort on this type. Spatial and unmapped types
    /// (json, xml, geography, ...) have no ordering operator.
    pub fn is_orderable(&self) -> bool {
        !matches!(self, StoreType::Geometry | StoreType::Unrecognized(_))
    }
}

impl fmt::Display for StoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreType::Text => write!(f, "text"),
            StoreType::Integer => write!(f, "integer"),
            StoreType::BigInt => write!(f, "bigint"),
            StoreType::Boolean => write!(f, "boolean"),
            StoreType::Float => write!(f, "float"),
            StoreType::Numeric => write!(f, "numeric"),
            StoreType::Date => write!(f, "date"),
            StoreType::Timestamp => write!(f, "timestamp"),
            StoreType::Geometry => write!(f, "geometry"),
            StoreType::Unrecognized(declared) => write!(f, "{}", declared),
        }
    }
}

/// One column of a table, as reported by the catalog
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ColumnFact {
    pub table: String,
    pub name: String,
    /// Type name exactly as the store declared it
    pub declared_type: String,
    pub store_type: StoreType,
    pub nullable: bool,
    /// 1-based position within the table
    pub ordinal: i32,
}

/// A registered geometry column and its subtype (`POINT`, `LINESTRING`, ...)
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct GeometryColumnFact {
    pub table: String,
    pub column: String,
    pub geometry_type: String,
}

impl GeometryColumnFact {
    pub fn is_point(&self) -> bool {
        self.geometry_type.eq_ignore_ascii_case("POINT")
    }
}

/// Membership of a column in its table's primary key
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct PrimaryKeyFact {
    pub table: String,
    pub column: String,
    /// 1-based position within the key
    pub position: i32,
}

/// Raw output of the four catalog listings, taken together
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub tables: BTreeSet<String>,
    /// Columns per table, ordered by ordinal
    pub columns: BTreeMap<String, Vec<ColumnFact>>,
    pub geometry_columns: Vec<GeometryColumnFact>,
    pub primary_keys: Vec<PrimaryKeyFact>,
}

impl CatalogSnapshot {
    pub fn columns_of(&self, table: &str) -> &[ColumnFact] {
        self.columns.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn geometry_of(&self, table: &str, column: &str) -> Option<&GeometryColumnFact> {
        self.geometry_columns
            .iter()
            .find(|g| g.table == table && g.column == column)
    }

    /// Primary key columns of `table`, in key order
    pub fn primary_key_of(&self, table: &str) -> Vec<&str> {
        let mut keys: Vec<&PrimaryKeyFact> = self
            .primary_keys
            .iter()
            .filter(|pk| pk.table == table)
            .collect();
        keys.sort_by_key(|pk| pk.position);
        keys.into_iter().map(|pk| pk.column.as_str()).collect()
    }
}

/// Column requested by a scan
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct ScanColumn {
    pub name: String,
    pub store_type: StoreType,
}

/// Row order of a scan
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ScanOrder {
    /// Ascending by the named column
    Column(String),
    /// Whatever order the store keeps rows in
    Physical,
}

/// Full, unfiltered read of one table
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ScanRequest {
    pub table: String,
    pub columns: Vec<ScanColumn>,
    pub order: ScanOrder,
}

/// A single value read from the store
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    /// Binary (E)WKB geometry, still encoded
    Geometry(Vec<u8>),
    /// Geometry a source already decoded (x = longitude, y = latitude)
    Point(Point<f64>),
}

/// One row of a scan, cells in the requested column order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataRow {
    pub cells: Vec<(String, CellValue)>,
}

impl DataRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: impl Into<String>, value: CellValue) {
        self.cells.push((column.into(), value));
    }

    pub fn with(mut self, column: impl Into<String>, value: CellValue) -> Self {
        self.push(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(name, value)| (name.as_str(), value))
    }
}
