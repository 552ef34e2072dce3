use crate::naming::{LATITUDE_PROPERTY, LONGITUDE_PROPERTY};
use geofeed_query::{ScanColumn, StoreType};
use serde::Serialize;
use std::fmt;

/// OData primitive types a property can carry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EdmType {
    String,
    Int32,
    Int64,
    Boolean,
    Double,
    Decimal,
    Date,
    DateTimeOffset,
    /// Store type with no EDM counterpart, kept so the column is not lost
    Unsupported { declared: String },
}

impl EdmType {
    /// Qualified EDM type name, as written into CSDL
    pub fn as_edm(&self) -> &'static str {
        match self {
            EdmType::String => "Edm.String",
            EdmType::Int32 => "Edm.Int32",
            EdmType::Int64 => "Edm.Int64",
            EdmType::Boolean => "Edm.Boolean",
            EdmType::Double => "Edm.Double",
            EdmType::Decimal => "Edm.Decimal",
            EdmType::Date => "Edm.Date",
            EdmType::DateTimeOffset => "Edm.DateTimeOffset",
            EdmType::Unsupported { .. } => "Edm.Untyped",
        }
    }
}

impl From<&StoreType> for EdmType {
    fn from(store_type: &StoreType) -> Self {
        match store_type {
            StoreType::Text => EdmType::String,
            StoreType::Integer => EdmType::Int32,
            StoreType::BigInt => EdmType::Int64,
            StoreType::Boolean => EdmType::Boolean,
            StoreType::Float | StoreType::Numeric => EdmType::Double,
            StoreType::Date => EdmType::Date,
            StoreType::Timestamp => EdmType::DateTimeOffset,
            StoreType::Geometry | StoreType::Unrecognized(_) => EdmType::Unsupported {
                declared: store_type.to_string(),
            },
        }
    }
}

impl fmt::Display for EdmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_edm())
    }
}

/// Coordinate axis of a point column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    pub fn property_name(self) -> &'static str {
        match self {
            Axis::Latitude => LATITUDE_PROPERTY,
            Axis::Longitude => LONGITUDE_PROPERTY,
        }
    }
}

/// Where a property's value is read from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PropertySource {
    /// The named column, as is
    Column { column: String },
    /// One axis of the point stored in the named column
    Coordinate { column: String, axis: Axis },
}

impl PropertySource {
    pub fn column(&self) -> &str {
        match self {
            PropertySource::Column { column } | PropertySource::Coordinate { column, .. } => {
                column
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Property {
    /// Display name, unique within its entity
    pub name: String,
    pub edm_type: EdmType,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_key: bool,
    pub nullable: bool,
    pub source: PropertySource,
}

/// One table exposed as an entity type and its entity set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityDefinition {
    pub name: String,
    pub collection: String,
    pub table: String,
    /// Properties in column ordinal order
    pub properties: Vec<Property>,
    /// Backing columns, each listed once, in ordinal order
    pub columns: Vec<ScanColumn>,
    /// Point column split into the Latitude/Longitude pair, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry_column: Option<String>,
}

impl EntityDefinition {
    /// Display name of the key property
    pub fn key_property(&self) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.is_key)
            .map(|p| p.name.as_str())
    }

    /// Column backing the key property
    pub fn key_column(&self) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.is_key)
            .map(|p| p.source.column())
    }

    /// True when both `Latitude` and `Longitude` exist, whether split out of
    /// a point column or read from columns with those names
    pub fn has_coordinate_properties(&self) -> bool {
        self.property(LATITUDE_PROPERTY).is_some() && self.property(LONGITUDE_PROPERTY).is_some()
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Column a display name reads from
    pub fn column_of(&self, property: &str) -> Option<&str> {
        self.property(property).map(|p| p.source.column())
    }

    /// Properties fed by `column`; two for a split point column
    pub fn properties_of<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Property> {
        self.properties
            .iter()
            .filter(move |p| p.source.column() == column)
    }
}

/// All entities exposed by the service, ordered by table name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntityModel {
    entities: Vec<EntityDefinition>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    rejected: Vec<RejectedTable>,
}

/// A table left out of the model because its names were already taken
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedTable {
    pub table: String,
    pub collection: String,
    /// Table that owns the collection
    pub conflicts_with: String,
}

impl EntityModel {
    pub(crate) fn new(entities: Vec<EntityDefinition>, rejected: Vec<RejectedTable>) -> Self {
        Self { entities, rejected }
    }

    pub fn entities(&self) -> &[EntityDefinition] {
        &self.entities
    }

    pub fn rejected(&self) -> &[RejectedTable] {
        &self.rejected
    }

    /// Entity whose collection is exactly `collection`
    pub fn get_entity(&self, collection: &str) -> Option<&EntityDefinition> {
        self.entities.iter().find(|e| e.collection == collection)
    }
}
