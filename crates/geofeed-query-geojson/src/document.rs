//! GeoJSON FeatureCollection parsing and value typing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use geo::Point;
use geofeed_query::{CellValue, DataError, Result, StoreType};
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub(crate) struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Feature {
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub coordinates: Value,
}

impl FeatureCollection {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let collection: FeatureCollection = serde_json::from_slice(bytes).map_err(|e| {
            DataError::SerializationError(format!("Invalid GeoJSON document: {}", e))
        })?;

        if collection.kind != "FeatureCollection" {
            return Err(DataError::SerializationError(format!(
                "Expected a FeatureCollection, found '{}'",
                collection.kind
            )));
        }

        Ok(collection)
    }

    /// Property keys in order of first appearance across all features
    pub fn property_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for properties in self.features.iter().filter_map(|f| f.properties.as_ref()) {
            for key in properties.keys() {
                if !keys.contains(key) {
                    keys.push(key.clone());
                }
            }
        }
        keys
    }

    /// Type of a property, widened over every non-null value it holds
    pub fn infer_type(&self, key: &str) -> StoreType {
        self.features
            .iter()
            .filter_map(|f| f.properties.as_ref()?.get(key))
            .filter(|v| !v.is_null())
            .map(infer_store_type)
            .reduce(widen)
            .unwrap_or(StoreType::Text)
    }

    /// Whether every feature carries a geometry
    pub fn all_located(&self) -> bool {
        self.features.iter().all(|f| f.geometry.is_some())
    }
}

impl Feature {
    pub fn property(&self, key: &str) -> &Value {
        self.properties
            .as_ref()
            .and_then(|p| p.get(key))
            .unwrap_or(&Value::Null)
    }

    /// `[lon, lat, ...]` of a Point geometry
    pub fn point(&self) -> Result<Option<Point<f64>>> {
        let Some(geometry) = &self.geometry else {
            return Ok(None);
        };

        if geometry.kind != "Point" {
            return Err(DataError::SerializationError(format!(
                "Expected Point geometry, found '{}'",
                geometry.kind
            )));
        }

        let coords = geometry
            .coordinates
            .as_array()
            .filter(|c| c.len() >= 2)
            .and_then(|c| Some((c[0].as_f64()?, c[1].as_f64()?)));

        match coords {
            Some((lon, lat)) => Ok(Some(Point::new(lon, lat))),
            None => Err(DataError::SerializationError(format!(
                "Invalid Point coordinates: {}",
                geometry.coordinates
            ))),
        }
    }
}

fn infer_store_type(value: &Value) -> StoreType {
    match value {
        Value::Bool(_) => StoreType::Boolean,
        Value::Number(n) if n.is_i64() => StoreType::BigInt,
        Value::Number(_) => StoreType::Float,
        Value::String(s) if parse_date(s).is_some() => StoreType::Date,
        Value::String(s) if parse_timestamp(s).is_some() => StoreType::Timestamp,
        Value::String(_) | Value::Null => StoreType::Text,
        Value::Array(_) | Value::Object(_) => StoreType::Unrecognized("json".to_string()),
    }
}

/// Smallest type that holds values of both `a` and `b`
fn widen(a: StoreType, b: StoreType) -> StoreType {
    match (a, b) {
        (a, b) if a == b => a,
        (StoreType::BigInt, StoreType::Float) | (StoreType::Float, StoreType::BigInt) => {
            StoreType::Float
        }
        (StoreType::Date, StoreType::Timestamp) | (StoreType::Timestamp, StoreType::Date) => {
            StoreType::Timestamp
        }
        _ => StoreType::Text,
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// Convert a property value to the cell of a column typed `store_type`
pub(crate) fn to_cell(column: &str, value: &Value, store_type: &StoreType) -> Result<CellValue> {
    let mismatch = || {
        DataError::SerializationError(format!(
            "Property '{}' holds {} where {} was expected",
            column, value, store_type
        ))
    };

    if value.is_null() {
        return Ok(CellValue::Null);
    }

    let cell = match store_type {
        StoreType::Integer | StoreType::BigInt => {
            CellValue::Integer(value.as_i64().ok_or_else(mismatch)?)
        }
        StoreType::Float | StoreType::Numeric => {
            CellValue::Float(value.as_f64().ok_or_else(mismatch)?)
        }
        StoreType::Boolean => CellValue::Boolean(value.as_bool().ok_or_else(mismatch)?),
        StoreType::Date => {
            CellValue::Date(value.as_str().and_then(parse_date).ok_or_else(mismatch)?)
        }
        StoreType::Timestamp => CellValue::Timestamp(
            value
                .as_str()
                .and_then(|s| {
                    parse_timestamp(s)
                        .or_else(|| parse_date(s).map(|d| d.and_time(NaiveTime::MIN).and_utc()))
                })
                .ok_or_else(mismatch)?,
        ),
        StoreType::Text => match value {
            Value::String(s) => CellValue::Text(s.clone()),
            other => CellValue::Text(other.to_string()),
        },
        StoreType::Geometry => return Err(mismatch()),
        StoreType::Unrecognized(_) => CellValue::Text(value.to_string()),
    };

    Ok(cell)
}
