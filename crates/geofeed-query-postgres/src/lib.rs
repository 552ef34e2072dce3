//! PostgreSQL/PostGIS driver for geofeed-query
//!
//! Implements `CatalogSource` on top of `information_schema`, the PostGIS
//! `geometry_columns` view and plain ordered scans. A fresh connection is
//! opened for every call and dropped when the call returns.

use async_trait::async_trait;
use geofeed_query::{
    CatalogSource, CellValue, ColumnFact, DataError, DataRow, GeometryColumnFact, PrimaryKeyFact,
    Result, ScanColumn, ScanOrder, ScanRequest, StoreType,
};
use std::collections::{BTreeMap, BTreeSet};
use tokio_postgres::error::SqlState;
use tokio_postgres::types::{FromSql, Type};
use tokio_postgres::{Client, NoTls, Row};
use tracing::{debug, error};

/// PostGIS bookkeeping tables that never become entities.
pub const INTERNAL_TABLES: &[&str] = &[
    "spatial_ref_sys",
    "geometry_columns",
    "geography_columns",
    "raster_columns",
    "raster_overviews",
];

/// PostgreSQL catalog source
#[derive(Debug, Clone)]
pub struct PostgresCatalog {
    connection_string: String,
    schema: String,
    excluded_tables: Vec<String>,
}

impl PostgresCatalog {
    /// Create a catalog over `schema`, connecting with `connection_string`
    /// (URL or key/value form) on every call.
    pub fn new(connection_string: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
            schema: schema.into(),
            excluded_tables: INTERNAL_TABLES.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Hide additional tables on top of the PostGIS internals.
    pub fn with_excluded_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for table in tables {
            let table = table.into();
            if !self.excluded_tables.contains(&table) {
                self.excluded_tables.push(table);
            }
        }
        self
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn excluded_tables(&self) -> &[String] {
        &self.excluded_tables
    }

    async fn connect(&self) -> Result<Client> {
        debug!("Connecting to PostgreSQL (schema '{}')", self.schema);

        let (client, connection) = tokio_postgres::connect(&self.connection_string, NoTls)
            .await
            .map_err(|e| {
                DataError::ConnectionFailed(format!("PostgreSQL connection failed: {}", e))
            })?;

        // The connection closes once the client is dropped
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("PostgreSQL connection error: {}", e);
            }
        });

        Ok(client)
    }

    /// Map a declared PostgreSQL type to the catalog vocabulary
    pub fn map_pg_type(pg_type: &str) -> StoreType {
        match pg_type.to_ascii_lowercase().as_str() {
            "text" | "character varying" | "varchar" | "character" | "char" | "bpchar"
            | "name" | "citext" => StoreType::Text,
            "smallint" | "int2" | "integer" | "int" | "int4" => StoreType::Integer,
            "bigint" | "int8" => StoreType::BigInt,
            "boolean" | "bool" => StoreType::Boolean,
            "real" | "float4" | "double precision" | "float8" => StoreType::Float,
            "numeric" | "decimal" => StoreType::Numeric,
            "date" => StoreType::Date,
            "timestamp"
            | "timestamp without time zone"
            | "timestamp with time zone"
            | "timestamptz" => StoreType::Timestamp,
            "geometry" => StoreType::Geometry,
            _ => StoreType::Unrecognized(pg_type.to_string()),
        }
    }

    /// Build the scan statement for a request
    pub fn scan_sql(&self, request: &ScanRequest) -> String {
        let columns = if request.columns.is_empty() {
            "NULL".to_string()
        } else {
            request
                .columns
                .iter()
                .map(select_expr)
                .collect::<Vec<_>>()
                .join(", ")
        };

        let order = match &request.order {
            ScanOrder::Column(column) => quote_ident(column),
            ScanOrder::Physical => "ctid".to_string(),
        };

        format!(
            "SELECT {} FROM {}.{} ORDER BY {}",
            columns,
            quote_ident(&self.schema),
            quote_ident(&request.table),
            order
        )
    }
}

/// Quote an identifier, doubling embedded quotes
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Select expression that makes a column readable as its `CellValue`
fn select_expr(column: &ScanColumn) -> String {
    let ident = quote_ident(&column.name);
    match column.store_type {
        StoreType::Boolean | StoreType::Date | StoreType::Geometry => ident,
        StoreType::Integer | StoreType::BigInt => format!("{}::int8 AS {}", ident, ident),
        StoreType::Float | StoreType::Numeric => format!("{}::float8 AS {}", ident, ident),
        StoreType::Timestamp => format!("{}::timestamptz AS {}", ident, ident),
        StoreType::Text | StoreType::Unrecognized(_) => format!("{}::text AS {}", ident, ident),
    }
}

fn query_error(context: &str, e: tokio_postgres::Error) -> DataError {
    if e.code() == Some(&SqlState::INSUFFICIENT_PRIVILEGE) {
        DataError::permission_denied(format!("{}: {}", context, e))
    } else if e.is_closed() {
        DataError::ConnectionLost(format!("{}: {}", context, e))
    } else {
        DataError::QueryFailed(format!("{}: {}", context, e))
    }
}

/// Raw PostGIS geometry, received in its binary (EWKB) form
struct GeometryBytes(Vec<u8>);

impl<'a> FromSql<'a> for GeometryBytes {
    fn from_sql(
        _ty: &Type,
        raw: &'a [u8],
    ) -> std::result::Result<Self, Box<dyn std::error::Error + Sync + Send>> {
        Ok(GeometryBytes(raw.to_vec()))
    }

    fn accepts(ty: &Type) -> bool {
        ty.name() == "geometry"
    }
}

/// Extract value from PostgreSQL row
fn extract_value(row: &Row, idx: usize, store_type: &StoreType) -> Result<CellValue> {
    fn get<'a, T: FromSql<'a>>(row: &'a Row, idx: usize) -> Result<Option<T>> {
        row.try_get::<_, Option<T>>(idx).map_err(|e| {
            DataError::SerializationError(format!(
                "Failed to read column '{}': {}",
                row.columns()[idx].name(),
                e
            ))
        })
    }

    let value = match store_type {
        StoreType::Integer | StoreType::BigInt => get::<i64>(row, idx)?.map(CellValue::Integer),
        StoreType::Float | StoreType::Numeric => get::<f64>(row, idx)?.map(CellValue::Float),
        StoreType::Boolean => get::<bool>(row, idx)?.map(CellValue::Boolean),
        StoreType::Date => get::<chrono::NaiveDate>(row, idx)?.map(CellValue::Date),
        StoreType::Timestamp => {
            get::<chrono::DateTime<chrono::Utc>>(row, idx)?.map(CellValue::Timestamp)
        }
        StoreType::Geometry => get::<GeometryBytes>(row, idx)?.map(|g| CellValue::Geometry(g.0)),
        StoreType::Text | StoreType::Unrecognized(_) => {
            get::<String>(row, idx)?.map(CellValue::Text)
        }
    };

    Ok(value.unwrap_or(CellValue::Null))
}

#[async_trait]
impl CatalogSource for PostgresCatalog {
    fn source_type(&self) -> &'static str {
        "postgres"
    }

    async fn list_tables(&self) -> Result<BTreeSet<String>> {
        let client = self.connect().await?;

        let query = r#"
            SELECT table_name::text
            FROM information_schema.tables
            WHERE table_schema::text = $1
              AND table_type = 'BASE TABLE'
              AND NOT (table_name::text = ANY($2))
            ORDER BY table_name
        "#;

        let rows = client
            .query(query, &[&self.schema, &self.excluded_tables])
            .await
            .map_err(|e| query_error("Failed to list tables", e))?;

        let tables: BTreeSet<String> = rows.iter().map(|row| row.get(0)).collect();

        debug!("Found {} tables in schema '{}'", tables.len(), self.schema);

        Ok(tables)
    }

    async fn list_columns(&self) -> Result<BTreeMap<String, Vec<ColumnFact>>> {
        let client = self.connect().await?;

        let query = r#"
            SELECT
                c.table_name::text,
                c.column_name::text,
                c.data_type::text,
                c.udt_name::text,
                c.is_nullable::text,
                c.ordinal_position::int4
            FROM information_schema.columns c
            JOIN information_schema.tables t
              ON t.table_schema = c.table_schema AND t.table_name = c.table_name
            WHERE c.table_schema::text = $1
              AND t.table_type = 'BASE TABLE'
              AND NOT (c.table_name::text = ANY($2))
            ORDER BY c.table_name, c.ordinal_position
        "#;

        let rows = client
            .query(query, &[&self.schema, &self.excluded_tables])
            .await
            .map_err(|e| query_error("Failed to list columns", e))?;

        let mut columns: BTreeMap<String, Vec<ColumnFact>> = BTreeMap::new();
        for row in &rows {
            let table: String = row.get(0);
            let data_type: String = row.get(2);
            let udt_name: String = row.get(3);
            let is_nullable: String = row.get(4);

            let declared_type = if data_type == "USER-DEFINED" {
                udt_name
            } else {
                data_type
            };

            columns.entry(table.clone()).or_default().push(ColumnFact {
                table,
                name: row.get(1),
                store_type: Self::map_pg_type(&declared_type),
                declared_type,
                nullable: is_nullable == "YES",
                ordinal: row.get(5),
            });
        }

        debug!(
            "Found {} columns across {} tables",
            rows.len(),
            columns.len()
        );

        Ok(columns)
    }

    async fn list_geometry_columns(&self) -> Result<Vec<GeometryColumnFact>> {
        let client = self.connect().await?;

        let postgis = client
            .query_one("SELECT to_regclass('geometry_columns') IS NOT NULL", &[])
            .await
            .map_err(|e| query_error("Failed to probe for PostGIS", e))?;
        if !postgis.get::<_, bool>(0) {
            debug!("PostGIS not installed; no geometry columns");
            return Ok(Vec::new());
        }

        let query = r#"
            SELECT f_table_name::text, f_geometry_column::text, type::text
            FROM geometry_columns
            WHERE f_table_schema::text = $1
              AND NOT (f_table_name::text = ANY($2))
            ORDER BY f_table_name, f_geometry_column
        "#;

        let rows = client
            .query(query, &[&self.schema, &self.excluded_tables])
            .await
            .map_err(|e| query_error("Failed to list geometry columns", e))?;

        Ok(rows
            .iter()
            .map(|row| GeometryColumnFact {
                table: row.get(0),
                column: row.get(1),
                geometry_type: row.get(2),
            })
            .collect())
    }

    async fn list_primary_keys(&self) -> Result<Vec<PrimaryKeyFact>> {
        let client = self.connect().await?;

        let query = r#"
            SELECT
                kcu.table_name::text,
                kcu.column_name::text,
                kcu.ordinal_position::int4
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
              ON kcu.constraint_schema = tc.constraint_schema
             AND kcu.constraint_name = tc.constraint_name
             AND kcu.table_name = tc.table_name
            WHERE tc.constraint_type = 'PRIMARY KEY'
              AND tc.table_schema::text = $1
              AND NOT (tc.table_name::text = ANY($2))
            ORDER BY kcu.table_name, kcu.ordinal_position
        "#;

        let rows = client
            .query(query, &[&self.schema, &self.excluded_tables])
            .await
            .map_err(|e| query_error("Failed to list primary keys", e))?;

        Ok(rows
            .iter()
            .map(|row| PrimaryKeyFact {
                table: row.get(0),
                column: row.get(1),
                position: row.get(2),
            })
            .collect())
    }

    async fn scan(&self, request: &ScanRequest) -> Result<Vec<DataRow>> {
        let sql = self.scan_sql(request);
        debug!("Scanning table '{}': {}", request.table, sql);

        let client = self.connect().await?;
        let rows = client
            .query(sql.as_str(), &[])
            .await
            .map_err(|e| query_error(&format!("Failed to scan table '{}'", request.table), e))?;

        let mut result = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut data_row = DataRow::new();
            for (idx, column) in request.columns.iter().enumerate() {
                data_row.push(
                    column.name.clone(),
                    extract_value(row, idx, &column.store_type)?,
                );
            }
            result.push(data_row);
        }

        debug!("Read {} rows from '{}'", result.len(), request.table);

        Ok(result)
    }
}
