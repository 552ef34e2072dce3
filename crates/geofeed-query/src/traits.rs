use crate::error::Result;
use crate::types::*;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};

/// A relational store whose catalog can be read at request time.
///
/// Every listing excludes the store's internal tables. Implementations hold no
/// per-request state; each call stands on its own, so two calls may observe
/// different catalog states if DDL runs in between.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Get the type name of this data source
    fn source_type(&self) -> &'static str;

    /// Names of all user tables
    async fn list_tables(&self) -> Result<BTreeSet<String>>;

    /// Columns of every user table, ordered by ordinal position
    async fn list_columns(&self) -> Result<BTreeMap<String, Vec<ColumnFact>>>;

    /// Registered geometry columns with their subtype
    async fn list_geometry_columns(&self) -> Result<Vec<GeometryColumnFact>>;

    /// Primary key membership of every user table
    async fn list_primary_keys(&self) -> Result<Vec<PrimaryKeyFact>>;

    /// Read every row of a table, in the requested order
    async fn scan(&self, request: &ScanRequest) -> Result<Vec<DataRow>>;
}
