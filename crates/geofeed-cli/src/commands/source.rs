use anyhow::Context;
use clap::Args;
use geofeed_query::CatalogSource;
use geofeed_query_geojson::FeatureFileCatalog;
use geofeed_query_postgres::PostgresCatalog;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Where entities come from: a PostgreSQL/PostGIS schema or a GeoJSON file
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// PostgreSQL connection URL
    #[arg(
        long,
        env = "GEOFEED_DATABASE_URL",
        conflicts_with = "feature_file",
        required_unless_present = "feature_file"
    )]
    pub database_url: Option<String>,

    /// Schema whose tables are exposed
    #[arg(long, default_value = "public", env = "GEOFEED_SCHEMA")]
    pub schema: String,

    /// Table to hide, on top of the PostGIS internals (repeatable)
    #[arg(
        long = "exclude-table",
        env = "GEOFEED_EXCLUDE_TABLES",
        value_delimiter = ','
    )]
    pub exclude_tables: Vec<String>,

    /// GeoJSON FeatureCollection served as a single table
    #[arg(long, env = "GEOFEED_FEATURE_FILE")]
    pub feature_file: Option<PathBuf>,

    /// Table name of the feature file
    #[arg(long, default_value = "depot", env = "GEOFEED_FEATURE_TABLE")]
    pub feature_table: String,

    /// Feature property used as the key
    #[arg(long, default_value = "identifier", env = "GEOFEED_FEATURE_KEY")]
    pub feature_key: String,
}

impl SourceArgs {
    pub fn build(&self) -> anyhow::Result<Arc<dyn CatalogSource>> {
        if let Some(path) = &self.feature_file {
            let catalog =
                FeatureFileCatalog::new(path.clone(), &self.feature_table, &self.feature_key)
                    .context("Invalid feature file configuration")?;
            info!(
                "Serving table '{}' from feature file {}",
                self.feature_table,
                path.display()
            );
            return Ok(Arc::new(catalog));
        }

        let database_url = self
            .database_url
            .as_deref()
            .context("Either --database-url or --feature-file is required")?;

        let catalog = PostgresCatalog::new(database_url, &self.schema)
            .with_excluded_tables(self.exclude_tables.iter().cloned());
        info!(
            "Serving schema '{}' from PostgreSQL ({} tables excluded)",
            catalog.schema(),
            catalog.excluded_tables().len()
        );

        Ok(Arc::new(catalog))
    }
}
