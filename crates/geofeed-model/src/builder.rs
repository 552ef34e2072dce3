//! Derives the entity model from a catalog snapshot.

use crate::entity::{
    Axis, EdmType, EntityDefinition, EntityModel, Property, PropertySource, RejectedTable,
};
use crate::naming::{
    collection_name, entity_name, format_property_name, LATITUDE_PROPERTY, LONGITUDE_PROPERTY,
};
use geofeed_query::{CatalogSnapshot, CatalogSource, ColumnFact, Result, ScanColumn};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Builds an [`EntityModel`] from whatever the catalog says right now.
///
/// Nothing is cached: every call re-reads the catalog, so schema changes show
/// up on the next request.
#[derive(Clone)]
pub struct EntityModelBuilder {
    source: Arc<dyn CatalogSource>,
}

impl EntityModelBuilder {
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self { source }
    }

    /// Run the four catalog listings
    pub async fn load_catalog(&self) -> Result<CatalogSnapshot> {
        let (tables, columns, geometry_columns, primary_keys) = futures::try_join!(
            self.source.list_tables(),
            self.source.list_columns(),
            self.source.list_geometry_columns(),
            self.source.list_primary_keys(),
        )?;

        Ok(CatalogSnapshot {
            tables,
            columns,
            geometry_columns,
            primary_keys,
        })
    }

    pub async fn build_entities(&self) -> Result<EntityModel> {
        let snapshot = self.load_catalog().await?;
        let model = Self::from_catalog(&snapshot);

        debug!(
            "Built {} entities from {} catalog",
            model.entities().len(),
            self.source.source_type()
        );

        Ok(model)
    }

    /// Derive the model from a snapshot.
    ///
    /// Tables are visited in name order. A table whose entity or collection
    /// name is already taken is left out and reported in
    /// [`EntityModel::rejected`].
    pub fn from_catalog(snapshot: &CatalogSnapshot) -> EntityModel {
        let mut entities: Vec<EntityDefinition> = Vec::new();
        let mut rejected = Vec::new();
        let mut collection_owners: HashMap<String, String> = HashMap::new();
        let mut name_owners: HashMap<String, String> = HashMap::new();

        for table in &snapshot.tables {
            let entity = build_entity(table, snapshot);

            let owner = collection_owners
                .get(&entity.collection)
                .or_else(|| name_owners.get(&entity.name));
            if let Some(owner) = owner {
                warn!(
                    "Table '{}' maps to collection '{}' already served by '{}'; skipping it",
                    table, entity.collection, owner
                );
                rejected.push(RejectedTable {
                    table: table.clone(),
                    collection: entity.collection,
                    conflicts_with: owner.clone(),
                });
                continue;
            }

            collection_owners.insert(entity.collection.clone(), table.clone());
            name_owners.insert(entity.name.clone(), table.clone());
            entities.push(entity);
        }

        EntityModel::new(entities, rejected)
    }
}

fn is_point_column(table: &str, column: &ColumnFact, snapshot: &CatalogSnapshot) -> bool {
    column.store_type.is_geometry()
        && snapshot
            .geometry_of(table, &column.name)
            .is_some_and(|g| g.is_point())
}

/// Build the definition of one table.
///
/// - a single-column primary key becomes the key property; composite or
///   missing keys leave the entity without one
/// - the first POINT column is split into `Latitude`/`Longitude` unless another
///   column already formats to either name
/// - display names that collide get the column ordinal appended
pub fn build_entity(table: &str, snapshot: &CatalogSnapshot) -> EntityDefinition {
    let columns = snapshot.columns_of(table);
    let primary_key = snapshot.primary_key_of(table);
    let key_column = match primary_key.as_slice() {
        [single] => Some(*single),
        _ => None,
    };

    let literal_names: HashSet<String> = columns
        .iter()
        .filter(|c| !is_point_column(table, c, snapshot))
        .map(|c| format_property_name(&c.name))
        .collect();
    let coordinates_free =
        !literal_names.contains(LATITUDE_PROPERTY) && !literal_names.contains(LONGITUDE_PROPERTY);

    let mut properties = Vec::new();
    let mut taken: HashSet<String> = HashSet::new();
    let mut geometry_column = None;

    for column in columns {
        if geometry_column.is_none() && coordinates_free && is_point_column(table, column, snapshot)
        {
            for axis in [Axis::Latitude, Axis::Longitude] {
                taken.insert(axis.property_name().to_string());
                properties.push(Property {
                    name: axis.property_name().to_string(),
                    edm_type: EdmType::Decimal,
                    is_key: false,
                    nullable: column.nullable,
                    source: PropertySource::Coordinate {
                        column: column.name.clone(),
                        axis,
                    },
                });
            }
            geometry_column = Some(column.name.clone());
            continue;
        }

        let is_key = key_column == Some(column.name.as_str());
        let name = unique_name(format_property_name(&column.name), column.ordinal, &taken);
        taken.insert(name.clone());

        properties.push(Property {
            name,
            edm_type: EdmType::from(&column.store_type),
            is_key,
            nullable: column.nullable && !is_key,
            source: PropertySource::Column {
                column: column.name.clone(),
            },
        });
    }

    EntityDefinition {
        name: entity_name(table),
        collection: collection_name(table),
        table: table.to_string(),
        properties,
        columns: columns
            .iter()
            .map(|c| ScanColumn {
                name: c.name.clone(),
                store_type: c.store_type.clone(),
            })
            .collect(),
        geometry_column,
    }
}

fn unique_name(name: String, ordinal: i32, taken: &HashSet<String>) -> String {
    if !taken.contains(&name) {
        return name;
    }

    let mut candidate = format!("{} {}", name, ordinal);
    let mut suffix = 2;
    while taken.contains(&candidate) {
        candidate = format!("{} {} {}", name, ordinal, suffix);
        suffix += 1;
    }
    candidate
}
