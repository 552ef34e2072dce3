use geofeed_core::ODataConfig;
use geofeed_model::EntityDefinition;
use serde::Serialize;
use utoipa::ToSchema;

/// Service document: every entity set the service exposes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ServiceRoot {
    #[serde(rename = "@odata.context")]
    #[schema(example = "http://localhost:8004/$metadata")]
    pub context: String,
    pub value: Vec<EntitySetReference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct EntitySetReference {
    #[schema(example = "Depots")]
    pub name: String,
    #[schema(example = "EntitySet")]
    pub kind: String,
    #[schema(example = "http://localhost:8004/Depots")]
    pub url: String,
}

/// List `entities` as entity sets, keeping their order
pub fn build_service_root(entities: &[EntityDefinition], config: &ODataConfig) -> ServiceRoot {
    ServiceRoot {
        context: config.metadata_url(),
        value: entities
            .iter()
            .map(|entity| EntitySetReference {
                name: entity.collection.clone(),
                kind: "EntitySet".to_string(),
                url: config.collection_url(&entity.collection),
            })
            .collect(),
    }
}
