//! CSDL (EDMX 4.0) metadata document.

use crate::error::ODataError;
use geofeed_model::EntityDefinition;
use quick_xml::se::Serializer;
use serde::Serialize;

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n";
const EDMX_NAMESPACE: &str = "http://docs.oasis-open.org/odata/ns/edmx";
const EDM_NAMESPACE: &str = "http://docs.oasis-open.org/odata/ns/edm";

/// Name of the single entity container
pub const CONTAINER_NAME: &str = "Container";

#[derive(Serialize)]
struct DataServices<'a> {
    #[serde(rename = "Schema")]
    schema: Schema<'a>,
}

#[derive(Serialize)]
struct Edmx<'a> {
    #[serde(rename = "@xmlns:edmx")]
    xmlns_edmx: &'static str,
    #[serde(rename = "@Version")]
    version: &'static str,
    #[serde(rename = "edmx:DataServices")]
    data_services: DataServices<'a>,
}

#[derive(Serialize)]
struct Schema<'a> {
    #[serde(rename = "@xmlns")]
    xmlns: &'static str,
    #[serde(rename = "@Namespace")]
    namespace: &'a str,
    #[serde(rename = "EntityType")]
    entity_types: Vec<EntityType<'a>>,
    #[serde(rename = "EntityContainer")]
    container: EntityContainer,
}

#[derive(Serialize)]
struct EntityType<'a> {
    #[serde(rename = "@Name")]
    name: &'a str,
    #[serde(rename = "Key", skip_serializing_if = "Option::is_none")]
    key: Option<Key<'a>>,
    #[serde(rename = "Property")]
    properties: Vec<PropertyElement<'a>>,
}

#[derive(Serialize)]
struct Key<'a> {
    #[serde(rename = "PropertyRef")]
    property_ref: PropertyRef<'a>,
}

#[derive(Serialize)]
struct PropertyRef<'a> {
    #[serde(rename = "@Name")]
    name: &'a str,
}

#[derive(Serialize)]
struct PropertyElement<'a> {
    #[serde(rename = "@Name")]
    name: &'a str,
    #[serde(rename = "@Type")]
    edm_type: &'static str,
    #[serde(rename = "@Nullable")]
    nullable: bool,
}

#[derive(Serialize)]
struct EntityContainer {
    #[serde(rename = "@Name")]
    name: &'static str,
    #[serde(rename = "EntitySet")]
    entity_sets: Vec<EntitySet>,
}

#[derive(Serialize)]
struct EntitySet {
    #[serde(rename = "@Name")]
    name: String,
    #[serde(rename = "@EntityType")]
    entity_type: String,
}

/// Render the metadata document for `entities`, in the order given.
///
/// Output depends only on its inputs, so an unchanged catalog always yields
/// a byte-identical document.
pub fn render_metadata(namespace: &str, entities: &[EntityDefinition]) -> Result<String, ODataError> {
    let document = Edmx {
        xmlns_edmx: EDMX_NAMESPACE,
        version: "4.0",
        data_services: DataServices {
            schema: Schema {
                xmlns: EDM_NAMESPACE,
                namespace,
                entity_types: entities.iter().map(entity_type).collect(),
                container: EntityContainer {
                    name: CONTAINER_NAME,
                    entity_sets: entities
                        .iter()
                        .map(|entity| EntitySet {
                            name: entity.collection.clone(),
                            entity_type: format!("{}.{}", namespace, entity.name),
                        })
                        .collect(),
                },
            },
        },
    };

    let mut body = String::from(XML_DECLARATION);
    let mut serializer = Serializer::with_root(&mut body, Some("edmx:Edmx"))
        .map_err(|e| ODataError::Rendering(e.to_string()))?;
    serializer.indent(' ', 2);
    document
        .serialize(serializer)
        .map_err(|e| ODataError::Rendering(e.to_string()))?;

    Ok(body)
}

fn entity_type(entity: &EntityDefinition) -> EntityType<'_> {
    EntityType {
        name: &entity.name,
        key: entity.key_property().map(|name| Key {
            property_ref: PropertyRef { name },
        }),
        properties: entity
            .properties
            .iter()
            .map(|p| PropertyElement {
                name: &p.name,
                edm_type: p.edm_type.as_edm(),
                nullable: p.nullable,
            })
            .collect(),
    }
}
