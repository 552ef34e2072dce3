//! # geofeed-model
//!
//! Turns a store catalog into the OData entity model: one entity type and
//! entity set per table, with display-named properties, a key when the table
//! has a single-column primary key, and point geometry split into
//! `Latitude`/`Longitude`.

pub mod builder;
pub mod entity;
pub mod inflection;
pub mod naming;

pub use builder::{build_entity, EntityModelBuilder};
pub use entity::{
    Axis, EdmType, EntityDefinition, EntityModel, Property, PropertySource, RejectedTable,
};
pub use naming::{
    collection_name, entity_name, format_property_name, resolve_table, reverse_property_name,
    ID_PROPERTY, LATITUDE_PROPERTY, LONGITUDE_PROPERTY,
};
