//! Name derivation between store identifiers and OData identifiers.
//!
//! Table names become PascalCase entity and collection names, with only the
//! last `_`-separated word inflected (`delivery_route` gives `DeliveryRoute`
//! and `DeliveryRoutes`). Column names become display names: `id` becomes
//! `ID`, anything else has `_` replaced by a space and each word capitalized.

use crate::inflection::{pluralize, singularize};
use inflector::Inflector;
use std::collections::BTreeSet;

/// Display name of a single-column `id` key
pub const ID_PROPERTY: &str = "ID";

/// Display names of the coordinate pair split out of a point column
pub const LATITUDE_PROPERTY: &str = "Latitude";
pub const LONGITUDE_PROPERTY: &str = "Longitude";

/// Apply `inflect` to the last word of a snake_case identifier
fn inflect_last_word(identifier: &str, inflect: fn(&str) -> String) -> String {
    let snake = identifier.to_snake_case();
    match snake.rsplit_once('_') {
        Some((head, last)) => format!("{}_{}", head, inflect(last)),
        None => inflect(&snake),
    }
}

/// Entity type name of a table: `depot` -> `Depot`, `people` -> `Person`
pub fn entity_name(table: &str) -> String {
    inflect_last_word(table, singularize).to_pascal_case()
}

/// Entity set name of a table: `depot` -> `Depots`, `person` -> `People`
pub fn collection_name(table: &str) -> String {
    inflect_last_word(table, pluralize).to_pascal_case()
}

/// Most likely table name behind a collection: `DeliveryRoutes` -> `delivery_route`
pub fn table_candidate(collection: &str) -> String {
    inflect_last_word(collection, singularize)
}

/// Find the table serving `collection`.
///
/// A table matches when its name equals the singular snake_case form of the
/// collection (ignoring ASCII case), or when the table's own collection name
/// is exactly `collection`. The second rule covers names the inflector cannot
/// invert, such as plural table names.
pub fn resolve_table<'a>(tables: &'a BTreeSet<String>, collection: &str) -> Option<&'a str> {
    let candidate = table_candidate(collection);

    tables
        .iter()
        .find(|table| table.eq_ignore_ascii_case(&candidate))
        .or_else(|| {
            tables
                .iter()
                .find(|table| collection_name(table) == collection)
        })
        .map(String::as_str)
}

/// Display name of a column: `established_at` -> `Established At`, `id` -> `ID`
pub fn format_property_name(column: &str) -> String {
    if column == "id" {
        return ID_PROPERTY.to_string();
    }

    column
        .split('_')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Column name of a display name: `Established At` -> `established_at`, `ID` -> `id`.
///
/// Exact inverse of [`format_property_name`] for lower-case column names.
pub fn reverse_property_name(property: &str) -> String {
    if property == ID_PROPERTY {
        return "id".to_string();
    }

    property.to_lowercase().replace(' ', "_")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
