//! HTTP handlers for the OData endpoints

mod handler;
mod types;

pub use handler::*;
pub use types::*;
