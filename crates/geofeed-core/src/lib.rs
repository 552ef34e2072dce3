//! Core utilities and types shared across all Geofeed crates

pub mod config;
pub mod error_builder;
pub mod problemdetails;
pub use problemdetails::ProblemDetails;

// Re-export commonly used types
pub use config::*;
pub use error_builder::*;
