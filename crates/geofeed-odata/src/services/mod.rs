mod collection_service;
mod metadata;
mod service_root;

pub use collection_service::*;
pub use metadata::*;
pub use service_root::*;
