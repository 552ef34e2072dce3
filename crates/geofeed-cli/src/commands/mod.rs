pub mod inspect;
pub mod serve;
pub mod source;

pub use inspect::InspectCommand;
pub use serve::ServeCommand;
pub use source::SourceArgs;
