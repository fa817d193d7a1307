pub mod loader;
pub mod schema;

pub use loader::{LoadedResources, ResourceLoader, Sourced};
