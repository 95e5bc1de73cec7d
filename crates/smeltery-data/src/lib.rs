//! File-backed configuration and item definitions for `smeltery-core`.

pub mod loader;
pub mod schema;

pub use loader::{DataLoadError, load_registry, load_settings, save_settings};
