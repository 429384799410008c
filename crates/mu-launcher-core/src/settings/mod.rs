//! Launcher settings: a flat JSON document with defaults, plus the legacy
//! registry script that carries the client resolution.

pub mod persist;
pub mod registry;
pub mod store;

pub use registry::{apply_resolution, registry_script, write_registry_script};
pub use store::{keys, SettingsStore};
