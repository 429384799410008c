//! Launcher/client updates from a remote manifest.
//!
//! The manifest (`<update_url>/launcher-manifest.json`) names a version, a
//! zip archive and its SHA-256. Archives are downloaded to a `.part` file,
//! verified, extracted to a staging directory and only then moved over the
//! launcher root.

pub mod manager;
pub mod manifest;
pub mod worker;

pub use manager::{UpdateCheck, UpdateManager};
pub use manifest::{is_newer_version, manifest_url, UpdateManifest};
pub use worker::UpdateWorker;
