//! Launching and controlling game clients.

pub mod config;
pub mod controller;
pub mod discovery;
pub mod scanner;

pub use config::{LaunchConfig, Resolution};
pub use controller::{LaunchController, LaunchOutcome};
pub use discovery::{DiscoveryOutcome, DiscoveryState};
pub use scanner::BackgroundScan;
