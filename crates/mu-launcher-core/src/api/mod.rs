//! API implementation submodules.
//!
//! Each submodule holds `impl LauncherApi` blocks for one area. The struct
//! itself is defined in `lib.rs`.

mod builder;
mod game;
mod settings;
mod state;
mod updates;

pub use builder::LauncherApiBuilder;
pub(crate) use state::ApiState;
