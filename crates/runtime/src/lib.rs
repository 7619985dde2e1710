//! Scene and script lifecycle core.
//!
//! # Invariants
//! - Scene names are unique within a registry.
//! - Exactly one scene/camera pair is active per render state.
//! - Within a frame every script's `update` runs before any `late_update`.
//! - `destroy` runs exactly once per detached script.

pub mod attach;
pub mod config;
mod error;
mod perf;
mod record;
mod registry;
mod runner;
#[cfg(test)]
mod testing;

pub use attach::{
    ScriptTarget, add_object_script, add_script, attach, destroy_scene, detach, detach_all,
    detach_object, remove_object_script, remove_script, set_script_enabled,
};
pub use config::{ConfigError, EngineConfig};
pub use error::SceneError;
pub use perf::{FrameTimer, PerformanceSampler};
pub use record::{ObjectScripts, SceneRecord};
pub use registry::SceneRegistry;
pub use runner::{FrameReport, LifecycleRunner};
