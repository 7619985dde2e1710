//! Scene model: the node graph owned by a scene record, its camera, and the
//! contract every attachable script implements.
//!
//! # Invariants
//! - The graph root cannot be removed.
//! - A script's `destroy` hook runs at most once over the handle's lifetime.

mod camera;
mod graph;
mod script;

pub use camera::{CameraSettings, PerspectiveCamera};
pub use graph::{GraphError, SceneGraph, SceneNode};
pub use script::{HookSet, Script, ScriptHandle, ScriptHost, StartFuture, StartOutcome};
