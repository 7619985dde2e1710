//! Shared identity and spatial types for the scenescript workspace.

mod types;

pub use types::{ObjectId, ScriptId, Transform, Viewport};
