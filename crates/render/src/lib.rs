//! Render Coordinator: the single frame-draw entry point.
//!
//! # Invariants
//! - Post-processing enabled implies a composer exists.
//! - No draw call is issued while the graphics context is lost.
//! - Callers never draw on the device directly; `RenderCoordinator::render`
//!   decides between the composer and a direct draw.

mod composer;
mod coordinator;
mod device;
mod state;
mod text;

pub use composer::{EffectComposer, EffectPass, RenderPass, ScenePass};
pub use coordinator::{RenderCoordinator, RenderError, RenderOutcome, SkipReason};
pub use device::{GraphicsDevice, RenderTarget};
pub use state::{ActiveScene, ContextStatus, RenderState};
pub use text::{DebugTextDevice, FrameRecorder};
