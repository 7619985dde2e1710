use scenescript_scene::{PerspectiveCamera, SceneGraph};

/// Where a draw or effect writes its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderTarget {
    Screen,
    /// One of the composer's offscreen buffers.
    Buffer(u8),
}

/// The graphics context the coordinator draws through.
///
/// Implementations own the real GPU resources; the coordinator only decides
/// whether and how a frame is drawn.
pub trait GraphicsDevice {
    /// Draw `scene` as seen from `camera` into `target`.
    fn draw(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera, target: RenderTarget);

    /// Run a full-screen effect reading `source` and writing `target`.
    fn apply_effect(&mut self, effect: &str, source: RenderTarget, target: RenderTarget);

    fn resize(&mut self, width: u32, height: u32);

    fn size(&self) -> (u32, u32);
}
