use scenescript_scene::{PerspectiveCamera, SceneGraph};
use tracing::trace;

use crate::device::{GraphicsDevice, RenderTarget};

/// One stage of the post-processing pipeline.
pub trait RenderPass {
    fn name(&self) -> &str;

    fn enabled(&self) -> bool {
        true
    }

    /// Whether this pass draws the scene rather than filtering a buffer.
    fn draws_scene(&self) -> bool {
        false
    }

    /// Read `read`, write `write`. The last enabled pass writes to the screen.
    fn render(
        &mut self,
        device: &mut dyn GraphicsDevice,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
        read: RenderTarget,
        write: RenderTarget,
    );

    fn set_size(&mut self, _width: u32, _height: u32) {}
}

/// Draws the scene itself. Always the first pass of a composer built by the
/// coordinator.
#[derive(Debug, Default)]
pub struct ScenePass;

impl RenderPass for ScenePass {
    fn name(&self) -> &str {
        "scene"
    }

    fn draws_scene(&self) -> bool {
        true
    }

    fn render(
        &mut self,
        device: &mut dyn GraphicsDevice,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
        _read: RenderTarget,
        write: RenderTarget,
    ) {
        device.draw(scene, camera, write);
    }
}

/// Named full-screen effect applied by the device (bloom, outline, FXAA, ...).
#[derive(Debug, Clone)]
pub struct EffectPass {
    name: String,
    pub enabled: bool,
}

impl EffectPass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
        }
    }
}

impl RenderPass for EffectPass {
    fn name(&self) -> &str {
        &self.name
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn render(
        &mut self,
        device: &mut dyn GraphicsDevice,
        _scene: &SceneGraph,
        _camera: &PerspectiveCamera,
        read: RenderTarget,
        write: RenderTarget,
    ) {
        device.apply_effect(&self.name, read, write);
    }
}

/// Ordered post-processing pipeline ping-ponging between two offscreen buffers.
pub struct EffectComposer {
    passes: Vec<Box<dyn RenderPass>>,
    width: u32,
    height: u32,
}

impl EffectComposer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            passes: Vec::new(),
            width,
            height,
        }
    }

    pub fn add_pass(&mut self, mut pass: Box<dyn RenderPass>) {
        pass.set_size(self.width, self.height);
        self.passes.push(pass);
    }

    /// Remove the first pass with `name`. Returns whether one was removed.
    pub fn remove_pass(&mut self, name: &str) -> bool {
        match self.passes.iter().position(|p| p.name() == name) {
            Some(index) => {
                self.passes.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        for pass in &mut self.passes {
            pass.set_size(width, height);
        }
    }

    /// Run every enabled pass in order. Returns how many ran.
    ///
    /// Nothing runs unless the first enabled pass draws the scene, so effects
    /// never read a buffer that was not written this frame.
    pub fn render(
        &mut self,
        device: &mut dyn GraphicsDevice,
        scene: &SceneGraph,
        camera: &PerspectiveCamera,
    ) -> usize {
        match self.passes.iter().find(|p| p.enabled()) {
            Some(first) if first.draws_scene() => {}
            _ => {
                trace!(passes = ?self.pass_names(), "composer has no leading scene pass");
                return 0;
            }
        }
        let enabled = self.passes.iter().filter(|p| p.enabled()).count();
        let mut read = RenderTarget::Buffer(0);
        let mut ran = 0;
        for pass in self.passes.iter_mut().filter(|p| p.enabled()) {
            ran += 1;
            let write = if ran == enabled {
                RenderTarget::Screen
            } else if read == RenderTarget::Buffer(0) {
                RenderTarget::Buffer(1)
            } else {
                RenderTarget::Buffer(0)
            };
            trace!(pass = pass.name(), ?read, ?write, "composer pass");
            pass.render(device, scene, camera, read, write);
            read = write;
        }
        ran
    }
}

impl std::fmt::Debug for EffectComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectComposer")
            .field("passes", &self.pass_names())
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}
