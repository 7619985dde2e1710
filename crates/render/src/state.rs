use std::cell::{Cell, RefCell};
use std::rc::Rc;

use scenescript_scene::{PerspectiveCamera, SceneGraph};

use crate::composer::EffectComposer;
use crate::device::GraphicsDevice;

/// Graphics context availability. `Live -> Lost -> Live` are the only transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextStatus {
    #[default]
    Live,
    Lost,
}

/// The scene/camera pair currently published for drawing.
#[derive(Debug, Clone)]
pub struct ActiveScene {
    pub name: String,
    pub scene: Rc<RefCell<SceneGraph>>,
    pub camera: Rc<RefCell<PerspectiveCamera>>,
}

/// Live render handles: device, active scene and camera, frame counter,
/// context status and the optional post-processing composer.
///
/// One instance per coordinator; nothing here is process-global.
#[derive(Default)]
pub struct RenderState {
    pub(crate) device: Option<Box<dyn GraphicsDevice>>,
    pub(crate) active: Option<ActiveScene>,
    pub(crate) frame_counter: u64,
    pub(crate) context: Rc<Cell<ContextStatus>>,
    pub(crate) post_processing_enabled: bool,
    pub(crate) composer: Option<EffectComposer>,
}

impl RenderState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a scene and its camera in one assignment.
    ///
    /// The scene registry is the owner of this pointer: it publishes on
    /// `set_active` and clears on `remove`/`reset_all`.
    pub fn set_active_scene(&mut self, active: ActiveScene) {
        self.active = Some(active);
    }

    pub fn clear_active_scene(&mut self) -> Option<ActiveScene> {
        self.active.take()
    }

    pub fn active_scene(&self) -> Option<&ActiveScene> {
        self.active.as_ref()
    }

    pub fn active_scene_name(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.name.as_str())
    }

    pub fn scene(&self) -> Option<&Rc<RefCell<SceneGraph>>> {
        self.active.as_ref().map(|a| &a.scene)
    }

    pub fn camera(&self) -> Option<&Rc<RefCell<PerspectiveCamera>>> {
        self.active.as_ref().map(|a| &a.camera)
    }

    pub fn device(&self) -> Option<&dyn GraphicsDevice> {
        self.device.as_deref()
    }

    pub fn has_device(&self) -> bool {
        self.device.is_some()
    }

    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    pub fn context_status(&self) -> ContextStatus {
        self.context.get()
    }

    pub fn context_lost(&self) -> bool {
        self.context.get() == ContextStatus::Lost
    }

    pub fn post_processing_enabled(&self) -> bool {
        self.post_processing_enabled
    }

    pub fn composer(&self) -> Option<&EffectComposer> {
        self.composer.as_ref()
    }
}

impl std::fmt::Debug for RenderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderState")
            .field("device", &self.device.as_ref().map(|d| d.size()))
            .field("active_scene", &self.active_scene_name())
            .field("frame_counter", &self.frame_counter)
            .field("context", &self.context.get())
            .field("post_processing_enabled", &self.post_processing_enabled)
            .field("composer", &self.composer)
            .finish()
    }
}
