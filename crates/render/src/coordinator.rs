use std::cell::Cell;
use std::rc::Rc;

use scenescript_events::{EventBus, Listener, listener, names};
use tracing::{debug, info, trace};

use crate::composer::{EffectComposer, RenderPass, ScenePass};
use crate::device::{GraphicsDevice, RenderTarget};
use crate::state::{ContextStatus, RenderState};

/// Errors from coordinator configuration calls.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("post-processing composer has not been created; enable post-processing first")]
    ComposerMissing,
    #[error("no graphics device attached")]
    NoDevice,
}

/// Why `render` did not draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Scene, camera or device is missing.
    NotReady,
    ContextLost,
}

/// What one `render` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Drawn { via_composer: bool },
    Skipped(SkipReason),
}

impl RenderOutcome {
    pub fn drawn(&self) -> bool {
        matches!(self, Self::Drawn { .. })
    }
}

fn set_status(context: &Cell<ContextStatus>, status: ContextStatus) {
    if context.replace(status) != status {
        match status {
            ContextStatus::Lost => info!("graphics context lost; draw calls suspended"),
            ContextStatus::Live => info!("graphics context restored; draw calls resumed"),
        }
    }
}

/// Owns a [`RenderState`] and is the only code path that draws a frame.
#[derive(Default)]
pub struct RenderCoordinator {
    state: RenderState,
    bindings: Vec<(&'static str, Listener)>,
}

impl std::fmt::Debug for RenderCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bound: Vec<&str> = self.bindings.iter().map(|(event, _)| *event).collect();
        f.debug_struct("RenderCoordinator")
            .field("state", &self.state)
            .field("bound_events", &bound)
            .finish()
    }
}

impl RenderCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(device: Box<dyn GraphicsDevice>) -> Self {
        let mut coordinator = Self::new();
        coordinator.set_device(device);
        coordinator
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut RenderState {
        &mut self.state
    }

    pub fn set_device(&mut self, device: Box<dyn GraphicsDevice>) {
        let (width, height) = device.size();
        debug!(width, height, "graphics device attached");
        if let Some(composer) = self.state.composer.as_mut() {
            composer.set_size(width, height);
        }
        self.state.device = Some(device);
    }

    pub fn take_device(&mut self) -> Option<Box<dyn GraphicsDevice>> {
        self.state.device.take()
    }

    /// Scene, camera and device are all present.
    pub fn is_ready(&self) -> bool {
        self.state.active.is_some() && self.state.device.is_some()
    }

    /// Draw one frame: through the composer when post-processing is on,
    /// otherwise with a single direct draw. A composer that runs no passes
    /// falls back to the direct draw. A no-op while not ready or while
    /// the context is lost.
    pub fn render(&mut self) -> RenderOutcome {
        if self.state.context_lost() {
            trace!("render skipped: context lost");
            return RenderOutcome::Skipped(SkipReason::ContextLost);
        }
        let state = &mut self.state;
        let (Some(active), Some(device)) = (state.active.as_ref(), state.device.as_mut()) else {
            trace!("render skipped: not ready");
            return RenderOutcome::Skipped(SkipReason::NotReady);
        };

        let via_composer = {
            let scene = active.scene.borrow();
            let camera = active.camera.borrow();
            match state.composer.as_mut() {
                Some(composer) if state.post_processing_enabled => {
                    let ran = composer.render(&mut **device, &scene, &camera);
                    if ran == 0 {
                        debug!("composer ran no passes; drawing directly");
                        device.draw(&scene, &camera, RenderTarget::Screen);
                    }
                    ran > 0
                }
                _ => {
                    device.draw(&scene, &camera, RenderTarget::Screen);
                    false
                }
            }
        };
        state.frame_counter += 1;
        RenderOutcome::Drawn { via_composer }
    }

    /// Route frames through a composer, creating it (with a leading scene
    /// pass) on first use.
    pub fn enable_post_processing(&mut self) -> Result<(), RenderError> {
        if self.state.composer.is_none() {
            let (width, height) = self
                .state
                .device
                .as_ref()
                .ok_or(RenderError::NoDevice)?
                .size();
            let mut composer = EffectComposer::new(width, height);
            composer.add_pass(Box::new(ScenePass));
            self.state.composer = Some(composer);
            debug!(width, height, "post-processing composer created");
        }
        self.state.post_processing_enabled = true;
        Ok(())
    }

    /// Draw directly again. The composer and its passes are kept.
    pub fn disable_post_processing(&mut self) {
        self.state.post_processing_enabled = false;
    }

    /// Append a pass to the composer. Fails if no composer exists yet.
    pub fn add_pass(&mut self, pass: Box<dyn RenderPass>) -> Result<(), RenderError> {
        let composer = self
            .state
            .composer
            .as_mut()
            .ok_or(RenderError::ComposerMissing)?;
        debug!(pass = pass.name(), "render pass added");
        composer.add_pass(pass);
        Ok(())
    }

    pub fn remove_pass(&mut self, name: &str) -> Result<bool, RenderError> {
        let composer = self
            .state
            .composer
            .as_mut()
            .ok_or(RenderError::ComposerMissing)?;
        Ok(composer.remove_pass(name))
    }

    /// Forward a surface resize to the device and composer.
    pub fn resize(&mut self, width: u32, height: u32) {
        if let Some(device) = self.state.device.as_mut() {
            device.resize(width, height);
        }
        if let Some(composer) = self.state.composer.as_mut() {
            composer.set_size(width, height);
        }
    }

    /// `Live -> Lost`. Idempotent.
    pub fn handle_context_lost(&self) {
        set_status(&self.state.context, ContextStatus::Lost);
    }

    /// `Lost -> Live`. Resource re-acquisition is left to scripts.
    pub fn handle_context_restored(&self) {
        set_status(&self.state.context, ContextStatus::Live);
    }

    /// Follow the loss/restore events published on `bus`.
    pub fn bind_context_events(&mut self, bus: &EventBus) {
        self.unbind_context_events(bus);
        let lost = {
            let context = self.state.context.clone();
            listener(move |_| {
                set_status(&context, ContextStatus::Lost);
                Ok(())
            })
        };
        let restored = {
            let context = self.state.context.clone();
            listener(move |_| {
                set_status(&context, ContextStatus::Live);
                Ok(())
            })
        };
        bus.on(names::CONTEXT_LOST, lost.clone());
        bus.on(names::CONTEXT_RESTORED, restored.clone());
        self.bindings = vec![
            (names::CONTEXT_LOST, lost),
            (names::CONTEXT_RESTORED, restored),
        ];
    }

    pub fn unbind_context_events(&mut self, bus: &EventBus) {
        for (event, listener) in self.bindings.drain(..) {
            bus.off(event, &listener);
        }
    }

    /// Context status cell shared with bound listeners.
    pub fn context_handle(&self) -> Rc<Cell<ContextStatus>> {
        self.state.context.clone()
    }
}
