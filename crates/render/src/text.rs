use std::cell::RefCell;
use std::fmt::Write as _;
use std::rc::Rc;

use scenescript_scene::{PerspectiveCamera, SceneGraph};

use crate::device::{GraphicsDevice, RenderTarget};

/// Counters for every call, text for the latest frame only.
#[derive(Debug, Default)]
struct Recording {
    draw_calls: u64,
    effect_calls: u64,
    last_frame: Option<String>,
    effects: Vec<String>,
}

/// Read side of a [`DebugTextDevice`], usable after the device has been
/// handed to a coordinator.
#[derive(Debug, Clone, Default)]
pub struct FrameRecorder(Rc<RefCell<Recording>>);

impl FrameRecorder {
    pub fn draw_calls(&self) -> u64 {
        self.0.borrow().draw_calls
    }

    pub fn effect_calls(&self) -> u64 {
        self.0.borrow().effect_calls
    }

    pub fn last_frame(&self) -> Option<String> {
        self.0.borrow().last_frame.clone()
    }

    /// Effects applied since the last draw, formatted as
    /// `name:source->target`.
    pub fn effects(&self) -> Vec<String> {
        self.0.borrow().effects.clone()
    }
}

/// Text device: writes a human-readable description of each draw.
///
/// Used by the CLI and by tests in place of a GPU backend.
#[derive(Debug)]
pub struct DebugTextDevice {
    width: u32,
    height: u32,
    recording: FrameRecorder,
}

impl DebugTextDevice {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            recording: FrameRecorder::default(),
        }
    }

    pub fn recorder(&self) -> FrameRecorder {
        self.recording.clone()
    }
}

impl GraphicsDevice for DebugTextDevice {
    fn draw(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera, target: RenderTarget) {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Frame -> {target:?} ({}x{}) objects={} ===",
            self.width,
            self.height,
            scene.object_count()
        );
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0} aspect={:.2}",
            camera.position.x,
            camera.position.y,
            camera.position.z,
            camera.target.x,
            camera.target.y,
            camera.target.z,
            camera.fov_degrees,
            camera.aspect
        );
        for node in scene.visible_objects() {
            let p = node.transform.position;
            let _ = writeln!(
                out,
                "  [{}] {} pos=({:.2}, {:.2}, {:.2})",
                node.id, node.name, p.x, p.y, p.z
            );
        }

        let mut rec = self.recording.0.borrow_mut();
        rec.draw_calls += 1;
        rec.last_frame = Some(out);
        rec.effects.clear();
    }

    fn apply_effect(&mut self, effect: &str, source: RenderTarget, target: RenderTarget) {
        let mut rec = self.recording.0.borrow_mut();
        rec.effect_calls += 1;
        rec.effects.push(format!("{effect}:{source:?}->{target:?}"));
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
