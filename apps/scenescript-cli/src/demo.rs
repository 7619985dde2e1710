//! Demo scene: a spinning cube on a floor, an orbiting camera, a slow
//! asset loader and a render counter.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::task::Poll;

use futures::future::poll_fn;
use glam::{Quat, Vec3};
use scenescript_common::{ObjectId, Transform};
use scenescript_runtime::{SceneError, SceneRegistry, add_object_script, add_script};
use scenescript_scene::{
    HookSet, PerspectiveCamera, SceneGraph, Script, ScriptHandle, ScriptHost, StartOutcome,
};
use tracing::{debug, info};

/// Rotates and bobs one object.
struct Spinner {
    object: ObjectId,
    scene: Rc<RefCell<SceneGraph>>,
    speed: f32,
    elapsed: f32,
}

impl Script for Spinner {
    fn host(&self) -> ScriptHost {
        ScriptHost::Object(self.object)
    }

    fn name(&self) -> Option<&str> {
        Some("spinner")
    }

    fn hooks(&self) -> HookSet {
        HookSet::UPDATE
    }

    fn update(&mut self, dt: f32) {
        self.elapsed += dt;
        let mut scene = self.scene.borrow_mut();
        if let Some(node) = scene.get_mut(self.object) {
            node.transform.rotation = Quat::from_rotation_y(self.elapsed * self.speed);
            node.transform.position.y = 0.5 + (self.elapsed * 2.0).sin() * 0.25;
        }
    }
}

/// Circles the camera around the origin after objects have moved.
struct OrbitCamera {
    camera: Rc<RefCell<PerspectiveCamera>>,
    radius: f32,
    height: f32,
    angle: f32,
    speed: f32,
}

impl Script for OrbitCamera {
    fn host(&self) -> ScriptHost {
        ScriptHost::Camera
    }

    fn name(&self) -> Option<&str> {
        Some("orbit-camera")
    }

    fn hooks(&self) -> HookSet {
        HookSet::LATE_UPDATE | HookSet::RESIZE
    }

    fn late_update(&mut self, dt: f32) {
        self.angle += dt * self.speed;
        let mut camera = self.camera.borrow_mut();
        camera.position = Vec3::new(
            self.angle.cos() * self.radius,
            self.height,
            self.angle.sin() * self.radius,
        );
        camera.look_at(Vec3::ZERO);
    }

    fn on_resize(&mut self, width: u32, height: u32) {
        info!(width, height, "orbit camera saw resize");
    }
}

/// Scene script whose `start` takes a few frames to finish.
struct AssetLoader {
    frames: u32,
    loaded: Rc<Cell<bool>>,
}

impl Script for AssetLoader {
    fn host(&self) -> ScriptHost {
        ScriptHost::Scene
    }

    fn name(&self) -> Option<&str> {
        Some("asset-loader")
    }

    fn hooks(&self) -> HookSet {
        HookSet::START | HookSet::UPDATE
    }

    fn start(&mut self) -> anyhow::Result<StartOutcome> {
        let mut remaining = self.frames;
        let loaded = self.loaded.clone();
        Ok(StartOutcome::pending(poll_fn(move |_| {
            if remaining == 0 {
                loaded.set(true);
                info!("assets loaded");
                return Poll::Ready(Ok(()));
            }
            remaining -= 1;
            Poll::Pending
        })))
    }

    fn update(&mut self, _dt: f32) {
        if !self.loaded.get() {
            debug!("update while assets are still loading");
        }
    }
}

/// Counts render callbacks on the renderer host.
#[derive(Debug, Default)]
pub struct RenderStats {
    pub pre_render: u64,
    pub post_render: u64,
}

impl Script for RenderStats {
    fn host(&self) -> ScriptHost {
        ScriptHost::Renderer
    }

    fn name(&self) -> Option<&str> {
        Some("render-stats")
    }

    fn hooks(&self) -> HookSet {
        HookSet::PRE_RENDER | HookSet::POST_RENDER | HookSet::DESTROY
    }

    fn on_pre_render(&mut self) {
        self.pre_render += 1;
    }

    fn on_post_render(&mut self) {
        self.post_render += 1;
    }

    fn destroy(&mut self) -> anyhow::Result<()> {
        info!(
            pre_render = self.pre_render,
            post_render = self.post_render,
            "render stats"
        );
        Ok(())
    }
}

/// Handles into a populated demo scene.
pub struct Demo {
    pub cube: ObjectId,
    pub floor: ObjectId,
    pub loaded: Rc<Cell<bool>>,
    pub stats: Rc<RefCell<RenderStats>>,
}

/// Build the demo objects in `name` (creating the scene if needed) and
/// attach its scripts. `load_frames` is how many frames `start` of the
/// loader stays pending.
pub fn populate(
    registry: &mut SceneRegistry,
    name: &str,
    load_frames: u32,
) -> Result<Demo, SceneError> {
    let (scene, camera) = {
        let record = registry.create_or_get(name);
        (record.scene().clone(), record.camera().clone())
    };
    let (cube, floor) = {
        let mut graph = scene.borrow_mut();
        let floor = graph.add("floor", Transform::default());
        let cube = graph.add("cube", Transform::from_position(Vec3::new(0.0, 0.5, 0.0)));
        (cube, floor)
    };

    let loaded = Rc::new(Cell::new(false));
    let stats = Rc::new(RefCell::new(RenderStats::default()));

    add_script(
        registry,
        name,
        &ScriptHandle::new(AssetLoader {
            frames: load_frames,
            loaded: loaded.clone(),
        }),
    )?;
    add_script(registry, name, &ScriptHandle::from_shared(stats.clone()))?;
    add_script(
        registry,
        name,
        &ScriptHandle::new(OrbitCamera {
            camera,
            radius: 6.0,
            height: 3.0,
            angle: 0.0,
            speed: 0.5,
        }),
    )?;
    add_object_script(
        registry,
        name,
        cube,
        &ScriptHandle::new(Spinner {
            object: cube,
            scene,
            speed: 1.5,
            elapsed: 0.0,
        }),
    )?;
    debug!(scene = name, %cube, %floor, "demo scene populated");

    Ok(Demo {
        cube,
        floor,
        loaded,
        stats,
    })
}
