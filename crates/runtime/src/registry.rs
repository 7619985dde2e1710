use std::collections::BTreeMap;

use scenescript_common::Viewport;
use scenescript_render::RenderState;
use scenescript_scene::{CameraSettings, PerspectiveCamera};
use tracing::{debug, warn};

use crate::error::SceneError;
use crate::record::SceneRecord;

/// Owns every named scene record and the name of the active one.
///
/// Two creation paths exist on purpose: [`SceneRegistry::create_or_get`]
/// silently reuses an existing record, [`SceneRegistry::register`] refuses
/// duplicates.
#[derive(Debug, Default)]
pub struct SceneRegistry {
    records: BTreeMap<String, SceneRecord>,
    active: Option<String>,
    viewport: Viewport,
    camera: CameraSettings,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose lazily created cameras use `camera` and the aspect of `viewport`.
    pub fn with_settings(viewport: Viewport, camera: CameraSettings) -> Self {
        Self {
            viewport,
            camera,
            ..Self::default()
        }
    }

    /// Existing record for `name`, or a new one with a fresh graph and default camera.
    pub fn create_or_get(&mut self, name: &str) -> &mut SceneRecord {
        let settings = self.camera;
        let aspect = self.viewport.aspect();
        self.records.entry(name.to_string()).or_insert_with(|| {
            debug!(scene = name, "scene record created");
            SceneRecord::new(name, PerspectiveCamera::new(settings, aspect))
        })
    }

    /// Insert a fully formed record. Fails if the name is taken.
    pub fn register(&mut self, record: SceneRecord) -> Result<(), SceneError> {
        if self.records.contains_key(record.name()) {
            return Err(SceneError::AlreadyExists(record.name().to_string()));
        }
        debug!(scene = record.name(), "scene record registered");
        self.records.insert(record.name().to_string(), record);
        Ok(())
    }

    /// Publish `name`'s scene and camera as the active pair of `state`.
    pub fn set_active(&mut self, name: &str, state: &mut RenderState) -> Result<(), SceneError> {
        let record = self
            .records
            .get(name)
            .ok_or_else(|| SceneError::NotFound(name.to_string()))?;
        state.set_active_scene(record.as_active());
        self.active = Some(name.to_string());
        debug!(scene = name, "active scene switched");
        Ok(())
    }

    /// Remove a record without touching its scripts. If it was the active
    /// scene, `state` stops drawing it.
    ///
    /// Callers detach scripts first (see [`crate::destroy_scene`]) so every
    /// `destroy` hook runs.
    pub fn remove(
        &mut self,
        name: &str,
        state: &mut RenderState,
    ) -> Result<SceneRecord, SceneError> {
        let record = self
            .records
            .remove(name)
            .ok_or_else(|| SceneError::NotFound(name.to_string()))?;
        if record.script_count() > 0 {
            warn!(
                scene = name,
                scripts = record.script_count(),
                "scene removed with scripts still attached"
            );
        }
        if self.active.as_deref() == Some(name) {
            self.active = None;
        }
        if state.active_scene_name() == Some(name) {
            state.clear_active_scene();
        }
        debug!(scene = name, "scene record removed");
        Ok(record)
    }

    /// Drop every record and the active pointer, and unpublish the active
    /// pair from `state`. Process teardown only.
    pub fn reset_all(&mut self, state: &mut RenderState) {
        debug!(scenes = self.records.len(), "scene registry reset");
        self.records.clear();
        self.active = None;
        state.clear_active_scene();
    }

    pub fn get(&self, name: &str) -> Option<&SceneRecord> {
        self.records.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut SceneRecord> {
        self.records.get_mut(name)
    }

    pub(crate) fn require_mut(&mut self, name: &str) -> Result<&mut SceneRecord, SceneError> {
        self.records
            .get_mut(name)
            .ok_or_else(|| SceneError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn records(&self) -> impl Iterator<Item = &SceneRecord> {
        self.records.values()
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active(&self) -> Option<&SceneRecord> {
        self.active.as_deref().and_then(|name| self.records.get(name))
    }

    pub fn active_mut(&mut self) -> Option<&mut SceneRecord> {
        match self.active.as_deref() {
            Some(name) => self.records.get_mut(name),
            None => None,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Record a new surface size and update every camera's aspect.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        let aspect = viewport.aspect();
        for record in self.records.values() {
            record.camera().borrow_mut().set_aspect(aspect);
        }
    }
}
