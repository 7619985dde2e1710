use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use scenescript_common::{ObjectId, ScriptId};
use scenescript_render::ActiveScene;
use scenescript_scene::{PerspectiveCamera, SceneGraph, ScriptHandle};

/// Per-object script lists, iterated in the order objects first received a script.
#[derive(Debug, Clone, Default)]
pub struct ObjectScripts {
    entries: Vec<(ObjectId, Vec<ScriptHandle>)>,
}

impl ObjectScripts {
    pub fn get(&self, object: ObjectId) -> Option<&[ScriptHandle]> {
        self.entries
            .iter()
            .find(|(id, _)| *id == object)
            .map(|(_, scripts)| scripts.as_slice())
    }

    pub fn contains(&self, object: ObjectId) -> bool {
        self.get(object).is_some()
    }

    /// Number of objects with at least one script.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn objects(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &[ScriptHandle])> {
        self.entries
            .iter()
            .map(|(id, scripts)| (*id, scripts.as_slice()))
    }

    pub(crate) fn push(&mut self, object: ObjectId, script: ScriptHandle) {
        match self.entries.iter_mut().find(|(id, _)| *id == object) {
            Some((_, scripts)) => scripts.push(script),
            None => self.entries.push((object, vec![script])),
        }
    }

    pub(crate) fn get_mut(&mut self, object: ObjectId) -> Option<&mut Vec<ScriptHandle>> {
        self.entries
            .iter_mut()
            .find(|(id, _)| *id == object)
            .map(|(_, scripts)| scripts)
    }

    pub(crate) fn remove(&mut self, object: ObjectId) -> Option<Vec<ScriptHandle>> {
        let index = self.entries.iter().position(|(id, _)| *id == object)?;
        Some(self.entries.remove(index).1)
    }

    /// Drop entries whose list is empty.
    pub(crate) fn prune(&mut self) {
        self.entries.retain(|(_, scripts)| !scripts.is_empty());
    }
}

/// One named scene: its graph, camera and the scripts bound to it.
#[derive(Debug)]
pub struct SceneRecord {
    name: String,
    scene: Rc<RefCell<SceneGraph>>,
    camera: Rc<RefCell<PerspectiveCamera>>,
    pub(crate) scripts: Vec<ScriptHandle>,
    pub(crate) object_scripts: ObjectScripts,
    pub(crate) started_scripts: HashSet<ScriptId>,
}

impl SceneRecord {
    pub fn new(name: impl Into<String>, camera: PerspectiveCamera) -> Self {
        Self::with_parts(name, SceneGraph::new(), camera)
    }

    /// Build a record around an already populated graph.
    pub fn with_parts(
        name: impl Into<String>,
        scene: SceneGraph,
        camera: PerspectiveCamera,
    ) -> Self {
        Self {
            name: name.into(),
            scene: Rc::new(RefCell::new(scene)),
            camera: Rc::new(RefCell::new(camera)),
            scripts: Vec::new(),
            object_scripts: ObjectScripts::default(),
            started_scripts: HashSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scene(&self) -> &Rc<RefCell<SceneGraph>> {
        &self.scene
    }

    pub fn camera(&self) -> &Rc<RefCell<PerspectiveCamera>> {
        &self.camera
    }

    /// Scripts bound to the whole scene, in attachment order.
    pub fn scripts(&self) -> &[ScriptHandle] {
        &self.scripts
    }

    pub fn object_scripts(&self) -> &ObjectScripts {
        &self.object_scripts
    }

    pub fn started_scripts(&self) -> &HashSet<ScriptId> {
        &self.started_scripts
    }

    pub fn has_started(&self, script: &ScriptHandle) -> bool {
        self.started_scripts.contains(&script.id())
    }

    /// Frame visit order: scene scripts, then object scripts grouped by object.
    pub fn ordered_scripts(&self) -> Vec<ScriptHandle> {
        self.scripts
            .iter()
            .chain(self.object_scripts.iter().flat_map(|(_, scripts)| scripts))
            .cloned()
            .collect()
    }

    pub fn script_count(&self) -> usize {
        self.scripts.len()
            + self
                .object_scripts
                .iter()
                .map(|(_, scripts)| scripts.len())
                .sum::<usize>()
    }

    pub(crate) fn as_active(&self) -> ActiveScene {
        ActiveScene {
            name: self.name.clone(),
            scene: self.scene.clone(),
            camera: self.camera.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Recorder;

    #[test]
    fn new_record_is_empty() {
        let record = SceneRecord::new("lobby", PerspectiveCamera::default());
        assert_eq!(record.name(), "lobby");
        assert_eq!(record.script_count(), 0);
        assert!(record.object_scripts().is_empty());
        assert!(record.started_scripts().is_empty());
    }

    #[test]
    fn ordered_scripts_puts_scene_scripts_first() {
        let rec = Recorder::new();
        let mut record = SceneRecord::new("s", PerspectiveCamera::default());
        let lamp = ObjectId::new();
        let door = ObjectId::new();
        let a = rec.handle("a");
        let b = rec.handle("b");
        let c = rec.handle("c");
        let d = rec.handle("d");

        record.object_scripts.push(lamp, b.clone());
        record.object_scripts.push(door, c.clone());
        record.object_scripts.push(lamp, d.clone());
        record.scripts.push(a.clone());

        assert_eq!(record.ordered_scripts(), vec![a, b, d, c]);
        assert_eq!(record.script_count(), 4);
        assert_eq!(record.object_scripts().objects().collect::<Vec<_>>(), [lamp, door]);
    }

    #[test]
    fn object_scripts_prune_removes_empty_entries() {
        let rec = Recorder::new();
        let mut scripts = ObjectScripts::default();
        let lamp = ObjectId::new();
        scripts.push(lamp, rec.handle("a"));
        scripts.get_mut(lamp).unwrap().clear();
        scripts.prune();
        assert!(!scripts.contains(lamp));
        assert!(scripts.remove(lamp).is_none());
    }
}
