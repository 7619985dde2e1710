//! Script Attachment Manager: binds scripts to a whole scene or to one scene
//! object and tears them down again.
//!
//! Attachment runs `awake` (and `on_enable` for enabled scripts) before
//! returning. Detachment runs `on_disable` and `destroy` before returning and
//! never waits on a pending `start`.

use scenescript_common::ObjectId;
use scenescript_render::RenderState;
use scenescript_scene::ScriptHandle;
use tracing::debug;

use crate::error::SceneError;
use crate::record::SceneRecord;
use crate::registry::SceneRegistry;

/// Which sequence of a scene record a script is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptTarget {
    Scene,
    Object(ObjectId),
}

/// Bind `script` to `target` in scene `scene`.
pub fn attach(
    registry: &mut SceneRegistry,
    scene: &str,
    target: ScriptTarget,
    script: &ScriptHandle,
) -> Result<(), SceneError> {
    let record = registry.require_mut(scene)?;
    if script.is_destroyed() {
        return Err(SceneError::Destroyed(script.label().to_string()));
    }
    if script.is_attached() {
        return Err(SceneError::AlreadyAttached(script.label().to_string()));
    }
    match target {
        ScriptTarget::Scene => record.scripts.push(script.clone()),
        ScriptTarget::Object(object) => record.object_scripts.push(object, script.clone()),
    }
    debug!(scene, script = script.label(), ?target, "script attached");
    script.attach();
    Ok(())
}

/// Unbind `script` from `target`, running its teardown hooks once.
pub fn detach(
    registry: &mut SceneRegistry,
    scene: &str,
    target: ScriptTarget,
    script: &ScriptHandle,
) -> Result<(), SceneError> {
    let record = registry.require_mut(scene)?;
    let (list, owner) = match target {
        ScriptTarget::Scene => (&mut record.scripts, format!("scene {scene}")),
        ScriptTarget::Object(object) => {
            let list = record.object_scripts.get_mut(object).ok_or_else(|| {
                SceneError::ObjectHasNoScripts {
                    scene: scene.to_string(),
                    object,
                }
            })?;
            (list, format!("object {object} in scene {scene}"))
        }
    };
    let index = list
        .iter()
        .position(|s| s == script)
        .ok_or_else(|| SceneError::ScriptNotFound {
            script: script.label().to_string(),
            owner,
        })?;

    script.detach();
    list.remove(index);
    record.started_scripts.remove(&script.id());
    record.object_scripts.prune();
    debug!(scene, script = script.label(), ?target, "script detached");
    Ok(())
}

/// `attach(registry, scene, ScriptTarget::Scene, script)`.
pub fn add_script(
    registry: &mut SceneRegistry,
    scene: &str,
    script: &ScriptHandle,
) -> Result<(), SceneError> {
    attach(registry, scene, ScriptTarget::Scene, script)
}

/// `attach(registry, scene, ScriptTarget::Object(object), script)`.
pub fn add_object_script(
    registry: &mut SceneRegistry,
    scene: &str,
    object: ObjectId,
    script: &ScriptHandle,
) -> Result<(), SceneError> {
    attach(registry, scene, ScriptTarget::Object(object), script)
}

pub fn remove_script(
    registry: &mut SceneRegistry,
    scene: &str,
    script: &ScriptHandle,
) -> Result<(), SceneError> {
    detach(registry, scene, ScriptTarget::Scene, script)
}

pub fn remove_object_script(
    registry: &mut SceneRegistry,
    scene: &str,
    object: ObjectId,
    script: &ScriptHandle,
) -> Result<(), SceneError> {
    detach(registry, scene, ScriptTarget::Object(object), script)
}

/// Enable or disable a script in place. Returns whether the state changed.
pub fn set_script_enabled(script: &ScriptHandle, enabled: bool) -> bool {
    let changed = script.set_enabled(enabled);
    if changed {
        debug!(script = script.label(), enabled, "script toggled");
    }
    changed
}

/// Detach every script bound to `object`. Returns how many were detached.
pub fn detach_object(
    registry: &mut SceneRegistry,
    scene: &str,
    object: ObjectId,
) -> Result<usize, SceneError> {
    let record = registry.require_mut(scene)?;
    let scripts = record.object_scripts.remove(object).unwrap_or_default();
    Ok(teardown(record, scripts))
}

/// Detach every script of `scene`: scene scripts first, then object scripts
/// in object order.
pub fn detach_all(registry: &mut SceneRegistry, scene: &str) -> Result<usize, SceneError> {
    let record = registry.require_mut(scene)?;
    let mut scripts = std::mem::take(&mut record.scripts);
    let objects: Vec<ObjectId> = record.object_scripts.objects().collect();
    for object in objects {
        if let Some(list) = record.object_scripts.remove(object) {
            scripts.extend(list);
        }
    }
    Ok(teardown(record, scripts))
}

/// Detach all scripts, then remove the scene from the registry and, if it
/// was active, from `state`.
pub fn destroy_scene(
    registry: &mut SceneRegistry,
    state: &mut RenderState,
    scene: &str,
) -> Result<SceneRecord, SceneError> {
    let detached = detach_all(registry, scene)?;
    debug!(scene, detached, "scene scripts torn down");
    registry.remove(scene, state)
}

fn teardown(record: &mut SceneRecord, scripts: Vec<ScriptHandle>) -> usize {
    for script in &scripts {
        script.detach();
        record.started_scripts.remove(&script.id());
    }
    record.object_scripts.prune();
    scripts.len()
}
