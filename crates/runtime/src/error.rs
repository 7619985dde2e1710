use scenescript_common::ObjectId;

/// Lookup and registration failures. These are caller mistakes and are
/// returned immediately, never retried.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("Scene not found: {0}")]
    NotFound(String),
    #[error("Scene already exists: {0}")]
    AlreadyExists(String),
    #[error("Script {script} not found on {owner}")]
    ScriptNotFound { script: String, owner: String },
    #[error("Object {object} has no scripts in scene {scene}")]
    ObjectHasNoScripts { scene: String, object: ObjectId },
    #[error("Script {0} is already attached")]
    AlreadyAttached(String),
    #[error("Script {0} was destroyed and cannot be attached again")]
    Destroyed(String),
}
