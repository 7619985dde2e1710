use scenescript_common::ObjectId;
use serde::{Deserialize, Serialize};

/// Event names published by the core or by well-known collaborators.
pub mod names {
    /// The graphics device lost its drawing surface.
    pub const CONTEXT_LOST: &str = "graphics-context-lost";
    /// The graphics device regained its drawing surface.
    pub const CONTEXT_RESTORED: &str = "graphics-context-restored";
    pub const OBJECT_SELECTED: &str = "object-selected";
    pub const PERFORMANCE_SAMPLE: &str = "performance-sample";
    pub const VIEWPORT_RESIZED: &str = "viewport-resized";
}

/// Frame timing summary published on [`names::PERFORMANCE_SAMPLE`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSample {
    pub frame: u64,
    pub fps: f32,
    pub avg_frame_ms: f32,
    pub max_frame_ms: f32,
}

/// Payload handed to every listener of one `emit` call.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EventData {
    #[default]
    None,
    ObjectSelected(ObjectId),
    PerformanceSample(PerformanceSample),
    Resized { width: u32, height: u32 },
    /// Free-form application payload.
    Json(serde_json::Value),
}

impl EventData {
    pub fn object(&self) -> Option<ObjectId> {
        match self {
            Self::ObjectSelected(id) => Some(*id),
            _ => None,
        }
    }

    pub fn json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for EventData {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_match_variant() {
        let id = ObjectId::new();
        assert_eq!(EventData::ObjectSelected(id).object(), Some(id));
        assert!(EventData::None.object().is_none());

        let data: EventData = serde_json::json!({ "room": "kitchen" }).into();
        assert_eq!(data.json().unwrap()["room"], "kitchen");
    }
}
