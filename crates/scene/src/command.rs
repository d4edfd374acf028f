use glam::Vec3;
use lumen_common::{ModelId, Rotation, Transform};
use serde::{Deserialize, Serialize};

/// A request against the scene coming from outside the render thread.
///
/// One command is one effect. Commands are applied by the render thread
/// in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneCommand {
    /// List every model with its transform.
    GetObjects,
    /// Overwrite the position only.
    Move { id: ModelId, position: Vec3 },
    /// Overwrite the rotation only.
    Rotate { id: ModelId, rotation: Rotation },
    /// Overwrite the scale only.
    Scale { id: ModelId, scale: Vec3 },
    /// Overwrite position, rotation and scale together.
    Update { id: ModelId, transform: Transform },
}

impl SceneCommand {
    /// Target model, if the command addresses one.
    pub fn target(&self) -> Option<ModelId> {
        match self {
            SceneCommand::GetObjects => None,
            SceneCommand::Move { id, .. }
            | SceneCommand::Rotate { id, .. }
            | SceneCommand::Scale { id, .. }
            | SceneCommand::Update { id, .. } => Some(*id),
        }
    }
}

/// Public view of one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub id: ModelId,
    pub name: String,
    pub transform: Transform,
}

/// Result of a successfully applied command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    Objects(Vec<ObjectInfo>),
    Applied,
}
