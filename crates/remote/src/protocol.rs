//! JSON-RPC 2.0 messages and the mapping between wire objects and scene
//! commands.
//!
//! Framing is one JSON object per line in both directions.

use glam::Vec3;
use lumen_common::{ModelId, Rotation, Transform};
use lumen_scene::{CommandOutput, ObjectInfo, SceneCommand, SceneError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
/// The render loop did not answer in time or has shut down.
pub const RENDER_UNAVAILABLE: i32 = -32000;
pub const OBJECT_NOT_FOUND: i32 = -32004;

pub const GET_OBJECTS: &str = "GetObjects";
pub const MOVE_OBJECT: &str = "MoveObject";
pub const ROTATE_OBJECT: &str = "RotateObject";
pub const SCALE_OBJECT: &str = "ScaleObject";
pub const UPDATE_OBJECT: &str = "UpdateObject";

/// JSON-RPC 2.0 request.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 response. Exactly one of `result` and `error` is set.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcResponse {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: Option<Value>,
}

/// JSON-RPC error object.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl From<SceneError> for RpcError {
    fn from(err: SceneError) -> Self {
        match err {
            SceneError::NotFound(id) => Self {
                code: OBJECT_NOT_FOUND,
                message: "object not found".into(),
                data: Some(Value::from(id.0)),
            },
            other => RpcError::new(INVALID_PARAMS, other.to_string()),
        }
    }
}

impl RpcRequest {
    pub fn new(method: &str, params: Value, id: u64) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            method: method.into(),
            params,
            id: Some(Value::from(id)),
        }
    }
}

impl RpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn failure(id: Option<Value>, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            result: None,
            error: Some(error),
            id,
        }
    }
}

/// `{ x, y, z }`
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Axis-angle rotation: `{ x, y, z, angle }`, angle in degrees.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct AxisAngle {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub angle: f32,
}

/// One object as listed by `GetObjects`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ObjectWire {
    pub id: u32,
    pub name: String,
    pub position: Vector3,
    pub rotation: AxisAngle,
    pub scale: Vector3,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ObjectList {
    pub objects: Vec<ObjectWire>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MoveParams {
    pub id: u32,
    pub position: Vector3,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct RotateParams {
    pub id: u32,
    pub rotation: AxisAngle,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ScaleParams {
    pub id: u32,
    pub scale: Vector3,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UpdateParams {
    pub id: u32,
    pub position: Vector3,
    pub rotation: AxisAngle,
    pub scale: Vector3,
}

impl From<Vec3> for Vector3 {
    fn from(v: Vec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<Vector3> for Vec3 {
    fn from(v: Vector3) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

impl From<Rotation> for AxisAngle {
    fn from(r: Rotation) -> Self {
        Self {
            x: r.axis.x,
            y: r.axis.y,
            z: r.axis.z,
            angle: r.angle_degrees,
        }
    }
}

impl From<AxisAngle> for Rotation {
    fn from(r: AxisAngle) -> Self {
        Rotation::new(Vec3::new(r.x, r.y, r.z), r.angle)
    }
}

impl From<&ObjectInfo> for ObjectWire {
    fn from(info: &ObjectInfo) -> Self {
        Self {
            id: info.id.0,
            name: info.name.clone(),
            position: info.transform.position.into(),
            rotation: info.transform.rotation.into(),
            scale: info.transform.scale.into(),
        }
    }
}

impl From<&ObjectWire> for ObjectInfo {
    fn from(wire: &ObjectWire) -> Self {
        Self {
            id: ModelId(wire.id),
            name: wire.name.clone(),
            transform: Transform {
                position: wire.position.into(),
                rotation: wire.rotation.into(),
                scale: wire.scale.into(),
            },
        }
    }
}

fn params<T: DeserializeOwned>(value: Value) -> Result<T, RpcError> {
    serde_json::from_value(value).map_err(|e| RpcError::new(INVALID_PARAMS, e.to_string()))
}

/// Translate a method call into the scene command it stands for.
pub fn parse_command(method: &str, value: Value) -> Result<SceneCommand, RpcError> {
    let command = match method {
        GET_OBJECTS => SceneCommand::GetObjects,
        MOVE_OBJECT => {
            let p: MoveParams = params(value)?;
            SceneCommand::Move {
                id: ModelId(p.id),
                position: p.position.into(),
            }
        }
        ROTATE_OBJECT => {
            let p: RotateParams = params(value)?;
            SceneCommand::Rotate {
                id: ModelId(p.id),
                rotation: p.rotation.into(),
            }
        }
        SCALE_OBJECT => {
            let p: ScaleParams = params(value)?;
            SceneCommand::Scale {
                id: ModelId(p.id),
                scale: p.scale.into(),
            }
        }
        UPDATE_OBJECT => {
            let p: UpdateParams = params(value)?;
            SceneCommand::Update {
                id: ModelId(p.id),
                transform: Transform {
                    position: p.position.into(),
                    rotation: p.rotation.into(),
                    scale: p.scale.into(),
                },
            }
        }
        other => {
            return Err(RpcError::new(
                METHOD_NOT_FOUND,
                format!("unknown method: {other}"),
            ));
        }
    };
    if !command_is_finite(&command) {
        return Err(RpcError::new(
            INVALID_PARAMS,
            "transform components must be finite",
        ));
    }
    Ok(command)
}

fn command_is_finite(command: &SceneCommand) -> bool {
    match command {
        SceneCommand::GetObjects => true,
        SceneCommand::Move { position: v, .. } | SceneCommand::Scale { scale: v, .. } => {
            v.is_finite()
        }
        SceneCommand::Rotate { rotation, .. } => rotation.is_finite(),
        SceneCommand::Update { transform, .. } => transform.is_finite(),
    }
}

fn vector_json(v: Vector3) -> Value {
    json!({ "x": v.x, "y": v.y, "z": v.z })
}

fn object_json(wire: &ObjectWire) -> Value {
    json!({
        "id": wire.id,
        "name": wire.name,
        "position": vector_json(wire.position),
        "rotation": {
            "x": wire.rotation.x,
            "y": wire.rotation.y,
            "z": wire.rotation.z,
            "angle": wire.rotation.angle,
        },
        "scale": vector_json(wire.scale),
    })
}

/// Result payload for a successfully applied command. Has the shape of
/// `ObjectList` for `GetObjects` and is empty otherwise.
pub fn encode_output(output: &CommandOutput) -> Value {
    match output {
        CommandOutput::Objects(objects) => {
            let objects: Vec<Value> = objects
                .iter()
                .map(|info| object_json(&ObjectWire::from(info)))
                .collect();
            json!({ "objects": objects })
        }
        CommandOutput::Applied => json!({}),
    }
}
