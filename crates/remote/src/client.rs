use crate::error::RemoteError;
use crate::protocol::{
    AxisAngle, GET_OBJECTS, MOVE_OBJECT, ObjectList, ROTATE_OBJECT, RpcRequest, RpcResponse,
    SCALE_OBJECT, UPDATE_OBJECT, Vector3,
};
use glam::Vec3;
use lumen_common::{ModelId, Rotation, Transform};
use lumen_scene::ObjectInfo;
use serde_json::{Value, json};
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};

/// Blocking client for the remote control server.
pub struct RemoteClient {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
    next_id: u64,
}

impl RemoteClient {
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self, RemoteError> {
        let stream = TcpStream::connect(addr)?;
        let writer = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(stream),
            writer,
            next_id: 1,
        })
    }

    /// Send one request and wait for its response.
    pub fn call(&mut self, method: &str, params: Value) -> Result<Value, RemoteError> {
        let id = self.next_id;
        self.next_id += 1;

        let mut line = serde_json::to_vec(&RpcRequest::new(method, params, id))?;
        line.push(b'\n');
        self.writer.write_all(&line)?;
        self.writer.flush()?;

        let mut text = String::new();
        if self.reader.read_line(&mut text)? == 0 {
            return Err(RemoteError::Closed);
        }
        let response: RpcResponse = serde_json::from_str(&text)?;
        if response.id != Some(Value::from(id)) {
            return Err(RemoteError::Unexpected(format!(
                "response id {:?} does not match request {id}",
                response.id
            )));
        }
        match (response.result, response.error) {
            (_, Some(error)) => Err(RemoteError::Rpc {
                code: error.code,
                message: error.message,
            }),
            (Some(result), None) => Ok(result),
            (None, None) => Err(RemoteError::Unexpected(
                "response has neither result nor error".into(),
            )),
        }
    }

    pub fn get_objects(&mut self) -> Result<Vec<ObjectInfo>, RemoteError> {
        let result = self.call(GET_OBJECTS, json!({}))?;
        let list: ObjectList = serde_json::from_value(result)?;
        Ok(list.objects.iter().map(ObjectInfo::from).collect())
    }

    pub fn move_object(&mut self, id: ModelId, position: Vec3) -> Result<(), RemoteError> {
        self.call(
            MOVE_OBJECT,
            json!({ "id": id.0, "position": Vector3::from(position) }),
        )?;
        Ok(())
    }

    pub fn rotate_object(&mut self, id: ModelId, rotation: Rotation) -> Result<(), RemoteError> {
        self.call(
            ROTATE_OBJECT,
            json!({ "id": id.0, "rotation": AxisAngle::from(rotation) }),
        )?;
        Ok(())
    }

    pub fn scale_object(&mut self, id: ModelId, scale: Vec3) -> Result<(), RemoteError> {
        self.call(
            SCALE_OBJECT,
            json!({ "id": id.0, "scale": Vector3::from(scale) }),
        )?;
        Ok(())
    }

    /// Replace the whole transform in one request.
    pub fn update_object(&mut self, id: ModelId, transform: Transform) -> Result<(), RemoteError> {
        self.call(
            UPDATE_OBJECT,
            json!({
                "id": id.0,
                "position": Vector3::from(transform.position),
                "rotation": AxisAngle::from(transform.rotation),
                "scale": Vector3::from(transform.scale),
            }),
        )?;
        Ok(())
    }
}
