/// Errors seen by remote clients and by the server's I/O layer.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("server error {code}: {message}")]
    Rpc { code: i32, message: String },
    #[error("connection closed")]
    Closed,
    #[error("unexpected response: {0}")]
    Unexpected(String),
}

impl RemoteError {
    /// JSON-RPC error code, if the server answered with one.
    pub fn code(&self) -> Option<i32> {
        match self {
            RemoteError::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }
}
