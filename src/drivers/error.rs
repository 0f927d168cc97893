use thiserror::Error;
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("device i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed device message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("device returned an error: {0}")]
    Remote(String),
    #[error("unexpected response to {method}: {detail}")]
    UnexpectedResponse { method: String, detail: String },
    #[error("device closed the connection")]
    Disconnected,
}
impl DeviceError {
    /// True when the connection can no longer be trusted and should be
    /// reopened; a remote error leaves the link usable.
    pub fn is_connection_lost(&self) -> bool {
        !matches!(self, DeviceError::Remote(_))
    }
}
