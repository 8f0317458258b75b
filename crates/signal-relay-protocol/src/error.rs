use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid message format: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid identifier: {0}")]
    InvalidId(#[from] uuid::Error),
}
