use thiserror::Error;
use tokio::task::JoinError;
use tonic::{Code, Status};

/// Errors surfaced by the public SDK API.
///
/// Every fallible operation in the crate funnels into this taxonomy; narrow
/// per-module errors ([`crate::cid::Error`], [`crate::dag::Error`], …) are
/// converted via `From` impls at the boundary.
#[derive(Debug, Error)]
pub enum SdkError {
    /// An option in [`crate::SdkConfig`] is out of range or inconsistent.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A bucket/file name or size bound was violated.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The requested bucket or file does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The bucket or file already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// A gRPC or stream I/O failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// A reverted transaction, failed receipt or chain RPC failure.
    #[error("chain error: {0}")]
    Chain(String),

    /// A chain submission failure that is safe to resubmit after a nonce
    /// reset (nonce too low, replacement underpriced, transient EOF).
    #[error("retryable chain error: {0}")]
    ChainRetryable(String),

    /// Signature, encryption or CID mismatch.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Not enough shards survived to reconstruct a chunk.
    #[error("insufficient shards: {0}")]
    Erasure(String),

    /// The operation was cancelled through its cancellation token.
    #[error("cancelled: {0}")]
    Cancelled(String),
}

impl SdkError {
    /// Maps a gRPC [`Status`] into the taxonomy, keeping the failing method
    /// name in the message.
    pub fn from_status(method: &str, status: Status) -> Self {
        match status.code() {
            Code::NotFound => SdkError::NotFound(format!("{}: {}", method, status.message())),
            Code::AlreadyExists => {
                SdkError::AlreadyExists(format!("{}: {}", method, status.message()))
            }
            Code::InvalidArgument => {
                SdkError::Validation(format!("{}: {}", method, status.message()))
            }
            code => SdkError::Transport(format!("{}: {} ({:?})", method, status.message(), code)),
        }
    }

    /// Whether the error is worth a local retry with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SdkError::ChainRetryable(_))
            || matches!(self, SdkError::Transport(msg)
                if msg.contains("Unavailable") || msg.contains("DeadlineExceeded"))
    }
}

impl From<std::io::Error> for SdkError {
    fn from(value: std::io::Error) -> Self {
        SdkError::Transport(value.to_string())
    }
}

impl From<JoinError> for SdkError {
    fn from(value: JoinError) -> Self {
        SdkError::Transport(value.to_string())
    }
}

impl From<tonic::transport::Error> for SdkError {
    fn from(value: tonic::transport::Error) -> Self {
        SdkError::Transport(value.to_string())
    }
}

impl From<crate::cid::Error> for SdkError {
    fn from(value: crate::cid::Error) -> Self {
        SdkError::Crypto(value.to_string())
    }
}

impl From<crate::dag::Error> for SdkError {
    fn from(value: crate::dag::Error) -> Self {
        match value {
            crate::dag::Error::EmptyInput => SdkError::Validation(value.to_string()),
            _ => SdkError::Crypto(value.to_string()),
        }
    }
}
