//! Protocol and RPC error types.

use minicbor::{Decode, Encode};
use thiserror::Error;

/// Status codes carried on RPC error frames. Tags are part of the wire
/// contract and must not be reassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
#[cbor(index_only)]
pub enum StatusCode {
    #[n(0)]
    Ok,
    #[n(1)]
    InvalidArgument,
    #[n(2)]
    NotFound,
    #[n(3)]
    DeadlineExceeded,
    #[n(4)]
    ResourceExhausted,
    #[n(5)]
    Unavailable,
    #[n(6)]
    Internal,
    #[n(7)]
    Cancelled,
    #[n(8)]
    Unimplemented,
}

impl StatusCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::InvalidArgument => "INVALID_ARGUMENT",
            StatusCode::NotFound => "NOT_FOUND",
            StatusCode::DeadlineExceeded => "DEADLINE_EXCEEDED",
            StatusCode::ResourceExhausted => "RESOURCE_EXHAUSTED",
            StatusCode::Unavailable => "UNAVAILABLE",
            StatusCode::Internal => "INTERNAL",
            StatusCode::Cancelled => "CANCELLED",
            StatusCode::Unimplemented => "UNIMPLEMENTED",
        }
    }
}

/// An application-level RPC failure, sent as an `Error` reply frame.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Error)]
#[cbor(map)]
#[error("{}: {message}", .code.as_str())]
pub struct RpcError {
    #[n(0)]
    pub code: StatusCode,
    #[n(1)]
    pub message: String,
}

impl RpcError {
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(StatusCode::InvalidArgument, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NotFound, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::Internal, message)
    }

    pub fn unimplemented(method: &str) -> Self {
        Self::new(StatusCode::Unimplemented, format!("{method} not served here"))
    }
}

/// Transport- and codec-level failures.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encode error: {0}")]
    Encode(#[from] minicbor::encode::Error<std::convert::Infallible>),

    #[error("decode error: {0}")]
    Decode(#[from] minicbor::decode::Error),

    #[error("frame of {got} bytes exceeds limit of {limit}")]
    FrameTooLarge { got: usize, limit: usize },

    #[error("connection closed")]
    Closed,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("unexpected reply variant for {0}")]
    UnexpectedReply(&'static str),

    #[error(transparent)]
    Rpc(#[from] RpcError),
}

impl ProtocolError {
    /// True when the failure is the caller's deadline firing, either locally
    /// or surfaced by the remote side.
    pub fn is_deadline(&self) -> bool {
        matches!(
            self,
            ProtocolError::DeadlineExceeded
                | ProtocolError::Rpc(RpcError {
                    code: StatusCode::DeadlineExceeded,
                    ..
                })
        )
    }
}
