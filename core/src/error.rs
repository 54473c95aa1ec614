//! Error types for the Unisender object mapping layer.
//!
//! # Design
//! `OrmError` covers everything a caller can see from the library: failures
//! raised because the client runs with `ErrorPolicy::Throw`, failures an
//! entity raises after inspecting its request log, and local validation.
//! `TransportError` is the narrower type a `Transport` returns; it is the
//! only failure class the client retries.

use thiserror::Error;

use crate::collection::Key;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, OrmError>;

#[derive(Debug, Error)]
pub enum OrmError {
    /// A request failure raised instead of logged (`ErrorPolicy::Throw`).
    #[error("{0}")]
    Request(String),

    #[error("Action failed. Check the request error log for more info.")]
    ActionFailed,

    #[error("Action ended with warning. Check the request warning log for more info.")]
    ActionWarning,

    #[error("List creation failed")]
    CreationFailed,

    #[error("Title is empty")]
    EmptyTitle,

    #[error("ID of list has to be set, got {0}")]
    InvalidListId(i64),

    #[error("Offset '{0}' does not exist")]
    OffsetMissing(Key),

    #[error("Object does not implement delete()")]
    DeleteUnsupported,

    #[error("Save method not implemented")]
    SaveNotImplemented,

    #[error("Unknown field {0} provided for sorting")]
    UnknownField(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("deserialization failed: {0}")]
    Deserialization(String),

    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("compression failed: {0}")]
    Compression(String),
}

/// Failures raised by a `Transport`.
///
/// Every variant but `Body` means no response arrived.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("operation timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),

    /// Status and headers arrived but the body could not be read.
    #[error("unreadable response body: {0}")]
    Body(String),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Whether the request may be sent again. A response that arrived,
    /// even one whose body was unreadable, ends the call.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, TransportError::Body(_))
    }
}
