//! Boundary errors.
//!
//! Every variant describes a contract violation between the bridge and the
//! host runtime. They indicate version skew or a released resource, never a
//! script-level error, and callers at the boundary treat them as fatal.

use crate::{PointerKind, Tag};

/// Errors raised while encoding or decoding tagged values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BridgeError {
    /// The value carries a different tag than the decoder expects
    #[error("tag mismatch: expected {expected:?}, found {found:?}")]
    TagMismatch {
        /// Tag requested by the decoder
        expected: Tag,
        /// Tag carried by the value
        found: Tag,
    },
    /// The tag is outside the stable numbering
    #[error("unknown tag {0}")]
    UnknownTag(i32),
    /// The pointer kind is outside the stable numbering
    #[error("unknown pointer kind {0}")]
    UnknownPointerKind(i64),
    /// The pointer kind is valid but has no conversion on this path
    #[error("pointer kind {0:?} cannot be converted here")]
    UnsupportedPointerKind(PointerKind),
    /// An owned payload pointer was null
    #[error("null payload for tag {0:?}")]
    NullPointer(Tag),
    /// A string payload holds unpaired surrogates and was requested as UTF-8
    #[error("string payload is not valid UTF-16")]
    InvalidUtf16,
    /// An integer payload does not fit the requested native type
    #[error("integer {0} out of range for the requested type")]
    IntegerOutOfRange(i64),
    /// A JSON payload could not be produced or parsed
    #[error("invalid json payload: {0}")]
    Json(String),
    /// A length exceeds the configured or representable limit
    #[error("{what} length {got} exceeds limit {max}")]
    LimitExceeded {
        /// What was measured
        what: &'static str,
        /// Measured length
        got: usize,
        /// Allowed maximum
        max: usize,
    },
    /// A function reference was released or its context was disposed
    #[error("native function reference is invalidated")]
    InvalidatedFunction,
}

/// Result alias for boundary operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
