//! Error types shared by the node layer.
//!
//! [`DomError`] covers every failure the crate reports to its callers:
//! malformed binary records, bad character-data offsets, an exhausted node
//! pool and lock failures surfaced by the external lock manager. Decode
//! errors are always returned to the immediate caller; nothing in this crate
//! logs an error and carries on.

use thiserror::Error;

use crate::model::DocId;

pub type Result<T, E = DomError> = core::result::Result<T, E>;

/// Crate-level error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomError {
    /// A binary record or identifier is malformed or truncated.
    #[error("malformed {context}: {message}")]
    Format {
        /// What was being decoded (`"node id"`, `"comment record"`, ...).
        context: &'static str,
        /// Details about the inconsistency.
        message: String,
    },

    /// An offset or count passed to a character-data operation is out of range.
    #[error("offset {offset} (count {count}) out of bounds for content of length {length}")]
    Bounds {
        offset: i64,
        count: i64,
        length: usize,
    },

    /// A bounded pool stayed full after being cleared once.
    #[error("node pool capacity {capacity} exhausted after clear and retry")]
    CapacityOverflow { capacity: usize },

    /// The signature byte names a node kind the leaf codec does not handle.
    #[error("unsupported node signature 0x{0:02x}")]
    UnsupportedSignature(u8),

    /// The document lock manager refused a lease.
    #[error(transparent)]
    Lock(#[from] LockError),
}

impl DomError {
    pub(crate) fn format(context: &'static str, message: impl Into<String>) -> Self {
        Self::Format { context, message: message.into() }
    }

    pub(crate) fn bounds(offset: i32, count: i32, length: usize) -> Self {
        Self::Bounds { offset: i64::from(offset), count: i64::from(count), length }
    }
}

/// Failure reported by a [`LockManager`](crate::document_set::LockManager).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LockError {
    /// The lease for one document could not be acquired.
    #[error("failed to acquire {mode} lock on document {doc}: {reason}")]
    AcquisitionFailed {
        doc: DocId,
        mode: &'static str,
        reason: String,
    },

    /// The lock manager gave up waiting.
    #[error("timed out acquiring lock on document {0}")]
    Timeout(DocId),
}
