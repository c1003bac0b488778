//! Error type for every fallible compressor operation.

use thiserror::Error;

use crate::compressor::types::{OpSpaceId, SessionId, SessionSpaceId, StableId};

pub type Result<T, E = CompressorError> = std::result::Result<T, E>;

/// Errors reported by the compressor.
///
/// All of them are detected before the compressor's state is touched, so a
/// failed call leaves the compressor exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompressorError {
    /// A creation range carried an id payload with no ids in it.
    #[error("malformed creation range from session {session}: {reason}")]
    MalformedRange {
        session: SessionId,
        reason: &'static str,
    },

    /// A creation range was not contiguous with the session's finalized ids.
    #[error(
        "creation range from session {session} finalized out of order: \
         expected generation count {expected}, got {actual}"
    )]
    OutOfOrder {
        session: SessionId,
        expected: u64,
        actual: u64,
    },

    /// The id was never generated, or is not known to this compressor yet.
    #[error("unknown session space id {0}")]
    UnknownSessionSpaceId(SessionSpaceId),

    /// The op space id cannot be resolved for the given originating session.
    #[error("unknown op space id {id} from session {origin}")]
    UnknownOpSpaceId { id: OpSpaceId, origin: SessionId },

    /// No session's allocated ids contain this stable id.
    #[error("unknown stable id {0}")]
    UnknownStableId(StableId),

    /// Two sessions' uuid spans overlap. The compressor cannot continue safely.
    #[error("uuid span of a new cluster for session {session} collides with session {other}")]
    Collision { session: SessionId, other: SessionId },

    /// The snapshot was written by an unsupported format version.
    #[error("unsupported snapshot version {found} (expected {expected})")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("snapshot is malformed: {0}")]
    MalformedSnapshot(&'static str),

    #[error("snapshot has no local state, a session id must be supplied")]
    SessionIdRequired,

    #[error("snapshot carries local state, a session id must not be supplied")]
    SessionIdForbidden,

    /// The supplied session id already owns ids in the snapshot.
    #[error("session {0} already exists in the snapshot")]
    SessionIdConflict(SessionId),

    #[error("invalid stable id: {0}")]
    InvalidStableId(String),

    #[error("invalid cluster capacity {capacity} (must be between 1 and {max})")]
    InvalidClusterCapacity { capacity: u64, max: u64 },
}
