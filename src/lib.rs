//! # Distributed id compressor
//!
//! Sessions of a collaborative document mint globally unique ids (v4 UUIDs)
//! without coordinating per id, and represent them as small integers once a
//! sequencing service has ordered their creation.
//!
//! ## Features
//!
//! - **Local generation**: new ids are available immediately as negative local ids
//! - **Cluster allocation**: finalized ids are reserved per session in blocks, so
//!   sessions often receive compact final ids before their range is even sequenced
//! - **Three id spaces**: session space, op space and stable uuids, with lossless
//!   translation between them
//! - **Snapshots**: a versioned binary format with or without local state
//!
//! ## Example
//!
//! ```rust
//! use crdt_id_compressor::{IdCompressor, SessionId};
//!
//! let mut compressor = IdCompressor::with_session_id(SessionId::random());
//! let id = compressor.generate_next_id();
//! assert!(id.is_local());
//!
//! // Hand the range to the sequencer; every peer finalizes it in order.
//! let range = compressor.take_next_creation_range();
//! compressor.finalize_creation_range(&range).unwrap();
//!
//! let op_id = compressor.normalize_to_op_space(id).unwrap();
//! assert!(op_id.is_final());
//! let stable = compressor.decompress(id).unwrap();
//! assert_eq!(compressor.recompress(stable).unwrap(), id);
//! ```

pub mod compressor;

// Re-export the main public API from the compressor module
pub use compressor::{CompressorConfig, CompressorError, IdCompressor, Result};
pub use compressor::{
    CompressedId, FinalId, IdCreationRange, IdRangeSpan, LocalId, OpSpaceId, SessionId,
    SessionSpaceId, StableId,
};
