//! Id compressor implementation module.
//!
//! This module contains the `IdCompressor` and the tables it is built from:
//! clusters, the final space, the sessions registry and the session space
//! normalizer.

pub mod cluster;
pub mod config;
pub mod error;
pub mod final_space;
pub mod id_compressor;
pub mod normalizer;
pub mod persistence;
pub mod session;
pub mod types;

// Re-export the main public API
pub use cluster::IdCluster;
pub use config::{CompressorConfig, DEFAULT_CLUSTER_CAPACITY, MAX_CLUSTER_CAPACITY};
pub use error::{CompressorError, Result};
pub use final_space::{ClusterRef, FinalSpace};
pub use id_compressor::IdCompressor;
pub use normalizer::SessionSpaceNormalizer;
pub use persistence::SNAPSHOT_VERSION;
pub use session::{Session, SessionRef, Sessions};
pub use types::{
    CompressedId, FinalId, IdCreationRange, IdRangeSpan, LocalId, NumericUuid, OpSpaceId,
    SessionId, SessionSpaceId, StableId,
};
