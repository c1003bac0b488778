//! Type definitions for the id compressor.
//!
//! This module contains the identifier types shared by every table of the
//! compressor, organized into focused submodules.

pub mod compressed_id;
pub mod creation_range;
pub mod numeric_uuid;
pub mod stable_id;

pub use compressed_id::{CompressedId, FinalId, LocalId, OpSpaceId, SessionSpaceId};
pub use creation_range::{IdCreationRange, IdRangeSpan};
pub use numeric_uuid::{NUMERIC_UUID_MASK, NumericUuid};
pub use stable_id::{SessionId, StableId};
