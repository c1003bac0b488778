//! Compressed id representations.
//!
//! Compressed ids are sign-tagged integers: negative values are local ids
//! (the negated generation count of an id within its session), non-negative
//! values are final ids assigned once the id's creation range was sequenced.
//! `SessionSpaceId` and `OpSpaceId` carry the same encoding but are distinct
//! types, so an id normalized for one space cannot be handed to the other.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A session-relative id for a not yet finalized generation count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalId(i64);

impl LocalId {
    /// The local id for a 1-based generation count.
    pub fn from_generation_count(generation_count: u64) -> Self {
        debug_assert!(
            generation_count > 0 && generation_count <= i64::MAX as u64,
            "generation count out of range: {generation_count}"
        );
        LocalId(-(generation_count as i64))
    }

    pub fn generation_count(&self) -> u64 {
        self.0.unsigned_abs()
    }

    pub fn id(&self) -> i64 {
        self.0
    }
}

/// A globally unique id, valid without any session context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FinalId(u64);

impl FinalId {
    pub fn new(id: u64) -> Self {
        debug_assert!(id <= i64::MAX as u64, "final id out of range: {id}");
        FinalId(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }

    pub(crate) fn offset(self, delta: u64) -> Self {
        FinalId::new(self.0 + delta)
    }
}

/// The decoded form of a compressed id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressedId {
    Local(LocalId),
    Final(FinalId),
}

impl CompressedId {
    fn from_signed(id: i64) -> Self {
        if id < 0 {
            CompressedId::Local(LocalId(id))
        } else {
            CompressedId::Final(FinalId(id as u64))
        }
    }

    fn to_signed(self) -> i64 {
        match self {
            CompressedId::Local(local) => local.0,
            CompressedId::Final(final_id) => final_id.0 as i64,
        }
    }
}

macro_rules! space_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Reinterprets a sign-encoded integer as an id in this space.
            pub fn from_i64(id: i64) -> Self {
                $name(id)
            }

            pub fn as_i64(&self) -> i64 {
                self.0
            }

            pub fn decode(&self) -> CompressedId {
                CompressedId::from_signed(self.0)
            }

            pub fn is_local(&self) -> bool {
                self.0 < 0
            }

            pub fn is_final(&self) -> bool {
                self.0 >= 0
            }
        }

        impl From<LocalId> for $name {
            fn from(local: LocalId) -> Self {
                $name(CompressedId::Local(local).to_signed())
            }
        }

        impl From<FinalId> for $name {
            fn from(final_id: FinalId) -> Self {
                $name(CompressedId::Final(final_id).to_signed())
            }
        }

        impl From<CompressedId> for $name {
            fn from(id: CompressedId) -> Self {
                $name(id.to_signed())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

space_id!(
    /// An id as seen by the local application: locals for ids this session
    /// minted before they had a final form, finals for everything else.
    SessionSpaceId
);

space_id!(
    /// An id as carried on the wire next to an operation. Locals only ever
    /// refer to the sending session's ids, so an op space id is meaningless
    /// without the id of the session that sent it.
    OpSpaceId
);
