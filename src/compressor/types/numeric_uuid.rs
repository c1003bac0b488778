//! Arithmetic form of a stable id.
//!
//! A version 4 UUID has 6 fixed bits (4 version bits, 2 variant bits). Removing
//! them packs the remaining 122 bits into a single integer on which sequential
//! ids of a session are plain offsets from the session's own id.

use std::fmt;

use crate::compressor::types::stable_id::{SessionId, StableId};

// xxxxxxxx-xxxx-Mxxx-Nxxx-xxxxxxxxxxxx
const VERSION_BITS: u128 = 0x4 << (19 * 4);
const VARIANT_BITS: u128 = 0x8 << (15 * 4);
const UPPER_MASK: u128 = 0xFFFF_FFFF_FFFF << (20 * 4);
const STRIPPED_UPPER_MASK: u128 = UPPER_MASK >> 6;
const MIDDLE_MASK: u128 = 0xFFF << (16 * 4);
const STRIPPED_MIDDLE_MASK: u128 = MIDDLE_MASK >> 2;
// The top two bits of the N nibble hold the variant.
const LOWER_MASK: u128 = 0x3FFF_FFFF_FFFF_FFFF;

/// Mask of the 122 significant bits.
pub const NUMERIC_UUID_MASK: u128 = (1 << 122) - 1;

/// A stable id with its version and variant bits removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NumericUuid(u128);

impl NumericUuid {
    pub fn from_raw(value: u128) -> Self {
        NumericUuid(value & NUMERIC_UUID_MASK)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn to_stable_id(self) -> StableId {
        let upper = (self.0 & STRIPPED_UPPER_MASK) << 6;
        let middle = (self.0 & STRIPPED_MIDDLE_MASK) << 2;
        let lower = self.0 & LOWER_MASK;
        StableId::from_u128_unchecked(upper | VERSION_BITS | middle | VARIANT_BITS | lower)
    }

    /// Adds `delta`, wrapping inside the 122-bit domain.
    pub fn offset(self, delta: i64) -> Self {
        let sum = (self.0 as i128).wrapping_add(delta as i128);
        NumericUuid((sum as u128) & NUMERIC_UUID_MASK)
    }

    /// Returns `self - other`. Both operands are below 2^122, so this cannot overflow.
    pub fn subtract(self, other: NumericUuid) -> i128 {
        self.0 as i128 - other.0 as i128
    }

    /// Offset of `self` from `base` as a generation-count delta, if it is
    /// non-negative and small enough to address an id.
    pub fn offset_from(self, base: NumericUuid) -> Option<u64> {
        u64::try_from(self.subtract(base))
            .ok()
            .filter(|delta| *delta < i64::MAX as u64)
    }
}

impl From<StableId> for NumericUuid {
    fn from(id: StableId) -> Self {
        let value = id.as_u128();
        let upper = (value & UPPER_MASK) >> 6;
        let middle = (value & MIDDLE_MASK) >> 2;
        let lower = value & LOWER_MASK;
        NumericUuid(upper | middle | lower)
    }
}

impl From<SessionId> for NumericUuid {
    fn from(id: SessionId) -> Self {
        NumericUuid::from(id.stable_id())
    }
}

impl From<NumericUuid> for StableId {
    fn from(numeric: NumericUuid) -> Self {
        numeric.to_stable_id()
    }
}

impl fmt::Display for NumericUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#033x}", self.0)
    }
}
