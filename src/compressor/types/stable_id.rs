//! Stable identifiers and session identifiers.
//!
//! A `StableId` is the fully expanded, globally unique form of every id the
//! compressor hands out. Only version 4, RFC 4122 variant UUIDs are accepted so
//! that the fixed version/variant bits can be stripped by `NumericUuid`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::{Uuid, Variant};

use crate::compressor::error::CompressorError;

/// A canonical version 4 UUID identifying a single id, or a session.
///
/// The textual form is always the lower-case hyphenated representation
/// `xxxxxxxx-xxxx-4xxx-[89ab]xxx-xxxxxxxxxxxx`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StableId(Uuid);

impl StableId {
    /// Wraps a `Uuid`, rejecting anything that is not version 4 / RFC 4122.
    pub fn from_uuid(uuid: Uuid) -> Result<Self, CompressorError> {
        if uuid.get_version_num() != 4 || uuid.get_variant() != Variant::RFC4122 {
            return Err(CompressorError::InvalidStableId(uuid.to_string()));
        }
        Ok(StableId(uuid))
    }

    /// Builds a stable id from the raw 128-bit value of a UUID.
    pub fn from_u128(value: u128) -> Result<Self, CompressorError> {
        Self::from_uuid(Uuid::from_u128(value))
    }

    /// Used by `NumericUuid`, which always re-inserts the version and variant bits.
    pub(crate) fn from_u128_unchecked(value: u128) -> Self {
        StableId(Uuid::from_u128(value))
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    pub fn as_u128(&self) -> u128 {
        self.0.as_u128()
    }
}

impl FromStr for StableId {
    type Err = CompressorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Only the 36 character hyphenated form is a stable id.
        if s.len() != 36 {
            return Err(CompressorError::InvalidStableId(s.to_string()));
        }
        let uuid =
            Uuid::try_parse(s).map_err(|_| CompressorError::InvalidStableId(s.to_string()))?;
        Self::from_uuid(uuid)
    }
}

impl fmt::Display for StableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl From<StableId> for Uuid {
    fn from(id: StableId) -> Self {
        id.0
    }
}

impl TryFrom<Uuid> for StableId {
    type Error = CompressorError;

    fn try_from(uuid: Uuid) -> Result<Self, Self::Error> {
        StableId::from_uuid(uuid)
    }
}

impl Serialize for StableId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StableId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Identifies a session (one peer's compressor instance).
///
/// Session ids are stable ids: the first id a session generates decompresses to
/// its own session id, and later ids are sequential offsets from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(StableId);

impl SessionId {
    /// Mints a fresh random session id.
    pub fn random() -> Self {
        SessionId(StableId(Uuid::new_v4()))
    }

    pub fn stable_id(&self) -> StableId {
        self.0
    }

    pub fn from_u128(value: u128) -> Result<Self, CompressorError> {
        StableId::from_u128(value).map(SessionId)
    }

    pub fn as_u128(&self) -> u128 {
        self.0.as_u128()
    }
}

impl From<StableId> for SessionId {
    fn from(id: StableId) -> Self {
        SessionId(id)
    }
}

impl From<SessionId> for StableId {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl FromStr for SessionId {
    type Err = CompressorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(SessionId)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
