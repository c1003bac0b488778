//! Creation range descriptors exchanged through the sequencer.

use serde::{Deserialize, Serialize};

use crate::compressor::types::stable_id::SessionId;

/// A contiguous run of generation counts minted by one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdRangeSpan {
    /// Generation count of the first id in the run (1-based).
    pub first_gen_count: u64,
    /// Number of ids in the run.
    pub count: u64,
}

/// The ids a session generated since its previous range was taken.
///
/// Produced by `IdCompressor::take_next_creation_range`, broadcast by the
/// sequencer, and applied by every peer (the producer included) through
/// `IdCompressor::finalize_creation_range` in the sequencer's total order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdCreationRange {
    pub session_id: SessionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<IdRangeSpan>,
}

impl IdCreationRange {
    /// A range carrying no ids.
    pub fn empty(session_id: SessionId) -> Self {
        IdCreationRange {
            session_id,
            ids: None,
        }
    }

    pub fn new(session_id: SessionId, first_gen_count: u64, count: u64) -> Self {
        IdCreationRange {
            session_id,
            ids: Some(IdRangeSpan {
                first_gen_count,
                count,
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_none_or(|span| span.count == 0)
    }
}
