//! Id clusters: contiguous blocks of final ids reserved for one session.
//!
//! A cluster maps generation counts `[g, g + capacity)` of its session onto the
//! final ids `[base_final_id, base_final_id + capacity)`. The first `count`
//! generation counts have been finalized through the sequencer; the rest of the
//! capacity is reserved so the owning session can hand out eager finals.
//!
//! Generation counts grow, and local ids are their negation, so the "last"
//! local id of a cluster is its most negative one.

use crate::compressor::session::SessionRef;
use crate::compressor::types::{FinalId, LocalId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdCluster {
    pub(crate) session: SessionRef,
    pub(crate) base_final_id: FinalId,
    pub(crate) base_local_id: LocalId,
    pub(crate) capacity: u64,
    pub(crate) count: u64,
}

impl IdCluster {
    /// Creates a cluster with nothing finalized yet.
    pub(crate) fn new(
        session: SessionRef,
        base_final_id: FinalId,
        base_local_id: LocalId,
        capacity: u64,
    ) -> Self {
        debug_assert!(capacity > 0, "clusters must have a positive capacity");
        IdCluster {
            session,
            base_final_id,
            base_local_id,
            capacity,
            count: 0,
        }
    }

    pub fn session(&self) -> SessionRef {
        self.session
    }

    pub fn base_final_id(&self) -> FinalId {
        self.base_final_id
    }

    pub fn base_local_id(&self) -> LocalId {
        self.base_local_id
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn base_generation_count(&self) -> u64 {
        self.base_local_id.generation_count()
    }

    /// First generation count past the finalized part of the cluster.
    pub fn finalized_end(&self) -> u64 {
        self.base_generation_count() + self.count
    }

    /// First generation count past the reserved part of the cluster.
    pub fn allocated_end(&self) -> u64 {
        self.base_generation_count() + self.capacity
    }

    pub fn last_allocated_final(&self) -> FinalId {
        self.base_final_id.offset(self.capacity - 1)
    }

    /// The most negative local id covered by the cluster's capacity.
    pub fn last_allocated_local(&self) -> LocalId {
        LocalId::from_generation_count(self.allocated_end() - 1)
    }

    /// The most negative finalized local id, if anything has been finalized.
    pub fn last_finalized_local(&self) -> Option<LocalId> {
        (self.count > 0).then(|| LocalId::from_generation_count(self.finalized_end() - 1))
    }

    pub fn remaining_capacity(&self) -> u64 {
        self.capacity - self.count
    }

    pub fn contains_final(&self, final_id: FinalId) -> bool {
        final_id >= self.base_final_id && final_id <= self.last_allocated_final()
    }

    /// Whether `generation_count` lies in the cluster, counting reserved
    /// capacity only when `include_allocated` is set.
    pub fn contains_generation(&self, generation_count: u64, include_allocated: bool) -> bool {
        let end = if include_allocated {
            self.allocated_end()
        } else {
            self.finalized_end()
        };
        generation_count >= self.base_generation_count() && generation_count < end
    }

    /// The final id reserved for `local`, if the cluster's capacity covers it.
    pub fn allocated_final(&self, local: LocalId) -> Option<FinalId> {
        if !self.contains_generation(local.generation_count(), true) {
            return None;
        }
        Some(
            self.base_final_id
                .offset(local.generation_count() - self.base_generation_count()),
        )
    }

    /// The local id aligned with `final_id`, if the cluster's capacity covers it.
    pub fn aligned_local(&self, final_id: FinalId) -> Option<LocalId> {
        if !self.contains_final(final_id) {
            return None;
        }
        let delta = final_id.id() - self.base_final_id.id();
        Some(LocalId::from_generation_count(
            self.base_generation_count() + delta,
        ))
    }
}
