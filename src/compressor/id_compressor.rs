//! The id compressor.
//!
//! `IdCompressor` lets a session mint ids without coordinating with other
//! sessions, and translates them between the three forms an id takes:
//! session space (what the local application holds), op space (what travels
//! next to an operation) and the fully expanded stable id.

use tracing::{debug, error, trace, warn};

use crate::compressor::cluster::IdCluster;
use crate::compressor::config::{CompressorConfig, validate_cluster_capacity};
use crate::compressor::error::{CompressorError, Result};
use crate::compressor::final_space::{ClusterRef, FinalSpace};
use crate::compressor::normalizer::SessionSpaceNormalizer;
use crate::compressor::persistence;
use crate::compressor::session::{Session, SessionRef, Sessions};
use crate::compressor::types::{
    CompressedId, FinalId, IdCreationRange, LocalId, NumericUuid, OpSpaceId, SessionId,
    SessionSpaceId, StableId,
};

/// Generates, finalizes and translates compressed ids for one local session.
///
/// # Design
///
/// - Ids are generated locally as negative local ids, or as eager finals when
///   the local session still has reserved capacity in its last cluster
/// - Creation ranges are applied through `finalize_creation_range` in the
///   sequencer's total order, identically on every peer
/// - Final ids are reserved in clusters, so consensus is needed per range,
///   never per id
/// - All state is owned by the instance; the only thing shared between
///   instances is the snapshot produced by `serialize`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdCompressor {
    pub(super) local_session_id: SessionId,
    pub(super) local_session: SessionRef,
    pub(super) normalizer: SessionSpaceNormalizer,
    pub(super) generated_id_count: u64,
    pub(super) next_range_base_gen_count: u64,
    pub(super) cluster_capacity: u64,
    pub(super) sessions: Sessions,
    pub(super) final_space: FinalSpace,
}

/// How a creation range is applied to the cluster chain of its session.
#[derive(Debug, Clone, Copy)]
enum Allocation {
    /// The tail cluster has enough reserved capacity.
    Extend { tail: ClusterRef },
    /// The tail cluster is last in final space and grows in place.
    Grow {
        tail: ClusterRef,
        additional_capacity: u64,
    },
    /// The tail cluster is filled and the rest spills into a new cluster.
    Overflow {
        tail: ClusterRef,
        base_generation: u64,
        capacity: u64,
        count: u64,
    },
    /// The session's first cluster.
    First { capacity: u64 },
}

impl IdCompressor {
    /// Creates a compressor for a fresh random session.
    pub fn new() -> Self {
        IdCompressor::with_session_id(SessionId::random())
    }

    /// Creates a compressor for `session_id` with the default configuration.
    pub fn with_session_id(session_id: SessionId) -> Self {
        let mut sessions = Sessions::new();
        let local_session = sessions.get_or_create(session_id);
        IdCompressor {
            local_session_id: session_id,
            local_session,
            normalizer: SessionSpaceNormalizer::new(),
            generated_id_count: 0,
            next_range_base_gen_count: 1,
            cluster_capacity: CompressorConfig::default().cluster_capacity,
            sessions,
            final_space: FinalSpace::new(),
        }
    }

    pub fn with_config(session_id: SessionId, config: CompressorConfig) -> Result<Self> {
        config.validate()?;
        let mut compressor = IdCompressor::with_session_id(session_id);
        compressor.cluster_capacity = config.cluster_capacity;
        Ok(compressor)
    }

    pub fn local_session_id(&self) -> SessionId {
        self.local_session_id
    }

    /// The capacity of newly allocated clusters.
    pub fn cluster_capacity(&self) -> u64 {
        self.cluster_capacity
    }

    /// Changes the capacity of clusters allocated from now on.
    ///
    /// Must only be called with a value every peer has agreed on, at the same
    /// point of the sequenced range stream.
    pub fn set_cluster_capacity(&mut self, cluster_capacity: u64) -> Result<()> {
        validate_cluster_capacity(cluster_capacity)?;
        self.cluster_capacity = cluster_capacity;
        Ok(())
    }

    pub fn generated_id_count(&self) -> u64 {
        self.generated_id_count
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn cluster_count(&self) -> usize {
        self.final_space.len()
    }

    /// One past the greatest final id finalized by any session.
    pub fn final_id_limit(&self) -> FinalId {
        self.final_space.final_id_limit()
    }

    /// Every cluster allocated so far, in final id order.
    pub fn final_space(&self) -> &FinalSpace {
        &self.final_space
    }

    pub fn sessions(&self) -> &Sessions {
        &self.sessions
    }

    fn local_session(&self) -> &Session {
        self.sessions.session(self.local_session)
    }

    /// Generates a new id for the local session.
    ///
    /// Returns an eager final if the local session's last cluster still has
    /// reserved capacity for it, and a local id otherwise.
    pub fn generate_next_id(&mut self) -> SessionSpaceId {
        self.generated_id_count += 1;
        let generation_count = self.generated_id_count;
        let local = LocalId::from_generation_count(generation_count);

        if let Some(tail) = self.local_session().tail_cluster() {
            if let Some(eager_final) = self.final_space.cluster(tail).allocated_final(local) {
                trace!(generation_count, final_id = eager_final.id(), "generated eager final");
                return eager_final.into();
            }
        }

        self.normalizer.add_local_range(generation_count, 1);
        trace!(generation_count, "generated local id");
        local.into()
    }

    /// Takes the ids generated since the previous call as a creation range,
    /// to be handed to the sequencer.
    pub fn take_next_creation_range(&mut self) -> IdCreationRange {
        let count = self.generated_id_count + 1 - self.next_range_base_gen_count;
        if count == 0 {
            return IdCreationRange::empty(self.local_session_id);
        }
        let first_gen_count = self.next_range_base_gen_count;
        self.next_range_base_gen_count = self.generated_id_count + 1;
        debug!(first_gen_count, count, "took creation range");
        IdCreationRange::new(self.local_session_id, first_gen_count, count)
    }

    /// Applies a sequenced creation range.
    ///
    /// Every peer, the range's own session included, must apply every range
    /// exactly once and in the order the sequencer delivered them.
    ///
    /// # Errors
    ///
    /// * `MalformedRange` - the range carries an id payload with no ids
    /// * `OutOfOrder` - the range does not continue the session's finalized ids
    /// * `MalformedRange` - the reservation would run past the largest id
    /// * `Collision` - the reserved uuids would overlap another session's
    ///
    /// The compressor is unchanged when an error is returned.
    pub fn finalize_creation_range(&mut self, range: &IdCreationRange) -> Result<()> {
        let session_id = range.session_id;
        let Some(span) = range.ids else {
            trace!(%session_id, "ignored empty creation range");
            return Ok(());
        };
        if span.count == 0 {
            return Err(CompressorError::MalformedRange {
                session: session_id,
                reason: "id payload is empty",
            });
        }
        if span.first_gen_count == 0 {
            return Err(CompressorError::MalformedRange {
                session: session_id,
                reason: "generation counts start at 1",
            });
        }
        if span
            .first_gen_count
            .checked_add(span.count)
            .is_none_or(|end| end > i64::MAX as u64)
        {
            return Err(CompressorError::MalformedRange {
                session: session_id,
                reason: "generation counts overflow",
            });
        }

        let tail = self
            .sessions
            .get(session_id)
            .and_then(|session_ref| self.sessions.session(session_ref).tail_cluster());
        let expected = tail.map_or(1, |tail| self.final_space.cluster(tail).finalized_end());
        if span.first_gen_count != expected {
            warn!(
                %session_id,
                expected,
                actual = span.first_gen_count,
                "rejected out of order creation range"
            );
            return Err(CompressorError::OutOfOrder {
                session: session_id,
                expected,
                actual: span.first_gen_count,
            });
        }

        let allocation = self.plan_allocation(tail, span.count);
        self.check_reservation(session_id, allocation)?;
        self.apply_allocation(session_id, allocation, span.count);
        Ok(())
    }

    fn plan_allocation(&self, tail: Option<ClusterRef>, count: u64) -> Allocation {
        let Some(tail) = tail else {
            // The range itself plus a full cluster's worth of reserve.
            return Allocation::First {
                capacity: self.cluster_capacity + count,
            };
        };

        let cluster = self.final_space.cluster(tail);
        let remaining = cluster.remaining_capacity();
        if count <= remaining {
            return Allocation::Extend { tail };
        }
        let overflow = count - remaining;
        if self.final_space.is_last(tail) {
            Allocation::Grow {
                tail,
                additional_capacity: self.cluster_capacity + overflow,
            }
        } else {
            Allocation::Overflow {
                tail,
                base_generation: cluster.allocated_end(),
                capacity: self.cluster_capacity + overflow,
                count: overflow,
            }
        }
    }

    fn check_reservation(&self, session_id: SessionId, allocation: Allocation) -> Result<()> {
        let session_uuid = NumericUuid::from(session_id);
        let (first_generation, length) = match allocation {
            Allocation::Extend { .. } => return Ok(()),
            Allocation::Grow {
                tail,
                additional_capacity,
            } => (
                self.final_space.cluster(tail).allocated_end(),
                additional_capacity,
            ),
            Allocation::Overflow {
                base_generation,
                capacity,
                ..
            } => (base_generation, capacity),
            Allocation::First { capacity } => (1, capacity),
        };
        let span_length = first_generation - 1 + length;
        let fits = |end: Option<u64>| end.is_some_and(|end| end <= i64::MAX as u64);
        if !fits(span_length.checked_add(1))
            || !fits(self.final_space.next_base_final().id().checked_add(length))
        {
            return Err(CompressorError::MalformedRange {
                session: session_id,
                reason: "reservation exceeds the id space",
            });
        }

        // Checked from the session's own uuid, which also catches spans that
        // run off the end of the uuid space.
        match self
            .sessions
            .colliding_session(session_id, session_uuid, span_length, &self.final_space)
        {
            Some(other) => {
                error!(%session_id, %other, "cluster uuid span collides with another session");
                Err(CompressorError::Collision {
                    session: session_id,
                    other,
                })
            }
            None => Ok(()),
        }
    }

    fn apply_allocation(&mut self, session_id: SessionId, allocation: Allocation, count: u64) {
        match allocation {
            Allocation::Extend { tail } => {
                self.final_space.cluster_mut(tail).count += count;
                debug!(%session_id, count, "finalized ids into reserved capacity");
            }
            Allocation::Grow {
                tail,
                additional_capacity,
            } => {
                let cluster = self.final_space.cluster_mut(tail);
                cluster.capacity += additional_capacity;
                cluster.count += count;
                debug!(
                    %session_id,
                    count,
                    capacity = cluster.capacity,
                    "grew tail cluster in place"
                );
            }
            Allocation::Overflow {
                tail,
                base_generation,
                capacity,
                count: overflow,
            } => {
                let filled = self.final_space.cluster_mut(tail);
                filled.count = filled.capacity;
                let session_ref = filled.session;
                let new_cluster = self.add_cluster(session_ref, base_generation, capacity);
                self.final_space.cluster_mut(new_cluster).count = overflow;
                debug!(
                    %session_id,
                    count,
                    capacity,
                    base_final_id = self.final_space.cluster(new_cluster).base_final_id().id(),
                    "overflowed into new cluster"
                );
            }
            Allocation::First { capacity } => {
                let session_ref = self.sessions.get_or_create(session_id);
                let new_cluster = self.add_cluster(session_ref, 1, capacity);
                self.final_space.cluster_mut(new_cluster).count = count;
                debug!(
                    %session_id,
                    count,
                    capacity,
                    base_final_id = self.final_space.cluster(new_cluster).base_final_id().id(),
                    "allocated first cluster"
                );
            }
        }
    }

    pub(super) fn add_cluster(
        &mut self,
        session_ref: SessionRef,
        base_generation: u64,
        capacity: u64,
    ) -> ClusterRef {
        let cluster = IdCluster::new(
            session_ref,
            self.final_space.next_base_final(),
            LocalId::from_generation_count(base_generation),
            capacity,
        );
        let cluster_ref = self.final_space.push(cluster);
        self.sessions
            .session_mut(session_ref)
            .push_cluster(cluster_ref);
        cluster_ref
    }

    /// Converts an id from session space to op space, for sending it with an
    /// operation.
    ///
    /// Finals pass through. Locals are converted to their final form once
    /// their cluster covers them, and stay local otherwise.
    pub fn normalize_to_op_space(&self, id: SessionSpaceId) -> Result<OpSpaceId> {
        match id.decode() {
            CompressedId::Final(final_id) => Ok(final_id.into()),
            CompressedId::Local(local) => {
                if !self.normalizer.contains(local.generation_count()) {
                    return Err(CompressorError::UnknownSessionSpaceId(id));
                }
                Ok(
                    match self
                        .local_session()
                        .try_convert_to_final(local, true, &self.final_space)
                    {
                        Some(final_id) => final_id.into(),
                        None => local.into(),
                    },
                )
            }
        }
    }

    /// Converts an id received with an operation from session `origin` into
    /// the local session's space.
    pub fn normalize_to_session_space(
        &self,
        id: OpSpaceId,
        origin: SessionId,
    ) -> Result<SessionSpaceId> {
        let unknown = || CompressorError::UnknownOpSpaceId { id, origin };
        match id.decode() {
            CompressedId::Final(final_id) => {
                let local_session = self.local_session();
                match local_session.cluster_by_final(final_id, &self.final_space) {
                    Some(cluster_ref) => {
                        let aligned = self
                            .final_space
                            .cluster(cluster_ref)
                            .aligned_local(final_id)
                            .ok_or_else(unknown)?;
                        let generation_count = aligned.generation_count();
                        if self.normalizer.contains(generation_count) {
                            Ok(aligned.into())
                        } else if generation_count <= self.generated_id_count {
                            Ok(final_id.into())
                        } else {
                            Err(unknown())
                        }
                    }
                    None if final_id < self.final_space.final_id_limit() => Ok(final_id.into()),
                    None => Err(unknown()),
                }
            }
            CompressedId::Local(local) if origin == self.local_session_id => {
                let generation_count = local.generation_count();
                if self.normalizer.contains(generation_count) {
                    Ok(local.into())
                } else if generation_count <= self.generated_id_count {
                    // Generated as an eager final.
                    self.local_session()
                        .try_convert_to_final(local, true, &self.final_space)
                        .map(Into::into)
                        .ok_or_else(unknown)
                } else {
                    Err(unknown())
                }
            }
            CompressedId::Local(local) => {
                // Locals of other sessions resolve only once finalized.
                let remote = self.sessions.get(origin).ok_or_else(unknown)?;
                self.sessions
                    .session(remote)
                    .try_convert_to_final(local, false, &self.final_space)
                    .map(Into::into)
                    .ok_or_else(unknown)
            }
        }
    }

    /// Expands a session space id into its stable id.
    pub fn decompress(&self, id: SessionSpaceId) -> Result<StableId> {
        self.try_decompress(id)
            .ok_or(CompressorError::UnknownSessionSpaceId(id))
    }

    /// Like `decompress`, but returns `None` for unknown ids.
    pub fn try_decompress(&self, id: SessionSpaceId) -> Option<StableId> {
        match id.decode() {
            CompressedId::Final(final_id) => {
                let cluster = self
                    .final_space
                    .cluster(self.final_space.containing_cluster(final_id)?);
                let aligned = cluster.aligned_local(final_id)?;
                let generation_count = aligned.generation_count();
                if generation_count >= cluster.finalized_end() {
                    // Reserved but not finalized: only the local session can
                    // hold it, as an eager final it actually generated.
                    if cluster.session != self.local_session
                        || self.normalizer.contains(generation_count)
                        || generation_count > self.generated_id_count
                    {
                        return None;
                    }
                }
                Some(self.sessions.session(cluster.session).stable_id_for(aligned))
            }
            CompressedId::Local(local) => {
                if !self.normalizer.contains(local.generation_count()) {
                    return None;
                }
                Some(self.local_session().stable_id_for(local))
            }
        }
    }

    /// Compresses a stable id back into session space.
    pub fn recompress(&self, stable_id: StableId) -> Result<SessionSpaceId> {
        self.try_recompress(stable_id)
            .ok_or(CompressorError::UnknownStableId(stable_id))
    }

    /// Like `recompress`, but returns `None` for unknown stable ids.
    pub fn try_recompress(&self, stable_id: StableId) -> Option<SessionSpaceId> {
        let numeric = NumericUuid::from(stable_id);

        // Fast path: one of our own ids minted as a local.
        if let Some(delta) = numeric.offset_from(self.local_session().session_uuid()) {
            let generation_count = delta + 1;
            if generation_count <= self.generated_id_count
                && self.normalizer.contains(generation_count)
            {
                return Some(LocalId::from_generation_count(generation_count).into());
            }
        }

        let (cluster_ref, aligned) = self
            .sessions
            .containing_cluster(numeric, &self.final_space)?;
        let cluster = self.final_space.cluster(cluster_ref);
        let generation_count = aligned.generation_count();
        let visible = if cluster.session == self.local_session {
            generation_count <= self.generated_id_count
        } else {
            generation_count < cluster.finalized_end()
        };
        if !visible {
            return None;
        }
        cluster.allocated_final(aligned).map(Into::into)
    }

    /// Serializes the compressor into a snapshot.
    ///
    /// With `include_local_state` the snapshot resumes this session when
    /// loaded with `deserialize`. Without it the snapshot only holds the
    /// finalized state shared by every peer, and must be loaded with
    /// `deserialize_with_session_id`.
    pub fn serialize(&self, include_local_state: bool) -> Vec<u8> {
        persistence::serialize(self, include_local_state)
    }

    /// Loads a snapshot written with local state.
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        persistence::deserialize(bytes, None)
    }

    /// Loads a snapshot written without local state, adopting `session_id`
    /// as the new local session.
    pub fn deserialize_with_session_id(bytes: &[u8], session_id: SessionId) -> Result<Self> {
        persistence::deserialize(bytes, Some(session_id))
    }
}

impl Default for IdCompressor {
    fn default() -> Self {
        IdCompressor::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(text: &str) -> SessionId {
        text.parse().unwrap()
    }

    fn compressor_with_capacity(capacity: u64) -> IdCompressor {
        IdCompressor::with_config(
            session("748540ca-b7c5-4c99-83ff-c1b8e02c09d6"),
            CompressorConfig::with_cluster_capacity(capacity),
        )
        .unwrap()
    }

    fn generate_n(compressor: &mut IdCompressor, n: usize) -> Vec<SessionSpaceId> {
        (0..n).map(|_| compressor.generate_next_id()).collect()
    }

    fn finalize_next_range(compressor: &mut IdCompressor) {
        let range = compressor.take_next_creation_range();
        compressor.finalize_creation_range(&range).unwrap();
    }

    #[test]
    fn test_compressor_creation() {
        let compressor = compressor_with_capacity(5);
        assert_eq!(compressor.cluster_capacity(), 5);
        assert_eq!(compressor.generated_id_count(), 0);
        assert_eq!(compressor.session_count(), 1);
        assert_eq!(compressor.cluster_count(), 0);
        assert_eq!(compressor.final_id_limit(), FinalId::new(0));
    }

    #[test]
    fn test_first_ids_are_local() {
        let mut compressor = compressor_with_capacity(5);
        let ids = generate_n(&mut compressor, 3);
        let raw: Vec<i64> = ids.iter().map(|id| id.as_i64()).collect();
        assert_eq!(raw, vec![-1, -2, -3]);
    }

    #[test]
    fn test_take_range_resets_base() {
        let mut compressor = compressor_with_capacity(5);
        assert!(compressor.take_next_creation_range().is_empty());

        generate_n(&mut compressor, 2);
        let first = compressor.take_next_creation_range();
        assert_eq!(first, IdCreationRange::new(compressor.local_session_id(), 1, 2));
        assert!(compressor.take_next_creation_range().is_empty());

        generate_n(&mut compressor, 3);
        let second = compressor.take_next_creation_range();
        assert_eq!(second, IdCreationRange::new(compressor.local_session_id(), 3, 3));
    }

    #[test]
    fn test_eager_finals_after_first_cluster() {
        let mut compressor = compressor_with_capacity(3);
        generate_n(&mut compressor, 2);
        finalize_next_range(&mut compressor);

        // The first cluster reserves 2 + 3 generation counts.
        let ids = generate_n(&mut compressor, 4);
        assert_eq!(ids[0].decode(), CompressedId::Final(FinalId::new(2)));
        assert_eq!(ids[2].decode(), CompressedId::Final(FinalId::new(4)));
        assert_eq!(ids[3].decode(), CompressedId::Local(LocalId::from_generation_count(6)));
    }

    #[test]
    fn test_first_cluster_reserves_range_plus_capacity() {
        let mut compressor = compressor_with_capacity(3);
        generate_n(&mut compressor, 5);
        finalize_next_range(&mut compressor);

        assert_eq!(compressor.cluster_count(), 1);
        let cluster = compressor.final_space.tail().unwrap();
        assert_eq!(cluster.count(), 5);
        assert_eq!(cluster.capacity(), 8);
    }

    #[test]
    fn test_grow_in_place_when_last() {
        let mut compressor = compressor_with_capacity(3);
        generate_n(&mut compressor, 2);
        finalize_next_range(&mut compressor);

        // Three eager finals fill the reserve, two more spill over.
        generate_n(&mut compressor, 5);
        finalize_next_range(&mut compressor);

        assert_eq!(compressor.cluster_count(), 1);
        let cluster = compressor.final_space.tail().unwrap();
        assert_eq!(cluster.count(), 7);
        assert_eq!(cluster.capacity(), 10);
        assert_eq!(compressor.final_id_limit(), FinalId::new(7));
    }

    #[test]
    fn test_overflow_into_new_cluster_when_not_last() {
        let mut compressor = compressor_with_capacity(3);
        let remote = session("0002c79e-b536-4776-b000-000266c252d5");

        generate_n(&mut compressor, 1);
        finalize_next_range(&mut compressor);
        compressor
            .finalize_creation_range(&IdCreationRange::new(remote, 1, 1))
            .unwrap();

        // Gen 2..=4 are eager, 5 and 6 are local.
        let ids = generate_n(&mut compressor, 5);
        assert!(ids[..3].iter().all(|id| id.is_final()));
        assert!(ids[3..].iter().all(|id| id.is_local()));
        finalize_next_range(&mut compressor);

        assert_eq!(compressor.cluster_count(), 3);
        let clusters: Vec<_> = compressor.final_space.clusters().cloned().collect();
        assert_eq!((clusters[0].capacity(), clusters[0].count()), (4, 4));
        assert_eq!(clusters[2].base_generation_count(), 5);
        assert_eq!(clusters[2].base_final_id(), FinalId::new(8));
        assert_eq!((clusters[2].capacity(), clusters[2].count()), (5, 2));
    }

    #[test]
    fn test_malformed_range() {
        let mut compressor = compressor_with_capacity(3);
        let range = IdCreationRange::new(compressor.local_session_id(), 1, 0);
        assert!(matches!(
            compressor.finalize_creation_range(&range),
            Err(CompressorError::MalformedRange { .. })
        ));
        let range = IdCreationRange::new(compressor.local_session_id(), 0, 2);
        assert!(matches!(
            compressor.finalize_creation_range(&range),
            Err(CompressorError::MalformedRange { .. })
        ));
    }

    #[test]
    fn test_empty_range_is_noop() {
        let mut compressor = compressor_with_capacity(3);
        let before = compressor.clone();
        let remote = session("0002c79e-b536-4776-b000-000266c252d5");
        compressor
            .finalize_creation_range(&IdCreationRange::empty(remote))
            .unwrap();
        assert_eq!(compressor, before);
    }

    #[test]
    fn test_finalizing_same_range_twice_fails() {
        let mut compressor = compressor_with_capacity(3);
        generate_n(&mut compressor, 2);
        let range = compressor.take_next_creation_range();
        compressor.finalize_creation_range(&range).unwrap();
        assert_eq!(
            compressor.finalize_creation_range(&range),
            Err(CompressorError::OutOfOrder {
                session: compressor.local_session_id(),
                expected: 3,
                actual: 1,
            })
        );
    }

    #[test]
    fn test_collision_leaves_state_unchanged() {
        let mut compressor = compressor_with_capacity(10);
        let a = session("10000000-0000-4000-8000-000000000000");
        compressor
            .finalize_creation_range(&IdCreationRange::new(a, 1, 1))
            .unwrap();

        let inside: SessionId = NumericUuid::from(a).offset(4).to_stable_id().into();
        let before = compressor.clone();
        assert_eq!(
            compressor.finalize_creation_range(&IdCreationRange::new(inside, 1, 1)),
            Err(CompressorError::Collision {
                session: inside,
                other: a,
            })
        );
        assert_eq!(compressor, before);
    }

    #[test]
    fn test_set_cluster_capacity_validation() {
        let mut compressor = IdCompressor::new();
        assert!(compressor.set_cluster_capacity(0).is_err());
        assert!(compressor.set_cluster_capacity(1).is_ok());
        assert!(compressor.set_cluster_capacity(u64::MAX).is_err());
        assert_eq!(compressor.cluster_capacity(), 1);
    }

    #[test]
    fn test_local_decompress_recompress() {
        let mut compressor = IdCompressor::new();
        let id = compressor.generate_next_id();
        let stable = compressor.local_session_id().stable_id();
        assert_eq!(compressor.decompress(id).unwrap(), stable);
        assert_eq!(compressor.recompress(stable).unwrap(), id);
    }

    #[test]
    fn test_ungenerated_local_is_unknown() {
        let compressor = IdCompressor::new();
        let id = SessionSpaceId::from(LocalId::from_generation_count(1));
        assert_eq!(compressor.try_decompress(id), None);
        assert_eq!(
            compressor.normalize_to_op_space(id),
            Err(CompressorError::UnknownSessionSpaceId(id))
        );
    }
}
