//! Sessions and the sessions registry.
//!
//! A `Session` is the chain of clusters one peer has been allocated, in
//! generation-count order. The `Sessions` registry owns every session a
//! compressor has heard of and indexes them by numeric uuid, which serves both
//! exact lookup by session id and predecessor search from an arbitrary stable
//! id to the session that may have minted it.

use std::fmt;

use crossbeam_skiplist::SkipMap;

use crate::compressor::final_space::{ClusterRef, FinalSpace};
use crate::compressor::types::{
    FinalId, LocalId, NUMERIC_UUID_MASK, NumericUuid, SessionId, StableId,
};

/// Position of a session in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionRef(usize);

impl SessionRef {
    pub(crate) fn from_index(index: usize) -> Self {
        SessionRef(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

/// The ids created by one session, stored as a cluster chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    session_id: SessionId,
    session_uuid: NumericUuid,
    // Ascending in both generation count and final id.
    clusters: Vec<ClusterRef>,
}

impl Session {
    fn new(session_id: SessionId) -> Self {
        Session {
            session_id,
            session_uuid: NumericUuid::from(session_id),
            clusters: Vec::new(),
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn session_uuid(&self) -> NumericUuid {
        self.session_uuid
    }

    pub fn clusters(&self) -> &[ClusterRef] {
        &self.clusters
    }

    pub fn tail_cluster(&self) -> Option<ClusterRef> {
        self.clusters.last().copied()
    }

    pub(crate) fn push_cluster(&mut self, cluster_ref: ClusterRef) {
        self.clusters.push(cluster_ref);
    }

    /// First generation count not covered by any cluster of this session.
    pub fn allocated_end(&self, final_space: &FinalSpace) -> u64 {
        match self.tail_cluster() {
            Some(tail) => final_space.cluster(tail).allocated_end(),
            None => 1,
        }
    }

    /// Numeric uuid of the last id reserved for this session, if any is.
    pub fn max_allocated_uuid(&self, final_space: &FinalSpace) -> Option<NumericUuid> {
        let tail = self.tail_cluster()?;
        let last_generation = final_space.cluster(tail).allocated_end() - 1;
        Some(self.uuid_for_generation(last_generation))
    }

    pub fn uuid_for_generation(&self, generation_count: u64) -> NumericUuid {
        self.session_uuid.offset(generation_count as i64 - 1)
    }

    pub fn stable_id_for(&self, local: LocalId) -> StableId {
        self.uuid_for_generation(local.generation_count())
            .to_stable_id()
    }

    /// Finds the cluster covering `local`, counting reserved capacity only
    /// when `include_allocated` is set.
    pub fn cluster_by_local(
        &self,
        local: LocalId,
        include_allocated: bool,
        final_space: &FinalSpace,
    ) -> Option<ClusterRef> {
        let generation_count = local.generation_count();
        let index = self.clusters.partition_point(|cluster_ref| {
            final_space.cluster(*cluster_ref).base_generation_count() <= generation_count
        });
        let candidate = self.clusters[index.checked_sub(1)?];
        final_space
            .cluster(candidate)
            .contains_generation(generation_count, include_allocated)
            .then_some(candidate)
    }

    /// Finds the cluster of this session whose capacity covers `final_id`.
    pub fn cluster_by_final(&self, final_id: FinalId, final_space: &FinalSpace) -> Option<ClusterRef> {
        let index = self.clusters.partition_point(|cluster_ref| {
            final_space.cluster(*cluster_ref).base_final_id() <= final_id
        });
        let candidate = self.clusters[index.checked_sub(1)?];
        final_space
            .cluster(candidate)
            .contains_final(final_id)
            .then_some(candidate)
    }

    pub fn try_convert_to_final(
        &self,
        local: LocalId,
        include_allocated: bool,
        final_space: &FinalSpace,
    ) -> Option<FinalId> {
        let cluster_ref = self.cluster_by_local(local, include_allocated, final_space)?;
        final_space.cluster(cluster_ref).allocated_final(local)
    }
}

/// Every session known to a compressor.
pub struct Sessions {
    sessions: Vec<Session>,
    by_uuid: SkipMap<NumericUuid, SessionRef>,
}

impl Sessions {
    pub fn new() -> Self {
        Sessions {
            sessions: Vec::new(),
            by_uuid: SkipMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.iter()
    }

    pub fn get_or_create(&mut self, session_id: SessionId) -> SessionRef {
        if let Some(existing) = self.get(session_id) {
            return existing;
        }
        let session = Session::new(session_id);
        let session_ref = SessionRef(self.sessions.len());
        self.by_uuid.insert(session.session_uuid(), session_ref);
        self.sessions.push(session);
        session_ref
    }

    pub fn get(&self, session_id: SessionId) -> Option<SessionRef> {
        self.by_uuid
            .get(&NumericUuid::from(session_id))
            .map(|entry| *entry.value())
    }

    pub fn session(&self, session_ref: SessionRef) -> &Session {
        &self.sessions[session_ref.0]
    }

    pub(crate) fn session_mut(&mut self, session_ref: SessionRef) -> &mut Session {
        &mut self.sessions[session_ref.0]
    }

    /// The session with the greatest numeric uuid not exceeding `query`
    /// among those owning at least one cluster.
    ///
    /// Sessions without clusters reserve no uuids and may sit inside the span
    /// of another session, so they are skipped.
    pub fn predecessor(&self, query: NumericUuid) -> Option<SessionRef> {
        self.by_uuid
            .range(..=query)
            .rev()
            .map(|entry| *entry.value())
            .find(|session_ref| !self.session(*session_ref).clusters().is_empty())
    }

    /// Resolves a stable id to the cluster whose capacity covers it, and the
    /// local id it has within its session. The id is not necessarily
    /// generated or finalized.
    pub fn containing_cluster(
        &self,
        query: NumericUuid,
        final_space: &FinalSpace,
    ) -> Option<(ClusterRef, LocalId)> {
        let session = self.session(self.predecessor(query)?);
        let delta = query.offset_from(session.session_uuid())?;
        if delta + 1 >= session.allocated_end(final_space) {
            return None;
        }
        let local = LocalId::from_generation_count(delta + 1);
        let cluster_ref = session.cluster_by_local(local, true, final_space)?;
        Some((cluster_ref, local))
    }

    /// Returns the id of a session other than `owner` whose reserved uuids
    /// intersect `[base, base + length)`. `owner` need not be registered yet.
    pub fn colliding_session(
        &self,
        owner: SessionId,
        base: NumericUuid,
        length: u64,
        final_space: &FinalSpace,
    ) -> Option<SessionId> {
        let max_raw = base.raw() + u128::from(length) - 1;
        if max_raw > NUMERIC_UUID_MASK {
            // The span would run off the end of the uuid space.
            return Some(owner);
        }
        let max = NumericUuid::from_raw(max_raw);
        // Spans of sessions never overlap, so the nearest populated session
        // below `max` is the only one that can reach into the new span.
        for entry in self.by_uuid.range(..=max).rev() {
            let candidate = self.session(*entry.value());
            if candidate.session_id() == owner {
                continue;
            }
            if let Some(candidate_max) = candidate.max_allocated_uuid(final_space) {
                return (candidate_max >= base).then_some(candidate.session_id());
            }
        }
        None
    }
}

impl Default for Sessions {
    fn default() -> Self {
        Sessions::new()
    }
}

impl Clone for Sessions {
    fn clone(&self) -> Self {
        let by_uuid = SkipMap::new();

        for entry in self.by_uuid.iter() {
            by_uuid.insert(*entry.key(), *entry.value());
        }

        Sessions {
            sessions: self.sessions.clone(),
            by_uuid,
        }
    }
}

// The uuid index is derived from the session list.
impl PartialEq for Sessions {
    fn eq(&self, other: &Self) -> bool {
        self.sessions == other.sessions
    }
}

impl Eq for Sessions {}

impl fmt::Debug for Sessions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.sessions.iter()).finish()
    }
}
