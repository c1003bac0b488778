//! Binary snapshots of a compressor.
//!
//! All integers are big-endian.
//!
//! ```text
//! u32   version
//! u8    has local state (0 or 1)
//! if local state:
//!   u128  local session uuid
//!   u64   generated id count
//!   u64   next range base generation count
//!   u64   normalizer run count, then (u64 first generation count, u64 length)*
//! u64   cluster capacity
//! u64   session count, then u128 session uuid*
//! u64   cluster count, then (u64 session index, u64 capacity, u64 count)*
//! ```
//!
//! Clusters are written in final id order, so base final ids are not stored:
//! loading replays the allocation from final id 0. Only sessions owning
//! clusters are written.

use tracing::info;

use crate::compressor::config::validate_cluster_capacity;
use crate::compressor::error::{CompressorError, Result};
use crate::compressor::id_compressor::IdCompressor;
use crate::compressor::normalizer::SessionSpaceNormalizer;
use crate::compressor::session::SessionRef;
use crate::compressor::types::SessionId;

/// The only snapshot version this build reads and writes.
pub const SNAPSHOT_VERSION: u32 = 1;

pub(super) fn serialize(compressor: &IdCompressor, include_local_state: bool) -> Vec<u8> {
    let mut buffer = Vec::new();
    write_u32(&mut buffer, SNAPSHOT_VERSION);
    buffer.push(u8::from(include_local_state));

    if include_local_state {
        write_u128(&mut buffer, compressor.local_session_id.as_u128());
        write_u64(&mut buffer, compressor.generated_id_count);
        write_u64(&mut buffer, compressor.next_range_base_gen_count);
        let runs = compressor.normalizer.ranges();
        write_u64(&mut buffer, runs.len() as u64);
        for &(first, length) in runs {
            write_u64(&mut buffer, first);
            write_u64(&mut buffer, length);
        }
    }

    write_u64(&mut buffer, compressor.cluster_capacity);

    // Session indices shift past the sessions that are left out.
    let mut table_indices = Vec::with_capacity(compressor.sessions.len());
    let mut table = Vec::new();
    for session in compressor.sessions.iter() {
        table_indices.push(table.len() as u64);
        if !session.clusters().is_empty() {
            table.push(session.session_id().as_u128());
        }
    }
    write_u64(&mut buffer, table.len() as u64);
    for uuid in table {
        write_u128(&mut buffer, uuid);
    }

    write_u64(&mut buffer, compressor.final_space.len() as u64);
    for cluster in compressor.final_space.clusters() {
        write_u64(&mut buffer, table_indices[cluster.session().index()]);
        write_u64(&mut buffer, cluster.capacity());
        write_u64(&mut buffer, cluster.count());
    }

    buffer
}

struct LocalState {
    session_id: SessionId,
    generated_id_count: u64,
    next_range_base_gen_count: u64,
    normalizer: SessionSpaceNormalizer,
}

impl LocalState {
    fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        let session_id = SessionId::from_u128(reader.read_u128()?)
            .map_err(|_| CompressorError::MalformedSnapshot("local session id is not a v4 uuid"))?;
        let generated_id_count = reader.read_u64()?;
        let next_range_base_gen_count = reader.read_u64()?;
        if generated_id_count >= i64::MAX as u64
            || next_range_base_gen_count == 0
            || next_range_base_gen_count > generated_id_count + 1
        {
            return Err(CompressorError::MalformedSnapshot(
                "inconsistent generation counters",
            ));
        }

        let run_count = reader.read_u64()?;
        let mut runs = Vec::new();
        for _ in 0..run_count {
            runs.push((reader.read_u64()?, reader.read_u64()?));
        }
        if runs
            .last()
            .is_some_and(|(first, length)| first.saturating_add(*length) > generated_id_count + 1)
        {
            return Err(CompressorError::MalformedSnapshot(
                "local ids beyond the generated id count",
            ));
        }
        let normalizer = SessionSpaceNormalizer::from_ranges(runs)
            .ok_or(CompressorError::MalformedSnapshot("invalid local id runs"))?;

        Ok(LocalState {
            session_id,
            generated_id_count,
            next_range_base_gen_count,
            normalizer,
        })
    }
}

pub(super) fn deserialize(bytes: &[u8], session_id: Option<SessionId>) -> Result<IdCompressor> {
    let mut reader = ByteReader::new(bytes);

    let version = reader.read_u32()?;
    if version != SNAPSHOT_VERSION {
        return Err(CompressorError::VersionMismatch {
            expected: SNAPSHOT_VERSION,
            found: version,
        });
    }
    let has_local_state = match reader.read_u8()? {
        0 => false,
        1 => true,
        _ => return Err(CompressorError::MalformedSnapshot("invalid local state flag")),
    };

    let (local_session_id, local_state) = match (has_local_state, session_id) {
        (true, Some(_)) => return Err(CompressorError::SessionIdForbidden),
        (false, None) => return Err(CompressorError::SessionIdRequired),
        (true, None) => {
            let state = LocalState::read(&mut reader)?;
            (state.session_id, Some(state))
        }
        (false, Some(session_id)) => (session_id, None),
    };

    let mut compressor = IdCompressor::with_session_id(local_session_id);
    compressor.cluster_capacity = reader.read_u64()?;
    validate_cluster_capacity(compressor.cluster_capacity)
        .map_err(|_| CompressorError::MalformedSnapshot("invalid cluster capacity"))?;

    let session_count = reader.read_u64()?;
    let mut table: Vec<SessionRef> = Vec::new();
    for _ in 0..session_count {
        let session_id = SessionId::from_u128(reader.read_u128()?)
            .map_err(|_| CompressorError::MalformedSnapshot("session id is not a v4 uuid"))?;
        match compressor.sessions.get(session_id) {
            Some(existing) if existing == compressor.local_session => {
                if local_state.is_none() {
                    return Err(CompressorError::SessionIdConflict(session_id));
                }
                if table.contains(&existing) {
                    return Err(CompressorError::MalformedSnapshot("duplicate session"));
                }
                table.push(existing);
            }
            Some(_) => return Err(CompressorError::MalformedSnapshot("duplicate session")),
            None => table.push(compressor.sessions.get_or_create(session_id)),
        }
    }

    let cluster_count = reader.read_u64()?;
    for _ in 0..cluster_count {
        let session_index = reader.read_u64()?;
        let capacity = reader.read_u64()?;
        let count = reader.read_u64()?;

        let session_ref = usize::try_from(session_index)
            .ok()
            .and_then(|index| table.get(index).copied())
            .ok_or(CompressorError::MalformedSnapshot("session index out of range"))?;
        if capacity == 0 || count == 0 || count > capacity {
            return Err(CompressorError::MalformedSnapshot("invalid cluster size"));
        }

        let session = compressor.sessions.session(session_ref);
        if let Some(tail) = session.tail_cluster() {
            let tail = compressor.final_space.cluster(tail);
            if tail.count() != tail.capacity() {
                return Err(CompressorError::MalformedSnapshot(
                    "cluster follows an unfilled cluster of its session",
                ));
            }
        }
        let base_generation = session.allocated_end(&compressor.final_space);
        let fits = |base: u64| {
            base.checked_add(capacity)
                .is_some_and(|end| end <= i64::MAX as u64)
        };
        if !fits(base_generation) || !fits(compressor.final_space.next_base_final().id()) {
            return Err(CompressorError::MalformedSnapshot("cluster exceeds the id space"));
        }
        let span_length = base_generation - 1 + capacity;
        if compressor
            .sessions
            .colliding_session(
                session.session_id(),
                session.session_uuid(),
                span_length,
                &compressor.final_space,
            )
            .is_some()
        {
            return Err(CompressorError::MalformedSnapshot("overlapping session uuid spans"));
        }

        let cluster_ref = compressor.add_cluster(session_ref, base_generation, capacity);
        compressor.final_space.cluster_mut(cluster_ref).count = count;
    }

    if !reader.is_empty() {
        return Err(CompressorError::MalformedSnapshot("trailing bytes"));
    }
    if table
        .iter()
        .any(|session_ref| compressor.sessions.session(*session_ref).clusters().is_empty())
    {
        return Err(CompressorError::MalformedSnapshot("session without clusters"));
    }

    if let Some(state) = local_state {
        let finalized_end = compressor
            .sessions
            .session(compressor.local_session)
            .tail_cluster()
            .map_or(1, |tail| compressor.final_space.cluster(tail).finalized_end());
        if finalized_end > state.next_range_base_gen_count {
            return Err(CompressorError::MalformedSnapshot(
                "local session finalized ids it never handed out",
            ));
        }
        compressor.generated_id_count = state.generated_id_count;
        compressor.next_range_base_gen_count = state.next_range_base_gen_count;
        compressor.normalizer = state.normalizer;
    }

    info!(
        local_session = %compressor.local_session_id,
        has_local_state,
        sessions = table.len(),
        clusters = cluster_count,
        "loaded compressor snapshot"
    );
    Ok(compressor)
}

fn write_u32(buffer: &mut Vec<u8>, value: u32) {
    buffer.extend_from_slice(&value.to_be_bytes());
}

fn write_u64(buffer: &mut Vec<u8>, value: u64) {
    buffer.extend_from_slice(&value.to_be_bytes());
}

fn write_u128(buffer: &mut Vec<u8>, value: u128) {
    buffer.extend_from_slice(&value.to_be_bytes());
}

/// Cursor over snapshot bytes. Running out of input is a malformed snapshot.
struct ByteReader<'a> {
    bytes: &'a [u8],
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        ByteReader { bytes }
    }

    fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let (head, rest) = self
            .bytes
            .split_first_chunk::<N>()
            .ok_or(CompressorError::MalformedSnapshot("unexpected end of snapshot"))?;
        self.bytes = rest;
        Ok(*head)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(u8::from_be_bytes(self.take()?))
    }

    fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.take()?))
    }

    fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.take()?))
    }

    fn read_u128(&mut self) -> Result<u128> {
        Ok(u128::from_be_bytes(self.take()?))
    }
}
