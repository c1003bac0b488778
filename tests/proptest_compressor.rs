//! Property tests for the id compressor.
//!
//! Several peers generate ids and hand their creation ranges to a simulated
//! sequencer, which delivers them to every peer in one total order, possibly
//! long after they were taken. Whatever the interleaving, ids must translate
//! losslessly and every peer must agree on the finalized state.

use std::collections::{HashSet, VecDeque};

use proptest::prelude::*;

use crdt_id_compressor::{
    CompressorConfig, IdCompressor, IdCreationRange, SessionId, SessionSpaceId, StableId,
};

const SESSIONS: [&str; 3] = [
    "748540ca-b7c5-4c99-83ff-c1b8e02c09d6",
    "0002c79e-b536-4776-b000-000266c252d5",
    "5fff846a-efd4-42fb-8b78-b32ce2672f99",
];

#[derive(Debug, Clone)]
enum Action {
    Generate { peer: usize, count: usize },
    TakeRange { peer: usize },
    /// Delivers the oldest pending range to every peer.
    Sequence,
    /// Replaces a peer by a copy loaded from its own snapshot.
    Reload { peer: usize },
}

fn action_strategy() -> impl Strategy<Value = Action> {
    let peers = SESSIONS.len();
    prop_oneof![
        4 => (0..peers, 1usize..6).prop_map(|(peer, count)| Action::Generate { peer, count }),
        2 => (0..peers).prop_map(|peer| Action::TakeRange { peer }),
        3 => Just(Action::Sequence),
        1 => (0..peers).prop_map(|peer| Action::Reload { peer }),
    ]
}

/// Total order broadcast of creation ranges.
#[derive(Default)]
struct Sequencer {
    pending: VecDeque<IdCreationRange>,
}

impl Sequencer {
    fn submit(&mut self, range: IdCreationRange) {
        if !range.is_empty() {
            self.pending.push_back(range);
        }
    }

    fn deliver_next(&mut self, peers: &mut [IdCompressor]) -> Result<(), TestCaseError> {
        if let Some(range) = self.pending.pop_front() {
            for peer in peers.iter_mut() {
                prop_assert_eq!(peer.finalize_creation_range(&range), Ok(()));
            }
        }
        Ok(())
    }

    fn deliver_all(&mut self, peers: &mut [IdCompressor]) -> Result<(), TestCaseError> {
        while !self.pending.is_empty() {
            self.deliver_next(peers)?;
        }
        Ok(())
    }
}

fn new_peers(cluster_capacity: u64) -> Vec<IdCompressor> {
    SESSIONS
        .iter()
        .map(|text| {
            IdCompressor::with_config(
                text.parse::<SessionId>().unwrap(),
                CompressorConfig::with_cluster_capacity(cluster_capacity),
            )
            .unwrap()
        })
        .collect()
}

fn run(
    cluster_capacity: u64,
    actions: &[Action],
) -> Result<(Vec<IdCompressor>, Vec<Vec<SessionSpaceId>>, Sequencer), TestCaseError> {
    let mut peers = new_peers(cluster_capacity);
    let mut generated = vec![Vec::new(); peers.len()];
    let mut sequencer = Sequencer::default();

    for action in actions {
        match *action {
            Action::Generate { peer, count } => {
                for _ in 0..count {
                    generated[peer].push(peers[peer].generate_next_id());
                }
            }
            Action::TakeRange { peer } => sequencer.submit(peers[peer].take_next_creation_range()),
            Action::Sequence => sequencer.deliver_next(&mut peers)?,
            Action::Reload { peer } => {
                let restored = IdCompressor::deserialize(&peers[peer].serialize(true));
                prop_assert_eq!(restored.as_ref(), Ok(&peers[peer]));
                if let Ok(restored) = restored {
                    peers[peer] = restored;
                }
            }
        }
    }
    Ok((peers, generated, sequencer))
}

proptest! {
    /// Every id a peer generated round-trips through op space and through its
    /// stable id, finalized or not.
    #[test]
    fn prop_local_round_trips(
        cluster_capacity in 1u64..6,
        actions in prop::collection::vec(action_strategy(), 1..60)
    ) {
        let (peers, generated, _) = run(cluster_capacity, &actions)?;
        for (peer, ids) in peers.iter().zip(&generated) {
            let origin = peer.local_session_id();
            for id in ids {
                let stable = peer.decompress(*id).unwrap();
                let op_space_id = peer.normalize_to_op_space(*id).unwrap();
                let back = peer.normalize_to_session_space(op_space_id, origin).unwrap();
                prop_assert_eq!(back, *id);
                prop_assert_eq!(peer.decompress(back).unwrap(), stable);
                prop_assert_eq!(peer.recompress(stable).unwrap(), *id);
            }
        }
    }

    /// Once every range is sequenced, all peers resolve every id to the same
    /// stable id, and no two ids share one.
    #[test]
    fn prop_peers_converge(
        cluster_capacity in 1u64..6,
        actions in prop::collection::vec(action_strategy(), 1..60)
    ) {
        let (mut peers, generated, mut sequencer) = run(cluster_capacity, &actions)?;
        for index in 0..peers.len() {
            let range = peers[index].take_next_creation_range();
            sequencer.submit(range);
        }
        sequencer.deliver_all(&mut peers)?;

        let mut seen: HashSet<StableId> = HashSet::new();
        for (origin, ids) in peers.iter().zip(&generated) {
            for id in ids {
                let expected = origin.decompress(*id).unwrap();
                prop_assert!(seen.insert(expected));
                let op_space_id = origin.normalize_to_op_space(*id).unwrap();
                prop_assert!(op_space_id.is_final());
                for peer in &peers {
                    let local = peer
                        .normalize_to_session_space(op_space_id, origin.local_session_id())
                        .unwrap();
                    prop_assert_eq!(peer.decompress(local).unwrap(), expected);
                    prop_assert_eq!(peer.recompress(expected).unwrap(), local);
                }
            }
        }
    }

    /// Final ids are handed out contiguously and never twice, and every
    /// session's clusters cover its generation counts without overlap.
    #[test]
    fn prop_cluster_invariants(
        cluster_capacity in 1u64..6,
        actions in prop::collection::vec(action_strategy(), 1..60)
    ) {
        let (peers, _, _) = run(cluster_capacity, &actions)?;
        for peer in &peers {
            let mut next_base_final = 0;
            for cluster in peer.final_space().clusters() {
                prop_assert_eq!(cluster.base_final_id().id(), next_base_final);
                prop_assert!(cluster.count() > 0);
                prop_assert!(cluster.count() <= cluster.capacity());
                next_base_final += cluster.capacity();
            }

            for session in peer.sessions().iter() {
                let mut next_generation = 1;
                let clusters = session.clusters();
                for (position, cluster_ref) in clusters.iter().enumerate() {
                    let cluster = peer.final_space().cluster(*cluster_ref);
                    prop_assert_eq!(cluster.base_generation_count(), next_generation);
                    if position + 1 < clusters.len() {
                        prop_assert_eq!(cluster.count(), cluster.capacity());
                    }
                    next_generation = cluster.allocated_end();
                }
            }
        }

        // Everyone agrees on the final space.
        let summary = |peer: &IdCompressor| -> Vec<(SessionId, u64, u64, u64)> {
            peer.final_space()
                .clusters()
                .map(|cluster| (
                    peer.sessions().session(cluster.session()).session_id(),
                    cluster.base_final_id().id(),
                    cluster.capacity(),
                    cluster.count(),
                ))
                .collect()
        };
        for peer in &peers[1..] {
            prop_assert_eq!(summary(peer), summary(&peers[0]));
        }
    }
}
