//! Several peers minting ids concurrently through a shared sequencer.
//!
//! This example showcases:
//! - One compressor per thread, each generating ids at its own pace
//! - A total order broadcast log standing in for the sequencing service
//! - Peers catching up on the log and agreeing on every final id
//!
//! Run with: cargo run --example multi_peer

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crdt_id_compressor::{
    CompressorConfig, IdCompressor, IdCreationRange, OpSpaceId, SessionId, SessionSpaceId,
};
use parking_lot::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

const PEERS: usize = 4;
const ROUNDS: usize = 50;

/// Append-only log of sequenced creation ranges.
#[derive(Default)]
struct Sequencer {
    log: Mutex<Vec<IdCreationRange>>,
}

impl Sequencer {
    fn submit(&self, range: IdCreationRange) {
        if !range.is_empty() {
            self.log.lock().push(range);
        }
    }

    /// Applies every range past `cursor` and returns the new cursor.
    fn catch_up(&self, compressor: &mut IdCompressor, cursor: usize) -> usize {
        let pending: Vec<IdCreationRange> = self.log.lock()[cursor..].to_vec();
        for range in &pending {
            compressor
                .finalize_creation_range(range)
                .expect("sequenced ranges always apply");
        }
        cursor + pending.len()
    }
}

struct Peer {
    compressor: IdCompressor,
    cursor: usize,
    ids: Vec<SessionSpaceId>,
}

fn run_peer(index: usize, sequencer: Arc<Sequencer>) -> Peer {
    let mut compressor = IdCompressor::with_config(
        SessionId::random(),
        CompressorConfig::with_cluster_capacity(32),
    )
    .expect("valid configuration");
    let mut cursor = 0;
    let mut ids = Vec::new();

    for round in 0..ROUNDS {
        for _ in 0..(round + index) % 7 + 1 {
            ids.push(compressor.generate_next_id());
        }
        sequencer.submit(compressor.take_next_creation_range());
        cursor = sequencer.catch_up(&mut compressor, cursor);
    }

    Peer {
        compressor,
        cursor,
        ids,
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("=== Multi Peer Id Compressor Example ===\n");

    let sequencer = Arc::new(Sequencer::default());
    let start = Instant::now();

    let handles: Vec<_> = (0..PEERS)
        .map(|index| {
            let sequencer = Arc::clone(&sequencer);
            thread::spawn(move || run_peer(index, sequencer))
        })
        .collect();
    let mut peers: Vec<Peer> = handles
        .into_iter()
        .map(|handle| handle.join().expect("peer thread panicked"))
        .collect();

    for peer in &mut peers {
        peer.cursor = sequencer.catch_up(&mut peer.compressor, peer.cursor);
    }
    info!(
        ranges = sequencer.log.lock().len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "all peers caught up"
    );

    println!("--- Per peer ---");
    for peer in &peers {
        let eager = peer.ids.iter().filter(|id| id.is_final()).count();
        println!(
            "  {}: {} ids, {} generated as eager finals",
            peer.compressor.local_session_id(),
            peer.ids.len(),
            eager
        );
    }

    // Every op space id must expand to the same stable id on every peer.
    let mut checked = 0;
    for origin in &peers {
        let origin_session = origin.compressor.local_session_id();
        for id in &origin.ids {
            let op_space_id: OpSpaceId = origin.compressor.normalize_to_op_space(*id).unwrap();
            let expected = origin.compressor.decompress(*id).unwrap();
            for peer in &peers {
                let local = peer
                    .compressor
                    .normalize_to_session_space(op_space_id, origin_session)
                    .unwrap();
                assert_eq!(peer.compressor.decompress(local).unwrap(), expected);
                checked += 1;
            }
        }
    }

    let reference = &peers[0].compressor;
    println!("\n--- Shared state ---");
    println!("  Clusters:        {}", reference.cluster_count());
    println!("  Final id limit:  {}", reference.final_id_limit().id());
    println!("  Translations checked: {}", checked);
    println!("  Elapsed: {:?}", start.elapsed());
}
