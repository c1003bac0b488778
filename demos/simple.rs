//! Simple standalone example of id compressor usage.
//!
//! This example follows two sessions through generating ids, sequencing their
//! creation ranges and exchanging ids in op space.
//!
//! Run with: cargo run --example simple

use crdt_id_compressor::{CompressorConfig, IdCompressor, SessionId};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("=== Simple Id Compressor Example ===\n");

    let config = CompressorConfig::with_cluster_capacity(4);
    let mut alice = IdCompressor::with_config(SessionId::random(), config).unwrap();
    let mut bob = IdCompressor::with_config(SessionId::random(), config).unwrap();

    println!("Alice is session {}", alice.local_session_id());
    println!("Bob is session   {}\n", bob.local_session_id());

    // Alice creates three ids before talking to anyone
    println!("Alice generates 3 ids:");
    let alice_ids: Vec<_> = (0..3).map(|_| alice.generate_next_id()).collect();
    for id in &alice_ids {
        println!("  {} -> {}", id, alice.decompress(*id).unwrap());
    }

    println!("\nBob generates 2 ids:");
    let bob_ids: Vec<_> = (0..2).map(|_| bob.generate_next_id()).collect();
    for id in &bob_ids {
        println!("  {} -> {}", id, bob.decompress(*id).unwrap());
    }

    // The sequencer orders Alice's range before Bob's, and both apply both
    println!("\n--- Sequencing creation ranges ---");
    let alice_range = alice.take_next_creation_range();
    let bob_range = bob.take_next_creation_range();
    for range in [&alice_range, &bob_range] {
        alice.finalize_creation_range(range).unwrap();
        bob.finalize_creation_range(range).unwrap();
    }
    println!("  Final ids handed out so far: {}", alice.final_id_limit().id());

    println!("\n--- Ids on the wire ---");
    for id in &alice_ids {
        let op_space_id = alice.normalize_to_op_space(*id).unwrap();
        let in_bob = bob
            .normalize_to_session_space(op_space_id, alice.local_session_id())
            .unwrap();
        println!(
            "  Alice {} sends {} which Bob reads as {} ({})",
            id,
            op_space_id,
            in_bob,
            bob.decompress(in_bob).unwrap()
        );
    }

    // Alice still has reserved capacity, so new ids are final right away
    println!("\nAlice generates 2 more ids:");
    for _ in 0..2 {
        let id = alice.generate_next_id();
        let kind = if id.is_final() { "eager final" } else { "local" };
        println!("  {} ({})", id, kind);
    }

    println!("\n--- Snapshot ---");
    let bytes = alice.serialize(true);
    let restored = IdCompressor::deserialize(&bytes).unwrap();
    println!("  {} bytes, restored equal: {}", bytes.len(), restored == alice);
}
