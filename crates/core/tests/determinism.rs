//! Cross-run reproducibility: same seed and parameters must produce a
//! byte-identical descriptor, and distinct seeds must diverge.

use core::{DungeonGenerator, GenerationParameters, generate};
use xxhash_rust::xxh3::xxh3_64;

#[test]
fn same_seed_and_parameters_replay_byte_identically() {
    let params = GenerationParameters::default();

    let first = generate(42, &params).expect("seed 42 generates");
    let second = generate(42, &params).expect("seed 42 generates");

    assert_eq!(first.canonical_bytes(), second.canonical_bytes());
    assert_eq!(xxh3_64(&first.canonical_bytes()), xxh3_64(&second.canonical_bytes()));
}

#[test]
fn multi_floor_runs_replay_byte_identically() {
    let params = GenerationParameters {
        width: 32,
        depth: 32,
        height: 2,
        floors: 2,
        min_rooms: 8,
        max_rooms: 12,
        max_stair_run: 8,
        ..Default::default()
    };

    // Stair placement may fail cleanly for awkward seeds; replay the
    // first seed that generates.
    let (seed, first) = (0..64)
        .find_map(|seed| generate(seed, &params).ok().map(|descriptor| (seed, descriptor)))
        .expect("some seed in the sweep produces a two-floor dungeon");
    let second = generate(seed, &params).expect("same seed generates again");

    assert!(first.stair_count() >= 1);
    assert_eq!(first.canonical_bytes(), second.canonical_bytes());
}

#[test]
fn different_seeds_produce_different_dungeons() {
    let params = GenerationParameters::default();

    let a = generate(1, &params).expect("seed 1 generates");
    let b = generate(2, &params).expect("seed 2 generates");

    assert_ne!(a.canonical_bytes(), b.canonical_bytes());
}

#[test]
fn helper_and_generator_entry_points_agree() {
    let params = GenerationParameters::default();

    let from_helper = generate(1234, &params).expect("generates");
    let from_generator =
        DungeonGenerator::new(1234, params).generate().expect("generates");

    assert_eq!(from_helper.canonical_bytes(), from_generator.canonical_bytes());
}

#[test]
fn canonical_bytes_are_stable_across_repeated_calls() {
    let descriptor = generate(9, &GenerationParameters::default()).expect("generates");

    assert_eq!(descriptor.canonical_bytes(), descriptor.canonical_bytes());
}
