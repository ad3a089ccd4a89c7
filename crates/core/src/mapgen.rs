//! Procedural dungeon generation pipeline split into coherent stages:
//! room packing, per-floor connectivity graphs, corridor routing and
//! vertical stair placement, all fed by one seeded random stream.

mod corridor;
mod generator;
mod graph;
mod rng;
mod rooms;
mod stairs;

pub use generator::DungeonGenerator;

use crate::descriptor::DungeonDescriptor;
use crate::error::GenerationError;
use crate::params::GenerationParameters;

/// Runs one full generation. Identical seed and parameters always yield
/// a byte-identical descriptor; failures never return a partial dungeon.
pub fn generate(
    seed: u64,
    params: &GenerationParameters,
) -> Result<DungeonDescriptor, GenerationError> {
    DungeonGenerator::new(seed, params.clone()).generate()
}
