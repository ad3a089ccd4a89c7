//! Seeded multi-floor dungeon layout generation. The single entry point
//! is [`generate`]: given a seed and [`GenerationParameters`] it packs
//! rooms, connects them per floor, routes corridors, places stairs and
//! returns an immutable [`DungeonDescriptor`] or a terminal
//! [`GenerationError`]. Same inputs, same dungeon, on every platform.

pub mod descriptor;
pub mod error;
pub mod mapgen;
pub mod params;
pub mod types;
pub mod voxel;

pub use descriptor::{Corridor, DungeonDescriptor, Room, Stair};
pub use error::GenerationError;
pub use mapgen::{DungeonGenerator, generate};
pub use params::GenerationParameters;
pub use types::{Cell, CellExtent, CellKind, CorridorId, RoomId, StairId};
pub use voxel::VoxelGrid;
