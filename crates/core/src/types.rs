use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    pub struct RoomId;
    pub struct CorridorId;
    pub struct StairId;
}

/// A single voxel coordinate. `z` is the floor layer; `x`/`y` span the
/// horizontal plane of that layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Cell {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self { x: self.x + dx, y: self.y + dy, z: self.z }
    }

    pub fn above(self) -> Self {
        Self { x: self.x, y: self.y, z: self.z + 1 }
    }

    pub fn manhattan_xy(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// Horizontal footprint of a room in cells. Every room occupies exactly
/// one floor layer, so no vertical extent is carried here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellExtent {
    pub width: u32,
    pub depth: u32,
}

/// Tag carried by every cell of the voxel grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CellKind {
    Empty,
    RoomFloor,
    CorridorFloor,
    Wall,
    Stair,
    Door,
}

impl CellKind {
    pub fn canonical_byte(self) -> u8 {
        match self {
            CellKind::Empty => 0,
            CellKind::RoomFloor => 1,
            CellKind::CorridorFloor => 2,
            CellKind::Wall => 3,
            CellKind::Stair => 4,
            CellKind::Door => 5,
        }
    }

    /// Cells a generated dungeon exposes as floor space.
    pub fn is_walkable(self) -> bool {
        matches!(
            self,
            CellKind::RoomFloor | CellKind::CorridorFloor | CellKind::Stair | CellKind::Door
        )
    }
}

/// Step directions used by corridor routing and stair placement, in the
/// fixed probe order north, east, south, west.
pub(crate) const CARDINAL_STEPS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];
