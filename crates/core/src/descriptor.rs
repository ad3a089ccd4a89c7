//! Final, immutable aggregate handed to downstream consumers. All
//! algorithmic work happens in `mapgen`; this module only stores results
//! and answers read-only queries.

use serde::Serialize;
use slotmap::{Key, SlotMap};

use crate::types::{Cell, CellExtent, CellKind, CorridorId, RoomId, StairId};
use crate::voxel::VoxelGrid;

/// Axis-aligned room volume on a single floor layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Room {
    pub id: RoomId,
    /// Minimum corner; `origin.z` equals the floor layer.
    pub origin: Cell,
    pub extent: CellExtent,
    pub floor: u32,
    /// Door cells on this room's boundary, in attachment order.
    pub doors: Vec<Cell>,
}

impl Room {
    pub fn max_x(&self) -> i32 {
        self.origin.x + self.extent.width as i32 - 1
    }

    pub fn max_y(&self) -> i32 {
        self.origin.y + self.extent.depth as i32 - 1
    }

    pub fn center_xy(&self) -> (f64, f64) {
        (
            self.origin.x as f64 + self.extent.width as f64 / 2.0,
            self.origin.y as f64 + self.extent.depth as f64 / 2.0,
        )
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.z == self.origin.z
            && cell.x >= self.origin.x
            && cell.x <= self.max_x()
            && cell.y >= self.origin.y
            && cell.y <= self.max_y()
    }

    /// Boundary cells on the face pointed at by the unit step
    /// `(dx, dy)`, ordered by ascending y then x.
    pub(crate) fn face_cells(&self, dx: i32, dy: i32) -> Vec<Cell> {
        let z = self.origin.z;
        match (dx, dy) {
            (1, 0) => (self.origin.y..=self.max_y()).map(|y| Cell::new(self.max_x(), y, z)).collect(),
            (-1, 0) => (self.origin.y..=self.max_y()).map(|y| Cell::new(self.origin.x, y, z)).collect(),
            (0, 1) => (self.origin.x..=self.max_x()).map(|x| Cell::new(x, self.max_y(), z)).collect(),
            (0, -1) => (self.origin.x..=self.max_x()).map(|x| Cell::new(x, self.origin.y, z)).collect(),
            _ => Vec::new(),
        }
    }
}

/// A routed corridor between two rooms on the same floor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Corridor {
    pub id: CorridorId,
    pub from_room: RoomId,
    pub to_room: RoomId,
    /// Door on `from_room`'s boundary.
    pub door_a: Cell,
    /// Door on `to_room`'s boundary.
    pub door_b: Cell,
    /// Ordered path between the two doors, exclusive of the door cells.
    /// May traverse cells claimed earlier by another corridor.
    pub cells: Vec<Cell>,
    /// Subset of `cells` this corridor claimed first.
    pub claimed: Vec<Cell>,
    /// True for spanning-tree corridors, false for loop corridors.
    pub is_main: bool,
}

/// A straight stair run linking a room on floor `f` to one on `f + 1`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Stair {
    pub id: StairId,
    pub lower_room: RoomId,
    pub upper_room: RoomId,
    /// Run cells on the lower layer followed by the upper landing.
    pub cells: Vec<Cell>,
    pub bottom: Cell,
    pub top: Cell,
}

#[derive(Clone, Debug)]
pub struct DungeonDescriptor {
    grid: VoxelGrid,
    rooms: SlotMap<RoomId, Room>,
    corridors: SlotMap<CorridorId, Corridor>,
    stairs: SlotMap<StairId, Stair>,
    room_order: Vec<RoomId>,
    corridor_order: Vec<CorridorId>,
    stair_order: Vec<StairId>,
}

impl DungeonDescriptor {
    pub(crate) fn assemble(
        grid: VoxelGrid,
        rooms: SlotMap<RoomId, Room>,
        corridors: SlotMap<CorridorId, Corridor>,
        stairs: SlotMap<StairId, Stair>,
        room_order: Vec<RoomId>,
        corridor_order: Vec<CorridorId>,
        stair_order: Vec<StairId>,
    ) -> Self {
        Self { grid, rooms, corridors, stairs, room_order, corridor_order, stair_order }
    }

    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    /// Grid extent as (width, depth, height) in cells.
    pub fn bounds(&self) -> (u32, u32, u32) {
        (self.grid.width(), self.grid.depth(), self.grid.height())
    }

    pub fn cell(&self, x: i32, y: i32, z: i32) -> Option<CellKind> {
        self.grid.get(Cell::new(x, y, z))
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(id)
    }

    pub fn room_at(&self, cell: Cell) -> Option<RoomId> {
        self.grid.room_owner_at(cell)
    }

    /// Rooms in their stable generation order.
    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.room_order.iter().map(|id| &self.rooms[*id])
    }

    pub fn room_count(&self) -> usize {
        self.room_order.len()
    }

    pub fn corridors(&self) -> impl Iterator<Item = &Corridor> {
        self.corridor_order.iter().map(|id| &self.corridors[*id])
    }

    pub fn corridor_count(&self) -> usize {
        self.corridor_order.len()
    }

    pub fn stairs(&self) -> impl Iterator<Item = &Stair> {
        self.stair_order.iter().map(|id| &self.stairs[*id])
    }

    pub fn stair_count(&self) -> usize {
        self.stair_order.len()
    }

    /// Corridors attached to `room`, in generation order.
    pub fn corridors_of(&self, room: RoomId) -> Vec<&Corridor> {
        self.corridors()
            .filter(|corridor| corridor.from_room == room || corridor.to_room == room)
            .collect()
    }

    /// Stairs attached to `room`, in generation order.
    pub fn stairs_of(&self, room: RoomId) -> Vec<&Stair> {
        self.stairs()
            .filter(|stair| stair.lower_room == room || stair.upper_room == room)
            .collect()
    }

    /// Byte-stable encoding of the full descriptor. Two runs with the
    /// same seed and parameters produce identical bytes.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        self.grid.canonical_bytes_into(&mut bytes);

        bytes.extend((self.room_order.len() as u32).to_le_bytes());
        for room in self.rooms() {
            bytes.extend(room.id.data().as_ffi().to_le_bytes());
            push_cell(&mut bytes, room.origin);
            bytes.extend(room.extent.width.to_le_bytes());
            bytes.extend(room.extent.depth.to_le_bytes());
            bytes.extend(room.floor.to_le_bytes());
            bytes.extend((room.doors.len() as u32).to_le_bytes());
            for &door in &room.doors {
                push_cell(&mut bytes, door);
            }
        }

        bytes.extend((self.corridor_order.len() as u32).to_le_bytes());
        for corridor in self.corridors() {
            bytes.extend(corridor.from_room.data().as_ffi().to_le_bytes());
            bytes.extend(corridor.to_room.data().as_ffi().to_le_bytes());
            push_cell(&mut bytes, corridor.door_a);
            push_cell(&mut bytes, corridor.door_b);
            bytes.push(u8::from(corridor.is_main));
            bytes.extend((corridor.cells.len() as u32).to_le_bytes());
            for &cell in &corridor.cells {
                push_cell(&mut bytes, cell);
            }
        }

        bytes.extend((self.stair_order.len() as u32).to_le_bytes());
        for stair in self.stairs() {
            bytes.extend(stair.lower_room.data().as_ffi().to_le_bytes());
            bytes.extend(stair.upper_room.data().as_ffi().to_le_bytes());
            push_cell(&mut bytes, stair.bottom);
            push_cell(&mut bytes, stair.top);
            bytes.extend((stair.cells.len() as u32).to_le_bytes());
            for &cell in &stair.cells {
                push_cell(&mut bytes, cell);
            }
        }

        bytes
    }
}

fn push_cell(bytes: &mut Vec<u8>, cell: Cell) {
    bytes.extend(cell.x.to_le_bytes());
    bytes.extend(cell.y.to_le_bytes());
    bytes.extend(cell.z.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_cells_cover_each_side_of_the_room() {
        let room = Room {
            id: RoomId::default(),
            origin: Cell::new(2, 3, 0),
            extent: CellExtent { width: 3, depth: 2 },
            floor: 0,
            doors: Vec::new(),
        };

        assert_eq!(room.face_cells(1, 0), vec![Cell::new(4, 3, 0), Cell::new(4, 4, 0)]);
        assert_eq!(room.face_cells(-1, 0), vec![Cell::new(2, 3, 0), Cell::new(2, 4, 0)]);
        assert_eq!(
            room.face_cells(0, 1),
            vec![Cell::new(2, 4, 0), Cell::new(3, 4, 0), Cell::new(4, 4, 0)]
        );
        assert_eq!(
            room.face_cells(0, -1),
            vec![Cell::new(2, 3, 0), Cell::new(3, 3, 0), Cell::new(4, 3, 0)]
        );
    }

    #[test]
    fn contains_respects_floor_layer() {
        let room = Room {
            id: RoomId::default(),
            origin: Cell::new(1, 1, 2),
            extent: CellExtent { width: 2, depth: 2 },
            floor: 2,
            doors: Vec::new(),
        };

        assert!(room.contains(Cell::new(2, 2, 2)));
        assert!(!room.contains(Cell::new(2, 2, 1)));
        assert!(!room.contains(Cell::new(3, 2, 2)));
    }
}
