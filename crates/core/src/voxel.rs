//! 3D grid of typed cells. Ground-truth spatial representation written by
//! the pipeline stages and exposed read-only through the descriptor.

use crate::types::{CARDINAL_STEPS, Cell, CellKind, CorridorId, RoomId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoxelGrid {
    width: u32,
    depth: u32,
    height: u32,
    cells: Vec<CellKind>,
    // Null keys mark unclaimed cells.
    room_owner: Vec<RoomId>,
    corridor_owner: Vec<CorridorId>,
}

impl VoxelGrid {
    pub(crate) fn new(width: u32, depth: u32, height: u32) -> Self {
        let len = (width as usize) * (depth as usize) * (height as usize);
        Self {
            width,
            depth,
            height,
            cells: vec![CellKind::Empty; len],
            room_owner: vec![RoomId::default(); len],
            corridor_owner: vec![CorridorId::default(); len],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0
            && cell.y >= 0
            && cell.z >= 0
            && (cell.x as u32) < self.width
            && (cell.y as u32) < self.depth
            && (cell.z as u32) < self.height
    }

    fn index(&self, cell: Cell) -> usize {
        debug_assert!(self.in_bounds(cell));
        let layer = (self.width as usize) * (self.depth as usize);
        (cell.z as usize) * layer + (cell.y as usize) * (self.width as usize) + (cell.x as usize)
    }

    /// Cell tag lookup; out-of-bounds coordinates read as `None`.
    pub fn get(&self, cell: Cell) -> Option<CellKind> {
        self.in_bounds(cell).then(|| self.cells[self.index(cell)])
    }

    /// Tag lookup for coordinates already known to be in bounds.
    pub(crate) fn kind_at(&self, cell: Cell) -> CellKind {
        self.cells[self.index(cell)]
    }

    pub(crate) fn set_kind(&mut self, cell: Cell, kind: CellKind) {
        let index = self.index(cell);
        self.cells[index] = kind;
    }

    pub fn room_owner_at(&self, cell: Cell) -> Option<RoomId> {
        if !self.in_bounds(cell) {
            return None;
        }
        let owner = self.room_owner[self.index(cell)];
        (owner != RoomId::default()).then_some(owner)
    }

    pub fn corridor_owner_at(&self, cell: Cell) -> Option<CorridorId> {
        if !self.in_bounds(cell) {
            return None;
        }
        let owner = self.corridor_owner[self.index(cell)];
        (owner != CorridorId::default()).then_some(owner)
    }

    /// Claims a rectangular room volume: cells become `RoomFloor` and are
    /// recorded as owned by `room`. Callers guarantee the volume is in
    /// bounds and unclaimed; packing enforces this before carving.
    pub(crate) fn carve_room(&mut self, room: RoomId, origin: Cell, width: u32, depth: u32) {
        for y in origin.y..origin.y + depth as i32 {
            for x in origin.x..origin.x + width as i32 {
                let cell = Cell::new(x, y, origin.z);
                let index = self.index(cell);
                debug_assert_eq!(self.cells[index], CellKind::Empty);
                self.cells[index] = CellKind::RoomFloor;
                self.room_owner[index] = room;
            }
        }
    }

    pub(crate) fn claim_corridor_cell(&mut self, corridor: CorridorId, cell: Cell) {
        let index = self.index(cell);
        debug_assert_eq!(self.corridor_owner[index], CorridorId::default());
        self.corridor_owner[index] = corridor;
    }

    /// Marks empty cells flanking walkable cells on the same layer as
    /// walls. Cells directly above a stair stay empty so the climb
    /// opening is preserved.
    pub(crate) fn finalize_walls(&mut self) {
        let mut walls = Vec::new();
        for z in 0..self.height as i32 {
            for y in 0..self.depth as i32 {
                for x in 0..self.width as i32 {
                    let cell = Cell::new(x, y, z);
                    if self.kind_at(cell) != CellKind::Empty {
                        continue;
                    }
                    let below = Cell::new(x, y, z - 1);
                    if self.in_bounds(below) && self.kind_at(below) == CellKind::Stair {
                        continue;
                    }
                    let flanks_floor = CARDINAL_STEPS.iter().any(|&(dx, dy)| {
                        let neighbor = cell.offset(dx, dy);
                        self.in_bounds(neighbor) && self.kind_at(neighbor).is_walkable()
                    });
                    if flanks_floor {
                        walls.push(cell);
                    }
                }
            }
        }
        for cell in walls {
            self.set_kind(cell, CellKind::Wall);
        }
    }

    pub(crate) fn canonical_bytes_into(&self, bytes: &mut Vec<u8>) {
        bytes.extend(self.width.to_le_bytes());
        bytes.extend(self.depth.to_le_bytes());
        bytes.extend(self.height.to_le_bytes());
        bytes.extend(self.cells.iter().map(|kind| kind.canonical_byte()));
    }
}
