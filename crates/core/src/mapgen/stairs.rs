//! Vertical connector: links every pair of adjacent populated floors
//! with at least one straight stair run. Candidate room pairs are tried
//! nearest-first; the first run whose cells and clearance column are all
//! unclaimed wins.

use slotmap::SlotMap;

use crate::descriptor::Room;
use crate::error::GenerationError;
use crate::params::GenerationParameters;
use crate::types::{CARDINAL_STEPS, Cell, CellKind, RoomId};
use crate::voxel::VoxelGrid;

/// Room pairs examined per floor boundary before giving up.
const MAX_PAIR_CANDIDATES: usize = 16;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct PlacedStair {
    pub(super) lower_room: RoomId,
    pub(super) upper_room: RoomId,
    /// Run cells on the lower layer followed by the upper landing.
    pub(super) cells: Vec<Cell>,
    pub(super) bottom: Cell,
    pub(super) top: Cell,
    pub(super) door_lower: Cell,
    pub(super) door_upper: Cell,
}

pub(super) fn connect_floors(
    grid: &mut VoxelGrid,
    rooms: &SlotMap<RoomId, Room>,
    room_order: &[RoomId],
    params: &GenerationParameters,
) -> Result<Vec<PlacedStair>, GenerationError> {
    let mut placed = Vec::new();

    for lower_floor in 0..params.floors.saturating_sub(1) {
        let lower: Vec<RoomId> =
            room_order.iter().copied().filter(|id| rooms[*id].floor == lower_floor).collect();
        let upper: Vec<RoomId> =
            room_order.iter().copied().filter(|id| rooms[*id].floor == lower_floor + 1).collect();
        if lower.is_empty() || upper.is_empty() {
            continue;
        }

        let mut pairs: Vec<(i64, RoomId, RoomId)> = Vec::new();
        for &low in &lower {
            for &high in &upper {
                let (lx, ly) = rooms[low].center_xy();
                let (hx, hy) = rooms[high].center_xy();
                let dx = ((lx - hx) * 2.0) as i64;
                let dy = ((ly - hy) * 2.0) as i64;
                pairs.push((dx * dx + dy * dy, low, high));
            }
        }
        pairs.sort();
        pairs.truncate(MAX_PAIR_CANDIDATES);

        let mut linked = false;
        for (_, low, high) in pairs {
            if let Some(stair) =
                try_place_stair(grid, &rooms[low], &rooms[high], params.max_stair_run)
            {
                log::debug!(
                    "floor {lower_floor}: stair {:?} -> {:?} over {} cells",
                    low,
                    high,
                    stair.cells.len()
                );
                placed.push(stair);
                linked = true;
                break;
            }
        }
        if !linked {
            return Err(GenerationError::FloorConnectivityFailure { lower_floor });
        }
    }

    Ok(placed)
}

/// Tries straight runs leaving each face of the lower room, shortest run
/// first. A run is valid when its lower cells, the clearance column
/// above them and the landing are all empty, and the landing touches the
/// upper room so a door can be opened into it.
fn try_place_stair(
    grid: &mut VoxelGrid,
    lower: &Room,
    upper: &Room,
    max_stair_run: u32,
) -> Option<PlacedStair> {
    let (lx, ly) = lower.center_xy();
    let (ux, uy) = upper.center_xy();
    let dx = ux - lx;
    let dy = uy - ly;

    let x_face = if dx >= 0.0 { (1, 0) } else { (-1, 0) };
    let y_face = if dy >= 0.0 { (0, 1) } else { (0, -1) };
    let faces = if dx.abs() >= dy.abs() {
        [x_face, y_face, (-y_face.0, -y_face.1), (-x_face.0, -x_face.1)]
    } else {
        [y_face, x_face, (-x_face.0, -x_face.1), (-y_face.0, -y_face.1)]
    };

    for (face_dx, face_dy) in faces {
        for door in lower.face_cells(face_dx, face_dy) {
            for run_len in 2..=max_stair_run as i32 {
                if let Some(stair) =
                    try_run(grid, lower, upper, door, (face_dx, face_dy), run_len)
                {
                    return Some(stair);
                }
            }
        }
    }
    None
}

fn try_run(
    grid: &mut VoxelGrid,
    lower: &Room,
    upper: &Room,
    door: Cell,
    (dx, dy): (i32, i32),
    run_len: i32,
) -> Option<PlacedStair> {
    let mut run = Vec::with_capacity(run_len as usize);
    for step in 1..=run_len {
        let cell = door.offset(dx * step, dy * step);
        if !grid.in_bounds(cell) || grid.kind_at(cell) != CellKind::Empty {
            return None;
        }
        // Clearance column: the climb needs the layer above open too.
        let above = cell.above();
        if !grid.in_bounds(above) || grid.kind_at(above) != CellKind::Empty {
            return None;
        }
        run.push(cell);
    }

    let landing = run.last().copied().expect("run_len >= 2").above();
    let door_upper = CARDINAL_STEPS.iter().map(|&(nx, ny)| landing.offset(nx, ny)).find(
        |&neighbor| {
            grid.in_bounds(neighbor)
                && grid.room_owner_at(neighbor) == Some(upper.id)
                && matches!(grid.kind_at(neighbor), CellKind::RoomFloor | CellKind::Door)
        },
    )?;

    for &cell in &run {
        grid.set_kind(cell, CellKind::Stair);
    }
    grid.set_kind(landing, CellKind::Stair);
    grid.set_kind(door, CellKind::Door);
    grid.set_kind(door_upper, CellKind::Door);

    let bottom = run[0];
    let mut cells = run;
    cells.push(landing);

    Some(PlacedStair {
        lower_room: lower.id,
        upper_room: upper.id,
        cells,
        bottom,
        top: landing,
        door_lower: door,
        door_upper,
    })
}
