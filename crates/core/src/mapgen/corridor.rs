//! Corridor routing: picks a door on each room's boundary facing the
//! other room, then runs a turn-penalized A* over the floor layer. Cells
//! already carved by earlier corridors are passable at a discount, which
//! encourages natural merging without double-claiming.

use std::collections::{BTreeMap, BTreeSet};

use crate::descriptor::Room;
use crate::types::{CARDINAL_STEPS, Cell, CellKind};
use crate::voxel::VoxelGrid;

/// Routing cost constants. These are part of the reproducibility
/// contract: changing any of them changes every seeded dungeon.
const STRAIGHT_STEP_COST: u32 = 10;
const TURN_PENALTY: u32 = 4;
const SHARED_STEP_COST: u32 = 5;
/// Pop budget per search, as a multiple of the layer's cell count.
const EXPANSION_BUDGET_FACTOR: usize = 8;

#[derive(Clone, Debug)]
pub(super) struct RoutedCorridor {
    pub(super) door_a: Cell,
    pub(super) door_b: Cell,
    /// Full path between the doors, exclusive of the door cells.
    pub(super) cells: Vec<Cell>,
    /// Path cells that were empty before this corridor carved them.
    pub(super) claimed: Vec<Cell>,
}

/// Routes one graph edge through the grid, carving corridor and door
/// cells on success. Returns `None` when no path exists under the
/// passability rules or the expansion budget runs out.
pub(super) fn route_corridor(
    grid: &mut VoxelGrid,
    from: &Room,
    to: &Room,
) -> Option<RoutedCorridor> {
    let budget = EXPANSION_BUDGET_FACTOR * (grid.width() as usize) * (grid.depth() as usize);

    for (door_a, start) in door_candidates(from, to.center_xy(), grid) {
        for (door_b, goal) in door_candidates(to, from.center_xy(), grid) {
            let Some(path) = astar(grid, start, goal, budget) else {
                continue;
            };

            let mut claimed = Vec::new();
            for &cell in &path {
                if grid.kind_at(cell) == CellKind::Empty {
                    grid.set_kind(cell, CellKind::CorridorFloor);
                    claimed.push(cell);
                }
            }
            grid.set_kind(door_a, CellKind::Door);
            grid.set_kind(door_b, CellKind::Door);

            return Some(RoutedCorridor { door_a, door_b, cells: path, claimed });
        }
    }
    None
}

/// Door candidates for a room, preferring the face toward `toward`. Each
/// entry is the boundary cell to open and the adjacent outside cell a
/// path would start from. Faces whose outside cell is blocked or out of
/// bounds are dropped.
fn door_candidates(room: &Room, toward: (f64, f64), grid: &VoxelGrid) -> Vec<(Cell, Cell)> {
    let (cx, cy) = room.center_xy();
    let dx = toward.0 - cx;
    let dy = toward.1 - cy;

    let x_face = if dx >= 0.0 { (1, 0) } else { (-1, 0) };
    let y_face = if dy >= 0.0 { (0, 1) } else { (0, -1) };
    let faces = if dx.abs() >= dy.abs() {
        [x_face, y_face, (-y_face.0, -y_face.1), (-x_face.0, -x_face.1)]
    } else {
        [y_face, x_face, (-x_face.0, -x_face.1), (-y_face.0, -y_face.1)]
    };

    let mut candidates = Vec::new();
    for (face_dx, face_dy) in faces {
        let door = if face_dx != 0 {
            let y = (toward.1.floor() as i32).clamp(room.origin.y, room.max_y());
            let x = if face_dx > 0 { room.max_x() } else { room.origin.x };
            Cell::new(x, y, room.origin.z)
        } else {
            let x = (toward.0.floor() as i32).clamp(room.origin.x, room.max_x());
            let y = if face_dy > 0 { room.max_y() } else { room.origin.y };
            Cell::new(x, y, room.origin.z)
        };

        let outside = door.offset(face_dx, face_dy);
        if !grid.in_bounds(outside) {
            continue;
        }
        if matches!(grid.kind_at(outside), CellKind::Empty | CellKind::CorridorFloor) {
            candidates.push((door, outside));
        }
    }
    candidates
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct OpenNode {
    f: u32,
    h: u32,
    y: i32,
    x: i32,
}

fn step_cost(kind: CellKind) -> Option<u32> {
    match kind {
        CellKind::Empty => Some(STRAIGHT_STEP_COST),
        CellKind::CorridorFloor => Some(SHARED_STEP_COST),
        _ => None,
    }
}

fn heuristic(a: Cell, b: Cell) -> u32 {
    // Admissible against the cheapest possible step.
    a.manhattan_xy(b) * SHARED_STEP_COST
}

/// A* across one floor layer. Open set ordered by `(f, h, y, x)` so tie
/// breaks are deterministic; direction changes pay a turn penalty to
/// keep corridors straight.
fn astar(grid: &VoxelGrid, start: Cell, goal: Cell, budget: usize) -> Option<Vec<Cell>> {
    if start == goal {
        return Some(vec![start]);
    }

    let key = |cell: Cell| (cell.y, cell.x);
    let mut open_set = BTreeSet::new();
    let mut g_score: BTreeMap<(i32, i32), u32> = BTreeMap::new();
    let mut came_from: BTreeMap<(i32, i32), Cell> = BTreeMap::new();
    let mut step_dir: BTreeMap<(i32, i32), (i32, i32)> = BTreeMap::new();

    let h = heuristic(start, goal);
    open_set.insert(OpenNode { f: h, h, y: start.y, x: start.x });
    g_score.insert(key(start), 0);

    let mut pops = 0usize;
    while let Some(current) = open_set.pop_first() {
        pops += 1;
        if pops > budget {
            return None;
        }

        let cell = Cell::new(current.x, current.y, start.z);
        if cell == goal {
            return Some(reconstruct_path(&came_from, start, goal));
        }
        let current_g = *g_score.get(&key(cell)).expect("popped node has a g-score");
        let current_dir = step_dir.get(&key(cell)).copied();

        for (dx, dy) in CARDINAL_STEPS {
            let next = cell.offset(dx, dy);
            if !grid.in_bounds(next) {
                continue;
            }
            let Some(base_cost) = step_cost(grid.kind_at(next)) else {
                continue;
            };
            let turn = match current_dir {
                Some(dir) if dir != (dx, dy) => TURN_PENALTY,
                _ => 0,
            };

            let tentative = current_g + base_cost + turn;
            if tentative < *g_score.get(&key(next)).unwrap_or(&u32::MAX) {
                came_from.insert(key(next), cell);
                step_dir.insert(key(next), (dx, dy));
                g_score.insert(key(next), tentative);
                let h = heuristic(next, goal);
                open_set.insert(OpenNode { f: tentative + h, h, y: next.y, x: next.x });
            }
        }
    }
    None
}

fn reconstruct_path(came_from: &BTreeMap<(i32, i32), Cell>, start: Cell, goal: Cell) -> Vec<Cell> {
    let mut path = vec![goal];
    let mut current = goal;
    while current != start {
        current = came_from[&(current.y, current.x)];
        path.push(current);
    }
    path.reverse();
    path
}
