//! Room proposal and iterative separation (packing). Candidate volumes
//! are sampled per floor, overlapping pairs are pushed apart along the
//! dominant axis of their center offset, and rooms that still overlap
//! after the relaxation budget are discarded newest-first.

use std::f64::consts::TAU;

use crate::error::GenerationError;
use crate::params::GenerationParameters;

use super::rng::RandomStream;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct PlannedRoom {
    pub(super) x: i32,
    pub(super) y: i32,
    pub(super) width: i32,
    pub(super) depth: i32,
    pub(super) floor: u32,
}

impl PlannedRoom {
    pub(super) fn max_x(self) -> i32 {
        self.x + self.width - 1
    }

    pub(super) fn max_y(self) -> i32 {
        self.y + self.depth - 1
    }

    /// Center doubled to stay in integers (cell centers sit on half
    /// coordinates).
    fn doubled_center(self) -> (i64, i64) {
        ((2 * self.x + self.width) as i64, (2 * self.y + self.depth) as i64)
    }

    /// True when fewer than `margin` empty cells separate the two
    /// footprints on both axes; a gap of exactly `margin` is acceptable.
    pub(super) fn violates_margin(self, other: Self, margin: i32) -> bool {
        other.x <= self.max_x() + margin
            && self.x <= other.max_x() + margin
            && other.y <= self.max_y() + margin
            && self.y <= other.max_y() + margin
    }
}

/// Proposes and packs rooms for every floor. Retries the whole proposal
/// when fewer than `min_rooms` survive, up to `packing_attempts` times.
pub(super) fn plan_rooms(
    params: &GenerationParameters,
    rng: &mut RandomStream,
) -> Result<Vec<PlannedRoom>, GenerationError> {
    let (min_size, max_size) = params.clamped_room_sizes();
    let mut best_survivors = 0;

    for attempt in 0..params.packing_attempts {
        let target = rng.next_usize(params.min_rooms, params.max_rooms);
        let mut floors: Vec<Vec<PlannedRoom>> = vec![Vec::new(); params.floors as usize];

        for index in 0..target {
            let floor = (index % params.floors as usize) as u32;
            if let Some(room) = propose_room(params, rng, min_size, max_size, floor) {
                floors[floor as usize].push(room);
            }
        }

        let mut survivors = Vec::new();
        for rooms in &mut floors {
            separate_floor(rooms, params, rng);
            survivors.extend(rooms.iter().copied());
        }

        if survivors.len() >= params.min_rooms {
            survivors.sort_by_key(|room| (room.floor, room.y, room.x, room.depth, room.width));
            log::debug!(
                "room packing succeeded on attempt {attempt}: {} of {target} proposals survived",
                survivors.len()
            );
            return Ok(survivors);
        }

        best_survivors = best_survivors.max(survivors.len());
        log::debug!(
            "room packing attempt {attempt} kept {} of {target} proposals, below minimum {}",
            survivors.len(),
            params.min_rooms
        );
    }

    Err(GenerationError::RoomPackingFailure {
        survivors: best_survivors,
        minimum: params.min_rooms,
    })
}

fn propose_room(
    params: &GenerationParameters,
    rng: &mut RandomStream,
    min_size: u32,
    max_size: u32,
    floor: u32,
) -> Option<PlannedRoom> {
    let width = rng.next_range(min_size as i64, max_size as i64) as i32;
    let depth = rng.next_range(min_size as i64, max_size as i64) as i32;

    // One border cell is reserved on every side for walls.
    let max_x = params.width as i32 - 1 - width;
    let max_y = params.depth as i32 - 1 - depth;
    if max_x < 1 || max_y < 1 {
        return None;
    }

    let x = rng.next_range(1, max_x as i64) as i32;
    let y = rng.next_range(1, max_y as i64) as i32;
    Some(PlannedRoom { x, y, width, depth, floor })
}

/// One relaxation pass over a single floor's rooms. The later room of
/// each violating pair is pushed, which keeps earlier proposals stable
/// and lines up with the discard-newest policy.
fn separate_floor(rooms: &mut Vec<PlannedRoom>, params: &GenerationParameters, rng: &mut RandomStream) {
    let margin = params.room_margin as i32;

    for _ in 0..params.separation_iterations {
        let mut moved = false;
        for i in 0..rooms.len() {
            for j in (i + 1)..rooms.len() {
                if rooms[i].violates_margin(rooms[j], margin) {
                    let pushed = push_apart(rooms[i], rooms[j], margin, rng);
                    rooms[j] = clamp_into_bounds(pushed, params);
                    moved = true;
                }
            }
        }
        if !moved {
            break;
        }
    }

    discard_unresolved(rooms, margin);
}

/// Moves `later` away from `anchor` along the dominant axis of their
/// center offset, just far enough to clear the margin. Coincident
/// centers get a random push direction.
fn push_apart(
    anchor: PlannedRoom,
    later: PlannedRoom,
    margin: i32,
    rng: &mut RandomStream,
) -> PlannedRoom {
    let (acx, acy) = anchor.doubled_center();
    let (lcx, lcy) = later.doubled_center();
    let mut dx = (lcx - acx) as f64 / 2.0;
    let mut dy = (lcy - acy) as f64 / 2.0;

    if dx == 0.0 && dy == 0.0 {
        let angle = rng.next_f64() * TAU;
        dx = angle.cos();
        dy = angle.sin();
    }

    let need_x = (anchor.width + later.width) as f64 / 2.0 + margin as f64 - dx.abs();
    let need_y = (anchor.depth + later.depth) as f64 / 2.0 + margin as f64 - dy.abs();

    let mut pushed = later;
    if dx.abs() >= dy.abs() {
        let step = need_x.max(1.0).ceil() as i32;
        pushed.x += if dx >= 0.0 { step } else { -step };
    } else {
        let step = need_y.max(1.0).ceil() as i32;
        pushed.y += if dy >= 0.0 { step } else { -step };
    }
    pushed
}

fn clamp_into_bounds(room: PlannedRoom, params: &GenerationParameters) -> PlannedRoom {
    let mut clamped = room;
    clamped.x = clamped.x.clamp(1, (params.width as i32 - 1 - room.width).max(1));
    clamped.y = clamped.y.clamp(1, (params.depth as i32 - 1 - room.depth).max(1));
    clamped
}

/// Drops rooms that still violate the margin, scanning from the newest
/// proposal backwards so earlier rooms win ties.
fn discard_unresolved(rooms: &mut Vec<PlannedRoom>, margin: i32) {
    let mut index = rooms.len();
    while index > 0 {
        index -= 1;
        let conflicted =
            (0..index).any(|earlier| rooms[earlier].violates_margin(rooms[index], margin));
        if conflicted {
            rooms.remove(index);
        }
    }
}
