//! Stage orchestration. Each stage fully commits its grid writes before
//! the next begins, and the random stream is consumed in one fixed
//! order, so a run is a pure function of seed and parameters.

use slotmap::SlotMap;

use crate::descriptor::{Corridor, DungeonDescriptor, Room, Stair};
use crate::error::GenerationError;
use crate::params::GenerationParameters;
use crate::types::{Cell, CellExtent, CorridorId, RoomId, StairId};
use crate::voxel::VoxelGrid;

use super::corridor::route_corridor;
use super::graph::{GraphEdge, build_floor_graph};
use super::rng::RandomStream;
use super::rooms::plan_rooms;
use super::stairs::connect_floors;

pub struct DungeonGenerator {
    seed: u64,
    params: GenerationParameters,
}

impl DungeonGenerator {
    pub fn new(seed: u64, params: GenerationParameters) -> Self {
        Self { seed, params }
    }

    pub fn generate(&self) -> Result<DungeonDescriptor, GenerationError> {
        self.params.validate()?;
        let mut rng = RandomStream::new(self.seed);

        let planned = plan_rooms(&self.params, &mut rng)?;
        log::info!("seed {}: packed {} rooms", self.seed, planned.len());

        let mut grid = VoxelGrid::new(self.params.width, self.params.depth, self.params.height);
        let mut rooms: SlotMap<RoomId, Room> = SlotMap::with_key();
        let mut room_order = Vec::with_capacity(planned.len());
        for proposal in planned {
            let origin = Cell::new(proposal.x, proposal.y, proposal.floor as i32);
            let extent =
                CellExtent { width: proposal.width as u32, depth: proposal.depth as u32 };
            let id = rooms.insert_with_key(|id| Room {
                id,
                origin,
                extent,
                floor: proposal.floor,
                doors: Vec::new(),
            });
            grid.carve_room(id, origin, extent.width, extent.depth);
            room_order.push(id);
        }

        let mut corridors: SlotMap<CorridorId, Corridor> = SlotMap::with_key();
        let mut corridor_order = Vec::new();
        for floor in 0..self.params.floors {
            let floor_rooms: Vec<(RoomId, (f64, f64))> = room_order
                .iter()
                .copied()
                .filter(|id| rooms[*id].floor == floor)
                .map(|id| (id, rooms[id].center_xy()))
                .collect();

            let graph = build_floor_graph(&floor_rooms, self.params.loop_ratio, &mut rng, floor)?;

            // Spanning edges first so essential connectivity is attempted
            // before optional cycles; within each class, weight ascending.
            for (edge, is_main) in graph
                .tree
                .iter()
                .map(|edge| (edge, true))
                .chain(graph.loops.iter().map(|edge| (edge, false)))
            {
                self.route_edge(
                    &mut grid,
                    &mut rooms,
                    &mut corridors,
                    &mut corridor_order,
                    edge,
                    is_main,
                    floor,
                )?;
            }
        }
        log::info!("seed {}: routed {} corridors", self.seed, corridor_order.len());

        let placed = connect_floors(&mut grid, &rooms, &room_order, &self.params)?;
        let mut stairs: SlotMap<StairId, Stair> = SlotMap::with_key();
        let mut stair_order = Vec::with_capacity(placed.len());
        for stair in placed {
            let id = stairs.insert_with_key(|id| Stair {
                id,
                lower_room: stair.lower_room,
                upper_room: stair.upper_room,
                cells: stair.cells.clone(),
                bottom: stair.bottom,
                top: stair.top,
            });
            attach_door(&mut rooms[stair.lower_room], stair.door_lower);
            attach_door(&mut rooms[stair.upper_room], stair.door_upper);
            stair_order.push(id);
        }
        log::info!("seed {}: placed {} stairs", self.seed, stair_order.len());

        grid.finalize_walls();

        Ok(DungeonDescriptor::assemble(
            grid,
            rooms,
            corridors,
            stairs,
            room_order,
            corridor_order,
            stair_order,
        ))
    }

    #[expect(clippy::too_many_arguments)]
    fn route_edge(
        &self,
        grid: &mut VoxelGrid,
        rooms: &mut SlotMap<RoomId, Room>,
        corridors: &mut SlotMap<CorridorId, Corridor>,
        corridor_order: &mut Vec<CorridorId>,
        edge: &GraphEdge,
        is_main: bool,
        floor: u32,
    ) -> Result<(), GenerationError> {
        let routed = route_corridor(grid, &rooms[edge.a], &rooms[edge.b]);
        let Some(routed) = routed else {
            if is_main {
                return Err(GenerationError::CorridorRoutingFailure {
                    floor,
                    from: edge.a,
                    to: edge.b,
                });
            }
            log::debug!("floor {floor}: skipping unroutable loop edge {:?}-{:?}", edge.a, edge.b);
            return Ok(());
        };

        let id = corridors.insert_with_key(|id| Corridor {
            id,
            from_room: edge.a,
            to_room: edge.b,
            door_a: routed.door_a,
            door_b: routed.door_b,
            cells: routed.cells,
            claimed: routed.claimed,
            is_main,
        });
        for &cell in &corridors[id].claimed {
            grid.claim_corridor_cell(id, cell);
        }
        attach_door(&mut rooms[edge.a], routed.door_a);
        attach_door(&mut rooms[edge.b], routed.door_b);
        corridor_order.push(id);
        Ok(())
    }
}

fn attach_door(room: &mut Room, door: Cell) {
    if !room.doors.contains(&door) {
        room.doors.push(door);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet, VecDeque};
    use std::ops::Range;

    use proptest::prelude::*;

    use crate::types::CellKind;

    use super::*;

    fn adjacency(descriptor: &DungeonDescriptor) -> BTreeMap<RoomId, Vec<RoomId>> {
        let mut adjacency: BTreeMap<RoomId, Vec<RoomId>> = BTreeMap::new();
        for room in descriptor.rooms() {
            adjacency.entry(room.id).or_default();
        }
        for corridor in descriptor.corridors() {
            adjacency.entry(corridor.from_room).or_default().push(corridor.to_room);
            adjacency.entry(corridor.to_room).or_default().push(corridor.from_room);
        }
        for stair in descriptor.stairs() {
            adjacency.entry(stair.lower_room).or_default().push(stair.upper_room);
            adjacency.entry(stair.upper_room).or_default().push(stair.lower_room);
        }
        adjacency
    }

    fn room_graph_is_connected(descriptor: &DungeonDescriptor) -> bool {
        let adjacency = adjacency(descriptor);
        let Some(&start) = adjacency.keys().next() else {
            return true;
        };
        let mut seen = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(room) = queue.pop_front() {
            for &next in &adjacency[&room] {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        seen.len() == adjacency.len()
    }

    fn assert_descriptor_invariants(descriptor: &DungeonDescriptor) {
        let (width, depth, height) = descriptor.bounds();

        // No two room volumes intersect; every room stays in bounds.
        let rooms: Vec<&Room> = descriptor.rooms().collect();
        for (index, room) in rooms.iter().enumerate() {
            assert!(room.origin.x >= 0 && room.origin.y >= 0);
            assert!(room.max_x() < width as i32 && room.max_y() < depth as i32);
            assert!((room.floor as i32) < height as i32);
            for other in &rooms[index + 1..] {
                let overlap = room.origin.z == other.origin.z
                    && room.origin.x <= other.max_x()
                    && other.origin.x <= room.max_x()
                    && room.origin.y <= other.max_y()
                    && other.origin.y <= room.max_y();
                assert!(!overlap, "rooms {:?} and {:?} intersect", room.id, other.id);
            }
        }

        // Corridor cells were claimed exactly once and stay in bounds.
        let mut claimed_by_corridors = BTreeSet::new();
        for corridor in descriptor.corridors() {
            for &cell in &corridor.claimed {
                assert!(descriptor.grid().in_bounds(cell));
                assert!(
                    claimed_by_corridors.insert(cell),
                    "cell {cell:?} claimed by two corridors"
                );
                assert_eq!(descriptor.room_at(cell), None);
            }
        }

        assert!(room_graph_is_connected(descriptor), "room graph must be connected");

        // Every adjacent populated floor pair is bridged by a stair.
        let populated: BTreeSet<u32> = descriptor.rooms().map(|room| room.floor).collect();
        for &floor in &populated {
            if populated.contains(&(floor + 1)) {
                let bridged = descriptor
                    .stairs()
                    .any(|stair| descriptor.room(stair.lower_room).unwrap().floor == floor);
                assert!(bridged, "no stair links floor {floor} to floor {}", floor + 1);
            }
        }
    }

    #[test]
    fn default_parameters_generate_a_valid_single_floor_dungeon() {
        let descriptor = generate_default(404);

        assert!(descriptor.room_count() >= 5);
        assert!(descriptor.room_count() <= 8);
        assert_eq!(descriptor.stair_count(), 0);
        assert_descriptor_invariants(&descriptor);
    }

    #[test]
    fn spanning_corridors_number_one_fewer_than_rooms_per_floor() {
        let descriptor = generate_default(2024);

        let main_count = descriptor.corridors().filter(|corridor| corridor.is_main).count();
        assert_eq!(main_count, descriptor.room_count() - 1);
    }

    // Sparse floors can legitimately fail with FloorConnectivityFailure,
    // so multi-floor assertions sweep seeds and check every dungeon that
    // was actually produced.
    fn two_floor_dungeons(seeds: Range<u64>) -> Vec<DungeonDescriptor> {
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
        seeds
            .filter_map(|seed| DungeonGenerator::new(seed, params.clone()).generate().ok())
            .collect()
    }

    #[test]
    fn multi_floor_runs_place_stairs_between_populated_floors() {
        let dungeons = two_floor_dungeons(0..64);
        assert!(!dungeons.is_empty(), "no seed in the sweep produced a two-floor dungeon");

        for descriptor in &dungeons {
            assert!(descriptor.stair_count() >= 1);
            assert_descriptor_invariants(descriptor);
            for stair in descriptor.stairs() {
                assert_eq!(stair.top.z, stair.bottom.z + 1);
                for window in stair.cells.windows(2) {
                    let horizontal = window[0].manhattan_xy(window[1]);
                    let vertical = (window[1].z - window[0].z).unsigned_abs();
                    assert!(
                        horizontal + vertical == 1 || (horizontal == 0 && vertical == 1),
                        "stair run must be continuous"
                    );
                }
            }
        }
    }

    #[test]
    fn doors_are_recorded_on_both_attached_rooms() {
        let descriptor = generate_default(11);

        for corridor in descriptor.corridors() {
            let from = descriptor.room(corridor.from_room).expect("room exists");
            let to = descriptor.room(corridor.to_room).expect("room exists");
            assert!(from.doors.contains(&corridor.door_a));
            assert!(to.doors.contains(&corridor.door_b));
            assert_eq!(descriptor.cell(corridor.door_a.x, corridor.door_a.y, corridor.door_a.z), Some(CellKind::Door));
        }
    }

    #[test]
    fn attached_corridor_and_stair_queries_cover_every_entity() {
        for descriptor in two_floor_dungeons(0..16) {
            let via_rooms: usize = descriptor
                .rooms()
                .map(|room| {
                    descriptor.corridors_of(room.id).len() + descriptor.stairs_of(room.id).len()
                })
                .sum();
            // Each corridor and stair touches exactly two rooms.
            assert_eq!(via_rooms, 2 * (descriptor.corridor_count() + descriptor.stair_count()));
        }
    }

    fn generate_default(seed: u64) -> DungeonDescriptor {
        DungeonGenerator::new(seed, GenerationParameters::default())
            .generate()
            .expect("default parameters generate")
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]
        #[test]
        fn any_seed_either_fails_cleanly_or_satisfies_all_invariants(
            seed in any::<u64>(),
            floors in 1_u32..=3,
            loop_tenths in 0_u32..=10,
        ) {
            let params = GenerationParameters {
                width: 48,
                depth: 48,
                height: floors,
                floors,
                min_rooms: 4,
                max_rooms: 10,
                loop_ratio: f64::from(loop_tenths) / 10.0,
                ..Default::default()
            };

            match DungeonGenerator::new(seed, params).generate() {
                Ok(descriptor) => assert_descriptor_invariants(&descriptor),
                Err(error) => {
                    // Terminal taxonomy errors only; never a panic or a
                    // partial descriptor.
                    prop_assert!(!matches!(error, GenerationError::InvalidParameters(_)));
                }
            }
        }
    }
}
