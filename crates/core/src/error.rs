use thiserror::Error;

use crate::types::RoomId;

/// Terminal generation failures. A run either returns a complete
/// [`crate::DungeonDescriptor`] or one of these; partial dungeons are
/// never handed out.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum GenerationError {
    #[error("invalid generation parameters: {0}")]
    InvalidParameters(String),

    #[error("room packing yielded {survivors} rooms, below the configured minimum of {minimum}")]
    RoomPackingFailure { survivors: usize, minimum: usize },

    #[error("candidate connectivity graph on floor {floor} could not be made connected")]
    GraphConnectivityFailure { floor: u32 },

    #[error("spanning corridor {from:?} -> {to:?} on floor {floor} could not be routed")]
    CorridorRoutingFailure { floor: u32, from: RoomId, to: RoomId },

    #[error("no stair placement links floor {lower_floor} to floor {}", .lower_floor + 1)]
    FloorConnectivityFailure { lower_floor: u32 },
}
