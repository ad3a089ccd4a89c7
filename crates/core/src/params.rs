//! Generation parameter set consumed by the pipeline, with explicit
//! validation instead of silent clamping.

use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParameters {
    /// Grid extent along x, in cells.
    pub width: u32,
    /// Grid extent along y, in cells.
    pub depth: u32,
    /// Grid extent along z, in cells. Must cover `floors` layers.
    pub height: u32,
    /// Number of floor layers rooms are distributed over.
    pub floors: u32,
    pub min_rooms: usize,
    pub max_rooms: usize,
    /// Horizontal room side length range, in cells.
    pub min_room_size: u32,
    pub max_room_size: u32,
    /// Minimum gap kept between separated rooms, in cells.
    pub room_margin: u32,
    /// Fraction of non-spanning-tree candidate edges retained as loops.
    pub loop_ratio: f64,
    /// Corridor cross-section, in cells. Only width 1 is supported.
    pub corridor_width: u32,
    /// Longest horizontal run a stair may span between two floors.
    pub max_stair_run: u32,
    /// Whole-proposal retries when packing falls short of `min_rooms`.
    pub packing_attempts: u32,
    /// Relaxation rounds before overlapping rooms are discarded.
    pub separation_iterations: u32,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            width: 64,
            depth: 64,
            height: 1,
            floors: 1,
            min_rooms: 5,
            max_rooms: 8,
            min_room_size: 3,
            max_room_size: 9,
            room_margin: 1,
            loop_ratio: 0.2,
            corridor_width: 1,
            max_stair_run: 6,
            packing_attempts: 8,
            separation_iterations: 64,
        }
    }
}

impl GenerationParameters {
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.width == 0 || self.depth == 0 || self.height == 0 {
            return Err(invalid("grid dimensions must be non-zero"));
        }
        if self.floors == 0 {
            return Err(invalid("at least one floor is required"));
        }
        if self.height < self.floors {
            return Err(invalid("grid height must cover every floor layer"));
        }
        if self.min_rooms == 0 {
            return Err(invalid("at least one room is required"));
        }
        if self.max_rooms < self.min_rooms {
            return Err(invalid("max_rooms must be >= min_rooms"));
        }
        if self.min_room_size == 0 {
            return Err(invalid("rooms must be at least one cell wide"));
        }
        if self.max_room_size < self.min_room_size {
            return Err(invalid("max_room_size must be >= min_room_size"));
        }
        if !(0.0..=1.0).contains(&self.loop_ratio) {
            return Err(invalid("loop_ratio must lie in [0, 1]"));
        }
        if self.corridor_width != 1 {
            return Err(invalid("only corridor_width = 1 is supported"));
        }
        if self.max_stair_run < 2 {
            return Err(invalid("stairs need a run of at least two cells"));
        }
        if self.packing_attempts == 0 || self.separation_iterations == 0 {
            return Err(invalid("packing budgets must be non-zero"));
        }
        Ok(())
    }

    /// Room side lengths actually usable inside this grid. Undersized
    /// grids shrink the sampled range rather than failing validation, so
    /// impossible layouts surface as `RoomPackingFailure` instead.
    pub(crate) fn clamped_room_sizes(&self) -> (u32, u32) {
        let usable = self.width.saturating_sub(2).min(self.depth.saturating_sub(2)).max(1);
        let max = self.max_room_size.min(usable);
        let min = self.min_room_size.min(max);
        (min, max)
    }
}

fn invalid(message: &str) -> GenerationError {
    GenerationError::InvalidParameters(message.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_parameters_validate() {
        assert_eq!(GenerationParameters::default().validate(), Ok(()));
    }

    #[test]
    fn loop_ratio_outside_unit_interval_is_rejected() {
        let params = GenerationParameters { loop_ratio: 1.5, ..Default::default() };
        assert!(matches!(params.validate(), Err(GenerationError::InvalidParameters(_))));
    }

    #[test]
    fn height_smaller_than_floor_count_is_rejected() {
        let params = GenerationParameters { floors: 3, height: 2, ..Default::default() };
        assert!(matches!(params.validate(), Err(GenerationError::InvalidParameters(_))));
    }

    #[test]
    fn tiny_grid_shrinks_room_size_range_instead_of_failing() {
        let params = GenerationParameters { width: 4, depth: 4, ..Default::default() };
        assert_eq!(params.validate(), Ok(()));
        assert_eq!(params.clamped_room_sizes(), (2, 2));
    }
}
