use std::ops::Neg;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Compass direction of a wall, as seen from the cell that owns it.
///
/// Displays and parses as the single-letter tokens used on the wire.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
pub enum Direction {
    #[strum(serialize = "N")]
    North,
    #[strum(serialize = "E")]
    East,
    #[strum(serialize = "S")]
    South,
    #[strum(serialize = "W")]
    West,
}

pub const DIRECTIONS: [Direction; 4] = [
    Direction::North,
    Direction::East,
    Direction::South,
    Direction::West,
];

impl Direction {
    /// Unit step `(dx, dy)`; y grows southward.
    pub fn offset(self) -> (isize, isize) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl Neg for Direction {
    type Output = Direction;

    fn neg(self) -> Self::Output {
        self.opposite()
    }
}
