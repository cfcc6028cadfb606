pub mod error;
pub mod maze;
pub mod planner;
pub mod protocol;

pub use error::{MazeError, Result};
pub use maze::{Direction, Maze, Point, Segment};
