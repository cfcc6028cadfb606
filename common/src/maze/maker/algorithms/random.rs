use log::info;
use rand::{Rng, rngs::StdRng};

use super::super::{DIRECTIONS, Direction, Maze, Step, remove};

/// Consecutive misses after which the generator gives up.
pub const MAX_TRIES: usize = 100;

/// Knocks out random walls, never leaving a cell with fewer than two walls.
/// This is not a maze generator: it stops when sampling keeps missing and may
/// leave regions that are cut off from each other.
#[derive(Debug, Default)]
pub struct RandomWalls {
    finished: bool,
}

impl RandomWalls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_wall(&mut self, maze: &mut Maze, rng: &mut StdRng) -> Step {
        if self.finished {
            return Step::Finished;
        }

        for _ in 0..MAX_TRIES {
            let x = rng.random_range(0..maze.width());
            let y = rng.random_range(0..maze.height());
            let dir = DIRECTIONS[rng.random_range(0..DIRECTIONS.len())];

            if is_removable(maze, x, y, dir) {
                return remove(maze, x, y, dir);
            }
        }

        self.finished = true;
        info!(
            "giving up on finding walls to remove after {MAX_TRIES} misses; {} regions left",
            maze.regions()
        );
        Step::Finished
    }
}

fn is_removable(maze: &Maze, x: usize, y: usize, dir: Direction) -> bool {
    let cell = maze.cell(x, y);
    if !cell.has_wall(dir) || cell.wall_count() < 3 {
        return false;
    }

    match maze.neighbor(x, y, dir) {
        Some((nx, ny)) => maze.cell(nx, ny).wall_count() >= 3,
        None => true,
    }
}
