pub mod algorithms;

use std::time::Instant;

use log::info;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::{MazeError, Result};

use super::{DIRECTIONS, Direction, Maze};
use algorithms::{backtrack::Backtrack, random::RandomWalls, wilson::Wilson};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Algorithm {
    #[strum(to_string = "Random")]
    Random, // Not a maze: knocks out walls until it keeps missing.
    #[strum(to_string = "RecursiveBacktracking", serialize = "backtrack")]
    RecursiveBacktracking, // Perfect maze with long corridors.
    #[strum(to_string = "Wilsons", serialize = "wilson")]
    Wilsons, // Perfect maze, every spanning tree equally likely.
}

impl Algorithm {
    pub fn from_name(name: &str) -> Result<Self> {
        name.parse()
            .map_err(|_| MazeError::UnknownAlgorithm(name.to_string()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallRemoval {
    pub x: usize,
    pub y: usize,
    pub dir: Direction,
}

/// Advisory progress colors. They never affect the maze itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum CellColor {
    Empty,
    Start,
    Partial,
    Current,
    End,
    Finished,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coloring {
    pub x: usize,
    pub y: usize,
    pub color: CellColor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// A wall came down; the maze has already been updated.
    Removed(WallRemoval),
    /// Internal progress only (e.g. one step of a random walk).
    Continue,
    /// Terminal. Every further call returns this again.
    Finished,
}

enum Generator {
    Random(RandomWalls),
    Backtrack(Backtrack),
    Wilson(Wilson),
}

/// Drives one generation algorithm over a maze, one step per call.
pub struct MazeMaker {
    pub rng: StdRng,
    algorithm: Algorithm,
    generator: Generator,
    colors: Vec<Coloring>,
    removed: usize,
    started: Instant,
    finished: bool,
}

impl MazeMaker {
    pub fn new(algorithm: Algorithm, maze: &Maze) -> Self {
        Self::with_rng(algorithm, maze, StdRng::from_os_rng())
    }

    pub fn with_seed(algorithm: Algorithm, maze: &Maze, seed: u64) -> Self {
        Self::with_rng(algorithm, maze, StdRng::seed_from_u64(seed))
    }

    fn with_rng(algorithm: Algorithm, maze: &Maze, mut rng: StdRng) -> Self {
        let generator = match algorithm {
            Algorithm::Random => Generator::Random(RandomWalls::new()),
            Algorithm::RecursiveBacktracking => Generator::Backtrack(Backtrack::new(maze)),
            Algorithm::Wilsons => Generator::Wilson(Wilson::new(maze, &mut rng)),
        };

        MazeMaker {
            rng,
            algorithm,
            generator,
            colors: Vec::new(),
            removed: 0,
            started: Instant::now(),
            finished: false,
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn walls_removed(&self) -> usize {
        self.removed
    }

    pub fn next_wall_to_remove(&mut self, maze: &mut Maze) -> Step {
        let step = match &mut self.generator {
            Generator::Random(state) => state.next_wall(maze, &mut self.rng),
            Generator::Backtrack(state) => state.next_wall(maze, &mut self.rng),
            Generator::Wilson(state) => state.next_wall(maze, &mut self.rng, &mut self.colors),
        };

        match step {
            Step::Removed(_) => self.removed += 1,
            Step::Finished if !self.finished => {
                self.finished = true;
                info!(
                    "{} complete - total time: {}ms for {} walls removed",
                    self.algorithm,
                    self.started.elapsed().as_millis(),
                    self.removed
                );
            }
            _ => {}
        }

        step
    }

    /// Colorings produced since the last call, in the order they happened.
    pub fn take_colors(&mut self) -> Vec<Coloring> {
        std::mem::take(&mut self.colors)
    }

    /// Steps until finished and returns every wall removed along the way.
    pub fn finish(&mut self, maze: &mut Maze) -> Vec<WallRemoval> {
        let mut walls = Vec::new();

        loop {
            match self.next_wall_to_remove(maze) {
                Step::Removed(wall) => walls.push(wall),
                Step::Continue => {}
                Step::Finished => break,
            }
        }

        self.colors.clear();
        walls
    }
}

fn shuffled_directions(rng: &mut StdRng) -> [Direction; 4] {
    let mut directions = DIRECTIONS;
    directions.shuffle(rng);
    directions
}

fn valid_directions(maze: &Maze, x: usize, y: usize) -> Vec<Direction> {
    DIRECTIONS
        .into_iter()
        .filter(|&dir| maze.neighbor(x, y, dir).is_some())
        .collect()
}

fn remove(maze: &mut Maze, x: usize, y: usize, dir: Direction) -> Step {
    maze.remove_wall(x, y, dir);
    Step::Removed(WallRemoval { x, y, dir })
}
