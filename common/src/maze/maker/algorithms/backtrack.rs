use rand::{Rng, rngs::StdRng, seq::IndexedRandom};

use super::super::{Direction, Maze, Step, remove, shuffled_directions};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Unstarted,
    Walking,
    Done,
}

#[derive(Clone, Copy, Debug)]
struct Visit {
    parent: Option<(usize, usize)>, // `None` for the entrance cell.
    depth: usize,
}

/// Depth-first maze growth, one wall per call. Enters through the west
/// border and leaves through the east border at the deepest cell of the last
/// column.
#[derive(Debug)]
pub struct Backtrack {
    phase: Phase,
    current: (usize, usize),
    visits: Vec<Option<Visit>>,
    width: usize,
}

impl Backtrack {
    pub fn new(maze: &Maze) -> Self {
        Backtrack {
            phase: Phase::Unstarted,
            current: (0, 0),
            visits: vec![None; maze.width() * maze.height()],
            width: maze.width(),
        }
    }

    pub fn next_wall(&mut self, maze: &mut Maze, rng: &mut StdRng) -> Step {
        debug_assert_eq!(self.visits.len(), maze.width() * maze.height());

        match self.phase {
            Phase::Done => Step::Finished,
            Phase::Unstarted => {
                let y = rng.random_range(0..maze.height());
                let idx = self.index(0, y);
                self.visits[idx] = Some(Visit {
                    parent: None,
                    depth: 0,
                });
                self.current = (0, y);
                self.phase = Phase::Walking;
                remove(maze, 0, y, Direction::West)
            }
            Phase::Walking => self.walk(maze, rng),
        }
    }

    fn walk(&mut self, maze: &mut Maze, rng: &mut StdRng) -> Step {
        loop {
            let (x, y) = self.current;
            let visit = self.visit(x, y);

            for dir in shuffled_directions(rng) {
                if !maze.has_wall(x, y, dir) {
                    continue;
                }
                let Some((nx, ny)) = maze.neighbor(x, y, dir) else {
                    continue;
                };
                let i = self.index(nx, ny);
                if self.visits[i].is_some() {
                    continue;
                }

                self.visits[i] = Some(Visit {
                    parent: Some((x, y)),
                    depth: visit.depth + 1,
                });
                self.current = (nx, ny);
                return remove(maze, x, y, dir);
            }

            match visit.parent {
                Some(parent) => self.current = parent,
                None => return self.open_exit(maze, rng),
            }
        }
    }

    fn open_exit(&mut self, maze: &mut Maze, rng: &mut StdRng) -> Step {
        let x = maze.width() - 1;
        let depths: Vec<usize> = (0..maze.height())
            .map(|y| self.visit(x, y).depth)
            .collect();
        let deepest = depths.iter().copied().max().unwrap_or(0);
        let candidates: Vec<usize> = (0..maze.height())
            .filter(|&y| depths[y] == deepest)
            .collect();
        let y = *candidates
            .choose(rng)
            .expect("the last column should have at least one cell");

        self.phase = Phase::Done;
        remove(maze, x, y, Direction::East)
    }

    fn visit(&self, x: usize, y: usize) -> Visit {
        self.visits[self.index(x, y)]
            .expect("cells on the backtracking path should have been visited")
    }

    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }
}
