use rand::{Rng, rngs::StdRng, seq::IndexedRandom, seq::SliceRandom};

use super::super::{CellColor, Coloring, Direction, Maze, Step, remove, valid_directions};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    SelectStart,
    StartWalk,
    Walk,
    Commit,
    Entrance,
    Exit,
    Done,
}

/// Wilson's algorithm: loop-erased random walks grafted onto a growing tree.
///
/// Every call does one unit of work. A walk step moves the walk head and
/// removes nothing; once the walk reaches the tree, its loop-erased path is
/// committed one wall per call, starting on the call that reached the tree.
/// After the last cell joins, one call opens a random west entrance and one
/// more opens a random east exit.
#[derive(Debug)]
pub struct Wilson {
    phase: Phase,
    order: Vec<(usize, usize)>, // Shuffled cells, consumed from the back.
    contained: Vec<bool>,
    walk_directions: Vec<Option<Direction>>, // Last direction taken from each cell.
    touched: Vec<(usize, usize)>,
    walk_start: (usize, usize),
    position: (usize, usize), // Walk head, or commit cursor while committing.
    width: usize,
}

impl Wilson {
    pub fn new(maze: &Maze, rng: &mut StdRng) -> Self {
        let (width, height) = (maze.width(), maze.height());
        let mut order: Vec<(usize, usize)> = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .collect();
        order.shuffle(rng);

        Wilson {
            phase: Phase::SelectStart,
            order,
            contained: vec![false; width * height],
            walk_directions: vec![None; width * height],
            touched: Vec::new(),
            walk_start: (0, 0),
            position: (0, 0),
            width,
        }
    }

    pub fn next_wall(
        &mut self,
        maze: &mut Maze,
        rng: &mut StdRng,
        colors: &mut Vec<Coloring>,
    ) -> Step {
        debug_assert_eq!(self.contained.len(), maze.width() * maze.height());

        match self.phase {
            Phase::SelectStart => self.select_start(maze, rng, colors),
            Phase::StartWalk => self.start_walk(maze, rng, colors),
            Phase::Walk => self.walk(maze, rng, colors),
            Phase::Commit => self.commit(maze, colors),
            Phase::Entrance => self.open_entrance(maze, rng, colors),
            Phase::Exit => self.open_exit(maze, rng, colors),
            Phase::Done => Step::Finished,
        }
    }

    fn select_start(
        &mut self,
        maze: &mut Maze,
        rng: &mut StdRng,
        colors: &mut Vec<Coloring>,
    ) -> Step {
        let Some((x, y)) = self.order.pop() else {
            return self.open_entrance(maze, rng, colors);
        };

        self.contain(x, y);
        paint(colors, x, y, CellColor::Finished);
        self.phase = Phase::StartWalk;
        Step::Continue
    }

    fn start_walk(&mut self, maze: &mut Maze, rng: &mut StdRng, colors: &mut Vec<Coloring>) -> Step {
        let start = loop {
            match self.order.pop() {
                Some(cell) if self.is_contained(cell) => continue,
                other => break other,
            }
        };
        let Some((x, y)) = start else {
            return self.open_entrance(maze, rng, colors);
        };

        paint(colors, x, y, CellColor::Current);
        self.walk_start = (x, y);
        self.position = (x, y);
        self.phase = Phase::Walk;
        Step::Continue
    }

    fn walk(&mut self, maze: &mut Maze, rng: &mut StdRng, colors: &mut Vec<Coloring>) -> Step {
        let (x, y) = self.position;
        let dir = *valid_directions(maze, x, y)
            .choose(rng)
            .expect("a walk only starts in a maze with more than one cell");
        let next = maze
            .neighbor(x, y, dir)
            .expect("valid directions stay inside the maze");

        self.record(x, y, dir);
        paint(colors, x, y, CellColor::Partial);
        self.position = next;

        if self.is_contained(next) {
            for &(tx, ty) in &self.touched {
                paint(colors, tx, ty, CellColor::Empty);
            }
            self.position = self.walk_start;
            self.phase = Phase::Commit;
            self.commit(maze, colors)
        } else {
            paint(colors, next.0, next.1, CellColor::Current);
            Step::Continue
        }
    }

    fn commit(&mut self, maze: &mut Maze, colors: &mut Vec<Coloring>) -> Step {
        let (x, y) = self.position;
        let dir = self.walk_directions[self.index(x, y)]
            .expect("every cell on a committed path has a recorded direction");
        let next = maze
            .neighbor(x, y, dir)
            .expect("recorded directions stay inside the maze");

        self.contain(x, y);
        paint(colors, x, y, CellColor::Finished);
        self.position = next;

        if self.is_contained(next) {
            self.clear_walk();
            self.phase = Phase::StartWalk;
        }

        remove(maze, x, y, dir)
    }

    fn open_entrance(
        &mut self,
        maze: &mut Maze,
        rng: &mut StdRng,
        colors: &mut Vec<Coloring>,
    ) -> Step {
        let y = rng.random_range(0..maze.height());
        paint(colors, 0, y, CellColor::Start);
        self.phase = Phase::Exit;
        remove(maze, 0, y, Direction::West)
    }

    fn open_exit(&mut self, maze: &mut Maze, rng: &mut StdRng, colors: &mut Vec<Coloring>) -> Step {
        let x = maze.width() - 1;
        let y = rng.random_range(0..maze.height());
        paint(colors, x, y, CellColor::End);
        self.phase = Phase::Done;
        remove(maze, x, y, Direction::East)
    }

    // Overwriting an earlier direction erases the loop the walk made since.
    fn record(&mut self, x: usize, y: usize, dir: Direction) {
        let i = self.index(x, y);
        if self.walk_directions[i].is_none() {
            self.touched.push((x, y));
        }
        self.walk_directions[i] = Some(dir);
    }

    fn clear_walk(&mut self) {
        for (x, y) in std::mem::take(&mut self.touched) {
            let i = self.index(x, y);
            self.walk_directions[i] = None;
        }
    }

    fn contain(&mut self, x: usize, y: usize) {
        let i = self.index(x, y);
        self.contained[i] = true;
    }

    fn is_contained(&self, (x, y): (usize, usize)) -> bool {
        self.contained[self.index(x, y)]
    }

    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }
}

fn paint(colors: &mut Vec<Coloring>, x: usize, y: usize, color: CellColor) {
    colors.push(Coloring { x, y, color });
}
