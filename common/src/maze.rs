pub mod direction;
pub mod maker;

use std::collections::HashSet;
use std::fmt;

use disjoint::DisjointSet;
use serde::{Deserialize, Serialize};

use crate::error::{MazeError, Result};

pub use direction::{DIRECTIONS, Direction};
pub use maker::{Algorithm, MazeMaker};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    walls: [bool; 4], // Indexed by `Direction::index`.
    wall_count: u8,   // Always equals the number of `true` flags.
}

impl Cell {
    fn walled() -> Self {
        Cell {
            walls: [true; 4],
            wall_count: 4,
        }
    }

    pub fn has_wall(&self, dir: Direction) -> bool {
        self.walls[dir.index()]
    }

    pub fn wall_count(&self) -> u8 {
        self.wall_count
    }

    fn clear(&mut self, dir: Direction) -> bool {
        let wall = &mut self.walls[dir.index()];
        if *wall {
            *wall = false;
            self.wall_count -= 1;
            true
        } else {
            false
        }
    }
}

/// A corner where grid lines cross. Cell `(x, y)` spans `(x, y)..(x + 1, y + 1)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

impl Point {
    pub fn new(x: usize, y: usize) -> Self {
        Point { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        let dx = self.x as f64 - other.x as f64;
        let dy = self.y as f64 - other.y as f64;
        dx.hypot(dy)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One undrawn wall, as a line between two grid corners.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment {
    pub p1: Point,
    pub p2: Point,
}

impl Segment {
    pub fn new(p1: Point, p2: Point) -> Self {
        Segment { p1, p2 }
    }

    pub fn reversed(self) -> Self {
        Segment {
            p1: self.p2,
            p2: self.p1,
        }
    }

    pub fn touches(&self, point: Point) -> bool {
        self.p1 == point || self.p2 == point
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Maze {
    width: usize,
    height: usize,
    cells: Vec<Cell>, // Row-major.
}

impl Maze {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let size = width
            .checked_mul(height)
            .filter(|&size| size > 0)
            .ok_or(MazeError::InvalidDimensions { width, height })?;

        Ok(Maze {
            width,
            height,
            cells: vec![Cell::walled(); size],
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cell(&self, x: usize, y: usize) -> &Cell {
        &self.cells[self.index(x, y)]
    }

    pub fn has_wall(&self, x: usize, y: usize, dir: Direction) -> bool {
        self.cell(x, y).has_wall(dir)
    }

    pub fn neighbor(&self, x: usize, y: usize, dir: Direction) -> Option<(usize, usize)> {
        let (dx, dy) = dir.offset();
        let nx = x.checked_add_signed(dx)?;
        let ny = y.checked_add_signed(dy)?;

        if nx < self.width && ny < self.height {
            Some((nx, ny))
        } else {
            None
        }
    }

    /// Removes the wall on side `dir` of cell `(x, y)` and its mirror on the
    /// neighboring cell. Returns `false` if the wall was already gone.
    pub fn remove_wall(&mut self, x: usize, y: usize, dir: Direction) -> bool {
        let i = self.index(x, y);
        if !self.cells[i].clear(dir) {
            return false;
        }

        if let Some((nx, ny)) = self.neighbor(x, y, dir) {
            let j = self.index(nx, ny);
            self.cells[j].clear(dir.opposite());
        }

        true
    }

    /// Every remaining wall as a segment, in row-major cell order. Interior
    /// walls are listed once, from the cell to their north or west.
    pub fn segments(&self) -> Vec<Segment> {
        let mut segments = Vec::new();

        for y in 0..self.height {
            for x in 0..self.width {
                let cell = self.cell(x, y);

                if y == 0 && cell.has_wall(Direction::North) {
                    segments.push(Segment::new(Point::new(x, y), Point::new(x + 1, y)));
                }
                if cell.has_wall(Direction::East) {
                    segments.push(Segment::new(Point::new(x + 1, y), Point::new(x + 1, y + 1)));
                }
                if cell.has_wall(Direction::South) {
                    segments.push(Segment::new(Point::new(x, y + 1), Point::new(x + 1, y + 1)));
                }
                if x == 0 && cell.has_wall(Direction::West) {
                    segments.push(Segment::new(Point::new(x, y), Point::new(x, y + 1)));
                }
            }
        }

        segments
    }

    /// Number of passage regions: cells joined wherever no wall separates them.
    pub fn regions(&self) -> usize {
        let mut sets = DisjointSet::with_len(self.cells.len());

        for y in 0..self.height {
            for x in 0..self.width {
                for dir in [Direction::East, Direction::South] {
                    if self.has_wall(x, y, dir) {
                        continue;
                    }
                    if let Some((nx, ny)) = self.neighbor(x, y, dir) {
                        let i = self.index(x, y);
                        let j = self.index(nx, ny);
                        if sets.root_of(i) != sets.root_of(j) {
                            sets.join(i, j);
                        }
                    }
                }
            }
        }

        (0..self.cells.len())
            .map(|i| sets.root_of(i))
            .collect::<HashSet<_>>()
            .len()
    }

    /// Validates a snapshot that arrived from elsewhere.
    pub fn check(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(MazeError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.width.checked_mul(self.height) != Some(self.cells.len()) {
            return Err(MazeError::InvalidSnapshot);
        }

        for y in 0..self.height {
            for x in 0..self.width {
                let cell = self.cell(x, y);
                let flags = cell.walls.iter().filter(|&&wall| wall).count();
                if flags != cell.wall_count as usize {
                    return Err(MazeError::InvalidSnapshot);
                }

                for dir in [Direction::East, Direction::South] {
                    if let Some((nx, ny)) = self.neighbor(x, y, dir) {
                        if cell.has_wall(dir) != self.has_wall(nx, ny, dir.opposite()) {
                            return Err(MazeError::InvalidSnapshot);
                        }
                    }
                }
            }
        }

        Ok(())
    }

    pub fn log(&self) -> String {
        let rows = 2 * self.height + 1;
        let cols = 2 * self.width + 1;

        (0..rows)
            .map(|row| {
                (0..cols)
                    .map(|col| if self.is_solid(row, col) { "██" } else { "  " })
                    .collect::<String>()
            })
            .collect::<Vec<String>>()
            .join("\n")
    }

    // Even rows and columns are grid lines; odd ones are cell interiors.
    fn is_solid(&self, row: usize, col: usize) -> bool {
        match (row % 2, col % 2) {
            (0, 0) => true,
            (1, 1) => false,
            (0, _) => {
                let x = col / 2;
                let y = row / 2;
                if y < self.height {
                    self.has_wall(x, y, Direction::North)
                } else {
                    self.has_wall(x, self.height - 1, Direction::South)
                }
            }
            _ => {
                let x = col / 2;
                let y = row / 2;
                if x < self.width {
                    self.has_wall(x, y, Direction::West)
                } else {
                    self.has_wall(self.width - 1, y, Direction::East)
                }
            }
        }
    }

    fn index(&self, x: usize, y: usize) -> usize {
        assert!(
            x < self.width && y < self.height,
            "cell ({x}, {y}) is outside a {}x{} maze",
            self.width,
            self.height
        );
        y * self.width + x
    }
}

impl fmt::Debug for Maze {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Maze {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.log())
    }
}
