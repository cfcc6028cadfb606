use std::{
    collections::HashMap,
    io::{self, Stdout, Write, stdout},
    time::{Duration, Instant},
};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor},
    terminal::{Clear, ClearType},
};

use common::{Maze, maze::maker::CellColor, protocol::FromWorker};

/// Redraws faster than this are skipped; the final frame is always drawn.
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Animates the consumer's copy of the maze in a terminal.
pub struct MazeView<W: Write> {
    out: W,
    colors: HashMap<(usize, usize), CellColor>,
    last_frame: Option<Instant>,
    owns_terminal: bool, // True except in tests.
}

impl MazeView<Stdout> {
    pub fn new() -> io::Result<Self> {
        let mut out = stdout();
        execute!(out, Hide, Clear(ClearType::All))?;
        Ok(MazeView {
            out,
            colors: HashMap::new(),
            last_frame: None,
            owns_terminal: true,
        })
    }
}

impl<W: Write> MazeView<W> {
    #[cfg(test)]
    fn with_writer(out: W) -> Self {
        MazeView {
            out,
            colors: HashMap::new(),
            last_frame: None,
            owns_terminal: false,
        }
    }

    /// Tracks cell colors. Wall changes are already in the maze.
    pub fn apply(&mut self, message: &FromWorker) {
        if let FromWorker::ColorCell { x, y, color } = *message {
            match color {
                CellColor::Empty => self.colors.remove(&(x, y)),
                color => self.colors.insert((x, y), color),
            };
        }
    }

    pub fn draw(&mut self, maze: &Maze) -> io::Result<()> {
        if self
            .last_frame
            .is_some_and(|last| last.elapsed() < FRAME_INTERVAL)
        {
            return Ok(());
        }
        self.frame(maze)
    }

    pub fn finish(&mut self, maze: &Maze) -> io::Result<()> {
        self.colors.clear();
        self.frame(maze)?;
        queue!(self.out, Print("\r\n"))?;
        self.out.flush()
    }

    fn frame(&mut self, maze: &Maze) -> io::Result<()> {
        queue!(self.out, MoveTo(0, 0))?;
        for line in maze.log().lines() {
            queue!(self.out, Print(line), Print("\r\n"))?;
        }

        // Cell (x, y) is drawn two characters wide at text row 2y + 1.
        for (&(x, y), &color) in &self.colors {
            let (Some(col), Some(row)) = (screen(4 * x + 2), screen(2 * y + 1)) else {
                continue;
            };
            queue!(
                self.out,
                MoveTo(col, row),
                SetBackgroundColor(background(color)),
                Print("  "),
                ResetColor
            )?;
        }

        let bottom = screen(2 * maze.height() + 1).unwrap_or(u16::MAX - 1);
        queue!(self.out, MoveTo(0, bottom))?;
        self.out.flush()?;
        self.last_frame = Some(Instant::now());
        Ok(())
    }
}

impl<W: Write> Drop for MazeView<W> {
    fn drop(&mut self) {
        if self.owns_terminal {
            let _ = execute!(self.out, ResetColor, Show);
        }
    }
}

/// A terminal coordinate, if it can be addressed at all.
fn screen(position: usize) -> Option<u16> {
    u16::try_from(position).ok().filter(|&position| position < u16::MAX)
}

fn background(color: CellColor) -> Color {
    match color {
        CellColor::Empty => Color::Reset,
        CellColor::Start => Color::Green,
        CellColor::Partial => Color::Yellow,
        CellColor::Current => Color::Red,
        CellColor::End => Color::Blue,
        CellColor::Finished => Color::DarkGrey,
    }
}
