use clap::Parser;

use common::{maze::Algorithm, planner::DEFAULT_MAX_SEGMENTS};

/// Watch a maze being carved one wall at a time, then plan how to plot it.
#[derive(Parser, Debug)]
#[command(about, long_about = None, version)]
pub struct Args {
    /// Number of cells across
    #[arg(short = 'x', long, default_value_t = 20)]
    pub width: usize,

    /// Number of cells down
    #[arg(short = 'y', long, default_value_t = 10)]
    pub height: usize,

    /// Random, RecursiveBacktracking or Wilsons
    #[arg(short, long, default_value_t = Algorithm::RecursiveBacktracking, value_parser = Algorithm::from_name)]
    pub algorithm: Algorithm,

    /// Milliseconds between generation steps
    #[arg(short, long, default_value_t = 0)]
    pub delay: u64,

    /// Largest wall count the travel planner will attempt
    #[arg(short, long, default_value_t = DEFAULT_MAX_SEGMENTS)]
    pub max_segments: usize,

    /// Seed for a reproducible maze
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Redraw the maze in the terminal as walls come down
    #[arg(long, default_value_t = false)]
    pub animate: bool,
}
