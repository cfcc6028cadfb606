use std::process;

use clap::Parser;
use log::warn;

use common::{Maze, planner::Planner};
use worker::{RunOutcome, WorkerHandle, cli::Args, render::MazeView, run};

fn main() {
    env_logger::init();
    let args = Args::parse();

    let mut maze = match Maze::new(args.width, args.height) {
        Ok(maze) => maze,
        Err(e) => {
            eprintln!("Error: {e}.");
            process::exit(2);
        }
    };

    let mut worker = WorkerHandle::new();
    let remote = worker.play(&maze, args.algorithm, args.delay, args.seed);
    ctrlc::set_handler(move || remote.stop()).expect("error setting Ctrl-C handler");

    let mut view = if args.animate {
        match MazeView::new() {
            Ok(view) => Some(view),
            Err(e) => {
                warn!("Animation disabled: {e}.");
                None
            }
        }
    } else {
        None
    };

    let summary = run::mirror(&worker, &mut maze, |maze, message| {
        if let Some(view) = view.as_mut() {
            view.apply(message);
            if let Err(e) = view.draw(maze) {
                warn!("Failed to draw: {e}.");
            }
        }
    });

    if let Some(mut view) = view {
        if let Err(e) = view.finish(&maze) {
            warn!("Failed to draw: {e}.");
        }
    } else {
        println!("{maze}");
    }

    match worker.wait() {
        Ok(RunOutcome::Finished) => {
            if !summary.done {
                warn!("Run finished without reporting it.");
            }
            println!("{} walls removed.", summary.walls);
            print!("{}", run::report(&maze, &Planner::new(args.max_segments)));
        }
        Ok(RunOutcome::Stopped) => {
            println!("Stopped after {} walls.", summary.walls);
        }
        Err(e) => {
            eprintln!("Error: {e}.");
            process::exit(1);
        }
    }
}
