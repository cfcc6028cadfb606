use std::fmt::Write;

use log::{debug, trace};

use common::{
    Maze,
    planner::{Plan, Planner},
    protocol::FromWorker,
};

use crate::handle::WorkerHandle;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub walls: usize,
    pub colors: usize,
    pub done: bool,
}

/// Applies every wall removal the worker reports to `shadow` until the run's
/// messages run out. `on_message` sees the maze after each change.
pub fn mirror(
    worker: &WorkerHandle,
    shadow: &mut Maze,
    mut on_message: impl FnMut(&Maze, &FromWorker),
) -> Summary {
    let mut summary = Summary::default();

    while let Some(message) = worker.recv() {
        trace!("Received {}.", message.variant_name());
        match message {
            FromWorker::RemoveWall { x, y, dir } => {
                shadow.remove_wall(x, y, dir);
                summary.walls += 1;
            }
            FromWorker::ColorCell { .. } => summary.colors += 1,
            FromWorker::Done => summary.done = true,
        }
        on_message(shadow, &message);
    }

    debug!("Run sent {summary:?}.");
    summary
}

/// Drawing instructions for the finished maze's walls.
pub fn report(maze: &Maze, planner: &Planner) -> String {
    let segments = maze.segments();
    let mut out = String::new();

    match planner.plan(&segments) {
        Plan::Ordered(plan) => {
            let _ = writeln!(
                out,
                "{} walls in {} strokes, {:.3} units of pen-up travel (drawn in order: {:.3}).",
                plan.segments.len(),
                plan.strokes().len(),
                plan.waste,
                plan.naive_waste
            );
            for (i, stroke) in plan.strokes().iter().enumerate() {
                let points: Vec<String> = stroke.iter().map(ToString::to_string).collect();
                let _ = writeln!(out, "Stroke {}: {}", i + 1, points.join(" -> "));
            }
            let _ = writeln!(out, "Finish at {}.", plan.terminal);
        }
        Plan::Unattempted {
            segments: count,
            max_segments,
        } => {
            let _ = writeln!(
                out,
                "Too many walls to plan ({count} > {max_segments}); drawing them as listed."
            );
            for (i, segment) in segments.iter().enumerate() {
                let _ = writeln!(out, "Wall {}: {} to {}", i + 1, segment.p1, segment.p2);
            }
        }
    }

    out
}
