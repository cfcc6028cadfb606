//! Drawing order for a finished maze's walls.
//!
//! A pen plotter draws every remaining wall once. Moving with the pen up is
//! wasted travel, so the planner looks for the order (and orientation) of
//! segments that wastes the least: the trip from the origin to the first
//! segment, the gaps between segments, and the trip from the last segment to
//! the far-right point of the top edge.
//!
//! The search is exhaustive with memoization, so it only runs on small inputs.

use std::collections::HashMap;
use std::time::Instant;

use log::{debug, info};

use crate::maze::{Point, Segment};

pub const DEFAULT_MAX_SEGMENTS: usize = 14;
pub const MAX_SEGMENTS_LIMIT: usize = u64::BITS as usize; // One bit per segment in the drawn set.

const EPSILON: f64 = 1e-9;

#[derive(Clone, Debug, PartialEq)]
pub struct TravelPlan {
    pub segments: Vec<Segment>,
    pub waste: f64,
    pub naive_waste: f64,
    pub terminal: Point,
}

impl TravelPlan {
    /// The plan as pen-down polylines: a new stroke starts wherever the pen
    /// has to lift.
    pub fn strokes(&self) -> Vec<Vec<Point>> {
        let mut strokes: Vec<Vec<Point>> = Vec::new();

        for segment in &self.segments {
            match strokes.last_mut() {
                Some(stroke) if stroke.last() == Some(&segment.p1) => stroke.push(segment.p2),
                _ => strokes.push(vec![segment.p1, segment.p2]),
            }
        }

        strokes
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Plan {
    Ordered(TravelPlan),
    /// Too many segments to search; draw them in the order given.
    Unattempted {
        segments: usize,
        max_segments: usize,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Planner {
    max_segments: usize,
}

impl Default for Planner {
    fn default() -> Self {
        Planner::new(DEFAULT_MAX_SEGMENTS)
    }
}

impl Planner {
    pub fn new(max_segments: usize) -> Self {
        Planner {
            max_segments: max_segments.min(MAX_SEGMENTS_LIMIT),
        }
    }

    pub fn max_segments(&self) -> usize {
        self.max_segments
    }

    pub fn plan(&self, segments: &[Segment]) -> Plan {
        if segments.len() > self.max_segments {
            info!(
                "not planning {} segments; anything over {} would take too long",
                segments.len(),
                self.max_segments
            );
            return Plan::Unattempted {
                segments: segments.len(),
                max_segments: self.max_segments,
            };
        }

        let origin = Point::default();
        let terminal = terminal(segments);
        let naive_waste = waste(origin, segments, terminal);
        debug!("score of default ordering: {naive_waste}");

        let started = Instant::now();
        let mut search = Search::new(segments, terminal);
        let mut waste = search
            .best(origin, 0, f64::INFINITY)
            .expect("an unbounded search always finds an order");
        let mut ordered = search.path(origin);
        if naive_waste < waste - EPSILON {
            debug!("input order beats the search ({naive_waste} < {waste}); keeping it");
            ordered = segments.to_vec();
            waste = naive_waste;
        }

        info!(
            "drawing order for {} segments found in {}ms ({} states): waste {waste:.4}, naive {naive_waste:.4}",
            segments.len(),
            started.elapsed().as_millis(),
            search.memo.len()
        );

        Plan::Ordered(TravelPlan {
            segments: ordered,
            waste,
            naive_waste,
            terminal,
        })
    }
}

/// Where the pen finishes: the far-right point of the top edge.
pub fn terminal(segments: &[Segment]) -> Point {
    let max_x = segments
        .iter()
        .flat_map(|segment| [segment.p1.x, segment.p2.x])
        .max()
        .unwrap_or(0);
    Point::new(max_x, 0)
}

/// Pen-up travel for drawing `order` as given, from `start` to `end`.
pub fn waste(start: Point, order: &[Segment], end: Point) -> f64 {
    let mut position = start;
    let mut total = 0.0;

    for segment in order {
        total += position.distance(segment.p1);
        position = segment.p2;
    }

    total + position.distance(end)
}

#[derive(Clone, Copy, Debug)]
enum Memo {
    /// Cheapest completion and the first move that achieves it.
    Exact { cost: f64, next: (usize, bool) },
    /// Every completion costs more than this.
    Above(f64),
}

struct Search<'a> {
    segments: &'a [Segment],
    terminal: Point,
    complete: u64,
    memo: HashMap<(Point, u64), Memo>,
}

impl<'a> Search<'a> {
    fn new(segments: &'a [Segment], terminal: Point) -> Self {
        let complete = match segments.len() {
            MAX_SEGMENTS_LIMIT => u64::MAX,
            n => (1u64 << n) - 1,
        };

        Search {
            segments,
            terminal,
            complete,
            memo: HashMap::new(),
        }
    }

    /// Cheapest waste for drawing everything not in `drawn`, starting at
    /// `position`, if it is within `budget`.
    fn best(&mut self, position: Point, drawn: u64, budget: f64) -> Option<f64> {
        if drawn == self.complete {
            let cost = position.distance(self.terminal);
            return (cost <= budget + EPSILON).then_some(cost);
        }

        match self.memo.get(&(position, drawn)) {
            Some(&Memo::Exact { cost, .. }) => return (cost <= budget + EPSILON).then_some(cost),
            Some(&Memo::Above(bound)) if budget <= bound => return None,
            _ => {}
        }

        let result = match self.forced_move(position, drawn) {
            Some(next) => self.take(position, drawn, next, budget),
            None => self.branch(position, drawn, budget),
        };

        let memo = match result {
            Some((cost, next)) => Memo::Exact { cost, next },
            None => Memo::Above(budget),
        };
        self.memo.insert((position, drawn), memo);

        result.map(|(cost, _)| cost)
    }

    // Only one undrawn segment continues the line just drawn: draw it
    // without branching. Never applies before the first segment.
    fn forced_move(&self, position: Point, drawn: u64) -> Option<(usize, bool)> {
        if drawn == 0 {
            return None;
        }

        let mut touching = self
            .undrawn(drawn)
            .filter(|&i| self.segments[i].touches(position));

        match (touching.next(), touching.next()) {
            (Some(i), None) => Some((i, self.segments[i].p1 != position)),
            _ => None,
        }
    }

    fn take(
        &mut self,
        position: Point,
        drawn: u64,
        next: (usize, bool),
        budget: f64,
    ) -> Option<(f64, (usize, bool))> {
        let segment = self.oriented(next);
        let dead = position.distance(segment.p1);
        let rest = self.best(segment.p2, drawn | 1 << next.0, budget - dead)?;
        Some((dead + rest, next))
    }

    fn branch(&mut self, position: Point, drawn: u64, budget: f64) -> Option<(f64, (usize, bool))> {
        let mut candidates: Vec<(usize, f64)> = self
            .undrawn(drawn)
            .map(|i| {
                let segment = self.segments[i];
                let near = position
                    .distance(segment.p1)
                    .min(position.distance(segment.p2));
                (i, near)
            })
            .collect();
        candidates.sort_by(|a, b| a.1.total_cmp(&b.1));

        let mut bound = budget;
        let mut best: Option<(f64, (usize, bool), f64)> = None;

        for (i, near) in candidates {
            if near > bound + EPSILON {
                break;
            }

            for reversed in [false, true] {
                let segment = self.oriented((i, reversed));
                let dead = position.distance(segment.p1);
                if dead > bound + EPSILON {
                    continue;
                }

                let Some(rest) = self.best(segment.p2, drawn | 1 << i, bound - dead) else {
                    continue;
                };
                let total = dead + rest;

                // On a tie, keep the pen down.
                let better = match best {
                    None => true,
                    Some((cost, _, first)) => {
                        total < cost - EPSILON
                            || (total <= cost + EPSILON && dead < EPSILON && first >= EPSILON)
                    }
                };
                if better {
                    best = Some((total, (i, reversed), dead));
                    bound = bound.min(total);
                }
            }
        }

        best.map(|(cost, next, _)| (cost, next))
    }

    fn path(&self, origin: Point) -> Vec<Segment> {
        let mut position = origin;
        let mut drawn = 0;
        let mut order = Vec::with_capacity(self.segments.len());

        while drawn != self.complete {
            let Some(&Memo::Exact { next, .. }) = self.memo.get(&(position, drawn)) else {
                panic!("every state on the best path should have an exact memo entry");
            };
            let segment = self.oriented(next);
            order.push(segment);
            position = segment.p2;
            drawn |= 1 << next.0;
        }

        order
    }

    fn undrawn(&self, drawn: u64) -> impl Iterator<Item = usize> + '_ {
        (0..self.segments.len()).filter(move |&i| drawn & (1 << i) == 0)
    }

    fn oriented(&self, (i, reversed): (usize, bool)) -> Segment {
        let segment = self.segments[i];
        if reversed { segment.reversed() } else { segment }
    }
}
