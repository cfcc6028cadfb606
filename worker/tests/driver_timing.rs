use std::{
    thread,
    time::{Duration, Instant},
};

use common::{Maze, maze::Algorithm, protocol::FromWorker};
use worker::{RunOutcome, WorkerHandle};

fn drain(worker: &WorkerHandle) -> Vec<(Instant, FromWorker)> {
    let mut received = Vec::new();
    while let Some(message) = worker.recv() {
        received.push((Instant::now(), message));
    }
    received
}

fn wall_times(received: &[(Instant, FromWorker)]) -> Vec<Instant> {
    received
        .iter()
        .filter(|(_, message)| matches!(message, FromWorker::RemoveWall { .. }))
        .map(|(at, _)| *at)
        .collect()
}

#[test]
fn zero_delay_runs_straight_through() {
    let maze = Maze::new(20, 20).unwrap();
    let mut worker = WorkerHandle::new();
    let started = Instant::now();
    worker.play(&maze, Algorithm::Wilsons, 0, Some(1));

    let received = drain(&worker);
    assert_eq!(worker.wait(), Ok(RunOutcome::Finished));
    assert!(started.elapsed() < Duration::from_secs(10));

    assert_eq!(wall_times(&received).len(), 20 * 20 - 1 + 2);
    assert_eq!(received.last().map(|(_, message)| *message), Some(FromWorker::Done));
}

#[test]
fn steps_are_spaced_by_the_delay() {
    let maze = Maze::new(3, 3).unwrap();
    let mut worker = WorkerHandle::new();
    worker.play(&maze, Algorithm::RecursiveBacktracking, 30, None);

    let walls = wall_times(&drain(&worker));
    assert_eq!(worker.wait(), Ok(RunOutcome::Finished));
    assert_eq!(walls.len(), 10);

    let span = walls[walls.len() - 1] - walls[0];
    assert!(span >= Duration::from_millis(9 * 27), "span was {span:?}");

    for pair in walls.windows(2) {
        let gap = pair[1] - pair[0];
        assert!(gap >= Duration::from_millis(24), "walls only {gap:?} apart");
    }
}

#[test]
fn short_delays_are_honored_too() {
    let maze = Maze::new(3, 3).unwrap();
    let mut worker = WorkerHandle::new();
    worker.play(&maze, Algorithm::RecursiveBacktracking, 5, None);

    let walls = wall_times(&drain(&worker));
    assert_eq!(worker.wait(), Ok(RunOutcome::Finished));

    let span = walls[walls.len() - 1] - walls[0];
    assert!(span >= Duration::from_millis(40), "span was {span:?}");
}

#[test]
fn stop_takes_effect_within_one_step() {
    let maze = Maze::new(30, 30).unwrap();
    let mut worker = WorkerHandle::new();
    worker.play(&maze, Algorithm::RecursiveBacktracking, 20, None);

    for _ in 0..3 {
        assert!(matches!(worker.recv(), Some(FromWorker::RemoveWall { .. })));
    }
    worker.stop();

    let after_stop = drain(&worker);
    assert!(wall_times(&after_stop).len() <= 1, "{after_stop:?}");
    assert!(
        after_stop
            .iter()
            .all(|(_, message)| *message != FromWorker::Done)
    );
    assert_eq!(worker.wait(), Ok(RunOutcome::Stopped));
}

#[test]
fn stop_from_another_thread_interrupts_a_long_pause() {
    let maze = Maze::new(10, 10).unwrap();
    let mut worker = WorkerHandle::new();
    let remote = worker.play(&maze, Algorithm::RecursiveBacktracking, 5_000, None);

    let started = Instant::now();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        remote.stop();
    });

    let received = drain(&worker);
    assert_eq!(worker.wait(), Ok(RunOutcome::Stopped));
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(wall_times(&received).len(), 1);
}

#[test]
fn a_new_delay_applies_to_the_current_pause() {
    let maze = Maze::new(5, 5).unwrap();
    let mut worker = WorkerHandle::new();
    worker.play(&maze, Algorithm::RecursiveBacktracking, 10_000, None);

    assert!(matches!(worker.recv(), Some(FromWorker::RemoveWall { .. })));
    let changed = Instant::now();
    worker.set_delay(0);

    let rest = drain(&worker);
    assert_eq!(worker.wait(), Ok(RunOutcome::Finished));
    assert!(changed.elapsed() < Duration::from_secs(5));
    assert_eq!(wall_times(&rest).len(), 5 * 5 - 1 + 2 - 1);
}

#[test]
fn playing_again_discards_the_previous_run() {
    let mut worker = WorkerHandle::new();
    worker.play(
        &Maze::new(10, 10).unwrap(),
        Algorithm::RecursiveBacktracking,
        50,
        None,
    );
    assert!(worker.recv().is_some());

    worker.play(&Maze::new(2, 2).unwrap(), Algorithm::Wilsons, 0, Some(3));
    let received = drain(&worker);
    assert_eq!(worker.wait(), Ok(RunOutcome::Finished));

    assert_eq!(wall_times(&received).len(), 2 * 2 - 1 + 2);
    for (_, message) in &received {
        if let FromWorker::RemoveWall { x, y, .. } | FromWorker::ColorCell { x, y, .. } = message {
            assert!(*x < 2 && *y < 2, "message from the old run: {message:?}");
        }
    }
}

#[test]
fn waiting_without_a_run_is_an_error() {
    let mut worker = WorkerHandle::new();
    assert!(worker.recv().is_none());
    assert!(worker.try_recv().is_none());
    assert!(worker.recv_timeout(Duration::from_millis(10)).is_none());
    assert!(worker.wait().is_err());
}
