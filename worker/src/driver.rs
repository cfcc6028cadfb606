use std::{
    hint,
    sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError},
    time::{Duration, Instant},
};

use log::{debug, info, warn};

use common::{
    Maze, MazeError, Result,
    maze::{
        Algorithm, MazeMaker,
        maker::{Coloring, Step},
    },
    protocol::{FromWorker, ToWorker, decode},
};

use crate::net::Outbox;

/// Remaining pauses at or below this are spun out instead of slept, since a
/// blocking wait tends to overshoot short delays.
pub const BUSY_WAIT_THRESHOLD: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Finished,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Continue,
    Stop,
}

/// The background side of a run: receives commands, steps the generator,
/// emits what changed.
pub struct Driver<O: Outbox> {
    inbox: Receiver<Vec<u8>>,
    outbox: O,
    delay: Duration,
    sleeps: u64,
    spins: u64,
}

impl<O: Outbox> Driver<O> {
    pub fn new(inbox: Receiver<Vec<u8>>, outbox: O) -> Self {
        Driver {
            inbox,
            outbox,
            delay: Duration::ZERO,
            sleeps: 0,
            spins: 0,
        }
    }

    pub fn outbox(&self) -> &O {
        &self.outbox
    }

    /// Blocks until `Play` arrives, then steps that run until the algorithm
    /// finishes or someone asks it to stop.
    pub fn run(&mut self) -> Result<RunOutcome> {
        let outcome = self.drive();
        debug!(
            "Paused with {} blocking waits and {} spins.",
            self.sleeps, self.spins
        );
        outcome
    }

    fn drive(&mut self) -> Result<RunOutcome> {
        let Some((mut maze, algorithm, seed)) = self.wait_for_play()? else {
            info!("Stopped before any run started.");
            return Ok(RunOutcome::Stopped);
        };

        maze.check()?;
        let mut maker = match seed {
            Some(seed) => MazeMaker::with_seed(algorithm, &maze, seed),
            None => MazeMaker::new(algorithm, &maze),
        };

        info!(
            "Starting {algorithm} on a {}x{} maze, {}ms between steps.",
            maze.width(),
            maze.height(),
            self.delay.as_millis()
        );

        loop {
            let started = Instant::now();
            let step = maker.next_wall_to_remove(&mut maze);
            let colors = maker.take_colors();

            match step {
                Step::Removed(wall) => {
                    if !self.outbox.post(wall.into()) {
                        return Ok(self.consumer_gone(&maker));
                    }
                }
                Step::Continue => {}
                Step::Finished => {
                    if !self.forward(colors) || !self.outbox.post(FromWorker::Done) {
                        return Ok(self.consumer_gone(&maker));
                    }
                    return Ok(RunOutcome::Finished);
                }
            }

            if !self.forward(colors) {
                return Ok(self.consumer_gone(&maker));
            }

            if self.pause(started)? == Control::Stop {
                info!(
                    "Stopped {algorithm} after {} walls.",
                    maker.walls_removed()
                );
                return Ok(RunOutcome::Stopped);
            }
        }
    }

    fn wait_for_play(&mut self) -> Result<Option<(Maze, Algorithm, Option<u64>)>> {
        let Ok(data) = self.inbox.recv() else {
            return Ok(None);
        };

        match decode::<ToWorker>(&data)? {
            ToWorker::Play {
                maze,
                algorithm,
                delay_ms,
                seed,
            } => {
                self.delay = Duration::from_millis(delay_ms);
                Ok(Some((maze, algorithm, seed)))
            }
            ToWorker::Stop => Ok(None),
            ToWorker::SetDelay { .. } => Err(MazeError::NotStarted),
        }
    }

    fn forward(&mut self, colors: Vec<Coloring>) -> bool {
        colors
            .into_iter()
            .all(|coloring| self.outbox.post(coloring.into()))
    }

    fn consumer_gone(&self, maker: &MazeMaker) -> RunOutcome {
        info!(
            "Nobody is listening; abandoning {} after {} walls.",
            maker.algorithm(),
            maker.walls_removed()
        );
        RunOutcome::Stopped
    }

    /// Waits out what is left of the delay after a step that began at
    /// `started`, handling commands as they arrive. A delay change takes
    /// effect against the same start instant.
    fn pause(&mut self, started: Instant) -> Result<Control> {
        loop {
            let remaining = self.delay.saturating_sub(started.elapsed());

            if remaining.is_zero() {
                return self.poll();
            }

            if remaining <= BUSY_WAIT_THRESHOLD {
                if self.poll()? == Control::Stop {
                    return Ok(Control::Stop);
                }
                self.spins += 1;
                hint::spin_loop();
                continue;
            }

            self.sleeps += 1;
            match self.inbox.recv_timeout(remaining) {
                Ok(data) => {
                    if self.handle(&data)? == Control::Stop {
                        return Ok(Control::Stop);
                    }
                }
                Err(RecvTimeoutError::Timeout) => return Ok(Control::Continue),
                Err(RecvTimeoutError::Disconnected) => return Ok(Control::Stop),
            }
        }
    }

    /// Handles everything already queued without blocking.
    fn poll(&mut self) -> Result<Control> {
        loop {
            match self.inbox.try_recv() {
                Ok(data) => {
                    if self.handle(&data)? == Control::Stop {
                        return Ok(Control::Stop);
                    }
                }
                Err(TryRecvError::Empty) => return Ok(Control::Continue),
                Err(TryRecvError::Disconnected) => return Ok(Control::Stop),
            }
        }
    }

    fn handle(&mut self, data: &[u8]) -> Result<Control> {
        match decode::<ToWorker>(data)? {
            ToWorker::Stop => Ok(Control::Stop),
            ToWorker::SetDelay { delay_ms } => {
                debug!("Delay changed to {delay_ms}ms.");
                self.delay = Duration::from_millis(delay_ms);
                Ok(Control::Continue)
            }
            ToWorker::Play { .. } => {
                warn!("Ignoring play: this worker is already running.");
                Ok(Control::Continue)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::mpsc::{self, Sender},
        thread,
    };

    use common::{
        maze::{Direction, maker::CellColor},
        protocol::encode,
    };

    use super::*;
    use crate::test_helpers::MockOutbox;

    fn play(maze: &Maze, algorithm: Algorithm) -> Vec<u8> {
        encode(&ToWorker::Play {
            maze: maze.clone(),
            algorithm,
            delay_ms: 0,
            seed: Some(5),
        })
    }

    /// Queues `messages` and returns the sender too, so the inbox stays
    /// open for as long as the test holds it.
    fn driver_with(
        messages: &[Vec<u8>],
        outbox: MockOutbox,
    ) -> (Driver<MockOutbox>, Sender<Vec<u8>>) {
        let (sender, receiver) = mpsc::channel();
        for message in messages {
            sender.send(message.clone()).unwrap();
        }
        (Driver::new(receiver, outbox), sender)
    }

    #[test]
    fn test_run_ends_with_done() {
        let maze = Maze::new(6, 4).unwrap();
        let (mut driver, _inbox) = driver_with(
            &[play(&maze, Algorithm::RecursiveBacktracking)],
            MockOutbox::new(),
        );

        assert_eq!(driver.run(), Ok(RunOutcome::Finished));

        let sent = driver.outbox().decoded();
        assert_eq!(sent.last(), Some(&FromWorker::Done));
        assert_eq!(
            sent.iter()
                .filter(|message| **message == FromWorker::Done)
                .count(),
            1
        );
        assert_eq!(driver.outbox().walls(), 6 * 4 - 1 + 2);
        assert!(matches!(
            sent[0],
            FromWorker::RemoveWall {
                x: 0,
                dir: Direction::West,
                ..
            }
        ));
    }

    #[test]
    fn test_emitted_walls_rebuild_the_maze() {
        let blank = Maze::new(5, 5).unwrap();

        for algorithm in [Algorithm::RecursiveBacktracking, Algorithm::Wilsons] {
            let (mut driver, _inbox) = driver_with(&[play(&blank, algorithm)], MockOutbox::new());
            assert_eq!(driver.run(), Ok(RunOutcome::Finished));

            let mut shadow = blank.clone();
            for message in driver.outbox().decoded() {
                if let FromWorker::RemoveWall { x, y, dir } = message {
                    assert!(shadow.remove_wall(x, y, dir), "{algorithm} sent {message:?} twice");
                }
            }
            assert_eq!(shadow.regions(), 1);
            assert!(shadow.check().is_ok());
        }
    }

    #[test]
    fn test_wilsons_reports_colors() {
        let maze = Maze::new(4, 4).unwrap();
        let (mut driver, _inbox) = driver_with(&[play(&maze, Algorithm::Wilsons)], MockOutbox::new());
        assert_eq!(driver.run(), Ok(RunOutcome::Finished));

        let sent = driver.outbox().decoded();
        // The first cell joins the tree before any wall comes down.
        assert!(matches!(
            sent[0],
            FromWorker::ColorCell {
                color: CellColor::Finished,
                ..
            }
        ));

        // The exit's color follows the wall it belongs to.
        let exit = sent
            .iter()
            .position(|message| {
                matches!(
                    message,
                    FromWorker::ColorCell {
                        color: CellColor::End,
                        ..
                    }
                )
            })
            .expect("the exit should be colored");
        assert!(matches!(
            sent[exit - 1],
            FromWorker::RemoveWall {
                x: 3,
                dir: Direction::East,
                ..
            }
        ));
    }

    #[test]
    fn test_stop_before_play() {
        let (mut driver, _inbox) = driver_with(&[encode(&ToWorker::Stop)], MockOutbox::new());
        assert_eq!(driver.run(), Ok(RunOutcome::Stopped));
        assert!(driver.outbox().sent.is_empty());
    }

    #[test]
    fn test_delay_before_play_is_rejected() {
        let (mut driver, _inbox) = driver_with(
            &[encode(&ToWorker::SetDelay { delay_ms: 5 })],
            MockOutbox::new(),
        );
        assert_eq!(driver.run(), Err(MazeError::NotStarted));
    }

    #[test]
    fn test_malformed_first_message() {
        let (mut driver, _inbox) = driver_with(&[vec![0xde, 0xad, 0xbe, 0xef]], MockOutbox::new());
        assert_eq!(driver.run(), Err(MazeError::MalformedMessage));
    }

    #[test]
    fn test_queued_stop_halts_after_one_step() {
        let maze = Maze::new(10, 10).unwrap();
        let (mut driver, _inbox) = driver_with(
            &[
                play(&maze, Algorithm::RecursiveBacktracking),
                encode(&ToWorker::Stop),
            ],
            MockOutbox::new(),
        );

        assert_eq!(driver.run(), Ok(RunOutcome::Stopped));
        let sent = driver.outbox().decoded();
        assert_eq!(sent.len(), 1);
        assert!(!sent.contains(&FromWorker::Done));
    }

    #[test]
    fn test_delay_change_is_not_a_stop() {
        let maze = Maze::new(3, 3).unwrap();
        let (mut driver, _inbox) = driver_with(
            &[
                play(&maze, Algorithm::RecursiveBacktracking),
                encode(&ToWorker::SetDelay { delay_ms: 0 }),
                encode(&ToWorker::SetDelay { delay_ms: 1 }),
            ],
            MockOutbox::new(),
        );

        assert_eq!(driver.run(), Ok(RunOutcome::Finished));
        assert_eq!(driver.outbox().walls(), 3 * 3 - 1 + 2);
    }

    #[test]
    fn test_closed_outbox_ends_the_run() {
        let maze = Maze::new(8, 8).unwrap();
        let (mut driver, _inbox) = driver_with(
            &[play(&maze, Algorithm::RecursiveBacktracking)],
            MockOutbox::hanging_up_after(3),
        );

        assert_eq!(driver.run(), Ok(RunOutcome::Stopped));
        assert_eq!(driver.outbox().sent.len(), 3);
    }

    #[test]
    fn test_dropped_inbox_ends_the_run() {
        let maze = Maze::new(8, 8).unwrap();
        let (sender, receiver) = mpsc::channel();
        sender
            .send(play(&maze, Algorithm::RecursiveBacktracking))
            .unwrap();
        drop(sender);

        let mut driver = Driver::new(receiver, MockOutbox::new());
        assert_eq!(driver.run(), Ok(RunOutcome::Stopped));
        assert_eq!(driver.outbox().walls(), 1);
    }

    fn play_with_delay(maze: &Maze, delay_ms: u64) -> Vec<u8> {
        encode(&ToWorker::Play {
            maze: maze.clone(),
            algorithm: Algorithm::RecursiveBacktracking,
            delay_ms,
            seed: Some(5),
        })
    }

    /// Runs the driver on its own thread and sends `Stop` after `after`.
    fn run_then_stop(
        mut driver: Driver<MockOutbox>,
        inbox: Sender<Vec<u8>>,
        after: Duration,
    ) -> (Result<RunOutcome>, Driver<MockOutbox>) {
        let running = thread::spawn(move || {
            let outcome = driver.run();
            (outcome, driver)
        });
        thread::sleep(after);
        inbox.send(encode(&ToWorker::Stop)).unwrap();
        running.join().unwrap()
    }

    #[test]
    fn test_raised_delay_blocks_instead_of_spinning() {
        let maze = Maze::new(10, 10).unwrap();
        let (driver, inbox) = driver_with(
            &[
                play_with_delay(&maze, 5),
                encode(&ToWorker::SetDelay { delay_ms: 1_000 }),
            ],
            MockOutbox::new(),
        );

        let started = Instant::now();
        let (outcome, driver) = run_then_stop(driver, inbox, Duration::from_millis(100));

        assert_eq!(outcome, Ok(RunOutcome::Stopped));
        assert!(started.elapsed() < Duration::from_millis(900));
        assert_eq!(driver.outbox().walls(), 1);
        // The raise is seen during the first short pause, which then sleeps.
        assert_eq!(driver.sleeps, 1);
        assert!(driver.spins <= 1, "spun {} times", driver.spins);
    }

    #[test]
    fn test_short_delays_spin() {
        let maze = Maze::new(10, 10).unwrap();
        let (driver, inbox) = driver_with(&[play_with_delay(&maze, 5)], MockOutbox::new());

        let (outcome, driver) = run_then_stop(driver, inbox, Duration::from_millis(50));

        assert_eq!(outcome, Ok(RunOutcome::Stopped));
        assert!(driver.outbox().walls() > 1);
        assert_eq!(driver.sleeps, 0);
        assert!(driver.spins > 0);
    }
}
