use std::{
    sync::mpsc::{self, Receiver, RecvTimeoutError, Sender},
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{info, warn};

use common::{
    Maze, MazeError, Result,
    maze::Algorithm,
    protocol::{FromWorker, ToWorker, decode, encode},
};

use crate::{
    driver::{Driver, RunOutcome},
    net::ChannelOutbox,
};

/// Sends commands to a run from any thread.
#[derive(Clone)]
pub struct Remote {
    inbox: Sender<Vec<u8>>,
}

impl Remote {
    pub fn stop(&self) {
        // A run that already ended has nothing left to stop.
        let _ = self.inbox.send(encode(&ToWorker::Stop));
    }

    pub fn set_delay(&self, delay_ms: u64) {
        let _ = self.inbox.send(encode(&ToWorker::SetDelay { delay_ms }));
    }
}

struct Run {
    remote: Remote,
    events: Receiver<Vec<u8>>,
    thread: JoinHandle<Result<RunOutcome>>,
}

/// The consumer side: owns at most one background run at a time.
#[derive(Default)]
pub struct WorkerHandle {
    run: Option<Run>,
}

impl WorkerHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts generating over a copy of `maze`. Any earlier run is stopped
    /// and its undelivered messages are thrown away.
    pub fn play(
        &mut self,
        maze: &Maze,
        algorithm: Algorithm,
        delay_ms: u64,
        seed: Option<u64>,
    ) -> Remote {
        self.discard();

        let (inbox_sender, inbox) = mpsc::channel();
        let (events_sender, events) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("maze-worker".to_string())
            .spawn(move || Driver::new(inbox, ChannelOutbox::new(events_sender)).run())
            .expect("failed to spawn worker thread");

        let remote = Remote {
            inbox: inbox_sender,
        };
        remote
            .inbox
            .send(encode(&ToWorker::Play {
                maze: maze.clone(),
                algorithm,
                delay_ms,
                seed,
            }))
            .expect("a freshly spawned worker is listening");

        self.run = Some(Run {
            remote: remote.clone(),
            events,
            thread,
        });
        remote
    }

    /// Asks the current run to stop. Messages it sent before noticing stay
    /// available through `recv`.
    pub fn stop(&self) {
        if let Some(run) = &self.run {
            run.remote.stop();
        }
    }

    pub fn set_delay(&self, delay_ms: u64) {
        if let Some(run) = &self.run {
            run.remote.set_delay(delay_ms);
        }
    }

    /// Blocks for the next message. `None` once the run has ended and every
    /// message it sent has been read.
    pub fn recv(&self) -> Option<FromWorker> {
        let run = self.run.as_ref()?;
        loop {
            let data = run.events.recv().ok()?;
            if let Some(message) = decode_event(&data) {
                return Some(message);
            }
        }
    }

    /// Like `recv`, but gives up after `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<FromWorker> {
        let run = self.run.as_ref()?;
        loop {
            match run.events.recv_timeout(timeout) {
                Ok(data) => {
                    if let Some(message) = decode_event(&data) {
                        return Some(message);
                    }
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    pub fn try_recv(&self) -> Option<FromWorker> {
        let run = self.run.as_ref()?;
        loop {
            let data = run.events.try_recv().ok()?;
            if let Some(message) = decode_event(&data) {
                return Some(message);
            }
        }
    }

    /// Waits for the current run's thread to end and reports how it ended.
    /// Drain messages with `recv` first: unread ones are dropped here.
    pub fn wait(&mut self) -> Result<RunOutcome> {
        let run = self.run.take().ok_or(MazeError::NotStarted)?;
        join_thread(run.thread)
    }

    fn discard(&mut self) {
        let Some(run) = self.run.take() else {
            return;
        };
        let Run {
            remote,
            events,
            thread,
        } = run;
        remote.stop();
        // A run still mid-step sees its next send fail.
        drop(events);
        drop(remote);

        match join_thread(thread) {
            Ok(outcome) => info!("Discarded previous run ({outcome:?})."),
            Err(e) => warn!("Previous run ended badly: {e}."),
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.discard();
    }
}

fn join_thread(thread: JoinHandle<Result<RunOutcome>>) -> Result<RunOutcome> {
    thread.join().map_err(|_| MazeError::WorkerPanicked)?
}

fn decode_event(data: &[u8]) -> Option<FromWorker> {
    match decode::<FromWorker>(data) {
        Ok(message) => Some(message),
        Err(e) => {
            warn!("Skipping worker message: {e}.");
            None
        }
    }
}
