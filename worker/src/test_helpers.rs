use common::protocol::{FromWorker, decode};

use crate::net::Outbox;

#[derive(Default)]
pub struct MockOutbox {
    /// **Outgoing Message Log:** every encoded message the driver sent, in
    /// order. Tests read it back with `decoded`.
    pub sent: Vec<Vec<u8>>,

    /// **Hang-up Point:** once this many messages have been accepted, `send`
    /// fails as if the consumer had dropped its receiver.
    pub capacity: Option<usize>,
}

impl MockOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hanging_up_after(capacity: usize) -> Self {
        MockOutbox {
            sent: Vec::new(),
            capacity: Some(capacity),
        }
    }

    pub fn decoded(&self) -> Vec<FromWorker> {
        self.sent
            .iter()
            .map(|data| decode::<FromWorker>(data).expect("driver should send well-formed messages"))
            .collect()
    }

    pub fn walls(&self) -> usize {
        self.decoded()
            .iter()
            .filter(|message| matches!(message, FromWorker::RemoveWall { .. }))
            .count()
    }
}

impl Outbox for MockOutbox {
    fn send(&mut self, message: Vec<u8>) -> bool {
        if self.capacity.is_some_and(|capacity| self.sent.len() >= capacity) {
            return false;
        }
        self.sent.push(message);
        true
    }
}
