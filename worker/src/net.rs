use std::sync::mpsc::Sender;

use common::protocol::{FromWorker, encode};

/// Where a run's outbound messages go.
pub trait Outbox {
    /// Returns `false` once nobody is listening any more.
    fn send(&mut self, message: Vec<u8>) -> bool;

    fn post(&mut self, message: FromWorker) -> bool {
        self.send(encode(&message))
    }
}

pub struct ChannelOutbox {
    sender: Sender<Vec<u8>>,
}

impl ChannelOutbox {
    pub fn new(sender: Sender<Vec<u8>>) -> Self {
        ChannelOutbox { sender }
    }
}

impl Outbox for ChannelOutbox {
    fn send(&mut self, message: Vec<u8>) -> bool {
        self.sender.send(message).is_ok()
    }
}
