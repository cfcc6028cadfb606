pub mod cli;
pub mod driver;
pub mod handle;
pub mod net;
pub mod render;
pub mod run;

#[cfg(test)]
mod test_helpers;

pub use driver::{Driver, RunOutcome};
pub use handle::{Remote, WorkerHandle};
