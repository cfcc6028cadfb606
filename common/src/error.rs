use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MazeError {
    #[error("maze dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    #[error("unknown algorithm `{0}`")]
    UnknownAlgorithm(String),
    #[error("malformed worker message")]
    MalformedMessage,
    #[error("maze snapshot does not match its declared size or wall flags")]
    InvalidSnapshot,
    #[error("no run has been started")]
    NotStarted,
    #[error("worker thread panicked")]
    WorkerPanicked,
}

pub type Result<T> = core::result::Result<T, MazeError>;
