use bincode::{
    config::standard,
    serde::{decode_from_slice, encode_to_vec},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    error::{MazeError, Result},
    maze::{
        Algorithm, Direction, Maze,
        maker::{CellColor, Coloring, WallRemoval},
    },
};

/// Messages into the background generation context.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ToWorker {
    Play {
        maze: Maze,
        algorithm: Algorithm,
        delay_ms: u64,
        seed: Option<u64>,
    },
    Stop,
    SetDelay {
        delay_ms: u64,
    },
}

/// Messages out of the background generation context, in the order the
/// algorithm produced them.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum FromWorker {
    RemoveWall { x: usize, y: usize, dir: Direction },
    ColorCell { x: usize, y: usize, color: CellColor },
    Done,
}

impl FromWorker {
    pub fn variant_name(&self) -> &'static str {
        match self {
            Self::RemoveWall { .. } => "RemoveWall",
            Self::ColorCell { .. } => "ColorCell",
            Self::Done => "Done",
        }
    }
}

impl From<WallRemoval> for FromWorker {
    fn from(wall: WallRemoval) -> Self {
        let WallRemoval { x, y, dir } = wall;
        FromWorker::RemoveWall { x, y, dir }
    }
}

impl From<Coloring> for FromWorker {
    fn from(coloring: Coloring) -> Self {
        let Coloring { x, y, color } = coloring;
        FromWorker::ColorCell { x, y, color }
    }
}

pub fn encode<T: Serialize>(message: &T) -> Vec<u8> {
    encode_to_vec(message, standard()).expect("failed to serialize worker message")
}

pub fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    decode_from_slice::<T, _>(data, standard())
        .map(|(message, _)| message)
        .map_err(|_| MazeError::MalformedMessage)
}
