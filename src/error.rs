use std::path::PathBuf;

use uuid::Uuid;

use crate::games::kalah::Player;

/// Problems with the layout handed to the initializer. These are always caused
/// by the caller's input and retrying without changing it won't help.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InitializationError {
    #[error("The board is already initialized.")]
    AlreadyInitialized,

    #[error("Provide an initial state to the board.")]
    MissingLayout,

    #[error("The amount of pits on board should be even.")]
    OddPitCount,

    #[error("The board should have at least two pits plus a base per player.")]
    TooFewPits,

    #[error("The board should have only two empty pits at the right of each player.")]
    MisplacedEmptyPits,

    #[error("There are too many stones on pit {pit}. The maximum amount of stones is {max}. Fix the initialization board and retry.")]
    TooManyStones { pit: usize, max: u32 },

    #[error("There are negative amount of stones on pit {pit}. Fix the initialization board and retry.")]
    NegativeStones { pit: usize },

    #[error("There are too many stones on the board. The maximum amount of stones is {max}.")]
    TooManyStonesOnBoard { max: u32 },

    #[error("A player has no stones left to move but the game is still marked as playable.")]
    StalledGame,
}

/// Illegal moves. `GameOver` is terminal, every later move gets the same answer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("The board has not been initialized yet.")]
    NotInitialized,

    #[error("Game has ended. Player {winner} won.")]
    GameOver { winner: Player },

    #[error("The stones at the base should not be moved.")]
    BasePit,

    #[error("Those stones are not yours to move.")]
    NotYourPit,

    #[error("Choose a pit with stones.")]
    EmptyPit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("The board has not been initialized yet.")]
pub struct NotInitialized;

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("no game stored with id {0}")]
    NotFound(Uuid),

    #[error("failed to access game store {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed record in {path} at line {line}: {source}")]
    Parse {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },

    #[error("failed to write record: {0}")]
    Write(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

/// Everything that can reach the command-line boundary. The first three are
/// domain failures; anything else is folded into `Internal`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Initialization(#[from] InitializationError),

    #[error(transparent)]
    Move(#[from] MoveError),

    #[error(transparent)]
    NotInitialized(#[from] NotInitialized),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl EngineError {
    /// Short name used in failure reports.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Initialization(_) => "InitializationError",
            EngineError::Move(_) => "MoveError",
            EngineError::NotInitialized(_) => "NotInitialized",
            EngineError::Internal(_) => "InternalError",
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, EngineError::Internal(_))
    }
}

impl From<PersistError> for EngineError {
    fn from(err: PersistError) -> Self {
        EngineError::Internal(err.into())
    }
}
