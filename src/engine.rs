use crate::error::{InitializationError, MoveError, NotInitialized};
use crate::games::kalah::{Board, Game, GameRecord, Layout, Player, Ply, Status, DEFAULT_MAX_STONES};
use crate::status::StatusReport;

/// Owns at most one live game. Every operation takes `&mut self` or `&self`,
/// so a host that shares an engine has to serialize access itself.
#[derive(Debug)]
pub struct Engine {
    game: Option<Game>,
    max_stones: u32,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STONES)
    }
}

impl Engine {
    pub fn new(max_stones: u32) -> Self {
        Self { game: None, max_stones }
    }

    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    pub fn snapshot(&self) -> Option<GameRecord> {
        self.game.as_ref().map(Game::record)
    }

    pub fn initialize(&mut self, layout: Option<&[i32]>) -> Result<Board, InitializationError> {
        if self.game.is_some() {
            return Err(InitializationError::AlreadyInitialized);
        }
        let layout = layout.ok_or(InitializationError::MissingLayout)?;
        let board = Layout::new(layout, self.max_stones).into_board().inspect_err(|err| {
            log::debug!("Rejected layout {:?}: {}", layout, err);
        })?;

        let game = Game::new(board.clone());
        log::info!("Initialized game {} with {} pits", game.id(), board.len());
        self.game = Some(game);
        Ok(board)
    }

    /// Put a persisted game back in play.
    pub fn restore(&mut self, record: GameRecord) -> Result<Board, InitializationError> {
        if self.game.is_some() {
            return Err(InitializationError::AlreadyInitialized);
        }
        let board = Layout::new(record.board.pits(), self.max_stones).in_progress().into_board()?;
        // Play marks the game DONE as soon as one side runs dry
        let side_empty = board.side_stones(Player::One) == 0 || board.side_stones(Player::Two) == 0;
        if record.status == Status::Playable && side_empty {
            return Err(InitializationError::StalledGame);
        }

        log::info!("Restored game {} ({}, player {} to move)", record.id, record.status, record.player);
        self.game = Some(Game::from_parts(record.id, board.clone(), record.player, record.status));
        Ok(board)
    }

    pub fn play(&mut self, pit: usize) -> Result<Ply, MoveError> {
        let game = self.game.as_mut().ok_or(MoveError::NotInitialized)?;
        game.move_stones_from(pit).inspect_err(|err| {
            log::debug!("Rejected move from pit {}: {}", pit, err);
        })
    }

    pub fn move_stones_from(&mut self, pit: usize) -> Result<Board, MoveError> {
        self.play(pit)?;
        self.game.as_ref().map(|g| g.board().clone()).ok_or(MoveError::NotInitialized)
    }

    pub fn status(&self) -> Result<StatusReport, NotInitialized> {
        self.game.as_ref().map(StatusReport::of).ok_or(NotInitialized)
    }

    pub fn clear(&mut self) {
        if let Some(game) = self.game.take() {
            log::info!("Cleared game {}", game.id());
        }
    }
}
