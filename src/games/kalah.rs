use super::{GameState, Validate};
use crate::error::{InitializationError, MoveError};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;
use uuid::Uuid;

pub const MIN_PITS: usize = 6;
pub const DEFAULT_MAX_STONES: u32 = 10;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub fn other(self) -> Self {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::One => write!(f, "ONE"),
            Player::Two => write!(f, "TWO"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Playable,
    Done,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Playable => write!(f, "PLAYABLE"),
            Status::Done => write!(f, "DONE"),
        }
    }
}

/// Pit counts around the board. The last pit of each half is that player's
/// base (store); player ONE owns the first half, player TWO the second.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    pits: Vec<u32>,
}

// Where the last stone of a sowing ended up, and how many stones that pit held
// right before it was dropped.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Landing {
    pit: usize,
    previous: u32,
}

impl Board {
    pub fn pits(&self) -> &[u32] {
        &self.pits
    }

    pub fn len(&self) -> usize {
        self.pits.len()
    }

    pub fn player_one_base(&self) -> usize {
        self.pits.len() / 2 - 1
    }

    pub fn player_two_base(&self) -> usize {
        self.pits.len() - 1
    }

    pub fn base(&self, player: Player) -> usize {
        match player {
            Player::One => self.player_one_base(),
            Player::Two => self.player_two_base(),
        }
    }

    /// Owner of a small pit. Bases and out of range indices have no owner.
    pub fn side_of(&self, pit: usize) -> Option<Player> {
        let base = self.player_one_base();
        if pit < base {
            Some(Player::One)
        } else if pit > base && pit < self.player_two_base() {
            Some(Player::Two)
        } else {
            None
        }
    }

    /// The pit facing `pit` across the board.
    pub fn opposite(&self, pit: usize) -> Option<usize> {
        let base = self.player_one_base();
        match self.side_of(pit)? {
            Player::One => Some(pit + base + 1),
            Player::Two => Some(pit - base - 1),
        }
    }

    pub fn small_pits(&self, player: Player) -> &[u32] {
        match player {
            Player::One => &self.pits[..self.player_one_base()],
            Player::Two => &self.pits[self.player_one_base() + 1..self.player_two_base()],
        }
    }

    pub fn side_stones(&self, player: Player) -> u32 {
        self.small_pits(player).iter().sum()
    }

    pub fn score(&self, player: Player) -> u32 {
        self.pits[self.base(player)]
    }

    pub fn total_stones(&self) -> u32 {
        self.pits.iter().sum()
    }

    // Empty `from` and drop its stones one by one going around the board,
    // never into the opponent's base.
    fn sow(&mut self, from: usize, player: Player) -> Landing {
        let skipped = self.base(player.other());
        let mut stones = self.pits[from];
        self.pits[from] = 0;

        let mut landing = Landing { pit: from, previous: 0 };
        while stones > 0 {
            landing.pit += 1;
            if landing.pit == skipped {
                landing.pit += 1;
            }
            if landing.pit >= self.pits.len() {
                landing.pit = 0;
            }
            landing.previous = self.pits[landing.pit];
            self.pits[landing.pit] += 1;
            stones -= 1;
        }

        landing
    }

    // A last stone landing in an own empty small pit takes the facing pit with
    // it into the player's base. Returns the number of stones captured.
    fn capture(&mut self, landing: Landing, player: Player) -> u32 {
        if landing.previous != 0 || self.side_of(landing.pit) != Some(player) {
            return 0;
        }
        let Some(opposite) = self.opposite(landing.pit) else {
            return 0;
        };

        let captured = self.pits[landing.pit] + self.pits[opposite];
        self.pits[landing.pit] = 0;
        self.pits[opposite] = 0;
        let base = self.base(player);
        self.pits[base] += captured;

        captured
    }
}

/// An initial (or restored) pit layout waiting to be checked.
#[derive(Clone, Debug)]
pub struct Layout {
    pits: Vec<i64>,
    max_stones: u32,
    in_progress: bool,
}

impl Layout {
    pub fn new<T: Copy + Into<i64>>(pits: &[T], max_stones: u32) -> Self {
        Self {
            pits: pits.iter().map(|&p| p.into()).collect(),
            max_stones,
            in_progress: false,
        }
    }

    // Games in progress have empty small pits all over the place and stores
    // well past the initial maximum, only the shape and the sign still apply.
    pub fn in_progress(mut self) -> Self {
        self.in_progress = true;
        self
    }

    fn max_total(&self) -> u32 {
        let len = u32::try_from(self.pits.len()).unwrap_or(u32::MAX);
        self.max_stones.saturating_mul(len)
    }

    pub fn into_board(self) -> Result<Board, InitializationError> {
        self.validate()?;
        Ok(Board {
            pits: self.pits.into_iter().map(|p| p as u32).collect(),
        })
    }
}

impl Validate for Layout {
    type Error = InitializationError;

    fn validate(&self) -> Result<(), InitializationError> {
        let len = self.pits.len();
        if len % 2 != 0 {
            return Err(InitializationError::OddPitCount);
        }
        if len < MIN_PITS {
            return Err(InitializationError::TooFewPits);
        }

        let player_one_base = len / 2 - 1;
        let player_two_base = len - 1;
        let mut empty_pits = 0;
        let mut total: i64 = 0;

        for (pit, &stones) in self.pits.iter().enumerate() {
            if stones < 0 {
                return Err(InitializationError::NegativeStones { pit });
            }
            if self.in_progress {
                total = total.saturating_add(stones);
                continue;
            }
            if stones > i64::from(self.max_stones) {
                return Err(InitializationError::TooManyStones { pit, max: self.max_stones });
            }
            if stones == 0 {
                empty_pits += 1;
                if empty_pits > 2 || (pit != player_one_base && pit != player_two_base) {
                    return Err(InitializationError::MisplacedEmptyPits);
                }
            }
        }

        // Sowing never adds stones, so a board that started within the per-pit
        // maximum can never hold more than this.
        let max_total = self.max_total();
        if self.in_progress && total > i64::from(max_total) {
            return Err(InitializationError::TooManyStonesOnBoard { max: max_total });
        }

        Ok(())
    }
}

/// Plain copy of a game, as handed to persistence and rendering.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub id: Uuid,
    pub board: Board,
    pub player: Player,
    pub status: Status,
}

/// What a single accepted move did.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Ply {
    pub player: Player,
    pub pit: usize,
    pub landed: usize,
    pub captured: u32,
    pub extra_turn: bool,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Game {
    id: Uuid,
    board: Board,
    player: Player,
    status: Status,
}

impl Game {
    pub fn new(board: Board) -> Self {
        Self {
            id: Uuid::new_v4(),
            board,
            player: Player::One,
            status: Status::Playable,
        }
    }

    // The board must have gone through `Layout` already.
    pub(crate) fn from_parts(id: Uuid, board: Board, player: Player, status: Status) -> Self {
        Self { id, board, player, status }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn player(&self) -> Player {
        self.player
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn record(&self) -> GameRecord {
        GameRecord {
            id: self.id,
            board: self.board.clone(),
            player: self.player,
            status: self.status,
        }
    }

    /// Player with the bigger store, None on a tie.
    pub fn leader(&self) -> Option<Player> {
        let one = self.board.score(Player::One);
        let two = self.board.score(Player::Two);
        match one.cmp(&two) {
            std::cmp::Ordering::Greater => Some(Player::One),
            std::cmp::Ordering::Less => Some(Player::Two),
            std::cmp::Ordering::Equal => None,
        }
    }

    fn validate_move(&self, pit: usize) -> Result<(), MoveError> {
        if self.status == Status::Done {
            return Err(MoveError::GameOver { winner: self.player });
        }
        if pit == self.board.base(self.player) {
            return Err(MoveError::BasePit);
        }
        if self.board.side_of(pit) != Some(self.player) {
            return Err(MoveError::NotYourPit);
        }
        if self.board.pits[pit] == 0 {
            return Err(MoveError::EmptyPit);
        }

        Ok(())
    }

    /// Sow the stones of `pit` for the active player, resolve a capture and
    /// hand the turn over. Nothing is touched when the move is illegal.
    pub fn move_stones_from(&mut self, pit: usize) -> Result<Ply, MoveError> {
        self.validate_move(pit)?;

        let player = self.player;
        log::debug!("Player {} sows {} stones from pit {}", player, self.board.pits[pit], pit);

        let landing = self.board.sow(pit, player);
        let captured = self.board.capture(landing, player);
        if captured > 0 {
            log::info!("Player {} captured {} stones landing on pit {}", player, captured, landing.pit);
        }

        let landed_on_base = landing.pit == self.board.base(player);
        let extra_turn = if self.board.side_stones(Player::One) == 0 || self.board.side_stones(Player::Two) == 0 {
            self.status = Status::Done;
            log::info!("Game {} is over, final board {:?}", self.id, self.board.pits);
            false
        } else if landed_on_base {
            log::info!("Player {} landed on own base and moves again", player);
            true
        } else {
            self.player = player.other();
            false
        };

        Ok(Ply {
            player,
            pit,
            landed: landing.pit,
            captured,
            extra_turn,
        })
    }
}

impl GameState for Game {
    type Action = usize;
    type Error = MoveError;

    fn current_player(&self) -> usize {
        self.player.index()
    }

    fn legal_actions(&self) -> Vec<usize> {
        if self.status == Status::Done {
            return Vec::new();
        }
        (0..self.board.len())
            .filter(|&pit| self.board.side_of(pit) == Some(self.player) && self.board.pits[pit] > 0)
            .collect()
    }

    fn apply(&mut self, pit: usize) -> Result<(), MoveError> {
        self.move_stones_from(pit).map(|_| ())
    }

    fn is_game_over(&self) -> bool {
        self.status == Status::Done
    }
}

// Look one move ahead and take the pit that grows the player's store the most.
// Ties go to a move that keeps the turn, then to the lowest pit.
pub fn play_greedy(game: &Game) -> Option<usize> {
    let player = game.player();
    let score = game.board().score(player);

    game.legal_actions()
        .into_iter()
        .filter_map(|pit| {
            let mut future = game.clone();
            let ply = future.move_stones_from(pit).ok()?;
            Some(((future.board().score(player) - score, ply.extra_turn, Reverse(pit)), pit))
        })
        .max_by_key(|(key, _)| *key)
        .map(|(_, pit)| pit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(pits: &[i32]) -> Game {
        Game::new(Layout::new(pits, DEFAULT_MAX_STONES).into_board().unwrap())
    }

    fn play(game: &mut Game, pits: &[usize]) {
        for &pit in pits {
            game.move_stones_from(pit).unwrap();
        }
    }

    #[test]
    fn test_board_geometry() {
        let g = game(&[6, 6, 6, 6, 6, 6, 0, 6, 6, 6, 6, 6, 6, 0]);
        let board = g.board();
        assert_eq!(board.player_one_base(), 6);
        assert_eq!(board.player_two_base(), 13);
        assert_eq!(board.side_of(0), Some(Player::One));
        assert_eq!(board.side_of(6), None);
        assert_eq!(board.side_of(7), Some(Player::Two));
        assert_eq!(board.side_of(13), None);
        assert_eq!(board.side_of(14), None);
        assert_eq!(board.small_pits(Player::Two).len(), 6);
    }

    #[test]
    fn test_opposite_is_symmetric() {
        let g = game(&[1, 1, 1, 0, 1, 1, 1, 0]);
        let board = g.board();
        for pit in [0, 1, 2, 4, 5, 6] {
            let opposite = board.opposite(pit).unwrap();
            assert_ne!(board.side_of(pit), board.side_of(opposite));
            assert_eq!(board.opposite(opposite), Some(pit));
        }
        assert_eq!(board.opposite(0), Some(4));
        assert_eq!(board.opposite(3), None);
        assert_eq!(board.opposite(7), None);
    }

    #[test]
    fn test_layout_rules() {
        fn check(pits: &[i32]) -> Result<(), InitializationError> {
            Layout::new(pits, DEFAULT_MAX_STONES).validate()
        }
        assert_eq!(check(&[0, 0, 0]), Err(InitializationError::OddPitCount));
        assert_eq!(check(&[1, 0, 1, 0]), Err(InitializationError::TooFewPits));
        assert_eq!(check(&[1, 1, 0, 1, 0, 0]), Err(InitializationError::MisplacedEmptyPits));
        assert_eq!(check(&[1, 1, 0, 0, 1, 1]), Err(InitializationError::MisplacedEmptyPits));
        assert_eq!(check(&[1, 20, 0, 1, 1, 0]), Err(InitializationError::TooManyStones { pit: 1, max: 10 }));
        assert_eq!(check(&[-1, 20, 0, 1, 1, 0]), Err(InitializationError::NegativeStones { pit: 0 }));
        assert_eq!(check(&[1, 1, 0, 1, 1, 0]), Ok(()));
        assert_eq!(check(&[1, 1, 3, 1, 1, 4]), Ok(()));
        assert_eq!(check(&[10, 10, 0, 10, 10, 0]), Ok(()));
    }

    #[test]
    fn test_in_progress_layout_allows_empty_pits() {
        let layout = Layout::new(&[0u32, 0, 15, 1, 0, 3], DEFAULT_MAX_STONES);
        assert!(layout.clone().validate().is_err());
        assert!(layout.in_progress().into_board().is_ok());
    }

    #[test]
    fn test_in_progress_layout_is_bounded_by_total() {
        fn check(pits: &[u32]) -> Result<(), InitializationError> {
            Layout::new(pits, DEFAULT_MAX_STONES).in_progress().validate()
        }
        assert_eq!(check(&[0, 0, 60, 0, 0, 0]), Ok(()));
        assert_eq!(
            check(&[0, 0, 61, 0, 0, 0]),
            Err(InitializationError::TooManyStonesOnBoard { max: 60 })
        );
        assert_eq!(
            check(&[1, 1, u32::MAX, 1, 1, 0]),
            Err(InitializationError::TooManyStonesOnBoard { max: 60 })
        );
        assert_eq!(
            Layout::new(&[-1i64, 0, i64::MAX, 0, 0, 0], u32::MAX).in_progress().validate(),
            Err(InitializationError::NegativeStones { pit: 0 })
        );
    }

    #[test]
    fn test_player_one_moves_first() {
        let mut g = game(&[2, 2, 0, 2, 2, 0]);
        assert_eq!(g.player(), Player::One);
        let ply = g.move_stones_from(1).unwrap();
        assert_eq!(g.board().pits(), &[2, 0, 1, 3, 2, 0]);
        assert_eq!(ply.player, Player::One);
        assert_eq!(ply.landed, 3);
        assert_eq!(g.player(), Player::Two);
    }

    #[test]
    fn test_move_validation() {
        let mut g = game(&[2, 2, 0, 2, 2, 0]);
        assert_eq!(g.move_stones_from(4), Err(MoveError::NotYourPit));
        assert_eq!(g.move_stones_from(3), Err(MoveError::NotYourPit));
        assert_eq!(g.move_stones_from(5), Err(MoveError::NotYourPit));
        assert_eq!(g.move_stones_from(2), Err(MoveError::BasePit));
        assert_eq!(g.move_stones_from(6), Err(MoveError::NotYourPit));

        play(&mut g, &[1]);
        assert_eq!(g.player(), Player::Two);
        assert_eq!(g.move_stones_from(1), Err(MoveError::NotYourPit));
        assert_eq!(g.move_stones_from(2), Err(MoveError::NotYourPit));
        assert_eq!(g.move_stones_from(5), Err(MoveError::BasePit));
        assert_eq!(g.move_stones_from(9), Err(MoveError::NotYourPit));
    }

    #[test]
    fn test_empty_pit_is_rejected() {
        let mut g = game(&[1, 1, 0, 1, 1, 0]);
        play(&mut g, &[1]);
        // Player ONE landed in the base and plays again
        assert_eq!(g.player(), Player::One);
        assert_eq!(g.move_stones_from(1), Err(MoveError::EmptyPit));

        let mut g = game(&[1, 1, 0, 1, 1, 0]);
        play(&mut g, &[0, 4]);
        assert_eq!(g.player(), Player::Two);
        assert_eq!(g.move_stones_from(4), Err(MoveError::EmptyPit));
    }

    #[test]
    fn test_sowing_wraps_around() {
        let mut g = game(&[2, 2, 0, 2, 2, 0]);
        play(&mut g, &[1, 4]);
        assert_eq!(g.board().pits(), &[3, 0, 1, 3, 0, 1]);
    }

    #[test]
    fn test_landing_on_base_repeats_turn() {
        let mut g = game(&[2, 2, 0, 2, 2, 0]);
        let ply = g.move_stones_from(0).unwrap();
        assert_eq!(g.board().pits(), &[0, 3, 1, 2, 2, 0]);
        assert_eq!(ply.landed, 2);
        assert!(ply.extra_turn);
        assert_eq!(g.player(), Player::One);

        let mut g = game(&[2, 2, 0, 2, 2, 0]);
        let ply = g.move_stones_from(1).unwrap();
        assert!(!ply.extra_turn);
        assert_eq!(g.player(), Player::Two);

        let mut g = game(&[2, 1, 0, 2, 2, 0]);
        let ply = g.move_stones_from(1).unwrap();
        assert!(ply.extra_turn);
        assert_eq!(g.player(), Player::One);
        assert_eq!(g.move_stones_from(4), Err(MoveError::NotYourPit));

        let mut g = game(&[2, 2, 0, 1, 2, 0]);
        play(&mut g, &[1, 3]);
        assert_eq!(g.board().pits(), &[2, 0, 1, 0, 3, 1]);
        assert_eq!(g.player(), Player::Two);
        assert_eq!(g.move_stones_from(0), Err(MoveError::NotYourPit));
    }

    #[test]
    fn test_capture_for_player_one() {
        let mut g = game(&[2, 5, 0, 2, 2, 0]);
        let ply = g.move_stones_from(1).unwrap();
        assert_eq!(g.board().pits(), &[3, 0, 5, 3, 0, 0]);
        assert_eq!(ply.landed, 1);
        assert_eq!(ply.captured, 4);
        assert_eq!(g.player(), Player::Two);
    }

    #[test]
    fn test_capture_for_player_two() {
        let mut g = game(&[2, 2, 0, 2, 5, 0]);
        play(&mut g, &[1, 4]);
        assert_eq!(g.board().pits(), &[3, 0, 1, 4, 0, 3]);
    }

    #[test]
    fn test_landing_on_opponent_empty_pit_does_not_capture() {
        let mut g = game(&[3, 3, 0, 3, 3, 0]);
        play(&mut g, &[1]);
        let ply = g.move_stones_from(3).unwrap();
        assert_eq!(g.board().pits(), &[4, 1, 1, 0, 5, 1]);
        assert_eq!(ply.captured, 0);
    }

    #[test]
    fn test_sowing_skips_opponent_base() {
        let mut g = game(&[2, 4, 0, 2, 2, 0]);
        play(&mut g, &[1]);
        assert_eq!(g.board().pits(), &[3, 0, 1, 3, 3, 0]);

        let mut g = game(&[2, 2, 0, 2, 4, 0]);
        play(&mut g, &[1, 4]);
        assert_eq!(g.board().pits(), &[3, 1, 1, 4, 0, 1]);
    }

    #[test]
    fn test_player_one_wins() {
        let mut g = game(&[2, 1, 0, 1, 1, 0]);
        play(&mut g, &[1, 0, 1]);
        assert_eq!(g.board().pits(), &[0, 0, 3, 1, 1, 0]);
        assert_eq!(g.status(), Status::Done);
        assert_eq!(g.player(), Player::One);
        assert_eq!(g.move_stones_from(0), Err(MoveError::GameOver { winner: Player::One }));
        assert_eq!(g.leader(), Some(Player::One));
    }

    #[test]
    fn test_player_two_wins() {
        let mut g = game(&[1, 2, 0, 1, 1, 0]);
        play(&mut g, &[1, 4, 3, 4]);
        assert_eq!(g.board().pits(), &[1, 0, 1, 0, 0, 3]);
        assert_eq!(g.status(), Status::Done);
        assert_eq!(g.move_stones_from(0), Err(MoveError::GameOver { winner: Player::Two }));
        assert!(g.legal_actions().is_empty());
    }

    #[test]
    fn test_legal_actions_follow_turn() {
        let mut g = game(&[2, 2, 0, 1, 2, 0]);
        assert_eq!(g.legal_actions(), vec![0, 1]);
        g.apply(1).unwrap();
        assert_eq!(g.current_player(), 1);
        assert_eq!(g.legal_actions(), vec![3, 4]);
    }

    #[test]
    fn test_greedy_prefers_capture() {
        let g = game(&[2, 5, 0, 2, 2, 0]);
        assert_eq!(play_greedy(&g), Some(1));
    }

    #[test]
    fn test_greedy_prefers_extra_turn_on_tie() {
        // Both pits drop one stone in the base, only pit 1 lands there
        let g = game(&[3, 1, 0, 1, 1, 0]);
        assert_eq!(play_greedy(&g), Some(1));
    }

    #[test]
    fn test_record_keeps_identity() {
        let mut g = game(&[2, 2, 0, 2, 2, 0]);
        let id = g.id();
        play(&mut g, &[0]);
        let record = g.record();
        assert_eq!(record.id, id);
        assert_eq!(record.board.pits(), &[0, 3, 1, 2, 2, 0]);
        assert_eq!(record.player, Player::One);
        assert_eq!(record.status, Status::Playable);
    }

    #[test]
    fn test_record_serializes_with_upper_case_tags() {
        let g = game(&[1, 1, 0, 1, 1, 0]);
        let json = serde_json::to_value(g.record()).unwrap();
        assert_eq!(json["board"], serde_json::json!([1, 1, 0, 1, 1, 0]));
        assert_eq!(json["player"], "ONE");
        assert_eq!(json["status"], "PLAYABLE");
    }
}
