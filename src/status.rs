use std::fmt;

use serde::Serialize;

use crate::games::kalah::{Game, Player, Status};

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SideReport {
    pub pits: Vec<u32>,
    pub store: u32,
}

/// Read-only summary of a game, rendered for people by `Display` and for
/// machines by serde.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct StatusReport {
    pub label: &'static str,
    pub player_one: SideReport,
    pub player_two: SideReport,
    pub current_player: Player,
    pub status: Status,
}

impl StatusReport {
    pub fn of(game: &Game) -> Self {
        let board = game.board();
        let side = |player: Player| SideReport {
            pits: board.small_pits(player).to_vec(),
            store: board.score(player),
        };

        Self {
            label: match game.status() {
                Status::Playable => "Current",
                Status::Done => "Final",
            },
            player_one: side(Player::One),
            player_two: side(Player::Two),
            current_player: game.player(),
            status: game.status(),
        }
    }

    pub fn score(&self, player: Player) -> u32 {
        match player {
            Player::One => self.player_one.store,
            Player::Two => self.player_two.store,
        }
    }
}

fn write_side(f: &mut fmt::Formatter<'_>, side: &SideReport) -> fmt::Result {
    for stones in &side.pits {
        write!(f, "| {} ", stones)?;
    }
    write!(f, "|| {} |", side.store)
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} Board:", self.label)?;
        write!(f, "  Player ONE: ")?;
        write_side(f, &self.player_one)?;
        write!(f, "\n  Player TWO: ")?;
        write_side(f, &self.player_two)?;
        writeln!(f)?;
        writeln!(f, "{} Score:", self.label)?;
        writeln!(f, "  Player ONE: {}", self.score(Player::One))?;
        writeln!(f, "  Player TWO: {}", self.score(Player::Two))?;
        writeln!(f, "{} Player: {}", self.label, self.current_player)?;
        writeln!(f, "Game: {}", self.status)
    }
}
