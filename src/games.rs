use rand::seq::IndexedRandom;

pub mod kalah;

pub trait Validate {
    type Error;

    fn validate(&self) -> Result<(), Self::Error>;
}

// A game state for sequential games where players take plys in turn. A ply
// may hand the turn back to the same player, so callers have to ask who moves
// next instead of counting.
pub trait GameState {
    type Action: Copy;
    type Error;

    fn current_player(&self) -> usize;

    fn legal_actions(&self) -> Vec<Self::Action>;

    fn apply(&mut self, action: Self::Action) -> Result<(), Self::Error>;

    // Once this is true no further action is accepted.
    fn is_game_over(&self) -> bool;
}

// Choose a random action from the list of legal actions. None when the game is
// over or the player is stuck.
pub fn play_random<S: GameState>(state: &S) -> Option<S::Action> {
    let mut rng = rand::rng();
    state.legal_actions().choose(&mut rng).copied()
}
