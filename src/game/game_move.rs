use serde::{Deserialize, Serialize};

use crate::game::card::Player;

/// Placement of one hand card on one board position.
///
/// `card_index` indexes the mover's hand at the time the move is applied;
/// `position` is a row-major board index in `0..=8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub card_index: usize,
    pub position: usize,
    pub player: Player,
}

impl Move {
    pub fn new(card_index: usize, position: usize, player: Player) -> Self {
        Self {
            card_index,
            position,
            player,
        }
    }
}

/// Validation failures reported by `GameState::apply_move`.
///
/// The state is left untouched whenever one of these is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("position {0} is outside the board")]
    OutOfBounds(usize),

    #[error("position {0} is already occupied")]
    Occupied(usize),

    #[error("it is not {0:?}'s turn")]
    WrongTurn(Player),

    #[error("card index {index} is out of range for a hand of {hand_len}")]
    InvalidCardIndex { index: usize, hand_len: usize },
}
