//! Feature encoding consumed by the neural evaluator.
//!
//! The map is deterministic and position-local: nine floats per board cell,
//! 81 in total. Hand contents are deliberately not encoded; the search layer
//! compensates for the missing information through rollouts. The layout is a
//! persistence contract: changing it invalidates every stored weight file.

use crate::game::card::{CardType, Player};
use crate::game::state::{GameState, BOARD_SIZE};

/// Floats per board position.
pub const FEATURES_PER_POSITION: usize = 9;

/// Total feature vector length.
pub const FEATURE_LEN: usize = BOARD_SIZE * FEATURES_PER_POSITION;

/// Encodes `state` into its 81-float vector.
///
/// Per position `p`, `features[p*9 .. p*9+9]` holds:
/// - 0..2: one-hot of the card type when the cell is occupied, else zeros;
/// - 3..5: one-hot of the owner in {None, One, Two};
/// - 6..7: one-hot of the side to move, repeated at every position;
/// - 8: reserved, always zero.
pub fn encode(state: &GameState) -> Vec<f32> {
    let mut features = vec![0.0f32; FEATURE_LEN];
    for (position, cell) in state.board.iter().enumerate() {
        let base = position * FEATURES_PER_POSITION;
        if !cell.is_empty() {
            features[base + type_index(cell.card)] = 1.0;
        }
        let owner_offset = match cell.owner {
            Player::None => 0,
            Player::One => 1,
            Player::Two => 2,
        };
        features[base + 3 + owner_offset] = 1.0;
        match state.current {
            Player::One => features[base + 6] = 1.0,
            Player::Two => features[base + 7] = 1.0,
            Player::None => {}
        }
    }
    features
}

fn type_index(card: CardType) -> usize {
    match card {
        CardType::Rock => 0,
        CardType::Paper => 1,
        CardType::Scissors => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::card::Cell;
    use crate::game::deck::GameConfig;
    use crate::game::game_move::Move;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_fresh_state_encoding() {
        let mut rng = StdRng::seed_from_u64(4);
        let state = GameState::new_game(&GameConfig::default(), &mut rng);
        let features = encode(&state);
        assert_eq!(features.len(), FEATURE_LEN);

        for p in 0..BOARD_SIZE {
            let cell = &features[p * 9..(p + 1) * 9];
            assert_eq!(&cell[0..3], &[0.0, 0.0, 0.0], "empty cell has no type");
            assert_eq!(&cell[3..6], &[1.0, 0.0, 0.0], "owner one-hot is None");
            assert_eq!(&cell[6..8], &[1.0, 0.0], "Player One to move");
            assert_eq!(cell[8], 0.0, "reserved slot stays zero");
        }
    }

    #[test]
    fn test_occupied_cell_encoding() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut state = GameState::new_game(&GameConfig::default(), &mut rng);
        let card = state.hand_one[0];
        state.apply_move(&Move::new(0, 4, Player::One)).unwrap();

        let features = encode(&state);
        let cell = &features[4 * 9..5 * 9];
        let type_slot = super::type_index(card);
        for i in 0..3 {
            let expected = if i == type_slot { 1.0 } else { 0.0 };
            assert_eq!(cell[i], expected);
        }
        assert_eq!(&cell[3..6], &[0.0, 1.0, 0.0], "owned by Player One");
        assert_eq!(&cell[6..8], &[0.0, 1.0], "Player Two to move now");
    }

    #[test]
    fn test_encoding_is_deterministic_over_clone() {
        let mut rng = StdRng::seed_from_u64(77);
        let state = GameState::new_game(&GameConfig::default(), &mut rng);
        assert_eq!(encode(&state), encode(&state.clone()));
    }

    #[test]
    fn test_structurally_equal_states_encode_equally() {
        // Two states built through different routes but with the same board,
        // owner layout and side to move must agree bit for bit.
        let mut rng = StdRng::seed_from_u64(5);
        let mut a = GameState::new_game(&GameConfig::default(), &mut rng);
        let card = a.hand_one[0];
        a.apply_move(&Move::new(0, 0, Player::One)).unwrap();

        let mut b = GameState::new_game(&GameConfig::default(), &mut rng);
        b.board[0] = Cell {
            card,
            owner: Player::One,
        };
        b.current = Player::Two;
        b.hand_one.clear();
        b.hand_two = vec![CardType::Rock; 3];

        // Hands and history differ; the encoding must not see them.
        assert_eq!(encode(&a), encode(&b));
    }
}
