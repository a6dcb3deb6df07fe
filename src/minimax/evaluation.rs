//! Static position evaluation for the alpha-beta oracle.
//!
//! Scores are from Player One's perspective: positive favours Player One.
//! Terminal states saturate at +/-1000 so that search can recognise decided
//! positions through the `TERMINAL_THRESHOLD`.

use crate::game::{GameState, Player, BOARD_DIM, BOARD_SIZE};

/// Absolute score of a won terminal position.
pub const WIN_SCORE: f64 = 1000.0;

/// Scores beyond this magnitude are treated as decided by the iterative
/// deepening driver.
pub const TERMINAL_THRESHOLD: f64 = 900.0;

/// Positional weight per cell: centre 1.0, corners 0.7, edges 0.5.
const POSITION_VALUE: [f64; BOARD_SIZE] = [0.7, 0.5, 0.7, 0.5, 1.0, 0.5, 0.7, 0.5, 0.7];

/// Directional offsets scanned once per cell pair: right, down,
/// diag-down-right, diag-down-left. Scanning only forward offsets visits
/// every pair a single time.
const RELATION_OFFSETS: [(i32, i32); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

const MATERIAL_WEIGHT: f64 = 10.0;
const POSITIONAL_WEIGHT: f64 = 5.0;
const RELATIONSHIP_WEIGHT: f64 = 3.0;

/// Evaluates `state` from Player One's perspective.
pub fn evaluate(state: &GameState) -> f64 {
    if state.is_terminal() {
        return match state.winner() {
            Player::One => WIN_SCORE,
            Player::Two => -WIN_SCORE,
            Player::None => 0.0,
        };
    }

    let material =
        state.board_count(Player::One) as f64 - state.board_count(Player::Two) as f64;

    let mut positional = 0.0;
    for (position, cell) in state.board.iter().enumerate() {
        match cell.owner {
            Player::One => positional += POSITION_VALUE[position],
            Player::Two => positional -= POSITION_VALUE[position],
            Player::None => {}
        }
    }

    let mut relationship = 0.0;
    for (position, cell) in state.board.iter().enumerate() {
        if cell.is_empty() {
            continue;
        }
        let row = (position / BOARD_DIM) as i32;
        let col = (position % BOARD_DIM) as i32;
        for (dr, dc) in RELATION_OFFSETS {
            let (nr, nc) = (row + dr, col + dc);
            if nr < 0 || nr >= BOARD_DIM as i32 || nc < 0 || nc >= BOARD_DIM as i32 {
                continue;
            }
            let neighbour = &state.board[(nr * BOARD_DIM as i32 + nc) as usize];
            if neighbour.owner != cell.owner.opponent() {
                continue;
            }
            let edge = if cell.card.beats(neighbour.card) {
                1.0
            } else {
                -1.0
            };
            match cell.owner {
                Player::One => relationship += edge,
                Player::Two => relationship -= edge,
                Player::None => {}
            }
        }
    }

    material * MATERIAL_WEIGHT
        + positional * POSITIONAL_WEIGHT
        + relationship * RELATIONSHIP_WEIGHT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{CardType, Cell};

    fn board_state(cells: &[(usize, CardType, Player)]) -> GameState {
        let mut state = GameState {
            board: [Cell::EMPTY; BOARD_SIZE],
            hand_one: vec![CardType::Rock],
            hand_two: vec![CardType::Rock],
            current: Player::One,
            round: 1,
            max_rounds: 10,
            history: Vec::new(),
        };
        for &(position, card, owner) in cells {
            state.board[position] = Cell { card, owner };
        }
        state
    }

    #[test]
    fn test_terminal_scores_saturate() {
        let mut state = board_state(&[(0, CardType::Rock, Player::One)]);
        state.hand_one.clear();
        state.hand_two.clear();
        assert_eq!(evaluate(&state), WIN_SCORE);

        let mut state = board_state(&[(0, CardType::Rock, Player::Two)]);
        state.hand_one.clear();
        state.hand_two.clear();
        assert_eq!(evaluate(&state), -WIN_SCORE);

        let mut state = board_state(&[
            (0, CardType::Rock, Player::One),
            (1, CardType::Rock, Player::Two),
        ]);
        state.hand_one.clear();
        state.hand_two.clear();
        assert_eq!(evaluate(&state), 0.0);
    }

    #[test]
    fn test_material_and_position_weights() {
        // A lone Player One card in the centre: 1 * 10 + 1.0 * 5 = 15.
        let state = board_state(&[(4, CardType::Rock, Player::One)]);
        assert_eq!(evaluate(&state), 15.0);

        // On a corner instead: 10 + 0.7 * 5 = 13.5.
        let state = board_state(&[(0, CardType::Rock, Player::One)]);
        assert_eq!(evaluate(&state), 13.5);

        // Mirrored ownership flips the sign.
        let state = board_state(&[(4, CardType::Rock, Player::Two)]);
        assert_eq!(evaluate(&state), -15.0);
    }

    #[test]
    fn test_relationship_rewards_winning_matchups() {
        // Rock at 0 with an opposing Scissors to its right: material cancels
        // and position gives (0.7 - 0.5) * 5. Only the forward offset from
        // cell 0 sees the pair, and Rock beats Scissors: +1 * 3.
        let state = board_state(&[
            (0, CardType::Rock, Player::One),
            (1, CardType::Scissors, Player::Two),
        ]);
        assert_eq!(evaluate(&state), 0.2 * 5.0 + 3.0);

        // With the types swapped the edge counts against Player One.
        let state = board_state(&[
            (0, CardType::Scissors, Player::One),
            (1, CardType::Rock, Player::Two),
        ]);
        assert_eq!(evaluate(&state), 0.2 * 5.0 - 3.0);
    }
}
