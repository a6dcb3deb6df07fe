//! Full game state and the rules that mutate it.
//!
//! The state is mutated only through [`GameState::apply_move`], which places a
//! hand card on an empty cell, runs single-step capture propagation at the
//! placed position and then hands the turn over. Everything else is a read.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::game::card::{CardType, Cell, Player};
use crate::game::deck::{create_deck, deal_hands, GameConfig};
use crate::game::game_move::{Move, MoveError};

/// Number of board cells.
pub const BOARD_SIZE: usize = 9;

/// Board side length.
pub const BOARD_DIM: usize = 3;

/// The full game state: board, hands, side to move and round counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Row-major board: cell `i` is at row `i / 3`, column `i % 3`.
    pub board: [Cell; BOARD_SIZE],
    pub hand_one: Vec<CardType>,
    pub hand_two: Vec<CardType>,
    /// The player to move. Stays meaningful only while the game is live.
    pub current: Player,
    /// Starts at 1, incremented after Player Two has played.
    pub round: u32,
    pub max_rounds: u32,
    /// Applied moves in order, kept for replay and debugging.
    pub history: Vec<Move>,
}

impl GameState {
    /// Deals a fresh game: generate a deck, shuffle it with `rng`, give each
    /// player `hand_size` cards. Player One moves first.
    pub fn new_game<R: Rng>(config: &GameConfig, rng: &mut R) -> GameState {
        let deck = create_deck(config.deck_size, rng);
        let (hand_one, hand_two) = deal_hands(&deck, config.hand_size);
        GameState {
            board: [Cell::EMPTY; BOARD_SIZE],
            hand_one,
            hand_two,
            current: Player::One,
            round: 1,
            max_rounds: config.max_rounds,
            history: Vec::new(),
        }
    }

    pub fn hand(&self, player: Player) -> &[CardType] {
        match player {
            Player::Two => &self.hand_two,
            _ => &self.hand_one,
        }
    }

    /// Board positions with no card on them, in ascending order.
    pub fn empty_positions(&self) -> Vec<usize> {
        self.board
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| if cell.is_empty() { Some(i) } else { None })
            .collect()
    }

    /// Enumerates every legal move for the side to move: the Cartesian
    /// product of hand indices and empty positions, hand-major. The order is
    /// deterministic for a given state.
    pub fn legal_moves(&self) -> Vec<Move> {
        let empty = self.empty_positions();
        let hand_len = self.hand(self.current).len();
        let mut moves = Vec::with_capacity(hand_len * empty.len());
        for card_index in 0..hand_len {
            for &position in &empty {
                moves.push(Move::new(card_index, position, self.current));
            }
        }
        moves
    }

    /// Validates and applies `mv`, returning without mutating on any error.
    ///
    /// Placement triggers capture propagation at the played cell, then the
    /// turn flips; the round counter advances when the turn returns to
    /// Player One.
    pub fn apply_move(&mut self, mv: &Move) -> Result<(), MoveError> {
        if mv.player != self.current {
            return Err(MoveError::WrongTurn(mv.player));
        }
        if mv.position >= BOARD_SIZE {
            return Err(MoveError::OutOfBounds(mv.position));
        }
        if !self.board[mv.position].is_empty() {
            return Err(MoveError::Occupied(mv.position));
        }
        let hand_len = self.hand(self.current).len();
        if mv.card_index >= hand_len {
            return Err(MoveError::InvalidCardIndex {
                index: mv.card_index,
                hand_len,
            });
        }

        let card = match self.current {
            Player::Two => self.hand_two.remove(mv.card_index),
            _ => self.hand_one.remove(mv.card_index),
        };
        self.board[mv.position] = Cell {
            card,
            owner: self.current,
        };
        self.propagate_captures(mv.position);
        self.history.push(*mv);

        self.current = self.current.opponent();
        if self.current == Player::One {
            self.round += 1;
        }
        Ok(())
    }

    /// Single-step capture propagation: each axis-aligned neighbour owned by
    /// the opponent whose type loses to the placed card flips owner. Captured
    /// cells keep their type and do not trigger further captures.
    fn propagate_captures(&mut self, position: usize) {
        let placed = self.board[position];
        let opponent = placed.owner.opponent();
        for neighbour in axis_neighbours(position) {
            let cell = self.board[neighbour];
            if cell.owner == opponent && placed.card.beats(cell.card) {
                self.board[neighbour].owner = placed.owner;
            }
        }
    }

    /// Number of board cells owned by `player`. Cards in hand do not count.
    pub fn board_count(&self, player: Player) -> usize {
        self.board.iter().filter(|c| c.owner == player).count()
    }

    /// The game ends when both hands are exhausted, the round cap is passed,
    /// or the side to move has no legal move left.
    pub fn is_terminal(&self) -> bool {
        if self.hand_one.is_empty() && self.hand_two.is_empty() {
            return true;
        }
        if self.round > self.max_rounds {
            return true;
        }
        self.hand(self.current).is_empty() || self.empty_positions().is_empty()
    }

    /// The player owning strictly more board cells, `Player::None` on a tie.
    pub fn winner(&self) -> Player {
        let one = self.board_count(Player::One);
        let two = self.board_count(Player::Two);
        if one > two {
            Player::One
        } else if two > one {
            Player::Two
        } else {
            Player::None
        }
    }

    /// Game outcome from `player`'s perspective: 1.0 win, 0.0 loss, 0.5 draw.
    pub fn outcome_for(&self, player: Player) -> f64 {
        let winner = self.winner();
        if winner == Player::None {
            0.5
        } else if winner == player {
            1.0
        } else {
            0.0
        }
    }
}

/// Axis-aligned board neighbours of `position`; diagonals do not participate
/// in captures.
pub fn axis_neighbours(position: usize) -> Vec<usize> {
    let row = position / BOARD_DIM;
    let col = position % BOARD_DIM;
    let mut out = Vec::with_capacity(4);
    if row > 0 {
        out.push(position - BOARD_DIM);
    }
    if row + 1 < BOARD_DIM {
        out.push(position + BOARD_DIM);
    }
    if col > 0 {
        out.push(position - 1);
    }
    if col + 1 < BOARD_DIM {
        out.push(position + 1);
    }
    out
}
