//! Uniform agent facade.
//!
//! Self-play, NEAT match evaluation and the arena all drive opponents
//! through [`Agent`] alone, so random baselines, neural MCTS players, the
//! minimax oracle, genome-parameterised players and external processes are
//! interchangeable.

pub mod match_runner;
pub mod players;
pub mod wire;

use crate::game::{GameState, Move};
use crate::Result;

/// A move-choosing player.
pub trait Agent {
    /// Display name used in logs and reports.
    fn name(&self) -> &str;

    /// Chooses a move for the side to move in `state`. Returns
    /// `RpsError::EmptyMoveSet` when the position is terminal.
    fn choose_move(&mut self, state: &GameState) -> Result<Move>;
}

pub use match_runner::{play_game, play_series, MatchTally};
pub use players::{GenomeAgent, MinimaxAgent, NeuralMctsAgent, RandomAgent};
pub use wire::{encode_request, parse_request, parse_response, PipeAgent};
