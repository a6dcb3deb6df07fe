//! # RPS Zero
//!
//! Self-play training and search engine for a small deterministic two-player
//! card-placement game: a 3x3 board on which players alternately place
//! Rock/Paper/Scissors cards drawn from private hands, capturing adjacent
//! opposing cards by the cyclic RPS relation.
//!
//! ## Features
//!
//! - **Game Kernel**: deterministic state, legal moves, capture propagation
//! - **Neural Evaluator**: policy/value heads over a shared board encoding
//! - **MCTS Engine**: PUCT search with neural priors, serial and shared-tree parallel
//! - **Self-Play Training**: example generation plus supervised head updates
//! - **NEAT-lite Evolution**: weight-vector genomes, speciation, hall of fame
//! - **Minimax Oracle**: alpha-beta with transposition cache and iterative deepening
//!
//! ## Usage
//!
//! ```no_run
//! use rps_zero::{
//!     game::{GameConfig, GameState},
//!     mcts::{Mcts, MctsConfig},
//!     neural::{Evaluator, EvaluatorConfig},
//! };
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let state = GameState::new_game(&GameConfig::default(), &mut rng);
//! let evaluator = Evaluator::new(&EvaluatorConfig::default()).unwrap();
//! let mcts = Mcts::new(MctsConfig::default());
//! let outcome = mcts.search(&state, &evaluator, &mut rng).unwrap();
//! println!("best move: {:?}", outcome.best_move);
//! ```

// ============================================================================
// PUBLIC API MODULES
// ============================================================================

/// Core game logic and rules
pub mod game;

/// Monte Carlo Tree Search engine
pub mod mcts;

/// Neural network evaluator (policy + value heads)
pub mod neural;

/// Self-play training loop
pub mod training;

/// NEAT-lite evolutionary trainer
pub mod neat;

/// Alpha-beta minimax oracle
pub mod minimax;

/// Uniform agent facade over random / neural / minimax / genome players
pub mod agent;

/// Training-data archive (CSV, minimax-compatible)
pub mod recording;

/// Logger setup shared by the binaries
pub mod logging;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

/// Game kernel exports
pub use game::*;

/// MCTS engine exports
pub use mcts::*;

/// Evaluator exports
pub use neural::*;

/// Self-play training exports
pub use training::*;

// ============================================================================
// ERROR TYPES
// ============================================================================

use crate::game::MoveError;

/// Main error type for the RPS Zero library
#[derive(Debug, thiserror::Error)]
pub enum RpsError {
    #[error("invalid move: {0}")]
    Game(#[from] MoveError),

    #[error("no legal move available")]
    EmptyMoveSet,

    #[error("weight buffer size mismatch: expected {expected}, got {got}")]
    SizeMismatch { expected: usize, got: usize },

    #[error("model serialization error: {0}")]
    Model(String),

    #[error("agent protocol error: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, RpsError>;

// ============================================================================
// LIBRARY VERSION INFO
// ============================================================================

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
