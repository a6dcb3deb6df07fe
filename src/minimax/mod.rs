pub mod evaluation;
pub mod search;
pub mod transposition;

pub use evaluation::{evaluate, TERMINAL_THRESHOLD, WIN_SCORE};
pub use search::{MinimaxConfig, MinimaxEngine};
pub use transposition::{fingerprint, PositionResult, TranspositionTable};
