pub mod config;
pub mod node;
pub mod parallel;
pub mod search;

pub use config::MctsConfig;
pub use node::{AtomicF64, Node, Tree};
pub use search::{Mcts, MctsResult};
