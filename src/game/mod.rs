pub mod card;
pub mod deck;
pub mod features;
pub mod game_move;
pub mod state;

pub use card::{CardType, Cell, Player};
pub use deck::{create_deck, deal_hands, GameConfig};
pub use features::{encode, FEATURE_LEN, FEATURES_PER_POSITION};
pub use game_move::{Move, MoveError};
pub use state::{axis_neighbours, GameState, BOARD_DIM, BOARD_SIZE};
