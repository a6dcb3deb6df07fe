pub mod example;
pub mod self_play;

pub use example::TrainingExample;
pub use self_play::{
    play_self_play_game, train, IterationStats, SelfPlayConfig, SelfPlayTrainer,
};
