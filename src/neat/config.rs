//! NEAT-lite trainer configuration.

use serde::{Deserialize, Serialize};

use crate::game::GameConfig;

/// Tunable parameters of the evolutionary trainer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeatConfig {
    /// Genomes per generation.
    /// Default: 16
    pub pop_size: usize,

    /// Generations to run.
    /// Default: 10
    pub generations: usize,

    /// Per-weight probability of adding Gaussian noise during mutation.
    /// Default: 0.05
    pub mutation_rate: f64,

    /// Probability that a child is produced by gene-wise crossover rather
    /// than cloning the fitter parent.
    /// Default: 0.7
    pub crossover_rate: f64,

    /// Mean-absolute-weight-distance threshold for joining a species.
    /// Default: 0.5
    pub compat_threshold: f64,

    /// Games per round-robin pairing (sides alternate within a pairing).
    /// Default: 2
    pub eval_games: usize,

    /// Random round-robin opponents drawn per genome each generation.
    /// Default: 3
    pub rr_opponents: usize,

    /// Games played against each hall-of-fame member.
    /// Default: 2
    pub hof_games: usize,

    /// Hall-of-fame capacity (most recent champions).
    /// Default: 3
    pub hof_size: usize,

    /// Standard deviation of both initial weights and mutation noise.
    /// Default: 0.1
    pub weight_std: f64,

    /// Hidden width of the genome-encoded networks.
    /// Default: 64
    pub hidden_size: usize,

    /// MCTS simulations per move in evaluation matches. Kept low: the point
    /// of a match is to rank genomes, not to play perfectly.
    /// Default: 16
    pub mcts_simulations: usize,

    /// Deal parameters of the evaluation games.
    #[serde(default)]
    pub game: GameConfig,

    /// Evaluation worker threads; 0 selects `max(1, cpus - 1)`.
    /// Default: 0
    pub num_workers: usize,

    /// Root seed for dealing, match agents and mutation noise.
    /// Default: 2025
    pub seed: u64,
}

impl Default for NeatConfig {
    fn default() -> Self {
        Self {
            pop_size: 16,
            generations: 10,
            mutation_rate: 0.05,
            crossover_rate: 0.7,
            compat_threshold: 0.5,
            eval_games: 2,
            rr_opponents: 3,
            hof_games: 2,
            hof_size: 3,
            weight_std: 0.1,
            hidden_size: 64,
            mcts_simulations: 16,
            game: GameConfig::default(),
            num_workers: 0,
            seed: 2025,
        }
    }
}

impl NeatConfig {
    /// Resolved evaluation worker count.
    pub fn worker_count(&self) -> usize {
        if self.num_workers > 0 {
            return self.num_workers;
        }
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        cpus.saturating_sub(1).max(1)
    }
}
