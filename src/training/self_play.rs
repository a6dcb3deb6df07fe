//! Self-play generation and the supervised training loop.
//!
//! Each game records `(features, visit distribution, player to move)` at
//! every position, plays the MCTS-recommended move and, once the game ends,
//! stamps each record with the outcome from the recorded player's
//! perspective. Training shuffles the accumulated examples and runs
//! minibatch epochs of `train_step`; checkpoints land on stable paths so an
//! interrupted run resumes exactly where it stopped, up to the RNG stream.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::game::{encode, GameConfig, GameState};
use crate::mcts::{Mcts, MctsConfig};
use crate::neural::Evaluator;
use crate::training::example::TrainingExample;
use crate::Result;

/// Self-play loop parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelfPlayConfig {
    /// Outer iterations (generate, then train, then checkpoint).
    /// Default: 10
    pub iterations: usize,

    /// Games generated per iteration.
    /// Default: 20
    pub games_per_iteration: usize,

    /// Search settings during generation; root noise belongs on.
    pub mcts: MctsConfig,

    /// Deal parameters of the generated games.
    #[serde(default)]
    pub game: GameConfig,

    /// Passes over the shuffled example set per iteration.
    /// Default: 5
    pub epochs: usize,

    /// Minibatch size.
    /// Default: 32
    pub batch_size: usize,

    /// Learning rate handed to `train_step`.
    /// Default: 1e-3
    pub learning_rate: f64,

    /// Checkpoint directory.
    /// Default: "checkpoints"
    pub output_dir: String,

    /// Checkpoint file prefix.
    /// Default: "selfplay"
    pub prefix: String,

    /// Seed for dealing, search noise and shuffling.
    /// Default: 2025
    pub seed: u64,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self {
            iterations: 10,
            games_per_iteration: 20,
            mcts: MctsConfig::self_play(200),
            game: GameConfig::default(),
            epochs: 5,
            batch_size: 32,
            learning_rate: 1e-3,
            output_dir: "checkpoints".to_string(),
            prefix: "selfplay".to_string(),
            seed: 2025,
        }
    }
}

/// Plays one self-play game and returns its stamped examples.
pub fn play_self_play_game<R: Rng>(
    evaluator: &Evaluator,
    mcts: &Mcts,
    game: &GameConfig,
    rng: &mut R,
) -> Result<Vec<TrainingExample>> {
    let mut state = GameState::new_game(game, rng);
    let mut records = Vec::new();

    while !state.is_terminal() {
        let result = mcts.search(&state, evaluator, rng)?;
        records.push((encode(&state), result.visit_distribution, state.current));
        state.apply_move(&result.best_move)?;
    }

    let examples = records
        .into_iter()
        .map(|(features, policy_target, player)| TrainingExample {
            features,
            policy_target,
            value_target: state.outcome_for(player) as f32,
        })
        .collect();
    Ok(examples)
}

/// Shuffles `examples` and runs `epochs` passes of minibatch updates.
/// Returns the mean losses of the final epoch.
pub fn train<R: Rng>(
    evaluator: &mut Evaluator,
    examples: &[TrainingExample],
    epochs: usize,
    batch_size: usize,
    learning_rate: f64,
    rng: &mut R,
) -> Result<(f64, f64)> {
    if examples.is_empty() || epochs == 0 {
        return Ok((0.0, 0.0));
    }
    let batch_size = batch_size.max(1);
    let mut shuffled: Vec<TrainingExample> = examples.to_vec();

    let mut policy_loss = 0.0;
    let mut value_loss = 0.0;
    for epoch in 0..epochs {
        shuffled.shuffle(rng);
        let mut epoch_policy = 0.0;
        let mut epoch_value = 0.0;
        let mut batches = 0;
        for batch in shuffled.chunks(batch_size) {
            let (p, v) = evaluator.train_step(batch, learning_rate)?;
            epoch_policy += p;
            epoch_value += v;
            batches += 1;
        }
        policy_loss = epoch_policy / batches as f64;
        value_loss = epoch_value / batches as f64;
        log::debug!(
            "epoch {}/{}: policy_loss={:.4}, value_loss={:.4}",
            epoch + 1,
            epochs,
            policy_loss,
            value_loss
        );
    }
    Ok((policy_loss, value_loss))
}

/// Summary of one training iteration.
#[derive(Debug, Clone)]
pub struct IterationStats {
    pub iteration: usize,
    pub examples: usize,
    pub policy_loss: f64,
    pub value_loss: f64,
}

/// The iterate-generate-train-checkpoint driver.
pub struct SelfPlayTrainer {
    config: SelfPlayConfig,
    evaluator: Evaluator,
    mcts: Mcts,
    rng: StdRng,
    iteration: usize,
}

impl SelfPlayTrainer {
    pub fn new(config: SelfPlayConfig, evaluator: Evaluator) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        let mcts = Mcts::new(config.mcts);
        Self {
            config,
            evaluator,
            mcts,
            rng,
            iteration: 0,
        }
    }

    /// Stable checkpoint paths for this run.
    pub fn checkpoint_paths(config: &SelfPlayConfig) -> (PathBuf, PathBuf) {
        let dir = Path::new(&config.output_dir);
        (
            dir.join(format!("{}_policy.safetensors", config.prefix)),
            dir.join(format!("{}_value.safetensors", config.prefix)),
        )
    }

    /// Starts from the checkpoint on disk when one exists, otherwise from
    /// the supplied fresh evaluator.
    pub fn resume_or_start(config: SelfPlayConfig, fresh: Evaluator) -> Result<Self> {
        let (policy_path, value_path) = Self::checkpoint_paths(&config);
        let evaluator = if policy_path.exists() && value_path.exists() {
            log::info!("📂 resuming from checkpoint {}", policy_path.display());
            Evaluator::load(&policy_path, &value_path)?
        } else {
            fresh
        };
        Ok(Self::new(config, evaluator))
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn config(&self) -> &SelfPlayConfig {
        &self.config
    }

    /// One iteration: generate games, train on their examples, checkpoint.
    pub fn run_iteration(&mut self) -> Result<IterationStats> {
        let mut examples = Vec::new();
        for game_index in 0..self.config.games_per_iteration {
            let game_examples = play_self_play_game(
                &self.evaluator,
                &self.mcts,
                &self.config.game,
                &mut self.rng,
            )?;
            examples.extend(game_examples);
            if (game_index + 1) % 10 == 0 {
                log::info!(
                    "🎮 generated {}/{} games",
                    game_index + 1,
                    self.config.games_per_iteration
                );
            }
        }

        let (policy_loss, value_loss) = train(
            &mut self.evaluator,
            &examples,
            self.config.epochs,
            self.config.batch_size,
            self.config.learning_rate,
            &mut self.rng,
        )?;

        if let Err(e) = self.checkpoint() {
            // A failed save is reported but never kills the run; the next
            // iteration retries on the same paths.
            log::error!("checkpoint failed: {}", e);
        }

        let stats = IterationStats {
            iteration: self.iteration,
            examples: examples.len(),
            policy_loss,
            value_loss,
        };
        self.iteration += 1;
        Ok(stats)
    }

    /// Runs the configured number of iterations.
    pub fn run(&mut self) -> Result<Vec<IterationStats>> {
        let mut history = Vec::with_capacity(self.config.iterations);
        for _ in 0..self.config.iterations {
            let stats = self.run_iteration()?;
            log::info!(
                "📊 iteration {}: {} examples, policy_loss={:.4}, value_loss={:.4}",
                stats.iteration + 1,
                stats.examples,
                stats.policy_loss,
                stats.value_loss
            );
            history.push(stats);
        }
        Ok(history)
    }

    fn checkpoint(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config.output_dir)?;
        let (policy_path, value_path) = Self::checkpoint_paths(&self.config);
        self.evaluator.save(&policy_path, &value_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::BOARD_SIZE;
    use crate::neural::EvaluatorConfig;

    fn small_evaluator() -> Evaluator {
        Evaluator::new(&EvaluatorConfig {
            hidden_size: 32,
            ..Default::default()
        })
        .unwrap()
    }

    fn tiny_mcts() -> Mcts {
        Mcts::new(MctsConfig {
            num_simulations: 8,
            dirichlet_weight: 0.25,
            ..Default::default()
        })
    }

    #[test]
    fn test_self_play_examples_are_consistent() {
        let evaluator = small_evaluator();
        let mcts = tiny_mcts();
        let mut rng = StdRng::seed_from_u64(1);

        let examples =
            play_self_play_game(&evaluator, &mcts, &GameConfig::default(), &mut rng).unwrap();
        assert!(!examples.is_empty());

        for example in &examples {
            assert_eq!(example.features.len(), 81);
            assert_eq!(example.policy_target.len(), BOARD_SIZE);
            let sum: f32 = example.policy_target.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "policy target sums to {}", sum);
            assert!(
                [0.0f32, 0.5, 1.0].contains(&example.value_target),
                "value target {} not a game outcome",
                example.value_target
            );
        }
    }

    #[test]
    fn test_value_targets_alternate_perspective() {
        let evaluator = small_evaluator();
        let mcts = tiny_mcts();
        let mut rng = StdRng::seed_from_u64(2);

        let examples =
            play_self_play_game(&evaluator, &mcts, &GameConfig::default(), &mut rng).unwrap();
        for pair in examples.windows(2) {
            let (a, b) = (pair[0].value_target, pair[1].value_target);
            assert!(
                (a + b - 1.0).abs() < 1e-6 || (a == 0.5 && b == 0.5),
                "consecutive targets {} and {} disagree on the outcome",
                a,
                b
            );
        }
    }

    #[test]
    fn test_train_runs_over_minibatches() {
        let mut evaluator = small_evaluator();
        let mcts = tiny_mcts();
        let mut rng = StdRng::seed_from_u64(3);

        let examples =
            play_self_play_game(&evaluator, &mcts, &GameConfig::default(), &mut rng).unwrap();
        let (policy_loss, value_loss) =
            train(&mut evaluator, &examples, 2, 4, 1e-3, &mut rng).unwrap();
        assert!(policy_loss.is_finite() && policy_loss > 0.0);
        assert!(value_loss.is_finite());
    }

    #[test]
    fn test_iteration_checkpoints_and_resumes() {
        let dir = tempfile::tempdir().unwrap();
        let config = SelfPlayConfig {
            iterations: 1,
            games_per_iteration: 1,
            mcts: MctsConfig {
                num_simulations: 4,
                dirichlet_weight: 0.25,
                ..Default::default()
            },
            epochs: 1,
            batch_size: 8,
            output_dir: dir.path().to_string_lossy().into_owned(),
            ..Default::default()
        };

        let mut trainer = SelfPlayTrainer::new(config.clone(), small_evaluator());
        let stats = trainer.run_iteration().unwrap();
        assert!(stats.examples > 0);

        let (policy_path, value_path) = SelfPlayTrainer::checkpoint_paths(&config);
        assert!(policy_path.exists());
        assert!(value_path.exists());

        // Resuming picks the checkpoint up; predictions match the trained
        // evaluator exactly.
        let resumed = SelfPlayTrainer::resume_or_start(config, small_evaluator()).unwrap();
        let mut rng = StdRng::seed_from_u64(4);
        let state = GameState::new_game(&GameConfig::default(), &mut rng);
        assert_eq!(
            trainer.evaluator().predict(&state),
            resumed.evaluator().predict(&state)
        );
    }
}
