//! The built-in agent implementations.

use rand::prelude::IndexedRandom;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

use crate::agent::Agent;
use crate::game::{GameState, Move};
use crate::mcts::{Mcts, MctsConfig};
use crate::minimax::{MinimaxConfig, MinimaxEngine};
use crate::neat::Genome;
use crate::neural::Evaluator;
use crate::{Result, RpsError};

/// Uniform random baseline.
pub struct RandomAgent {
    name: String,
    rng: StdRng,
}

impl RandomAgent {
    pub fn new(seed: u64) -> Self {
        Self {
            name: "random".to_string(),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Agent for RandomAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose_move(&mut self, state: &GameState) -> Result<Move> {
        let moves = state.legal_moves();
        moves
            .choose(&mut self.rng)
            .copied()
            .ok_or(RpsError::EmptyMoveSet)
    }
}

/// Evaluator-guided MCTS player.
pub struct NeuralMctsAgent {
    name: String,
    evaluator: Evaluator,
    mcts: Mcts,
    rng: StdRng,
}

impl NeuralMctsAgent {
    pub fn new(name: impl Into<String>, evaluator: Evaluator, config: MctsConfig, seed: u64) -> Self {
        Self {
            name: name.into(),
            evaluator,
            mcts: Mcts::new(config),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }
}

impl Agent for NeuralMctsAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose_move(&mut self, state: &GameState) -> Result<Move> {
        let result = self.mcts.search(state, &self.evaluator, &mut self.rng)?;
        Ok(result.best_move)
    }
}

/// Alpha-beta oracle player.
pub struct MinimaxAgent {
    name: String,
    engine: MinimaxEngine,
    budget: Duration,
}

impl MinimaxAgent {
    pub fn new(config: MinimaxConfig) -> Self {
        let budget = Duration::from_millis(config.time_budget_ms);
        Self {
            name: "minimax".to_string(),
            engine: MinimaxEngine::new(config),
            budget,
        }
    }

    pub fn engine(&self) -> &MinimaxEngine {
        &self.engine
    }
}

impl Agent for MinimaxAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose_move(&mut self, state: &GameState) -> Result<Move> {
        let legal = state.legal_moves();
        if legal.is_empty() {
            return Err(RpsError::EmptyMoveSet);
        }
        let (mv, _) = self.engine.find_best_move_iterative(state, self.budget);
        // A fully spent budget can come back without a move; any legal move
        // is still better than forfeiting the turn.
        Ok(mv.unwrap_or(legal[0]))
    }
}

/// MCTS player whose evaluator is instantiated from a NEAT genome.
pub struct GenomeAgent {
    inner: NeuralMctsAgent,
}

impl GenomeAgent {
    pub fn from_genome(
        name: impl Into<String>,
        genome: &Genome,
        config: MctsConfig,
        seed: u64,
    ) -> Result<Self> {
        let evaluator = genome.to_evaluator()?;
        Ok(Self {
            inner: NeuralMctsAgent::new(name, evaluator, config, seed),
        })
    }
}

impl Agent for GenomeAgent {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn choose_move(&mut self, state: &GameState) -> Result<Move> {
        self.inner.choose_move(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameConfig, Player};
    use crate::neural::EvaluatorConfig;
    use assert_matches::assert_matches;

    fn fresh_state(seed: u64) -> GameState {
        let mut rng = StdRng::seed_from_u64(seed);
        GameState::new_game(&GameConfig::default(), &mut rng)
    }

    #[test]
    fn test_random_agent_moves_are_legal() {
        let mut agent = RandomAgent::new(1);
        let state = fresh_state(1);
        for _ in 0..20 {
            let mv = agent.choose_move(&state).unwrap();
            assert!(state.legal_moves().contains(&mv));
        }
    }

    #[test]
    fn test_random_agent_on_terminal_state() {
        let mut agent = RandomAgent::new(2);
        let mut state = fresh_state(2);
        state.hand_one.clear();
        assert_matches!(agent.choose_move(&state), Err(RpsError::EmptyMoveSet));
    }

    #[test]
    fn test_neural_mcts_agent_plays_a_full_game() {
        let evaluator = Evaluator::new(&EvaluatorConfig {
            hidden_size: 32,
            ..Default::default()
        })
        .unwrap();
        let mut agent = NeuralMctsAgent::new(
            "mcts-32",
            evaluator,
            MctsConfig {
                num_simulations: 8,
                ..Default::default()
            },
            3,
        );

        let mut state = fresh_state(3);
        while !state.is_terminal() {
            let mv = agent.choose_move(&state).unwrap();
            state.apply_move(&mv).unwrap();
        }
        assert!(state.hand_one.is_empty() || state.round > state.max_rounds);
    }

    #[test]
    fn test_minimax_agent_chooses_a_legal_move() {
        let mut agent = MinimaxAgent::new(MinimaxConfig {
            max_depth: 3,
            time_budget_ms: 200,
            use_cache: true,
        });
        let state = fresh_state(4);
        let mv = agent.choose_move(&state).unwrap();
        assert!(state.legal_moves().contains(&mv));
        assert_eq!(mv.player, Player::One);
    }
}
