//! PUCT Monte Carlo Tree Search guided by the neural evaluator.
//!
//! The policy head provides per-position priors, the value head the leaf
//! estimate. A search builds a fresh arena tree, runs a fixed number of
//! simulations and reports the robust move (maximum visits) together with
//! the visit distribution used as a self-play training target.

use rand::Rng;
use rand_distr::{Distribution, Gamma};
use std::sync::atomic::Ordering;

use crate::game::{GameState, Move, BOARD_SIZE};
use crate::mcts::config::MctsConfig;
use crate::mcts::node::{Node, Tree};
use crate::neural::Evaluator;
use crate::{Result, RpsError};

/// Snapshot returned by one search call.
#[derive(Debug, Clone, PartialEq)]
pub struct MctsResult {
    /// The robust move: maximum visit count, first occurrence on ties.
    pub best_move: Move,
    /// Normalised child visit counts per board position; zero on positions
    /// with no child. Uniform over legal positions when nothing was visited.
    pub visit_distribution: Vec<f32>,
    /// Mean root value, in [0, 1] from the root player's perspective.
    pub root_value: f64,
    /// Total simulations backpropagated through the root.
    pub total_visits: u64,
}

/// The search engine. Holds only configuration; every call builds its own
/// tree, so one instance may serve many positions.
pub struct Mcts {
    config: MctsConfig,
}

impl Mcts {
    pub fn new(config: MctsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    /// Runs a full search from `state`. Dispatches to the shared-tree
    /// parallel variant when the configuration asks for more than one
    /// worker.
    pub fn search<R: Rng>(
        &self,
        state: &GameState,
        evaluator: &Evaluator,
        rng: &mut R,
    ) -> Result<MctsResult> {
        if self.config.num_workers > 1 {
            return self.search_parallel(state, evaluator, rng);
        }
        let mut tree = self.setup_root(state, evaluator, rng)?;
        for _ in 0..self.config.num_simulations {
            self.simulate(&mut tree, evaluator);
        }
        Ok(summarize(&tree))
    }

    /// Builds the tree root and expands one child per legal move, mixing
    /// Dirichlet noise into the root priors when configured.
    pub(crate) fn setup_root<R: Rng>(
        &self,
        state: &GameState,
        evaluator: &Evaluator,
        rng: &mut R,
    ) -> Result<Tree> {
        let legal = state.legal_moves();
        if legal.is_empty() {
            return Err(RpsError::EmptyMoveSet);
        }

        let mut tree = Tree::new(state.clone());
        let (raw_priors, _) = evaluator.predict(state);
        let mut priors = masked_priors(&raw_priors, state);
        if self.config.dirichlet_weight > 0.0 {
            mix_dirichlet_noise(
                &mut priors,
                state,
                self.config.dirichlet_alpha,
                self.config.dirichlet_weight,
                rng,
            );
        }
        tree.nodes[Tree::ROOT].priors = priors;
        attach_children(&mut tree, Tree::ROOT, &legal);
        Ok(tree)
    }

    /// One selection / expansion / evaluation / backpropagation cycle.
    fn simulate(&self, tree: &mut Tree, evaluator: &Evaluator) {
        let mut index = Tree::ROOT;
        while tree.nodes[index].is_expanded() && !tree.nodes[index].state.is_terminal() {
            index = select_child(tree, index, self.config.c_puct);
        }

        let mut evaluated = index;
        let expandable = {
            let leaf = &tree.nodes[index];
            !leaf.state.is_terminal() && leaf.visit_count() >= 1
        };
        if expandable {
            expand(tree, index, evaluator);
            if let Some(&first) = tree.nodes[index].children.first() {
                evaluated = first;
            }
        }

        let value = leaf_value(&tree.nodes[evaluated].state, evaluator);
        backpropagate(tree, evaluated, value);
    }
}

/// PUCT child selection. `Q` is taken from the selecting player's
/// perspective (the stored value sum tracks the player to move at the child,
/// one ply later), zero for unvisited children so the exploration term
/// drives the first visits. Ties resolve to the first child in move order.
pub(crate) fn select_child(tree: &Tree, parent: usize, c_puct: f64) -> usize {
    let parent_node = &tree.nodes[parent];
    let sqrt_parent = (parent_node.visit_count() as f64).sqrt();

    let mut best = parent_node.children[0];
    let mut best_score = f64::NEG_INFINITY;
    for &child_index in &parent_node.children {
        let child = &tree.nodes[child_index];
        let action = child.action.expect("non-root node has an action");
        let prior = parent_node.priors[action.position] as f64;
        let visits = child.visit_count();
        let q = if visits == 0 { 0.0 } else { 1.0 - child.q() };
        let score = q + c_puct * prior * sqrt_parent / (1.0 + visits as f64);
        if score > best_score {
            best_score = score;
            best = child_index;
        }
    }
    best
}

/// Expands `index`: queries the evaluator for priors and attaches one child
/// per legal move.
pub(crate) fn expand(tree: &mut Tree, index: usize, evaluator: &Evaluator) {
    let state = &tree.nodes[index].state;
    let legal = state.legal_moves();
    let (raw_priors, _) = evaluator.predict(state);
    let priors = masked_priors(&raw_priors, state);

    tree.nodes[index].priors = priors;
    attach_children(tree, index, &legal);
}

/// Creates one child node per legal move, skipping (and logging) any move
/// the kernel rejects rather than aborting the search.
pub(crate) fn attach_children(tree: &mut Tree, parent: usize, legal: &[Move]) {
    for mv in legal {
        let mut child_state = tree.nodes[parent].state.clone();
        match child_state.apply_move(mv) {
            Ok(()) => {
                tree.add_child(parent, child_state, *mv);
            }
            Err(e) => log::debug!("skipping rejected move {:?}: {}", mv, e),
        }
    }
}

/// Restricts raw policy output to the legal positions and renormalises.
/// Falls back to uniform over legal positions when the legal mass vanishes.
pub(crate) fn masked_priors(raw: &[f32], state: &GameState) -> Vec<f32> {
    let empty = state.empty_positions();
    let mut priors = vec![0.0f32; BOARD_SIZE];
    let mut mass = 0.0f32;
    for &position in &empty {
        priors[position] = raw[position];
        mass += raw[position];
    }
    if mass > f32::EPSILON {
        for p in priors.iter_mut() {
            *p /= mass;
        }
    } else {
        let uniform = 1.0 / empty.len() as f32;
        for &position in &empty {
            priors[position] = uniform;
        }
    }
    priors
}

/// Mixes `(1-w)*prior + w*Dir(alpha)` over the legal positions. The
/// Dirichlet sample is drawn as normalised Gamma(alpha, 1) variates.
pub(crate) fn mix_dirichlet_noise<R: Rng>(
    priors: &mut [f32],
    state: &GameState,
    alpha: f64,
    weight: f64,
    rng: &mut R,
) {
    let empty = state.empty_positions();
    if empty.is_empty() {
        return;
    }
    let gamma = Gamma::new(alpha, 1.0).expect("valid Dirichlet concentration");
    let mut noise: Vec<f64> = empty.iter().map(|_| gamma.sample(rng)).collect();
    let sum: f64 = noise.iter().sum();
    if sum <= f64::EPSILON {
        return;
    }
    for n in noise.iter_mut() {
        *n /= sum;
    }
    for (i, &position) in empty.iter().enumerate() {
        priors[position] =
            ((1.0 - weight) * priors[position] as f64 + weight * noise[i]) as f32;
    }
}

/// Value of an evaluated leaf from the perspective of the player to move
/// there: exact outcome at terminal states, value head otherwise.
pub(crate) fn leaf_value(state: &GameState, evaluator: &Evaluator) -> f64 {
    if state.is_terminal() {
        state.outcome_for(state.current)
    } else {
        evaluator.predict(state).1
    }
}

/// Walks from the evaluated node to the root, incrementing visits and adding
/// the value, flipped at every step because the perspective alternates.
pub(crate) fn backpropagate(tree: &Tree, from: usize, value: f64) {
    let mut index = from;
    let mut value = value;
    loop {
        let node = &tree.nodes[index];
        node.visits.fetch_add(1, Ordering::Relaxed);
        node.value_sum.fetch_add(value);
        match node.parent {
            Some(parent) => {
                value = 1.0 - value;
                index = parent;
            }
            None => break,
        }
    }
}

/// Reads the finished tree into an [`MctsResult`].
pub(crate) fn summarize(tree: &Tree) -> MctsResult {
    let root = tree.root();
    let mut distribution = vec![0.0f32; BOARD_SIZE];
    let mut total: u64 = 0;
    let mut best_child = root.children[0];
    let mut best_visits = 0u64;

    for &child_index in &root.children {
        let child = &tree.nodes[child_index];
        let action = child.action.expect("non-root node has an action");
        let visits = child.visit_count();
        distribution[action.position] += visits as f32;
        total += visits;
        if visits > best_visits {
            best_visits = visits;
            best_child = child_index;
        }
    }

    if total > 0 {
        for d in distribution.iter_mut() {
            *d /= total as f32;
        }
    } else {
        // No simulations ran; fall back to uniform over the legal positions.
        let empty = root.state.empty_positions();
        let uniform = 1.0 / empty.len() as f32;
        for &position in &empty {
            distribution[position] = uniform;
        }
    }

    let root_visits = root.visit_count();
    let root_value = if root_visits == 0 {
        0.5
    } else {
        root.value_sum.load() / root_visits as f64
    };

    MctsResult {
        best_move: tree.nodes[best_child]
            .action
            .expect("non-root node has an action"),
        visit_distribution: distribution,
        root_value,
        total_visits: total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{CardType, Cell, GameConfig, Player};
    use crate::neural::EvaluatorConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn small_evaluator() -> Evaluator {
        Evaluator::new(&EvaluatorConfig {
            hidden_size: 32,
            ..Default::default()
        })
        .unwrap()
    }

    fn fresh_state(seed: u64) -> GameState {
        let mut rng = StdRng::seed_from_u64(seed);
        GameState::new_game(&GameConfig::default(), &mut rng)
    }

    #[test]
    fn test_visit_counts_match_simulation_budget() {
        let evaluator = small_evaluator();
        let state = fresh_state(1);
        let mut rng = StdRng::seed_from_u64(9);

        for budget in [1usize, 10, 50] {
            let mcts = Mcts::new(MctsConfig {
                num_simulations: budget,
                ..Default::default()
            });
            let result = mcts.search(&state, &evaluator, &mut rng).unwrap();
            assert_eq!(result.total_visits, budget as u64);
        }
    }

    #[test]
    fn test_visit_distribution_is_normalised() {
        let evaluator = small_evaluator();
        let state = fresh_state(2);
        let mut rng = StdRng::seed_from_u64(10);
        let mcts = Mcts::new(MctsConfig {
            num_simulations: 40,
            ..Default::default()
        });

        let result = mcts.search(&state, &evaluator, &mut rng).unwrap();
        let sum: f32 = result.visit_distribution.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5, "distribution sums to {}", sum);
        assert!(result.visit_distribution.iter().all(|p| *p >= 0.0));
        assert!((0.0..=1.0).contains(&result.root_value));
    }

    #[test]
    fn test_zero_simulations_yield_uniform_distribution() {
        let evaluator = small_evaluator();
        let state = fresh_state(3);
        let mut rng = StdRng::seed_from_u64(11);
        let mcts = Mcts::new(MctsConfig {
            num_simulations: 0,
            ..Default::default()
        });

        let result = mcts.search(&state, &evaluator, &mut rng).unwrap();
        for position in 0..BOARD_SIZE {
            let expected = 1.0 / BOARD_SIZE as f32;
            assert!((result.visit_distribution[position] - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_search_on_terminal_state_is_empty_move_set() {
        let evaluator = small_evaluator();
        let mut state = fresh_state(4);
        state.hand_one.clear();
        state.hand_two.clear();
        let mut rng = StdRng::seed_from_u64(12);

        let mcts = Mcts::new(MctsConfig::default());
        assert!(matches!(
            mcts.search(&state, &evaluator, &mut rng),
            Err(RpsError::EmptyMoveSet)
        ));
    }

    /// The side to move can win on the spot by capturing the last opposing
    /// card; the search must concentrate its visits on that move.
    #[test]
    fn test_mcts_finds_the_forced_win() {
        let mut state = fresh_state(5);
        state.board = [Cell::EMPTY; BOARD_SIZE];
        // Player Two's hand is spent and it owns a Scissors at 0 and a Paper
        // at 3. Rock at 1 captures the Scissors and wins 2-1; every other
        // placement loses 1-2. Position 1 is the only cell adjacent to the
        // Scissors, since 3 is occupied.
        state.board[0] = Cell { card: CardType::Scissors, owner: Player::Two };
        state.board[3] = Cell { card: CardType::Paper, owner: Player::Two };
        state.hand_one = vec![CardType::Rock];
        state.hand_two = Vec::new();
        state.current = Player::One;

        let winning_position = 1;

        let evaluator = small_evaluator();
        let mut rng = StdRng::seed_from_u64(13);
        let mcts = Mcts::new(MctsConfig {
            num_simulations: 50,
            ..Default::default()
        });
        let result = mcts.search(&state, &evaluator, &mut rng).unwrap();
        assert_eq!(result.best_move.position, winning_position);
    }

    #[test]
    fn test_masked_priors_renormalise() {
        let mut state = fresh_state(6);
        state.apply_move(&Move::new(0, 0, Player::One)).unwrap();

        let raw = vec![1.0f32 / 9.0; 9];
        let priors = masked_priors(&raw, &state);
        assert_eq!(priors[0], 0.0, "occupied position is masked");
        let sum: f32 = priors.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_dirichlet_noise_keeps_a_distribution() {
        let state = fresh_state(7);
        let raw = vec![1.0f32 / 9.0; 9];
        let mut priors = masked_priors(&raw, &state);
        let mut rng = StdRng::seed_from_u64(14);
        mix_dirichlet_noise(&mut priors, &state, 0.3, 0.25, &mut rng);

        let sum: f32 = priors.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4, "noisy priors sum to {}", sum);
        assert!(priors.iter().all(|p| *p >= 0.0));
    }

    #[test]
    fn test_terminal_leaf_values_are_exact() {
        let evaluator = small_evaluator();
        let mut state = fresh_state(8);
        state.board[0] = Cell { card: CardType::Rock, owner: Player::One };
        state.hand_one.clear();
        state.hand_two.clear();

        // Player Two to move at the terminal state and Player One wins 1-0.
        state.current = Player::Two;
        assert_eq!(leaf_value(&state, &evaluator), 0.0);
        state.current = Player::One;
        assert_eq!(leaf_value(&state, &evaluator), 1.0);

        state.board[1] = Cell { card: CardType::Rock, owner: Player::Two };
        assert_eq!(leaf_value(&state, &evaluator), 0.5);
    }
}
