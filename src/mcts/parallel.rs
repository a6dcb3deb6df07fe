//! Shared-tree parallel search.
//!
//! A pool of workers runs the full simulation cycle on one tree behind a
//! reader/writer lock: selection holds the read lock and clones the leaf
//! state out, evaluator calls run lock-free on per-worker network replicas,
//! expansion and backpropagation take the write lock (expansion re-checks
//! that no other worker expanded the same leaf first). Visit counts and
//! value sums are atomics, so readers under the shared lock observe a
//! consistent monotone view; two workers occasionally backpropagating the
//! same leaf value twice is acceptable, torn counters are not.

use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::game::{GameState, Move};
use crate::mcts::config::MctsConfig;
use crate::mcts::node::Tree;
use crate::mcts::search::{
    attach_children, backpropagate, leaf_value, masked_priors, select_child, summarize, Mcts,
    MctsResult,
};
use crate::neural::Evaluator;
use crate::Result;

impl Mcts {
    /// Runs the configured simulation budget with `num_workers` threads on a
    /// shared tree. Statistics are not bit-reproducible across runs; callers
    /// needing determinism use the serial search.
    pub(crate) fn search_parallel<R: Rng>(
        &self,
        state: &GameState,
        evaluator: &Evaluator,
        rng: &mut R,
    ) -> Result<MctsResult> {
        let tree = self.setup_root(state, evaluator, rng)?;

        // Network tensors cannot be shared across threads; each worker
        // rebuilds its own replica from the flat weight vectors.
        let workers = self.config().num_workers.max(1);
        let hidden_size = evaluator.hidden_size();
        let policy_weights = evaluator.get_policy_weights();
        let value_weights = evaluator.get_value_weights();

        let shared = RwLock::new(tree);
        let budget = AtomicUsize::new(0);
        let config = *self.config();

        let shared_ref = &shared;
        let budget_ref = &budget;
        let config_ref = &config;
        std::thread::scope(|scope| {
            for _ in 0..workers {
                let policy_weights = policy_weights.clone();
                let value_weights = value_weights.clone();
                scope.spawn(move || {
                    let replica = match Evaluator::from_weights(
                        hidden_size,
                        &policy_weights,
                        &value_weights,
                    ) {
                        Ok(replica) => replica,
                        Err(e) => {
                            log::error!("search worker failed to build its evaluator: {}", e);
                            return;
                        }
                    };
                    worker_loop(shared_ref, budget_ref, config_ref, &replica);
                });
            }
        });

        let tree = shared
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(summarize(&tree))
    }
}

/// What one worker learned about its selected leaf before taking the write
/// lock.
struct LeafPlan {
    index: usize,
    value: f64,
    /// Present when the leaf still needs expansion: priors for the leaf,
    /// its legal moves and the evaluated value of the first child.
    expansion: Option<(Vec<f32>, Vec<Move>, f64)>,
}

fn worker_loop(
    shared: &RwLock<Tree>,
    budget: &AtomicUsize,
    config: &MctsConfig,
    evaluator: &Evaluator,
) {
    loop {
        if budget.fetch_add(1, Ordering::Relaxed) >= config.num_simulations {
            return;
        }

        // Selection under the read lock; the leaf state is cloned out so the
        // lock is not held across network calls.
        let (leaf_index, leaf_state, wants_expansion) = {
            let tree = shared
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let mut index = Tree::ROOT;
            while tree.nodes[index].is_expanded() && !tree.nodes[index].state.is_terminal() {
                index = select_child(&tree, index, config.c_puct);
            }
            let node = &tree.nodes[index];
            let wants_expansion = !node.state.is_terminal() && node.visit_count() >= 1;
            (index, node.state.clone(), wants_expansion)
        };

        // Evaluation without any lock.
        let plan = plan_leaf(leaf_index, leaf_state, wants_expansion, evaluator);

        // Expansion (re-checked) and backpropagation under the write lock.
        let tree = shared
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        commit_plan(tree, plan);
    }
}

fn plan_leaf(
    index: usize,
    state: GameState,
    wants_expansion: bool,
    evaluator: &Evaluator,
) -> LeafPlan {
    let value = leaf_value(&state, evaluator);
    if !wants_expansion {
        return LeafPlan {
            index,
            value,
            expansion: None,
        };
    }

    let legal = state.legal_moves();
    let (raw_priors, _) = evaluator.predict(&state);
    let priors = masked_priors(&raw_priors, &state);

    // The first child is where evaluation continues after expansion.
    let first_child_value = legal.first().map_or(value, |mv| {
        let mut child_state = state.clone();
        match child_state.apply_move(mv) {
            Ok(()) => leaf_value(&child_state, evaluator),
            Err(_) => value,
        }
    });

    LeafPlan {
        index,
        value,
        expansion: Some((priors, legal, first_child_value)),
    }
}

fn commit_plan(mut tree: std::sync::RwLockWriteGuard<'_, Tree>, plan: LeafPlan) {
    match plan.expansion {
        Some((priors, legal, first_child_value))
            if !tree.nodes[plan.index].is_expanded() =>
        {
            tree.nodes[plan.index].priors = priors;
            attach_children(&mut tree, plan.index, &legal);
            match tree.nodes[plan.index].children.first().copied() {
                Some(first) => backpropagate(&tree, first, first_child_value),
                None => backpropagate(&tree, plan.index, plan.value),
            }
        }
        // Another worker expanded this leaf in the meantime (or it never
        // needed expansion); its own evaluation still counts.
        _ => backpropagate(&tree, plan.index, plan.value),
    }
}
