//! Arena-backed search tree.
//!
//! Nodes refer to their parent and children by index into the arena, which
//! sidesteps reference cycles; the whole tree is dropped at the end of a
//! search. Visit counts and value sums are atomics so that the parallel
//! search can read them under the shared lock while another worker
//! backpropagates.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::game::{GameState, Move};

/// An `f64` accumulator stored as bits in an `AtomicU64`.
///
/// Statistics only need eventual convergence, so all accesses are relaxed.
#[derive(Debug, Default)]
pub struct AtomicF64(AtomicU64);

impl AtomicF64 {
    pub fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    pub fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn fetch_add(&self, delta: f64) {
        let mut current = self.0.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(current) + delta).to_bits();
            match self
                .0
                .compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return,
                Err(observed) => current = observed,
            }
        }
    }
}

/// One search-tree node.
pub struct Node {
    pub state: GameState,
    /// The move that produced this node; `None` at the root.
    pub action: Option<Move>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    /// Per-position priors for this node's children, filled at expansion.
    /// Children look their prior up by `action.position`.
    pub priors: Vec<f32>,
    pub visits: AtomicU64,
    pub value_sum: AtomicF64,
}

impl Node {
    pub fn new(state: GameState, action: Option<Move>, parent: Option<usize>) -> Self {
        Self {
            state,
            action,
            parent,
            children: Vec::new(),
            priors: Vec::new(),
            visits: AtomicU64::new(0),
            value_sum: AtomicF64::new(0.0),
        }
    }

    pub fn is_expanded(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn visit_count(&self) -> u64 {
        self.visits.load(Ordering::Relaxed)
    }

    /// Mean value from the perspective of the player to move at this node;
    /// 0 while unvisited.
    pub fn q(&self) -> f64 {
        let visits = self.visit_count();
        if visits == 0 {
            0.0
        } else {
            self.value_sum.load() / visits as f64
        }
    }
}

/// Append-only node arena; indices stay valid for the tree's lifetime.
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    pub const ROOT: usize = 0;

    pub fn new(root_state: GameState) -> Self {
        Self {
            nodes: vec![Node::new(root_state, None, None)],
        }
    }

    pub fn add_child(&mut self, parent: usize, state: GameState, action: Move) -> usize {
        let index = self.nodes.len();
        self.nodes.push(Node::new(state, Some(action), Some(parent)));
        self.nodes[parent].children.push(index);
        index
    }

    pub fn root(&self) -> &Node {
        &self.nodes[Self::ROOT]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameConfig, Player};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_atomic_f64_accumulates() {
        let acc = AtomicF64::new(0.5);
        acc.fetch_add(0.25);
        acc.fetch_add(0.25);
        assert!((acc.load() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_tree_links() {
        let mut rng = StdRng::seed_from_u64(2);
        let state = GameState::new_game(&GameConfig::default(), &mut rng);
        let mut tree = Tree::new(state.clone());

        let mv = state.legal_moves()[0];
        let mut child_state = state.clone();
        child_state.apply_move(&mv).unwrap();
        let child = tree.add_child(Tree::ROOT, child_state, mv);

        assert_eq!(tree.nodes[child].parent, Some(Tree::ROOT));
        assert_eq!(tree.root().children, vec![child]);
        assert_eq!(tree.nodes[child].action.unwrap().player, Player::One);
        assert_eq!(tree.nodes[child].q(), 0.0, "unvisited node has Q = 0");
    }
}
