//! Transposition cache for the alpha-beta search.
//!
//! Keys are canonical fingerprints: board contents, hands as multisets
//! (ordering inside a hand is irrelevant to play strength), side to move and
//! round. Move history never enters the key, so transpositions reached
//! through different move orders share an entry.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use crate::game::{GameState, Move};

/// Cached outcome of a searched subtree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionResult {
    pub best_move: Option<Move>,
    pub value: f64,
    /// Depth the subtree was searched to; hits at a depth at least as deep
    /// as the request short-circuit the search.
    pub depth: u32,
}

/// Unbounded replace-always table.
#[derive(Debug, Default)]
pub struct TranspositionTable {
    entries: HashMap<u64, PositionResult>,
    hits: u64,
    misses: u64,
}

impl TranspositionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probe(&mut self, key: u64, depth: u32) -> Option<PositionResult> {
        match self.entries.get(&key) {
            Some(entry) if entry.depth >= depth => {
                self.hits += 1;
                Some(*entry)
            }
            _ => {
                self.misses += 1;
                None
            }
        }
    }

    /// Stores `result`, replacing any existing entry unconditionally.
    pub fn store(&mut self, key: u64, result: PositionResult) {
        self.entries.insert(key, result);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hit_rate(&self) -> f64 {
        let probes = self.hits + self.misses;
        if probes == 0 {
            0.0
        } else {
            self.hits as f64 / probes as f64
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

/// Canonical state fingerprint. Hands are sorted before hashing so that two
/// states differing only in card order inside a hand collide on purpose.
pub fn fingerprint(state: &GameState) -> u64 {
    let mut hasher = DefaultHasher::new();
    for cell in &state.board {
        if cell.is_empty() {
            0u8.hash(&mut hasher);
        } else {
            1u8.hash(&mut hasher);
            cell.card.hash(&mut hasher);
            cell.owner.hash(&mut hasher);
        }
    }
    let mut hand_one = state.hand_one.clone();
    hand_one.sort();
    hand_one.hash(&mut hasher);
    let mut hand_two = state.hand_two.clone();
    hand_two.sort();
    hand_two.hash(&mut hasher);
    state.current.hash(&mut hasher);
    state.round.hash(&mut hasher);
    hasher.finish()
}
