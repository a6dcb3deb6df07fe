//! Depth-limited alpha-beta search with iterative deepening.
//!
//! The oracle shares the game kernel with the learned agents and anchors
//! their evaluation: at full depth on this small board it plays perfectly.
//! A wall-clock deadline makes it usable as a sparring partner; exceeding it
//! unwinds the recursion with the static evaluation so the caller always
//! gets a well-formed partial result.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::game::{GameState, Move, Player};
use crate::minimax::evaluation::{evaluate, TERMINAL_THRESHOLD};
use crate::minimax::transposition::{fingerprint, PositionResult, TranspositionTable};

/// Oracle parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MinimaxConfig {
    /// Deepest iteration attempted by `find_best_move_iterative`.
    /// Default: 6
    pub max_depth: u32,

    /// Wall-clock budget per move in milliseconds.
    /// Default: 1000
    pub time_budget_ms: u64,

    /// Transposition caching on/off; off forces a full re-search and is
    /// mainly useful for benchmarking the table.
    /// Default: true
    pub use_cache: bool,
}

impl Default for MinimaxConfig {
    fn default() -> Self {
        Self {
            max_depth: 6,
            time_budget_ms: 1000,
            use_cache: true,
        }
    }
}

/// Alpha-beta engine with a transposition table that persists across calls.
pub struct MinimaxEngine {
    config: MinimaxConfig,
    table: TranspositionTable,
    nodes_visited: u64,
}

impl MinimaxEngine {
    pub fn new(config: MinimaxConfig) -> Self {
        Self {
            config,
            table: TranspositionTable::new(),
            nodes_visited: 0,
        }
    }

    pub fn config(&self) -> &MinimaxConfig {
        &self.config
    }

    pub fn nodes_visited(&self) -> u64 {
        self.nodes_visited
    }

    pub fn cache_len(&self) -> usize {
        self.table.len()
    }

    /// Fixed-depth search. Returns the best move (None only on positions
    /// without a legal move) and its value from Player One's perspective.
    pub fn find_best_move(&mut self, state: &GameState, depth: u32) -> (Option<Move>, f64) {
        let deadline = Instant::now() + Duration::from_millis(self.config.time_budget_ms);
        let (value, best_move) = self.alphabeta(
            state,
            depth,
            f64::NEG_INFINITY,
            f64::INFINITY,
            deadline,
        );
        (best_move, value)
    }

    /// Iterative deepening driver: searches depth 1, 2, ... `max_depth`,
    /// stopping once 80% of the budget has elapsed or the position is
    /// decided (|value| beyond the terminal threshold). Depth 1 always runs
    /// so a move is available even under a spent budget.
    pub fn find_best_move_iterative(
        &mut self,
        state: &GameState,
        budget: Duration,
    ) -> (Option<Move>, f64) {
        let start = Instant::now();
        let deadline = start + budget;
        let cutoff = budget.mul_f64(0.8);

        let mut best: (Option<Move>, f64) = (None, evaluate(state));
        for depth in 1..=self.config.max_depth {
            if depth > 1 && start.elapsed() > cutoff {
                log::debug!("deepening stopped before depth {}: budget spent", depth);
                break;
            }
            let (value, mv) = self.alphabeta(
                state,
                depth,
                f64::NEG_INFINITY,
                f64::INFINITY,
                deadline,
            );
            if mv.is_some() {
                best = (mv, value);
            }
            if value.abs() > TERMINAL_THRESHOLD {
                break;
            }
        }
        best
    }

    /// Alpha-beta recursion. Player One maximises. The deadline is checked
    /// on entry; an expired clock returns the static evaluation and lets the
    /// stack unwind normally.
    fn alphabeta(
        &mut self,
        state: &GameState,
        depth: u32,
        mut alpha: f64,
        mut beta: f64,
        deadline: Instant,
    ) -> (f64, Option<Move>) {
        self.nodes_visited += 1;

        if Instant::now() >= deadline {
            return (evaluate(state), None);
        }
        if depth == 0 || state.is_terminal() {
            return (evaluate(state), None);
        }

        let key = fingerprint(state);
        if self.config.use_cache {
            if let Some(entry) = self.table.probe(key, depth) {
                return (entry.value, entry.best_move);
            }
        }

        let maximizing = state.current == Player::One;
        let mut best_value = if maximizing {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
        let mut best_move = None;

        for mv in state.legal_moves() {
            let mut child = state.clone();
            if let Err(e) = child.apply_move(&mv) {
                // A rejected move is skipped, never fatal to the search.
                log::debug!("minimax skipping rejected move {:?}: {}", mv, e);
                continue;
            }
            let (value, _) = self.alphabeta(&child, depth - 1, alpha, beta, deadline);
            if maximizing {
                if value > best_value {
                    best_value = value;
                    best_move = Some(mv);
                }
                alpha = alpha.max(best_value);
            } else {
                if value < best_value {
                    best_value = value;
                    best_move = Some(mv);
                }
                beta = beta.min(best_value);
            }
            if beta <= alpha {
                break;
            }
        }

        if best_move.is_none() {
            // Every move was rejected; treat the node as a leaf.
            return (evaluate(state), None);
        }

        // Results truncated by the deadline would poison the table.
        if self.config.use_cache && Instant::now() < deadline {
            self.table.store(
                key,
                PositionResult {
                    best_move,
                    value: best_value,
                    depth,
                },
            );
        }
        (best_value, best_move)
    }
}
