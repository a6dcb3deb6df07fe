//! Oracle-labelled dataset generation.
//!
//! Plays complete games with the minimax engine on both sides and archives
//! every decision, producing supervised data compatible with the training
//! archive format.

use rand::Rng;
use std::time::Duration;

use crate::game::{GameConfig, GameState};
use crate::minimax::MinimaxEngine;
use crate::recording::archive::{ArchiveRecord, ArchiveWriter};
use crate::Result;

/// Runs `games` oracle self-play games, appending one row per move.
/// Returns the number of rows written.
pub fn generate_minimax_dataset<R: Rng>(
    engine: &mut MinimaxEngine,
    games: usize,
    game: &GameConfig,
    writer: &mut ArchiveWriter,
    rng: &mut R,
) -> Result<usize> {
    let budget = Duration::from_millis(engine.config().time_budget_ms);
    let depth = engine.config().max_depth;
    let mut rows = 0;

    for index in 0..games {
        let mut state = GameState::new_game(game, rng);
        while !state.is_terminal() {
            let (mv, value) = engine.find_best_move_iterative(&state, budget);
            let Some(mv) = mv else { break };
            writer.append(&ArchiveRecord::from_state(&state, &mv, value, depth))?;
            rows += 1;
            state.apply_move(&mv)?;
        }
        log::debug!("archived oracle game {}/{}", index + 1, games);
    }
    writer.flush()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::minimax::MinimaxConfig;
    use crate::recording::archive::read_archive;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_rows_are_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oracle.csv");

        let mut engine = MinimaxEngine::new(MinimaxConfig {
            max_depth: 2,
            time_budget_ms: 50,
            use_cache: true,
        });
        let mut writer = ArchiveWriter::open(&path).unwrap();
        let mut rng = StdRng::seed_from_u64(5);

        let rows = generate_minimax_dataset(
            &mut engine,
            1,
            &GameConfig::default(),
            &mut writer,
            &mut rng,
        )
        .unwrap();
        assert!(rows > 0);

        let records = read_archive(&path).unwrap();
        assert_eq!(records.len(), rows);
        for record in &records {
            assert!(record.best_move < 9);
            assert!(matches!(record.current_player, 1 | 2));
            assert_eq!(record.search_depth, 2);
        }
    }
}
