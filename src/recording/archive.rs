//! Append-only CSV archive of training positions.
//!
//! The row format interoperates with minimax-generated datasets: raw board
//! ints, per-type hand counts, the side to move, the chosen move, the
//! search evaluation, a coarse game phase and the depth that produced the
//! evaluation.

use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::Path;

use crate::game::{CardType, GameState, Move, Player, BOARD_SIZE};
use crate::{Result, RpsError};

/// Coarse game phase by occupied cell count: opening at two or fewer,
/// endgame at seven or more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    Opening,
    Midgame,
    Endgame,
}

impl GamePhase {
    pub fn of(state: &GameState) -> GamePhase {
        let occupied = BOARD_SIZE - state.empty_positions().len();
        match occupied {
            0..=2 => GamePhase::Opening,
            7.. => GamePhase::Endgame,
            _ => GamePhase::Midgame,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            GamePhase::Opening => "opening",
            GamePhase::Midgame => "midgame",
            GamePhase::Endgame => "endgame",
        }
    }

    fn parse(s: &str) -> Result<GamePhase> {
        match s {
            "opening" => Ok(GamePhase::Opening),
            "midgame" => Ok(GamePhase::Midgame),
            "endgame" => Ok(GamePhase::Endgame),
            other => Err(RpsError::Protocol(format!("unknown game phase '{}'", other))),
        }
    }
}

/// One archived position.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveRecord {
    /// Cell encoding: 0 empty, 1..=3 Player One R/P/S, 4..=6 Player Two.
    pub board_state: [u8; BOARD_SIZE],
    /// Rock/Paper/Scissors counts of Player One's hand.
    pub hand_one: [u8; 3],
    /// Rock/Paper/Scissors counts of Player Two's hand.
    pub hand_two: [u8; 3],
    /// 1 or 2.
    pub current_player: u8,
    /// Chosen board position, 0..=8.
    pub best_move: u8,
    pub evaluation: f64,
    pub game_phase: GamePhase,
    pub search_depth: u32,
}

impl ArchiveRecord {
    pub fn from_state(
        state: &GameState,
        best_move: &Move,
        evaluation: f64,
        search_depth: u32,
    ) -> ArchiveRecord {
        let mut board_state = [0u8; BOARD_SIZE];
        for (i, cell) in state.board.iter().enumerate() {
            board_state[i] = match cell.owner {
                Player::None => 0,
                Player::One => 1 + type_offset(cell.card),
                Player::Two => 4 + type_offset(cell.card),
            };
        }
        ArchiveRecord {
            board_state,
            hand_one: hand_counts(&state.hand_one),
            hand_two: hand_counts(&state.hand_two),
            current_player: if state.current == Player::Two { 2 } else { 1 },
            best_move: best_move.position as u8,
            evaluation,
            game_phase: GamePhase::of(state),
            search_depth,
        }
    }
}

fn type_offset(card: CardType) -> u8 {
    match card {
        CardType::Rock => 0,
        CardType::Paper => 1,
        CardType::Scissors => 2,
    }
}

fn hand_counts(hand: &[CardType]) -> [u8; 3] {
    let mut counts = [0u8; 3];
    for card in hand {
        counts[type_offset(*card) as usize] += 1;
    }
    counts
}

/// Appending CSV writer; the header goes in only when the file is created.
pub struct ArchiveWriter {
    writer: csv::Writer<std::fs::File>,
}

impl ArchiveWriter {
    pub fn open(path: impl AsRef<Path>) -> Result<ArchiveWriter> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let exists = path.exists();
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if !exists {
            writer
                .write_record(Self::header())
                .map_err(|e| RpsError::Protocol(e.to_string()))?;
        }
        Ok(ArchiveWriter { writer })
    }

    fn header() -> Vec<String> {
        let mut header = Vec::new();
        for i in 0..BOARD_SIZE {
            header.push(format!("board_{}", i));
        }
        for side in ["hand1", "hand2"] {
            for suffix in ["rock", "paper", "scissors"] {
                header.push(format!("{}_{}", side, suffix));
            }
        }
        header.extend(
            ["current_player", "best_move", "evaluation", "game_phase", "search_depth"]
                .map(String::from),
        );
        header
    }

    pub fn append(&mut self, record: &ArchiveRecord) -> Result<()> {
        let mut row: Vec<String> = Vec::with_capacity(20);
        row.extend(record.board_state.iter().map(|v| v.to_string()));
        row.extend(record.hand_one.iter().map(|v| v.to_string()));
        row.extend(record.hand_two.iter().map(|v| v.to_string()));
        row.push(record.current_player.to_string());
        row.push(record.best_move.to_string());
        row.push(format!("{:.4}", record.evaluation));
        row.push(record.game_phase.as_str().to_string());
        row.push(record.search_depth.to_string());
        self.writer
            .write_record(&row)
            .map_err(|e| RpsError::Protocol(e.to_string()))?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Reads a whole archive back.
pub fn read_archive(path: impl AsRef<Path>) -> Result<Vec<ArchiveRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path.as_ref())
        .map_err(|e| RpsError::Protocol(e.to_string()))?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| RpsError::Protocol(e.to_string()))?;
        if row.len() != BOARD_SIZE + 6 + 5 {
            return Err(RpsError::Protocol(format!(
                "archive row has {} fields",
                row.len()
            )));
        }
        let int = |i: usize| -> Result<u8> {
            row[i]
                .parse::<u8>()
                .map_err(|e| RpsError::Protocol(format!("field {}: {}", i, e)))
        };

        let mut board_state = [0u8; BOARD_SIZE];
        for (i, slot) in board_state.iter_mut().enumerate() {
            *slot = int(i)?;
        }
        let mut hand_one = [0u8; 3];
        let mut hand_two = [0u8; 3];
        for i in 0..3 {
            hand_one[i] = int(BOARD_SIZE + i)?;
            hand_two[i] = int(BOARD_SIZE + 3 + i)?;
        }
        records.push(ArchiveRecord {
            board_state,
            hand_one,
            hand_two,
            current_player: int(BOARD_SIZE + 6)?,
            best_move: int(BOARD_SIZE + 7)?,
            evaluation: row[BOARD_SIZE + 8]
                .parse::<f64>()
                .map_err(|e| RpsError::Protocol(e.to_string()))?,
            game_phase: GamePhase::parse(&row[BOARD_SIZE + 9])?,
            search_depth: row[BOARD_SIZE + 10]
                .parse::<u32>()
                .map_err(|e| RpsError::Protocol(e.to_string()))?,
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_game_phase_boundaries() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut state = GameState::new_game(&GameConfig::default(), &mut rng);
        assert_eq!(GamePhase::of(&state), GamePhase::Opening);

        for _ in 0..3 {
            let mv = state.legal_moves()[0];
            state.apply_move(&mv).unwrap();
        }
        assert_eq!(GamePhase::of(&state), GamePhase::Midgame);

        for _ in 0..4 {
            let mv = state.legal_moves()[0];
            state.apply_move(&mv).unwrap();
        }
        assert_eq!(GamePhase::of(&state), GamePhase::Endgame);
    }

    #[test]
    fn test_record_encoding() {
        let mut rng = StdRng::seed_from_u64(2);
        let state = GameState::new_game(&GameConfig::default(), &mut rng);
        let mv = state.legal_moves()[0];
        let record = ArchiveRecord::from_state(&state, &mv, 12.5, 3);

        assert_eq!(record.board_state, [0u8; BOARD_SIZE]);
        assert_eq!(record.hand_one.iter().map(|c| *c as usize).sum::<usize>(), 5);
        assert_eq!(record.hand_two.iter().map(|c| *c as usize).sum::<usize>(), 5);
        assert_eq!(record.current_player, 1);
        assert_eq!(record.game_phase, GamePhase::Opening);
    }

    #[test]
    fn test_archive_append_and_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.csv");

        let mut rng = StdRng::seed_from_u64(3);
        let mut state = GameState::new_game(&GameConfig::default(), &mut rng);
        let mut written = Vec::new();
        {
            let mut writer = ArchiveWriter::open(&path).unwrap();
            for _ in 0..3 {
                let mv = state.legal_moves()[0];
                let record = ArchiveRecord::from_state(&state, &mv, -1.25, 2);
                writer.append(&record).unwrap();
                written.push(record);
                state.apply_move(&mv).unwrap();
            }
            writer.flush().unwrap();
        }

        // A second writer appends without repeating the header.
        {
            let mv = state.legal_moves()[0];
            let record = ArchiveRecord::from_state(&state, &mv, 7.0, 4);
            let mut writer = ArchiveWriter::open(&path).unwrap();
            writer.append(&record).unwrap();
            writer.flush().unwrap();
            written.push(record);
        }

        let records = read_archive(&path).unwrap();
        assert_eq!(records, written);
    }
}
