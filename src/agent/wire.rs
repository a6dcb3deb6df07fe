//! Line-oriented stdio contract for external agent processes.
//!
//! Request: `"<board>|<hand1>|<hand2>|<current>"`, where the board is nine
//! characters (`.` empty, uppercase = Player One card letter `R|P|S`,
//! lowercase = Player Two), the hands are letter strings in hand order and
//! current is `1` or `2`. Response: `"<card_index>:<position>"` on one line.
//!
//! The adapter keeps kernel types on this side of the pipe; a subprocess
//! only ever sees the textual encoding.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use crate::agent::Agent;
use crate::game::{CardType, Cell, GameConfig, GameState, Move, Player, BOARD_SIZE};
use crate::{Result, RpsError};

/// Encodes `state` as a request line (without the trailing newline).
pub fn encode_request(state: &GameState) -> String {
    let mut line = String::with_capacity(32);
    for cell in &state.board {
        match cell.owner {
            Player::None => line.push('.'),
            Player::One => line.push(cell.card.letter()),
            Player::Two => line.push(cell.card.letter().to_ascii_lowercase()),
        }
    }
    line.push('|');
    for card in &state.hand_one {
        line.push(card.letter());
    }
    line.push('|');
    for card in &state.hand_two {
        line.push(card.letter());
    }
    line.push('|');
    line.push(if state.current == Player::Two { '2' } else { '1' });
    line
}

/// Parses a request line back into a state, for processes serving the other
/// end of the contract. Round bookkeeping is not part of the wire format;
/// the result carries defaults.
pub fn parse_request(line: &str) -> Result<GameState> {
    let parts: Vec<&str> = line.trim().split('|').collect();
    if parts.len() != 4 {
        return Err(RpsError::Protocol(format!(
            "expected 4 '|'-separated fields, got {}",
            parts.len()
        )));
    }
    let board_chars: Vec<char> = parts[0].chars().collect();
    if board_chars.len() != BOARD_SIZE {
        return Err(RpsError::Protocol(format!(
            "board must be {} characters, got {}",
            BOARD_SIZE,
            board_chars.len()
        )));
    }

    let mut board = [Cell::EMPTY; BOARD_SIZE];
    for (i, ch) in board_chars.into_iter().enumerate() {
        if ch == '.' {
            continue;
        }
        let card = CardType::from_letter(ch)
            .ok_or_else(|| RpsError::Protocol(format!("bad board character '{}'", ch)))?;
        let owner = if ch.is_ascii_uppercase() {
            Player::One
        } else {
            Player::Two
        };
        board[i] = Cell { card, owner };
    }

    let parse_hand = |s: &str| -> Result<Vec<CardType>> {
        s.chars()
            .map(|ch| {
                CardType::from_letter(ch)
                    .ok_or_else(|| RpsError::Protocol(format!("bad hand character '{}'", ch)))
            })
            .collect()
    };

    let current = match parts[3] {
        "1" => Player::One,
        "2" => Player::Two,
        other => {
            return Err(RpsError::Protocol(format!(
                "current player must be 1 or 2, got '{}'",
                other
            )))
        }
    };

    Ok(GameState {
        board,
        hand_one: parse_hand(parts[1])?,
        hand_two: parse_hand(parts[2])?,
        current,
        round: 1,
        max_rounds: GameConfig::default().max_rounds,
        history: Vec::new(),
    })
}

/// Parses a `"<card_index>:<position>"` response line.
pub fn parse_response(line: &str) -> Result<(usize, usize)> {
    let trimmed = line.trim();
    let (card, position) = trimmed
        .split_once(':')
        .ok_or_else(|| RpsError::Protocol(format!("malformed response '{}'", trimmed)))?;
    let card = card
        .parse::<usize>()
        .map_err(|_| RpsError::Protocol(format!("bad card index '{}'", card)))?;
    let position = position
        .parse::<usize>()
        .map_err(|_| RpsError::Protocol(format!("bad position '{}'", position)))?;
    Ok((card, position))
}

/// Formats an agent's decision as a response line.
pub fn encode_response(mv: &Move) -> String {
    format!("{}:{}", mv.card_index, mv.position)
}

/// An agent living in a subprocess, driven over stdin/stdout.
pub struct PipeAgent {
    name: String,
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl PipeAgent {
    /// Spawns `command` with piped stdio.
    pub fn spawn(name: impl Into<String>, command: &mut Command) -> Result<Self> {
        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| RpsError::Protocol("child stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RpsError::Protocol("child stdout unavailable".to_string()))?;
        Ok(Self {
            name: name.into(),
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }
}

impl Agent for PipeAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose_move(&mut self, state: &GameState) -> Result<Move> {
        if state.legal_moves().is_empty() {
            return Err(RpsError::EmptyMoveSet);
        }
        writeln!(self.stdin, "{}", encode_request(state))?;
        self.stdin.flush()?;

        let mut line = String::new();
        self.stdout.read_line(&mut line)?;
        let (card_index, position) = parse_response(&line)?;
        Ok(Move::new(card_index, position, state.current))
    }
}

impl Drop for PipeAgent {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_request_round_trip() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut state = GameState::new_game(&GameConfig::default(), &mut rng);
        let mv = state.legal_moves()[3];
        state.apply_move(&mv).unwrap();

        let line = encode_request(&state);
        let parsed = parse_request(&line).unwrap();

        assert_eq!(parsed.board, state.board);
        assert_eq!(parsed.hand_one, state.hand_one);
        assert_eq!(parsed.hand_two, state.hand_two);
        assert_eq!(parsed.current, state.current);
    }

    #[test]
    fn test_request_encoding_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let state = GameState::new_game(&GameConfig::default(), &mut rng);
        let line = encode_request(&state);

        let parts: Vec<&str> = line.split('|').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], ".........");
        assert_eq!(parts[1].len(), 5);
        assert_eq!(parts[2].len(), 5);
        assert_eq!(parts[3], "1");
    }

    #[test]
    fn test_response_round_trip() {
        let mv = Move::new(2, 7, Player::One);
        assert_eq!(parse_response(&encode_response(&mv)).unwrap(), (2, 7));
        assert_eq!(parse_response("0:4\n").unwrap(), (0, 4));
    }

    #[test]
    fn test_malformed_lines_are_rejected() {
        assert!(parse_response("nonsense").is_err());
        assert!(parse_response("1;2").is_err());
        assert!(parse_request("...|RR|1").is_err());
        assert!(parse_request("..X......|R|R|1").is_err());
        assert!(parse_request(".........|R|R|3").is_err());
    }
}
