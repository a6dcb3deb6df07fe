//! Runs complete games between two agents.

use rand::Rng;

use crate::agent::Agent;
use crate::game::{GameConfig, GameState, Player};
use crate::{Result, RpsError};

/// Win/draw/loss tally from the first agent's point of view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchTally {
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
}

impl MatchTally {
    pub fn games(&self) -> u32 {
        self.wins + self.draws + self.losses
    }

    /// Score in [0, 1]: wins count 1, draws 0.5.
    pub fn score(&self) -> f64 {
        let games = self.games();
        if games == 0 {
            0.0
        } else {
            (self.wins as f64 + 0.5 * self.draws as f64) / games as f64
        }
    }
}

/// Plays one game to termination; `first` moves as Player One. Returns the
/// winner (`Player::None` on a draw).
pub fn play_game<'a, R: Rng>(
    first: &'a mut dyn Agent,
    second: &'a mut dyn Agent,
    config: &GameConfig,
    rng: &mut R,
) -> Result<Player> {
    let mut state = GameState::new_game(config, rng);
    while !state.is_terminal() {
        let agent = match state.current {
            Player::One => &mut *first,
            Player::Two => &mut *second,
            Player::None => return Err(RpsError::EmptyMoveSet),
        };
        let mv = match agent.choose_move(&state) {
            Ok(mv) => mv,
            // The agent sees no move; the kernel treats that as game over.
            Err(RpsError::EmptyMoveSet) => break,
            Err(e) => return Err(e),
        };
        state.apply_move(&mv)?;
    }
    Ok(state.winner())
}

/// Plays `games` games between two agents, alternating which one starts.
/// The tally is from `a`'s point of view.
pub fn play_series<R: Rng>(
    a: &mut dyn Agent,
    b: &mut dyn Agent,
    games: usize,
    config: &GameConfig,
    rng: &mut R,
) -> Result<MatchTally> {
    let mut tally = MatchTally::default();
    for game in 0..games {
        let a_starts = game % 2 == 0;
        let winner = if a_starts {
            play_game(a, b, config, rng)?
        } else {
            play_game(b, a, config, rng)?
        };
        let a_player = if a_starts { Player::One } else { Player::Two };
        if winner == Player::None {
            tally.draws += 1;
        } else if winner == a_player {
            tally.wins += 1;
        } else {
            tally.losses += 1;
        }
    }
    Ok(tally)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::players::RandomAgent;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_play_game_terminates() {
        let mut a = RandomAgent::new(1);
        let mut b = RandomAgent::new(2);
        let mut rng = StdRng::seed_from_u64(3);
        let winner = play_game(&mut a, &mut b, &GameConfig::default(), &mut rng).unwrap();
        assert!(matches!(winner, Player::One | Player::Two | Player::None));
    }

    #[test]
    fn test_series_accounting() {
        let mut a = RandomAgent::new(4);
        let mut b = RandomAgent::new(5);
        let mut rng = StdRng::seed_from_u64(6);
        let tally = play_series(&mut a, &mut b, 10, &GameConfig::default(), &mut rng).unwrap();
        assert_eq!(tally.games(), 10);
        assert!((0.0..=1.0).contains(&tally.score()));
    }
}
