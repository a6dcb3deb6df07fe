use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::game::card::CardType;

/// Deal parameters for a fresh game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Number of cards generated before dealing.
    pub deck_size: usize,
    /// Cards dealt to each player. If `2 * hand_size > deck_size` the hands
    /// are truncated to whatever the deck can cover.
    pub hand_size: usize,
    /// Round cap; the game ends once `round` exceeds it.
    pub max_rounds: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            deck_size: 21,
            hand_size: 5,
            max_rounds: 10,
        }
    }
}

/// Builds a shuffled deck of `deck_size` cards cycling Rock, Paper, Scissors.
pub fn create_deck<R: Rng>(deck_size: usize, rng: &mut R) -> Vec<CardType> {
    let mut cards: Vec<CardType> = (0..deck_size)
        .map(|i| CardType::ALL[i % CardType::ALL.len()])
        .collect();
    cards.shuffle(rng);
    cards
}

/// Deals `hand_size` cards to each player from the front of `deck`.
///
/// Leftover cards are discarded. When the deck is too small the second hand
/// (and then the first) is truncated rather than rejected.
pub fn deal_hands(deck: &[CardType], hand_size: usize) -> (Vec<CardType>, Vec<CardType>) {
    let first = deck.len().min(hand_size);
    let second = deck.len().saturating_sub(hand_size).min(hand_size);
    let hand_one = deck[..first].to_vec();
    let hand_two = deck[first..first + second].to_vec();
    (hand_one, hand_two)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_deck_cycles_types_evenly() {
        let mut rng = StdRng::seed_from_u64(7);
        let deck = create_deck(21, &mut rng);
        assert_eq!(deck.len(), 21);

        let rocks = deck.iter().filter(|c| **c == CardType::Rock).count();
        let papers = deck.iter().filter(|c| **c == CardType::Paper).count();
        let scissors = deck.iter().filter(|c| **c == CardType::Scissors).count();
        assert_eq!(rocks, 7);
        assert_eq!(papers, 7);
        assert_eq!(scissors, 7);
    }

    #[test]
    fn test_deck_is_deterministic_for_a_seed() {
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        assert_eq!(create_deck(21, &mut a), create_deck(21, &mut b));
    }

    #[test]
    fn test_deal_full_hands() {
        let mut rng = StdRng::seed_from_u64(1);
        let deck = create_deck(21, &mut rng);
        let (h1, h2) = deal_hands(&deck, 5);
        assert_eq!(h1.len(), 5);
        assert_eq!(h2.len(), 5);
        assert_eq!(h1, deck[..5].to_vec());
        assert_eq!(h2, deck[5..10].to_vec());
    }

    #[test]
    fn test_deal_truncates_short_deck() {
        let deck = vec![CardType::Rock, CardType::Paper, CardType::Scissors];
        let (h1, h2) = deal_hands(&deck, 5);
        assert_eq!(h1.len(), 3);
        assert!(h2.is_empty());

        let deck = vec![
            CardType::Rock,
            CardType::Paper,
            CardType::Scissors,
            CardType::Rock,
            CardType::Paper,
            CardType::Scissors,
            CardType::Rock,
        ];
        let (h1, h2) = deal_hands(&deck, 5);
        assert_eq!(h1.len(), 5);
        assert_eq!(h2.len(), 2);
    }
}
