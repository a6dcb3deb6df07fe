use serde::{Deserialize, Serialize};

/// One of the three cyclic card types.
///
/// Rock beats Scissors, Paper beats Rock, Scissors beats Paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CardType {
    Rock,
    Paper,
    Scissors,
}

impl CardType {
    /// All card types in cycle order, used by deck generation.
    pub const ALL: [CardType; 3] = [CardType::Rock, CardType::Paper, CardType::Scissors];

    /// Whether this type wins the RPS match-up against `other`. Equal types tie.
    pub fn beats(self, other: CardType) -> bool {
        matches!(
            (self, other),
            (CardType::Rock, CardType::Scissors)
                | (CardType::Paper, CardType::Rock)
                | (CardType::Scissors, CardType::Paper)
        )
    }

    /// Letter used by the line-oriented agent protocol (`R`, `P`, `S`).
    pub fn letter(self) -> char {
        match self {
            CardType::Rock => 'R',
            CardType::Paper => 'P',
            CardType::Scissors => 'S',
        }
    }

    pub fn from_letter(c: char) -> Option<CardType> {
        match c.to_ascii_uppercase() {
            'R' => Some(CardType::Rock),
            'P' => Some(CardType::Paper),
            'S' => Some(CardType::Scissors),
            _ => None,
        }
    }
}

/// A player slot. `None` marks empty cells and unowned cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    None,
    One,
    Two,
}

impl Player {
    pub fn opponent(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
            Player::None => Player::None,
        }
    }
}

/// A board cell. The cell is empty iff `owner == Player::None`; its `card`
/// is then meaningless and readers must ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub card: CardType,
    pub owner: Player,
}

impl Cell {
    pub const EMPTY: Cell = Cell {
        card: CardType::Rock,
        owner: Player::None,
    };

    pub fn is_empty(&self) -> bool {
        self.owner == Player::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beats_is_cyclic() {
        assert!(CardType::Rock.beats(CardType::Scissors));
        assert!(CardType::Paper.beats(CardType::Rock));
        assert!(CardType::Scissors.beats(CardType::Paper));

        assert!(!CardType::Scissors.beats(CardType::Rock));
        assert!(!CardType::Rock.beats(CardType::Paper));
        assert!(!CardType::Paper.beats(CardType::Scissors));
    }

    #[test]
    fn test_equal_types_tie() {
        for t in CardType::ALL {
            assert!(!t.beats(t), "{:?} must not beat itself", t);
        }
    }

    #[test]
    fn test_letter_round_trip() {
        for t in CardType::ALL {
            assert_eq!(CardType::from_letter(t.letter()), Some(t));
        }
        assert_eq!(CardType::from_letter('x'), None);
    }

    #[test]
    fn test_opponent() {
        assert_eq!(Player::One.opponent(), Player::Two);
        assert_eq!(Player::Two.opponent(), Player::One);
        assert_eq!(Player::None.opponent(), Player::None);
    }
}
