//! Card catalog.
//!
//! Maps short card codes such as `2c`, `10h` or `ad` to the canonical
//! image filenames of the card asset set (`2_of_clubs.png`,
//! `10_of_hearts.png`, `ace_of_diamonds.png`).

use crate::error::{DeckError, Result};

/// Suit code → suit name.
static SUITS: [(char, &str); 4] = [
    ('c', "clubs"),
    ('d', "diamonds"),
    ('s', "spades"),
    ('h', "hearts"),
];

/// Rank code → rank name.
static RANKS: [(&str, &str); 13] = [
    ("2", "2"),
    ("3", "3"),
    ("4", "4"),
    ("5", "5"),
    ("6", "6"),
    ("7", "7"),
    ("8", "8"),
    ("9", "9"),
    ("10", "10"),
    ("j", "jack"),
    ("q", "queen"),
    ("k", "king"),
    ("a", "ace"),
];

const IMAGE_EXTENSION: &str = ".png";

/// A playing card identified by its rank and suit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Card {
    rank: &'static str,
    suit: char,
}

impl Card {
    /// Parse a card code. Case-insensitive, surrounding whitespace ignored.
    pub fn parse(code: &str) -> Result<Self> {
        let normalized = normalize(code);
        let invalid = |reason: String| DeckError::InvalidCardCode {
            code: code.to_string(),
            reason,
        };

        if normalized.chars().count() < 2 {
            return Err(invalid("too short".to_string()));
        }

        let mut chars = normalized.chars();
        let suit_char = chars.next_back().unwrap_or_default();
        let rank_str = chars.as_str();

        let suit = SUITS
            .iter()
            .find(|(c, _)| *c == suit_char)
            .map(|(c, _)| *c)
            .ok_or_else(|| invalid(format!("unknown suit '{}'", suit_char)))?;
        let rank = RANKS
            .iter()
            .find(|(r, _)| *r == rank_str)
            .map(|(r, _)| *r)
            .ok_or_else(|| invalid(format!("unknown rank '{}'", rank_str)))?;

        Ok(Self { rank, suit })
    }

    /// Recover a card from its canonical image filename.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let stem = filename.strip_suffix(IMAGE_EXTENSION)?;
        let (rank_name, suit_name) = stem.split_once("_of_")?;
        let rank = RANKS.iter().find(|(_, name)| *name == rank_name)?.0;
        let suit = SUITS.iter().find(|(_, name)| *name == suit_name)?.0;
        Some(Self { rank, suit })
    }

    /// Every card in the catalog, ranks within suits.
    pub fn all() -> impl Iterator<Item = Card> {
        SUITS.iter().flat_map(|(suit, _)| {
            RANKS.iter().map(move |(rank, _)| Card {
                rank: *rank,
                suit: *suit,
            })
        })
    }

    /// Normalized code, e.g. `10h`.
    pub fn code(&self) -> String {
        format!("{}{}", self.rank, self.suit)
    }

    /// Canonical image filename, e.g. `10_of_hearts.png`.
    pub fn filename(&self) -> String {
        format!("{}_of_{}{}", self.rank_name(), self.suit_name(), IMAGE_EXTENSION)
    }

    fn rank_name(&self) -> &'static str {
        RANKS
            .iter()
            .find(|(r, _)| *r == self.rank)
            .map(|(_, name)| *name)
            .unwrap_or(self.rank)
    }

    fn suit_name(&self) -> &'static str {
        SUITS
            .iter()
            .find(|(c, _)| *c == self.suit)
            .map(|(_, name)| *name)
            .unwrap_or("unknown")
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

/// Resolve a card code to its image filename.
pub fn resolve(code: &str) -> Result<String> {
    Card::parse(code).map(|card| card.filename())
}

/// Trim and lower-case a card code.
pub fn normalize(code: &str) -> String {
    code.trim().to_lowercase()
}
