use std::fmt;

use crate::error::{TrainerError, TrainerResult};

pub const RANKS_STR: &str = "23456789TJQKA";
pub const SUITS_STR: &str = "cdhs";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
    Ten = 10,
    Jack = 11,
    Queen = 12,
    King = 13,
    Ace = 14,
}

impl Rank {
    pub fn from_char(c: char) -> TrainerResult<Rank> {
        match c {
            '2' => Ok(Rank::Two),
            '3' => Ok(Rank::Three),
            '4' => Ok(Rank::Four),
            '5' => Ok(Rank::Five),
            '6' => Ok(Rank::Six),
            '7' => Ok(Rank::Seven),
            '8' => Ok(Rank::Eight),
            '9' => Ok(Rank::Nine),
            'T' => Ok(Rank::Ten),
            'J' => Ok(Rank::Jack),
            'Q' => Ok(Rank::Queen),
            'K' => Ok(Rank::King),
            'A' => Ok(Rank::Ace),
            _ => Err(TrainerError::InvalidRank(c)),
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Rank::Two => '2',
            Rank::Three => '3',
            Rank::Four => '4',
            Rank::Five => '5',
            Rank::Six => '6',
            Rank::Seven => '7',
            Rank::Eight => '8',
            Rank::Nine => '9',
            Rank::Ten => 'T',
            Rank::Jack => 'J',
            Rank::Queen => 'Q',
            Rank::King => 'K',
            Rank::Ace => 'A',
        }
    }
}

pub const ALL_RANKS: [Rank; 13] = [
    Rank::Two,
    Rank::Three,
    Rank::Four,
    Rank::Five,
    Rank::Six,
    Rank::Seven,
    Rank::Eight,
    Rank::Nine,
    Rank::Ten,
    Rank::Jack,
    Rank::Queen,
    Rank::King,
    Rank::Ace,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

impl Suit {
    pub fn from_char(c: char) -> TrainerResult<Suit> {
        match c.to_ascii_lowercase() {
            'c' => Ok(Suit::Clubs),
            'd' => Ok(Suit::Diamonds),
            'h' => Ok(Suit::Hearts),
            's' => Ok(Suit::Spades),
            _ => Err(TrainerError::InvalidSuit(c)),
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Suit::Clubs => 'c',
            Suit::Diamonds => 'd',
            Suit::Hearts => 'h',
            Suit::Spades => 's',
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Suit::Clubs => "\u{2663}",
            Suit::Diamonds => "\u{2666}",
            Suit::Hearts => "\u{2665}",
            Suit::Spades => "\u{2660}",
        }
    }
}

pub const ALL_SUITS: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Card {
        Card { rank, suit }
    }

    pub fn pretty(&self) -> String {
        format!("{}{}", self.rank.to_char(), self.suit.symbol())
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank.to_char(), self.suit.to_char())
    }
}

pub fn parse_card(notation: &str) -> TrainerResult<Card> {
    let notation = notation.trim();
    let chars: Vec<char> = notation.chars().collect();
    if chars.len() != 2 {
        return Err(TrainerError::InvalidCardNotation(notation.to_string()));
    }
    let rank = Rank::from_char(chars[0].to_ascii_uppercase())?;
    let suit = Suit::from_char(chars[1])?;
    Ok(Card::new(rank, suit))
}

/// Parse a board like "Ks7d2c", "Ks,7d,2c" or "Ks 7d 2c".
pub fn parse_board(notation: &str) -> TrainerResult<Vec<Card>> {
    let notation = notation.trim().replace(' ', "").replace(',', "");
    if notation.len() % 2 != 0 {
        return Err(TrainerError::InvalidBoardNotation(notation.to_string()));
    }
    let mut cards = Vec::new();
    let chars: Vec<char> = notation.chars().collect();
    for i in (0..chars.len()).step_by(2) {
        let s: String = chars[i..i + 2].iter().collect();
        cards.push(parse_card(&s)?);
    }
    Ok(cards)
}

/// True when a node-path token is a dealt community card ("Kh", "2d")
/// rather than an action label.
pub fn is_card_code(token: &str) -> bool {
    let chars: Vec<char> = token.chars().collect();
    chars.len() == 2 && RANKS_STR.contains(chars[0]) && SUITS_STR.contains(chars[1])
}

/// Split a 4-char combo key into its two card codes.
pub fn split_combo(combo: &str) -> TrainerResult<(String, String)> {
    if combo.len() != 4 {
        return Err(TrainerError::InvalidComboNotation(combo.to_string()));
    }
    let first = &combo[..2];
    let second = &combo[2..];
    if !is_card_code(first) || !is_card_code(second) {
        return Err(TrainerError::InvalidComboNotation(combo.to_string()));
    }
    Ok((first.to_string(), second.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_card() {
        let c = parse_card("Ah").unwrap();
        assert_eq!(c.rank, Rank::Ace);
        assert_eq!(c.suit, Suit::Hearts);
        assert!(parse_card("1h").is_err());
        assert!(parse_card("Ahx").is_err());
    }

    #[test]
    fn test_parse_board_with_separators() {
        let b = parse_board("Ks,7d,2c").unwrap();
        assert_eq!(b.len(), 3);
        assert_eq!(b[0].to_string(), "Ks");
        assert_eq!(b[2].to_string(), "2c");
        assert_eq!(parse_board("Ks 7d 2c").unwrap(), b);
    }

    #[test]
    fn test_is_card_code() {
        assert!(is_card_code("Kh"));
        assert!(is_card_code("2d"));
        assert!(!is_card_code("CHECK"));
        assert!(!is_card_code("BET 50"));
        assert!(!is_card_code("kh"));
    }

    #[test]
    fn test_split_combo() {
        let (a, b) = split_combo("AhKs").unwrap();
        assert_eq!(a, "Ah");
        assert_eq!(b, "Ks");
        assert!(split_combo("AhK").is_err());
        assert!(split_combo("FOLD").is_err());
    }
}
