//! Range shorthand expansion into concrete combos.
//!
//! Solver ranges arrive as comma-separated tokens like
//! "AA,AKs,AJo:0.75,99:0.5". The frequency suffix marks how often a hand is
//! in the range; for expansion purposes any nonzero-frequency token counts.

use std::collections::HashSet;

use crate::cards::{parse_card, Card, ALL_SUITS};
use crate::error::{TrainerError, TrainerResult};

/// Expand a range string into concrete 4-char combos, dropping any combo
/// that shares a card with `excluded` (board plus any other dead cards).
///
/// An empty result means every candidate collided with a dead card; callers
/// must treat that as a data-integrity fault, not a normal outcome.
pub fn expand(range_str: &str, excluded: &[Card]) -> TrainerResult<Vec<String>> {
    let dead: HashSet<Card> = excluded.iter().copied().collect();
    let mut combos = Vec::new();
    for token in range_str.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let (hand, freq) = split_frequency(token)?;
        if freq <= 0.0 {
            continue;
        }
        for (c1, c2) in hand_combos(hand)? {
            if !dead.contains(&c1) && !dead.contains(&c2) {
                combos.push(format!("{}{}", c1, c2));
            }
        }
    }
    Ok(combos)
}

fn split_frequency(token: &str) -> TrainerResult<(&str, f64)> {
    match token.split_once(':') {
        None => Ok((token, 1.0)),
        Some((hand, freq)) => {
            let freq: f64 = freq
                .trim()
                .parse()
                .map_err(|_| TrainerError::InvalidComboNotation(token.to_string()))?;
            Ok((hand.trim(), freq))
        }
    }
}

/// Expand one shorthand token to concrete card pairs:
/// 6 for a pair, 4 suited, 12 offsuit.
fn hand_combos(hand: &str) -> TrainerResult<Vec<(Card, Card)>> {
    let chars: Vec<char> = hand.chars().collect();

    if chars.len() == 2 && chars[0] == chars[1] {
        let rank = crate::cards::Rank::from_char(chars[0])?;
        let mut combos = Vec::new();
        for i in 0..ALL_SUITS.len() {
            for j in (i + 1)..ALL_SUITS.len() {
                combos.push((
                    Card::new(rank, ALL_SUITS[i]),
                    Card::new(rank, ALL_SUITS[j]),
                ));
            }
        }
        return Ok(combos);
    }

    if chars.len() == 3 {
        let r1 = crate::cards::Rank::from_char(chars[0])?;
        let r2 = crate::cards::Rank::from_char(chars[1])?;
        match chars[2] {
            's' => {
                return Ok(ALL_SUITS
                    .iter()
                    .map(|&s| (Card::new(r1, s), Card::new(r2, s)))
                    .collect());
            }
            'o' => {
                let mut combos = Vec::new();
                for &s1 in &ALL_SUITS {
                    for &s2 in &ALL_SUITS {
                        if s1 != s2 {
                            combos.push((Card::new(r1, s1), Card::new(r2, s2)));
                        }
                    }
                }
                return Ok(combos);
            }
            _ => {}
        }
    }

    // Specific combo: "AsKh"
    if chars.len() == 4 {
        let c1 = parse_card(&hand[..2])?;
        let c2 = parse_card(&hand[2..])?;
        return Ok(vec![(c1, c2)]);
    }

    Err(TrainerError::InvalidComboNotation(hand.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::parse_board;

    #[test]
    fn test_expand_counts() {
        assert_eq!(expand("AA", &[]).unwrap().len(), 6);
        assert_eq!(expand("AKs", &[]).unwrap().len(), 4);
        assert_eq!(expand("AKo", &[]).unwrap().len(), 12);
        assert_eq!(expand("AA,AKs,AKo", &[]).unwrap().len(), 22);
    }

    #[test]
    fn test_expand_strips_frequency_suffix() {
        assert_eq!(expand("99:0.5", &[]).unwrap().len(), 6);
        assert_eq!(expand("AJo:0.75", &[]).unwrap().len(), 12);
        assert!(expand("99:0", &[]).unwrap().is_empty());
    }

    #[test]
    fn test_expand_removes_dead_cards() {
        let board = parse_board("AcKc2d").unwrap();
        let combos = expand("AKs", &board).unwrap();
        // AcKc blocked, three suited combos remain
        assert_eq!(combos.len(), 3);
        assert!(!combos.contains(&"AcKc".to_string()));
    }

    #[test]
    fn test_expand_no_duplicates() {
        let combos = expand("AKs,AKo", &[]).unwrap();
        let unique: std::collections::HashSet<_> = combos.iter().collect();
        assert_eq!(unique.len(), combos.len());
    }

    #[test]
    fn test_expand_fully_blocked_is_empty() {
        let dead = parse_board("AcAdAhAs").unwrap();
        assert!(expand("AA", &dead).unwrap().is_empty());
    }

    #[test]
    fn test_expand_invalid_token() {
        assert!(expand("ZZ", &[]).is_err());
    }
}
