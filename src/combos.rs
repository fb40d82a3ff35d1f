//! Combo canonicalization and suit-isomorphism resolution.
//!
//! Solver results store a suit-reduced subset of combos ("AsKs" standing in
//! for every suited AK), so a concrete holding often needs a permutation
//! search before its strategy vector can be found.

use std::collections::HashMap;

use itertools::Itertools;

use crate::cards::{parse_card, Card, SUITS_STR};
use crate::error::{TrainerError, TrainerResult};

/// Collapse two concrete cards into range-key notation:
/// higher rank first, "s" suited, "o" offsuit, bare for pairs.
/// "KsAs" -> "AKs", "7h7d" -> "77".
pub fn normalize(combo: &str) -> TrainerResult<String> {
    if combo.len() != 4 {
        return Err(TrainerError::InvalidComboNotation(combo.to_string()));
    }
    let c1 = parse_card(&combo[..2])?;
    let c2 = parse_card(&combo[2..])?;
    Ok(normalize_cards(c1, c2))
}

pub fn normalize_cards(c1: Card, c2: Card) -> String {
    let (hi, lo) = if c1.rank >= c2.rank { (c1, c2) } else { (c2, c1) };
    if hi.rank == lo.rank {
        return format!("{}{}", hi.rank.to_char(), lo.rank.to_char());
    }
    let suffix = if hi.suit == lo.suit { "s" } else { "o" };
    format!("{}{}{}", hi.rank.to_char(), lo.rank.to_char(), suffix)
}

/// Find the stored key for a concrete combo under suit isomorphism.
///
/// Direct lookup first, then both rank orderings against all 24 suit
/// permutations. Deterministic: permutations are tried in lexicographic
/// order, so the same combo always resolves to the same stored key.
pub fn resolve<'a, V>(strategy: &'a HashMap<String, V>, combo: &str) -> Option<&'a str> {
    if let Some((key, _)) = strategy.get_key_value(combo) {
        return Some(key.as_str());
    }
    if combo.len() != 4 {
        return None;
    }
    let b = combo.as_bytes();
    let orderings = [
        [b[0], b[1], b[2], b[3]],
        [b[2], b[3], b[0], b[1]],
    ];
    let suits: Vec<u8> = SUITS_STR.bytes().collect();
    for perm in suits.iter().copied().permutations(4) {
        let map = |s: u8| -> u8 {
            match SUITS_STR.bytes().position(|x| x == s) {
                Some(i) => perm[i],
                None => s,
            }
        };
        for ord in &orderings {
            let candidate: String = [ord[0], map(ord[1]), ord[2], map(ord[3])]
                .iter()
                .map(|&b| b as char)
                .collect();
            if let Some((key, _)) = strategy.get_key_value(&candidate) {
                return Some(key.as_str());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(keys: &[&str]) -> HashMap<String, Vec<f64>> {
        keys.iter().map(|k| (k.to_string(), vec![1.0])).collect()
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("KsAs").unwrap(), "AKs");
        assert_eq!(normalize("AhKs").unwrap(), "AKo");
        assert_eq!(normalize("7h7d").unwrap(), "77");
        assert!(normalize("AhK").is_err());
    }

    #[test]
    fn test_resolve_direct_hit_is_returned_unchanged() {
        let strat = table(&["AcKc"]);
        assert_eq!(resolve(&strat, "AcKc"), Some("AcKc"));
    }

    #[test]
    fn test_resolve_suit_permutation() {
        let strat = table(&["AsKs"]);
        assert_eq!(resolve(&strat, "AcKc"), Some("AsKs"));
    }

    #[test]
    fn test_resolve_rank_order_swap() {
        let strat = table(&["AcQc"]);
        assert_eq!(resolve(&strat, "QcAc"), Some("AcQc"));
    }

    #[test]
    fn test_resolve_absent() {
        let strat = table(&["AsKs"]);
        assert_eq!(resolve(&strat, "AhKd"), None);
    }
}
