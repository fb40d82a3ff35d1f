//! Grading of human decisions against equilibrium frequencies, for both
//! live training sessions and post-hoc analysis of real played hands.
//!
//! The hand-history walk is deliberately forgiving: solved trees may be
//! shallow (no turn/river dump), the exact runout card may be missing from
//! a chance node, and real bet sizes rarely match solver labels exactly.
//! Every such gap degrades to a best-effort substitute or an early stop
//! with the decisions collected so far.

use std::collections::HashMap;
use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::combos;
use crate::error::TrainerResult;
use crate::tree::{
    action_entries, available_actions, frequency_for, navigate, round4, ActionEntry, ActionFreq,
    Actor, Node, Street,
};

// ---------------------------------------------------------------------------
// Grades
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    Best,
    Correct,
    Inaccuracy,
    Wrong,
    Blunder,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grade::Best => f.write_str("best"),
            Grade::Correct => f.write_str("correct"),
            Grade::Inaccuracy => f.write_str("inaccuracy"),
            Grade::Wrong => f.write_str("wrong"),
            Grade::Blunder => f.write_str("blunder"),
        }
    }
}

/// Map an observed GTO frequency to a qualitative grade. Total and exact
/// at the boundaries: 0.75 is still best, 0.05 is still wrong.
pub fn grade(gto_freq: f64) -> Grade {
    if gto_freq >= 0.75 {
        Grade::Best
    } else if gto_freq >= 0.40 {
        Grade::Correct
    } else if gto_freq >= 0.15 {
        Grade::Inaccuracy
    } else if gto_freq >= 0.05 {
        Grade::Wrong
    } else {
        Grade::Blunder
    }
}

// ---------------------------------------------------------------------------
// Hand action records (structured output of the hand-history parser)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    Checks,
    Calls,
    Folds,
    Bets,
    Raises,
}

impl Verb {
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Checks => "checks",
            Verb::Calls => "calls",
            Verb::Folds => "folds",
            Verb::Bets => "bets",
            Verb::Raises => "raises",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HandAction {
    #[serde(default)]
    pub actor: String,
    pub is_hero: bool,
    #[serde(alias = "action")]
    pub verb: Verb,
    #[serde(default)]
    pub amount: Option<f64>,
}

/// Per-street ordered action lists for one played hand.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HandActions {
    #[serde(default)]
    pub flop: Vec<HandAction>,
    #[serde(default)]
    pub turn: Vec<HandAction>,
    #[serde(default)]
    pub river: Vec<HandAction>,
}

impl HandActions {
    fn for_street(&self, street: Street) -> &[HandAction] {
        match street {
            Street::Flop => &self.flop,
            Street::Turn => &self.turn,
            Street::River => &self.river,
        }
    }
}

/// Map a recorded action verb to the nearest solver child label.
///
/// Bet and raise sizes match by prefix, taking the lexicographically first
/// label: a deliberate approximation, not a nearest-size search.
pub fn map_verb_to_action(verb: Verb, children: &[String]) -> Option<String> {
    let exact = |label: &str| children.iter().find(|c| *c == label).cloned();
    match verb {
        Verb::Checks => exact("CHECK"),
        Verb::Calls => exact("CALL"),
        Verb::Folds => exact("FOLD"),
        Verb::Bets | Verb::Raises => {
            let prefix = if verb == Verb::Bets { "BET" } else { "RAISE" };
            let mut matches: Vec<&String> =
                children.iter().filter(|c| c.starts_with(prefix)).collect();
            matches.sort();
            matches.first().map(|s| (*s).clone())
        }
    }
}

// ---------------------------------------------------------------------------
// Hand-history analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct GtoDecision {
    pub street: Street,
    pub hero_verb: Verb,
    pub matched_action: Option<String>,
    pub gto_actions: Vec<ActionFreq>,
    pub hero_freq: f64,
    pub grade: Grade,
    /// Raw per-combo strategy table at the decision node, for range display.
    pub strategy_snapshot: Option<HashMap<String, Vec<f64>>>,
    pub action_entries: Vec<ActionEntry>,
}

/// Replay a real hand's action sequence through a solved tree, grading
/// every hero decision along the way.
///
/// `turn_card`/`river_card` are the actual runout when known; chance nodes
/// prefer them and fall back to an arbitrary available card. A tree that
/// lacks a street's depth ends the walk gracefully with the decisions
/// collected so far.
pub fn analyze_hand(
    root: &Node,
    hero_combo: &str,
    actions: &HandActions,
    turn_card: Option<&str>,
    river_card: Option<&str>,
) -> TrainerResult<Vec<GtoDecision>> {
    let (hero_c1, hero_c2) = crate::cards::split_combo(hero_combo)?;
    let mut decisions = Vec::new();
    let mut node_path: Vec<String> = Vec::new();

    let streets = [
        (Street::Flop, None),
        (Street::Turn, turn_card),
        (Street::River, river_card),
    ];

    for (street, street_card) in streets {
        let street_actions = actions.for_street(street);
        if street_actions.is_empty() {
            break;
        }

        let mut current = match navigate(root, &node_path) {
            Some(node) => node,
            None => break,
        };

        if let (Some(card), Node::Chance(chance)) = (street_card, current) {
            if chance.deals.is_empty() {
                warn!("tree has no {} data; stopping analysis early", street);
                break;
            }
            let is_hero_card = |c: &str| c == hero_c1 || c == hero_c2;
            if chance.deals.iter().any(|(c, _)| c == card) && !is_hero_card(card) {
                node_path.push(card.to_string());
            } else {
                let substitute = chance
                    .deals
                    .iter()
                    .map(|(c, _)| c)
                    .find(|c| !is_hero_card(c));
                match substitute {
                    Some(c) => {
                        warn!("{} card {} not dealable; substituting {}", street, card, c);
                        node_path.push(c.clone());
                    }
                    None => break,
                }
            }
            current = match navigate(root, &node_path) {
                Some(node) => node,
                None => break,
            };
        }

        for action_data in street_actions {
            let action = match current {
                Node::Action(a) => a,
                Node::Chance(_) => break,
            };
            if action.children.is_empty() {
                break;
            }
            let children: Vec<String> =
                action.children.iter().map(|(k, _)| k.clone()).collect();
            let solver_action = map_verb_to_action(action_data.verb, &children);

            if action_data.is_hero {
                let hero_freq = solver_action
                    .as_deref()
                    .map(|label| frequency_for(action, hero_combo, label))
                    .unwrap_or(0.0);
                decisions.push(GtoDecision {
                    street,
                    hero_verb: action_data.verb,
                    matched_action: solver_action.clone(),
                    gto_actions: available_actions(action, hero_combo),
                    hero_freq: round4(hero_freq),
                    grade: grade(hero_freq),
                    strategy_snapshot: action.table().cloned(),
                    action_entries: action_entries(action),
                });
            }

            match solver_action {
                Some(label) if children.contains(&label) => {
                    node_path.push(label);
                    current = match navigate(root, &node_path) {
                        Some(node) => node,
                        None => return Ok(decisions),
                    };
                }
                _ => return Ok(decisions),
            }
        }
    }

    Ok(decisions)
}

/// The canonical solver key for hero's combo, discovered from the first
/// decision that carries a strategy snapshot.
pub fn hero_iso_combo(decisions: &[GtoDecision], hero_combo: &str) -> Option<String> {
    decisions
        .iter()
        .filter_map(|d| d.strategy_snapshot.as_ref())
        .find_map(|table| combos::resolve(table, hero_combo).map(|s| s.to_string()))
}

// ---------------------------------------------------------------------------
// Matchup resolution for hand analysis
// ---------------------------------------------------------------------------

/// Postflop acting order: leftmost acts first (most OOP).
const POSTFLOP_POSITION_ORDER: [&str; 6] = ["SB", "BB", "EP", "HJ", "CO", "BTN"];

/// 'ip' when hero acts after villain postflop.
pub fn postflop_role(hero_pos: &str, villain_pos: &str) -> Option<Actor> {
    let index = |p: &str| POSTFLOP_POSITION_ORDER.iter().position(|x| *x == p);
    let h = index(hero_pos)?;
    let v = index(villain_pos)?;
    Some(if h > v { Actor::Ip } else { Actor::Oop })
}

/// Best available solved matchup for a hero position, plus hero's role in
/// it. BB assumes a BTN opener (the most common single-raised pot); EP has
/// no solved spot.
pub fn resolve_matchup(hero_pos: &str) -> Option<(&'static str, Actor)> {
    let (matchup, villain) = match hero_pos {
        "BTN" => ("BTN_vs_BB", "BB"),
        "CO" => ("CO_vs_BB", "BB"),
        "HJ" => ("HJ_vs_BB", "BB"),
        "SB" => ("SB_vs_BB", "BB"),
        "BB" => ("BTN_vs_BB", "BTN"),
        _ => return None,
    };
    let role = postflop_role(hero_pos, villain)?;
    Some((matchup, role))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_boundaries_exact() {
        assert_eq!(grade(0.75), Grade::Best);
        assert_eq!(grade(0.749999), Grade::Correct);
        assert_eq!(grade(0.40), Grade::Correct);
        assert_eq!(grade(0.15), Grade::Inaccuracy);
        assert_eq!(grade(0.05), Grade::Wrong);
        assert_eq!(grade(0.049), Grade::Blunder);
        assert_eq!(grade(0.0), Grade::Blunder);
        assert_eq!(grade(1.0), Grade::Best);
    }

    #[test]
    fn test_map_verb_exact_labels() {
        let children = vec!["CHECK".to_string(), "BET 50".to_string()];
        assert_eq!(
            map_verb_to_action(Verb::Checks, &children),
            Some("CHECK".to_string())
        );
        assert_eq!(map_verb_to_action(Verb::Calls, &children), None);
        assert_eq!(map_verb_to_action(Verb::Folds, &children), None);
    }

    #[test]
    fn test_map_verb_prefix_takes_lexicographically_first() {
        let children = vec![
            "CHECK".to_string(),
            "BET 75".to_string(),
            "BET 150".to_string(),
        ];
        // "BET 150" sorts before "BET 75" as a string.
        assert_eq!(
            map_verb_to_action(Verb::Bets, &children),
            Some("BET 150".to_string())
        );
        assert_eq!(map_verb_to_action(Verb::Raises, &children), None);
    }

    #[test]
    fn test_postflop_role() {
        assert_eq!(postflop_role("BTN", "BB"), Some(Actor::Ip));
        assert_eq!(postflop_role("SB", "BB"), Some(Actor::Oop));
        assert_eq!(postflop_role("BB", "BTN"), Some(Actor::Oop));
        assert_eq!(postflop_role("XX", "BB"), None);
    }

    #[test]
    fn test_resolve_matchup() {
        assert_eq!(resolve_matchup("BTN"), Some(("BTN_vs_BB", Actor::Ip)));
        assert_eq!(resolve_matchup("SB"), Some(("SB_vs_BB", Actor::Oop)));
        assert_eq!(resolve_matchup("BB"), Some(("BTN_vs_BB", Actor::Oop)));
        assert_eq!(resolve_matchup("EP"), None);
    }
}
