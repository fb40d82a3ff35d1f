//! Strategy-tree document model and traversal.
//!
//! The solver dumps its solved game tree as a recursive JSON document:
//! action nodes carry an ordered map of action-label children plus a
//! per-combo strategy table; chance nodes carry a map of dealable cards.
//! The document is validated into a sum type once at load time and treated
//! as immutable afterwards.
//!
//! Every lookup here is total: a missing child means a terminal branch, a
//! missing combo falls back to the population average, a missing table to a
//! uniform split. Absence is data, never an error.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::cards::is_card_code;
use crate::combos;
use crate::error::TrainerResult;

// ---------------------------------------------------------------------------
// Document model
// ---------------------------------------------------------------------------

/// Which player acts at a node. The solver encodes `player: 0` for the
/// out-of-position player and `player: 1` for in-position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Actor {
    Ip,
    Oop,
}

impl Actor {
    pub fn as_str(self) -> &'static str {
        match self {
            Actor::Ip => "ip",
            Actor::Oop => "oop",
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str().to_uppercase().as_str())
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "node_type")]
pub enum Node {
    #[serde(rename = "action_node")]
    Action(ActionNode),
    #[serde(rename = "chance_node")]
    Chance(ChanceNode),
}

#[derive(Debug, Deserialize)]
pub struct ActionNode {
    /// 0 = OOP, 1 = IP. Older dumps omit the field.
    #[serde(default)]
    pub player: Option<u8>,
    /// Child order is positional: strategy-vector indices refer to it.
    #[serde(rename = "childrens", default, deserialize_with = "ordered_children")]
    pub children: Vec<(String, Node)>,
    #[serde(default)]
    strategy: Option<StrategyBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct StrategyBlock {
    #[serde(default)]
    strategy: HashMap<String, Vec<f64>>,
}

#[derive(Debug, Deserialize)]
pub struct ChanceNode {
    #[serde(
        rename = "dealcards",
        alias = "deal_cards",
        default,
        deserialize_with = "ordered_children"
    )]
    pub deals: Vec<(String, Node)>,
}

/// Keeps JSON insertion order; a sorted map would silently remap the
/// positional strategy indices.
fn ordered_children<'de, D>(deserializer: D) -> Result<Vec<(String, Node)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ChildVisitor;

    impl<'de> Visitor<'de> for ChildVisitor {
        type Value = Vec<(String, Node)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of child nodes")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut children = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, node)) = map.next_entry::<String, Node>()? {
                children.push((key, node));
            }
            Ok(children)
        }
    }

    deserializer.deserialize_map(ChildVisitor)
}

impl Node {
    /// Load and validate a solver result document.
    pub fn load(path: &Path) -> TrainerResult<Node> {
        let data = std::fs::read(path)?;
        Ok(serde_json::from_slice(&data)?)
    }

    pub fn child(&self, key: &str) -> Option<&Node> {
        let entries = match self {
            Node::Action(n) => &n.children,
            Node::Chance(n) => &n.deals,
        };
        entries.iter().find(|(k, _)| k == key).map(|(_, n)| n)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Node::Action(_) => "action_node",
            Node::Chance(_) => "chance_node",
        }
    }
}

impl ActionNode {
    /// The per-combo strategy table, if the solver dumped one at this depth.
    pub fn table(&self) -> Option<&HashMap<String, Vec<f64>>> {
        self.strategy
            .as_ref()
            .map(|b| &b.strategy)
            .filter(|t| !t.is_empty())
    }

    pub fn actor(&self) -> Option<Actor> {
        match self.player {
            Some(0) => Some(Actor::Oop),
            Some(1) => Some(Actor::Ip),
            _ => None,
        }
    }

    /// Whether this node belongs to the opponent of a hero playing
    /// `hero_role` with `hero_combo`.
    ///
    /// The solver's `player` field is authoritative. The fallback is a
    /// direct (non-isomorphic) combo lookup: iso matching would produce
    /// false positives when the villain range contains a suit-relabelled
    /// version of hero's combo.
    pub fn is_villain(&self, hero_role: Actor, hero_combo: &str) -> bool {
        if let Some(actor) = self.actor() {
            return actor != hero_role;
        }
        match self.table() {
            Some(table) => !table.contains_key(hero_combo),
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Traversal
// ---------------------------------------------------------------------------

/// One available action at a node: display label plus its index into the
/// strategy vectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionEntry {
    pub name: String,
    pub index: usize,
}

/// An action label paired with hero's GTO frequency for it.
#[derive(Debug, Clone, Serialize)]
pub struct ActionFreq {
    pub name: String,
    pub gto_freq: f64,
}

/// Follow `path` from `root`, treating each element as an action label
/// (action node) or card code (chance node). The first missing key halts
/// traversal: `None` means terminal or unavailable depth, never an error.
pub fn navigate<'a>(root: &'a Node, path: &[String]) -> Option<&'a Node> {
    let mut node = root;
    for step in path {
        node = node.child(step)?;
    }
    Some(node)
}

/// Derive the ordered action list at a node.
///
/// The solver omits FOLD children with no subtree; when a combo's strategy
/// vector is one longer than the child list, index 0 is an implicit FOLD.
pub fn action_entries(node: &ActionNode) -> Vec<ActionEntry> {
    let labels: Vec<&String> = node.children.iter().map(|(k, _)| k).collect();
    if let Some(table) = node.table() {
        let vector_len = table.values().next().map(|v| v.len()).unwrap_or(0);
        if vector_len == labels.len() + 1 {
            let mut entries = vec![ActionEntry {
                name: "FOLD".to_string(),
                index: 0,
            }];
            entries.extend(labels.iter().enumerate().map(|(i, k)| ActionEntry {
                name: (*k).clone(),
                index: i + 1,
            }));
            return entries;
        }
    }
    labels
        .iter()
        .enumerate()
        .map(|(i, k)| ActionEntry {
            name: (*k).clone(),
            index: i,
        })
        .collect()
}

/// Mean frequency at `index` across every combo's vector.
pub fn population_average(table: &HashMap<String, Vec<f64>>, index: usize) -> f64 {
    let values: Vec<f64> = table
        .values()
        .filter(|v| v.len() > index)
        .map(|v| v[index])
        .collect();
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// The full population-average vector over `len` entries.
pub fn average_vector(table: &HashMap<String, Vec<f64>>, len: usize) -> Vec<f64> {
    (0..len).map(|i| population_average(table, i)).collect()
}

/// GTO frequency of `action_name` for `combo` at `node`.
///
/// Total function: no table yields a uniform split, an unknown action
/// yields 0, an unresolvable combo yields the population average so that
/// analysis can proceed for combos outside the solved isomorphism classes.
pub fn frequency_for(node: &ActionNode, combo: &str, action_name: &str) -> f64 {
    let entries = action_entries(node);
    let table = match node.table() {
        Some(t) => t,
        None => return 1.0 / entries.len().max(1) as f64,
    };
    let entry = match entries.iter().find(|e| e.name == action_name) {
        Some(e) => e,
        None => return 0.0,
    };
    match combos::resolve(table, combo) {
        Some(key) => {
            let vector = &table[key];
            if entry.index < vector.len() {
                vector[entry.index]
            } else {
                0.0
            }
        }
        None => population_average(table, entry.index),
    }
}

/// Ordered available actions with hero-combo frequencies, rounded the way
/// callers display them.
pub fn available_actions(node: &ActionNode, hero_combo: &str) -> Vec<ActionFreq> {
    action_entries(node)
        .iter()
        .map(|e| ActionFreq {
            name: e.name.clone(),
            gto_freq: round4(frequency_for(node, hero_combo, &e.name)),
        })
        .collect()
}

pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

// ---------------------------------------------------------------------------
// Streets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Street {
    Flop,
    Turn,
    River,
}

impl fmt::Display for Street {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Street::Flop => f.write_str("flop"),
            Street::Turn => f.write_str("turn"),
            Street::River => f.write_str("river"),
        }
    }
}

/// Street is derived purely from how many cards have been dealt along the
/// path; the initial board is the flop.
pub fn street_for_path(path: &[String]) -> Street {
    match path.iter().filter(|step| is_card_code(step)).count() {
        0 => Street::Flop,
        1 => Street::Turn,
        _ => Street::River,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn node_from_json(value: serde_json::Value) -> Node {
        serde_json::from_value(value).unwrap()
    }

    fn action_node(value: serde_json::Value) -> ActionNode {
        match node_from_json(value) {
            Node::Action(n) => n,
            Node::Chance(_) => panic!("expected action node"),
        }
    }

    #[test]
    fn test_deserialize_preserves_child_order() {
        let node = action_node(serde_json::json!({
            "node_type": "action_node",
            "player": 1,
            "childrens": {
                "CHECK": {"node_type": "action_node", "childrens": {}},
                "BET 50": {"node_type": "action_node", "childrens": {}},
                "BET 100": {"node_type": "action_node", "childrens": {}}
            }
        }));
        let labels: Vec<&str> = node.children.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(labels, vec!["CHECK", "BET 50", "BET 100"]);
    }

    #[test]
    fn test_unknown_node_type_rejected_at_load() {
        let result: Result<Node, _> = serde_json::from_value(serde_json::json!({
            "node_type": "mystery_node"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_fold_synthesis() {
        let node = action_node(serde_json::json!({
            "node_type": "action_node",
            "player": 0,
            "childrens": {
                "CALL": {"node_type": "action_node", "childrens": {}},
                "RAISE 100": {"node_type": "action_node", "childrens": {}}
            },
            "strategy": {"strategy": {"AsKs": [0.2, 0.5, 0.3]}}
        }));
        let entries = action_entries(&node);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].name, "FOLD");
        assert_eq!(entries[0].index, 0);
        assert_eq!(entries[1].name, "CALL");
        assert_eq!(entries[1].index, 1);
    }

    #[test]
    fn test_no_fold_synthesis_when_lengths_match() {
        let node = action_node(serde_json::json!({
            "node_type": "action_node",
            "player": 0,
            "childrens": {
                "CHECK": {"node_type": "action_node", "childrens": {}},
                "BET 50": {"node_type": "action_node", "childrens": {}}
            },
            "strategy": {"strategy": {"AsKs": [0.6, 0.4]}}
        }));
        let entries = action_entries(&node);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "CHECK");
    }

    #[test]
    fn test_frequency_iso_resolution_beats_population_average() {
        let node = action_node(serde_json::json!({
            "node_type": "action_node",
            "player": 1,
            "childrens": {
                "CHECK": {"node_type": "action_node", "childrens": {}},
                "BET 50": {"node_type": "action_node", "childrens": {}}
            },
            "strategy": {"strategy": {
                "AsKs": [0.9, 0.1],
                "7d6d": [0.1, 0.9]
            }}
        }));
        // AcKc not stored; must land on AsKs via isomorphism, not the mean.
        let freq = frequency_for(&node, "AcKc", "CHECK");
        assert!((freq - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_frequency_population_average_for_unmatched_combo() {
        let node = action_node(serde_json::json!({
            "node_type": "action_node",
            "player": 1,
            "childrens": {
                "CHECK": {"node_type": "action_node", "childrens": {}},
                "BET 50": {"node_type": "action_node", "childrens": {}}
            },
            "strategy": {"strategy": {
                "AsKs": [0.8, 0.2],
                "QhQd": [0.4, 0.6]
            }}
        }));
        // 7c2c maps to neither key under suit relabeling.
        let freq = frequency_for(&node, "7c2c", "CHECK");
        assert!((freq - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_frequency_uniform_without_table() {
        let node = action_node(serde_json::json!({
            "node_type": "action_node",
            "player": 1,
            "childrens": {
                "CHECK": {"node_type": "action_node", "childrens": {}},
                "BET 50": {"node_type": "action_node", "childrens": {}}
            }
        }));
        assert!((frequency_for(&node, "AcKc", "CHECK") - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_navigate_missing_key_is_terminal() {
        let root = node_from_json(serde_json::json!({
            "node_type": "action_node",
            "player": 0,
            "childrens": {
                "CHECK": {"node_type": "action_node", "childrens": {}}
            }
        }));
        assert!(navigate(&root, &["CHECK".to_string()]).is_some());
        assert!(navigate(&root, &["BET 50".to_string()]).is_none());
        assert!(navigate(&root, &[]).is_some());
    }

    #[test]
    fn test_chance_node_deal_keys() {
        let root = node_from_json(serde_json::json!({
            "node_type": "chance_node",
            "dealcards": {
                "2h": {"node_type": "action_node", "childrens": {}},
                "Kd": {"node_type": "action_node", "childrens": {}}
            }
        }));
        assert!(root.child("2h").is_some());
        assert!(root.child("As").is_none());
    }

    #[test]
    fn test_street_for_path() {
        let path = |steps: &[&str]| steps.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(street_for_path(&path(&["CHECK", "BET 50"])), Street::Flop);
        assert_eq!(street_for_path(&path(&["CHECK", "Kh"])), Street::Turn);
        assert_eq!(
            street_for_path(&path(&["CHECK", "Kh", "CALL", "2d"])),
            Street::River
        );
    }

    #[test]
    fn test_is_villain_prefers_player_field() {
        let node = action_node(serde_json::json!({
            "node_type": "action_node",
            "player": 0,
            "childrens": {},
            "strategy": {"strategy": {"AsKs": [1.0]}}
        }));
        assert!(node.is_villain(Actor::Ip, "AsKs"));
        assert!(!node.is_villain(Actor::Oop, "AsKs"));
    }

    #[test]
    fn test_is_villain_fallback_direct_lookup() {
        let node = action_node(serde_json::json!({
            "node_type": "action_node",
            "childrens": {},
            "strategy": {"strategy": {"AsKs": [1.0]}}
        }));
        assert!(!node.is_villain(Actor::Ip, "AsKs"));
        // AcKc is isomorphic to AsKs but absent: villain node.
        assert!(node.is_villain(Actor::Ip, "AcKc"));
    }
}
