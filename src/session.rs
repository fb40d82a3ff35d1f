//! Interactive training sessions: a resumable state machine that walks a
//! solved strategy tree, auto-advancing through chance deals and villain
//! actions until the hero has a decision to make.
//!
//! Sessions are process-local and short-lived. The engine talks to a
//! `SessionStore` abstraction rather than ambient state so tests can
//! inspect it and a durable store can be slotted in later.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::info;
use rand::Rng;
use serde::Serialize;

use crate::cards::{is_card_code, parse_board, split_combo};
use crate::error::{TrainerError, TrainerResult};
use crate::range;
use crate::sampler;
use crate::spots::{scenario_context, SpotLibrary, TrainerSpot, TreeCache};
use crate::stats::ScoreBook;
use crate::tree::{
    self, action_entries, available_actions, frequency_for, navigate, round4, ActionEntry,
    ActionFreq, Actor, Node, Street,
};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One step of the visible hand history, tagged by who produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum HistoryEvent {
    Dealt(String),
    Villain(String),
    Hero(String),
}

impl fmt::Display for HistoryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryEvent::Dealt(card) => write!(f, "[{}]", card),
            HistoryEvent::Villain(action) => write!(f, "V:{}", action),
            HistoryEvent::Hero(action) => write!(f, "H:{}", action),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DecisionRecord {
    pub node_path: Vec<String>,
    pub chosen_action: String,
    pub gto_freq: f64,
    pub all_actions: Vec<ActionFreq>,
    pub pot_weight: f64,
    pub street: Street,
}

/// In-flight session state. Not durable: a process restart loses it, which
/// is acceptable because sessions are short and cheap to restart.
pub struct Session {
    pub id: String,
    pub player: String,
    pub spot_key: String,
    pub position_matchup: String,
    pub scenario_context: String,
    pub tree: Arc<Node>,
    pub hero_combo: String,
    pub hero_role: Actor,
    pub board: String,
    pub initial_pot: u32,
    pub effective_stack: u32,
    pub node_path: Vec<String>,
    pub extra_board_cards: Vec<String>,
    pub decisions: Vec<DecisionRecord>,
    pub action_history: Vec<HistoryEvent>,
}

impl Session {
    /// Board string including any cards dealt during auto-advance.
    pub fn board_string(&self) -> String {
        if self.extra_board_cards.is_empty() {
            self.board.clone()
        } else {
            format!("{},{}", self.board, self.extra_board_cards.join(","))
        }
    }
}

// ---------------------------------------------------------------------------
// Session store
// ---------------------------------------------------------------------------

pub trait SessionStore {
    fn insert(&mut self, session: Session);
    fn get(&self, id: &str) -> Option<&Session>;
    fn get_mut(&mut self, id: &str) -> Option<&mut Session>;
    fn remove(&mut self, id: &str) -> Option<Session>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Default)]
pub struct MemoryStore {
    sessions: HashMap<String, Session>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }
}

impl SessionStore for MemoryStore {
    fn insert(&mut self, session: Session) {
        self.sessions.insert(session.id.clone(), session);
    }

    fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Session> {
        self.sessions.get_mut(id)
    }

    fn remove(&mut self, id: &str) -> Option<Session> {
        self.sessions.remove(id)
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }
}

// ---------------------------------------------------------------------------
// Outward shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct GameState {
    pub session_id: String,
    pub hero_combo: String,
    pub hero_role: Actor,
    pub board: String,
    pub pot: u32,
    pub effective_stack: u32,
    pub node_path: Vec<String>,
    pub node_kind: String,
    pub available_actions: Vec<ActionFreq>,
    pub villain_action: Option<String>,
    pub is_terminal: bool,
    pub street: Street,
    pub scenario_context: String,
    pub action_history: Vec<HistoryEvent>,
    pub position_matchup: String,
}

#[derive(Debug, Serialize)]
pub struct CompleteOut {
    pub gto_score: f64,
    pub decisions: Vec<DecisionRecord>,
}

/// Raw strategy table at a node, for range-matrix rendering.
#[derive(Debug, Serialize)]
pub struct NodeStrategy {
    pub strategy: HashMap<String, Vec<f64>>,
    pub entries: Vec<ActionEntry>,
}

// ---------------------------------------------------------------------------
// Auto-advance
// ---------------------------------------------------------------------------

/// Advance through chance nodes (uniform deal, hero's cards excluded) and
/// villain action nodes (policy sample) until a hero decision or terminal.
/// Returns the cards dealt and the last villain action along the way.
fn advance_to_hero<R: Rng>(
    root: &Node,
    path: &mut Vec<String>,
    hero_role: Actor,
    hero_combo: &str,
    rng: &mut R,
) -> TrainerResult<(Vec<String>, Option<String>)> {
    let (hero_c1, hero_c2) = split_combo(hero_combo)?;
    let mut dealt = Vec::new();
    let mut last_villain_action = None;

    loop {
        let node = match navigate(root, path) {
            Some(n) => n,
            None => break,
        };
        match node {
            Node::Chance(chance) => {
                let dealable: Vec<&String> = chance
                    .deals
                    .iter()
                    .map(|(card, _)| card)
                    .filter(|card| **card != hero_c1 && **card != hero_c2)
                    .collect();
                if dealable.is_empty() {
                    break;
                }
                let card = dealable[rng.gen_range(0..dealable.len())].clone();
                path.push(card.clone());
                dealt.push(card);
            }
            Node::Action(action) => {
                if !action.is_villain(hero_role, hero_combo) {
                    break;
                }
                match sampler::sample(action, None, rng) {
                    Some(label) => {
                        path.push(label.clone());
                        last_villain_action = Some(label);
                    }
                    None => break,
                }
            }
        }
    }
    Ok((dealt, last_villain_action))
}

fn history_event_for(step: &str) -> HistoryEvent {
    if is_card_code(step) {
        HistoryEvent::Dealt(step.to_string())
    } else {
        HistoryEvent::Villain(step.to_string())
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct SessionEngine {
    library: SpotLibrary,
    cache: TreeCache,
    store: Box<dyn SessionStore>,
    scores: ScoreBook,
}

impl SessionEngine {
    pub fn new(library: SpotLibrary, cache: TreeCache) -> SessionEngine {
        SessionEngine::with_store(library, cache, Box::new(MemoryStore::new()))
    }

    pub fn with_store(
        library: SpotLibrary,
        cache: TreeCache,
        store: Box<dyn SessionStore>,
    ) -> SessionEngine {
        SessionEngine {
            library,
            cache,
            store,
            scores: ScoreBook::new(),
        }
    }

    pub fn library(&self) -> &SpotLibrary {
        &self.library
    }

    pub fn scores(&self) -> &ScoreBook {
        &self.scores
    }

    pub fn scores_mut(&mut self) -> &mut ScoreBook {
        &mut self.scores
    }

    pub fn open_sessions(&self) -> usize {
        self.store.len()
    }

    /// Start a session on a specific spot (or a random ready one): draw a
    /// hero role and combo, then auto-advance to hero's first decision.
    pub fn start<R: Rng>(
        &mut self,
        spot_key: Option<&str>,
        player: &str,
        rng: &mut R,
    ) -> TrainerResult<GameState> {
        let spot: TrainerSpot = self.library.select(spot_key, rng)?.clone();
        let tree = self.cache.get_or_load(&spot)?;

        let hero_role = if rng.gen::<bool>() { Actor::Ip } else { Actor::Oop };
        let board_cards = parse_board(&spot.board)?;
        let combos = range::expand(spot.range_for(hero_role), &board_cards)?;
        if combos.is_empty() {
            return Err(TrainerError::EmptyExpansion);
        }
        let hero_combo = combos[rng.gen_range(0..combos.len())].clone();

        let mut node_path = Vec::new();
        let (dealt, villain_action) =
            advance_to_hero(&tree, &mut node_path, hero_role, &hero_combo, rng)?;
        if navigate(&tree, &node_path).is_none() {
            return Err(TrainerError::RootUnreachable);
        }

        let action_history: Vec<HistoryEvent> =
            node_path.iter().map(|s| history_event_for(s)).collect();
        let session = Session {
            id: format!("{:016x}", rng.gen::<u64>()),
            player: player.to_string(),
            spot_key: spot.spot_key.clone(),
            position_matchup: spot.position_matchup.clone(),
            scenario_context: scenario_context(&spot.position_matchup, hero_role),
            tree: Arc::clone(&tree),
            hero_combo,
            hero_role,
            board: spot.board.clone(),
            initial_pot: spot.pot,
            effective_stack: spot.effective_stack,
            node_path,
            extra_board_cards: dealt,
            decisions: Vec::new(),
            action_history,
        };
        info!(
            "session {} started: {} as {} holding {}",
            session.id, session.spot_key, session.hero_role, session.hero_combo
        );

        let state = self.game_state(&session, spot.pot, villain_action);
        self.store.insert(session);
        Ok(state)
    }

    /// Record hero's decision at the current node, then auto-advance to the
    /// next hero decision or terminal.
    pub fn submit_action<R: Rng>(
        &mut self,
        session_id: &str,
        chosen_action: &str,
        pot_at_decision: u32,
        rng: &mut R,
    ) -> TrainerResult<GameState> {
        let session = self
            .store
            .get_mut(session_id)
            .ok_or_else(|| TrainerError::SessionNotFound(session_id.to_string()))?;
        let tree = Arc::clone(&session.tree);

        let node = navigate(&tree, &session.node_path).ok_or(TrainerError::RootUnreachable)?;
        let action = match node {
            Node::Action(a) => a,
            Node::Chance(_) => return Err(TrainerError::RootUnreachable),
        };

        session.decisions.push(DecisionRecord {
            node_path: session.node_path.clone(),
            chosen_action: chosen_action.to_string(),
            gto_freq: frequency_for(action, &session.hero_combo, chosen_action),
            all_actions: available_actions(action, &session.hero_combo),
            pot_weight: f64::from(pot_at_decision) / f64::from(session.initial_pot.max(1)),
            street: tree::street_for_path(&session.node_path),
        });

        session
            .action_history
            .push(HistoryEvent::Hero(chosen_action.to_string()));
        session.node_path.push(chosen_action.to_string());

        let hero_role = session.hero_role;
        let hero_combo = session.hero_combo.clone();
        let prior_len = session.node_path.len();
        let (dealt, villain_action) =
            advance_to_hero(&tree, &mut session.node_path, hero_role, &hero_combo, rng)?;
        let appended: Vec<String> = session.node_path[prior_len..].to_vec();
        for step in &appended {
            session.action_history.push(history_event_for(step));
        }
        session.extra_board_cards.extend(dealt);

        let state = {
            let session = self
                .store
                .get(session_id)
                .ok_or_else(|| TrainerError::SessionNotFound(session_id.to_string()))?;
            self.game_state(session, pot_at_decision, villain_action)
        };
        Ok(state)
    }

    /// Finish a session: score it, fold the score into the aggregates and
    /// drop the session. Completing twice yields `SessionNotFound`.
    pub fn complete(&mut self, session_id: &str) -> TrainerResult<CompleteOut> {
        let session = self
            .store
            .remove(session_id)
            .ok_or_else(|| TrainerError::SessionNotFound(session_id.to_string()))?;

        let gto_score = if session.decisions.is_empty() {
            0.0
        } else {
            let sum: f64 = session.decisions.iter().map(|d| d.gto_freq).sum();
            round4(sum / session.decisions.len() as f64)
        };

        if !session.decisions.is_empty() {
            self.scores.record(
                &session.player,
                &session.spot_key,
                session.hero_role,
                gto_score,
            );
        }
        info!(
            "session {} complete: score {:.4} over {} decisions",
            session.id,
            gto_score,
            session.decisions.len()
        );

        Ok(CompleteOut {
            gto_score,
            decisions: session.decisions,
        })
    }

    /// The raw strategy table at a node path of a live session.
    pub fn node_strategy(&self, session_id: &str, path: &[String]) -> TrainerResult<NodeStrategy> {
        let session = self
            .store
            .get(session_id)
            .ok_or_else(|| TrainerError::SessionNotFound(session_id.to_string()))?;
        match navigate(&session.tree, path) {
            Some(Node::Action(action)) => Ok(NodeStrategy {
                strategy: action.table().cloned().unwrap_or_default(),
                entries: action_entries(action),
            }),
            _ => Err(TrainerError::RootUnreachable),
        }
    }

    fn game_state(
        &self,
        session: &Session,
        pot: u32,
        villain_action: Option<String>,
    ) -> GameState {
        let (node_kind, actions) = match navigate(&session.tree, &session.node_path) {
            Some(Node::Action(action)) => (
                "action_node".to_string(),
                available_actions(action, &session.hero_combo),
            ),
            Some(Node::Chance(_)) => ("chance_node".to_string(), Vec::new()),
            None => ("terminal".to_string(), Vec::new()),
        };
        GameState {
            session_id: session.id.clone(),
            hero_combo: session.hero_combo.clone(),
            hero_role: session.hero_role,
            board: session.board_string(),
            pot,
            effective_stack: session.effective_stack,
            node_path: session.node_path.clone(),
            node_kind,
            is_terminal: actions.is_empty(),
            available_actions: actions,
            villain_action,
            street: tree::street_for_path(&session.node_path),
            scenario_context: session.scenario_context.clone(),
            action_history: session.action_history.clone(),
            position_matchup: session.position_matchup.clone(),
        }
    }
}
