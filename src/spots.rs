//! Solved-spot library and the shared strategy-tree cache.
//!
//! A spot is a fixed scenario (position matchup, board, ranges, pot) solved
//! once by the external solver; its result document lives on disk under the
//! library directory. The built-in library mirrors the standard 6-max
//! single-raised and 3-bet pot matchups; a `spots.json` manifest in the
//! library directory replaces it when present.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};
use once_cell::sync::Lazy;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{TrainerError, TrainerResult};
use crate::tree::{Actor, Node};

// ---------------------------------------------------------------------------
// Preflop ranges (approximate GTO, 6-max 100bb)
// ---------------------------------------------------------------------------

const BTN_OPEN: &str = "AA,KK,QQ,JJ,TT,99:0.5,88:0.33,AKs,AQs,AJs,ATs,A9s,A8s,A7s,A6s,A5s,A4s,A3s,A2s,\
KQs,KJs,KTs,K9s,QJs,QTs,Q9s,JTs,J9s,T9s,98s,87s,76s,65s,54s,\
AKo,AQo,AJo:0.75,ATo:0.5,KQo,KJo:0.5";

const BB_DEFEND_VS_BTN: &str = "AA,KK,QQ,JJ,TT,99,88,77,66,55,44,33,22,\
AKs,AQs,AJs,ATs,A9s,A8s,A7s,A6s,A5s,A4s,A3s,A2s,\
KQs,KJs,KTs,K9s,K8s,QJs,QTs,Q9s,JTs,J9s,J8s,T9s,T8s,98s,97s,87s,86s,76s,75s,65s,64s,54s,53s,\
AKo,AQo,AJo,ATo,A9o:0.5,KQo,KJo,KTo:0.5,QJo,QTo:0.5,JTo:0.5";

const CO_OPEN: &str = "AA,KK,QQ,JJ,TT,99,88:0.5,AKs,AQs,AJs,ATs,A9s,A8s,A5s,A4s,A3s,A2s,\
KQs,KJs,KTs,QJs,QTs,JTs,T9s,98s,87s,76s,65s,\
AKo,AQo,AJo,KQo,KJo:0.5";

const BB_DEFEND_VS_CO: &str = "AA,KK,QQ,JJ,TT,99,88,77,66,55,44,33,22,\
AKs,AQs,AJs,ATs,A9s,A8s,A5s,A4s,A3s,A2s,\
KQs,KJs,KTs,QJs,QTs,JTs,T9s,98s,87s,76s,65s,54s,\
AKo,AQo,AJo,ATo:0.5,KQo,KJo,QJo:0.5";

const SB_OPEN: &str = "AA,KK,QQ,JJ,TT,99,88,77,66:0.5,AKs,AQs,AJs,ATs,A9s,A8s,A7s,A6s,A5s,A4s,A3s,A2s,\
KQs,KJs,KTs,K9s,QJs,QTs,Q9s,JTs,J9s,T9s,98s,87s,76s,65s,54s,\
AKo,AQo,AJo,ATo,KQo,KJo,QJo:0.5";

const BB_DEFEND_VS_SB: &str = "AA,KK,QQ,JJ,TT,99,88,77,66,55,44,33,22,\
AKs,AQs,AJs,ATs,A9s,A8s,A7s,A5s,A4s,A3s,A2s,\
KQs,KJs,KTs,K9s,QJs,QTs,JTs,T9s,98s,87s,76s,65s,54s,\
AKo,AQo,AJo,ATo,A9o:0.5,KQo,KJo,KTo:0.5,QJo,JTo:0.5";

const HJ_OPEN: &str = "AA,KK,QQ,JJ,TT,99,88:0.5,AKs,AQs,AJs,ATs,A9s,A5s,A4s,\
KQs,KJs,KTs,QJs,QTs,JTs,T9s,98s,87s,76s,\
AKo,AQo,KQo";

const BB_DEFEND_VS_HJ: &str = "AA,KK,QQ,JJ,TT,99,88,77,66,55,44,33,22,\
AKs,AQs,AJs,ATs,A9s,A5s,A4s,A3s,\
KQs,KJs,KTs,QJs,QTs,JTs,T9s,98s,87s,76s,65s,\
AKo,AQo,AJo:0.5,KQo,KJo:0.5";

const BTN_CALL_3BET: &str = "AA,KK,QQ,JJ,TT:0.5,AKs,AQs,AJs,KQs:0.5,AKo,AQo:0.5";
const SB_3BET: &str = "AA,KK,QQ,JJ,TT:0.5,AKs,AKo,AQs:0.5";
const BB_3BET_VS_CO: &str = "AA,KK,QQ,JJ:0.5,AKs,AKo,AQs:0.5,KQs:0.5";
const CO_CALL_3BET_VS_BB: &str = "AA,KK,QQ,JJ,TT:0.5,AKs,AQs,AKo:0.5";

/// Pot and effective stack in solver chips (tenths of a big blind).
pub const SRP_POT: u32 = 70;
pub const SRP_STACK: u32 = 930;
pub const THREE_BET_POT: u32 = 200;
pub const THREE_BET_STACK: u32 = 800;

// ---------------------------------------------------------------------------
// Spot definitions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolveStatus {
    Pending,
    Solving,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerSpot {
    pub spot_key: String,
    pub label: String,
    pub position_matchup: String,
    pub board_texture: String,
    /// Comma-separated flop, e.g. "Ks,7d,2c".
    pub board: String,
    pub range_ip: String,
    pub range_oop: String,
    pub pot: u32,
    pub effective_stack: u32,
    pub solve_status: SolveStatus,
    #[serde(default)]
    pub result_path: Option<PathBuf>,
}

impl TrainerSpot {
    pub fn range_for(&self, role: Actor) -> &str {
        match role {
            Actor::Ip => &self.range_ip,
            Actor::Oop => &self.range_oop,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.solve_status == SolveStatus::Ready
    }
}

fn spot(
    key: &str,
    label: &str,
    matchup: &str,
    texture: &str,
    board: &str,
    range_ip: &str,
    range_oop: &str,
    pot: u32,
    stack: u32,
) -> TrainerSpot {
    TrainerSpot {
        spot_key: key.to_string(),
        label: label.to_string(),
        position_matchup: matchup.to_string(),
        board_texture: texture.to_string(),
        board: board.to_string(),
        range_ip: range_ip.to_string(),
        range_oop: range_oop.to_string(),
        pot,
        effective_stack: stack,
        solve_status: SolveStatus::Pending,
        result_path: None,
    }
}

static DEFAULT_SPOTS: Lazy<Vec<TrainerSpot>> = Lazy::new(|| {
    vec![
        spot(
            "btn_bb_srp_dry", "BTN vs BB · K72r (SRP)", "BTN_vs_BB", "dry",
            "Ks,7d,2c", BTN_OPEN, BB_DEFEND_VS_BTN, SRP_POT, SRP_STACK,
        ),
        spot(
            "btn_bb_srp_wet", "BTN vs BB · JT9 two-tone (SRP)", "BTN_vs_BB", "wet",
            "Jh,Th,9d", BTN_OPEN, BB_DEFEND_VS_BTN, SRP_POT, SRP_STACK,
        ),
        spot(
            "co_bb_srp_ace", "CO vs BB · A84r (SRP)", "CO_vs_BB", "ace_high",
            "Ah,8d,4c", CO_OPEN, BB_DEFEND_VS_CO, SRP_POT, SRP_STACK,
        ),
        spot(
            "hj_bb_srp_mid", "HJ vs BB · 965 two-tone (SRP)", "HJ_vs_BB", "medium",
            "9s,6s,5d", HJ_OPEN, BB_DEFEND_VS_HJ, SRP_POT, SRP_STACK,
        ),
        spot(
            "sb_bb_srp_dry", "SB vs BB · Q63r (SRP)", "SB_vs_BB", "dry",
            "Qd,6c,3h", BB_DEFEND_VS_SB, SB_OPEN, SRP_POT, SRP_STACK,
        ),
        spot(
            "btn_sb_3bp_broadway", "BTN vs SB 3-bet · KQ4 (3BP)", "BTN_vs_SB_3bet", "broadway",
            "Kh,Qs,4d", BTN_CALL_3BET, SB_3BET, THREE_BET_POT, THREE_BET_STACK,
        ),
        spot(
            "co_bb_3bp_low", "CO vs BB 3-bet · 752r (3BP)", "CO_vs_BB_3bet", "low",
            "7h,5c,2d", CO_CALL_3BET_VS_BB, BB_3BET_VS_CO, THREE_BET_POT, THREE_BET_STACK,
        ),
    ]
});

/// Human-readable preflop story for a matchup and hero role.
pub fn scenario_context(position_matchup: &str, hero_role: Actor) -> String {
    let pair = match position_matchup {
        "BTN_vs_BB" => Some((
            "BTN (you) opens 2.5bb, BB calls. Single-raised pot.",
            "BTN opens 2.5bb, you call from BB. Single-raised pot.",
        )),
        "CO_vs_BB" => Some((
            "CO (you) opens 2.5bb, BB calls. Single-raised pot.",
            "CO opens 2.5bb, you call from BB. Single-raised pot.",
        )),
        "HJ_vs_BB" => Some((
            "HJ (you) opens 2.5bb, BB calls. Single-raised pot.",
            "HJ opens 2.5bb, you call from BB. Single-raised pot.",
        )),
        "SB_vs_BB" => Some((
            "SB opens 2.5bb, you call from BB. Single-raised pot.",
            "SB (you) opens 2.5bb, BB calls. Single-raised pot.",
        )),
        "BTN_vs_SB_3bet" => Some((
            "You open 2.5bb from BTN, SB 3-bets to 9bb, you call. 3-bet pot.",
            "BTN opens 2.5bb, you 3-bet to 9bb from SB, BTN calls. 3-bet pot.",
        )),
        "CO_vs_BB_3bet" => Some((
            "You open 2.5bb from CO, BB 3-bets to 9bb, you call. 3-bet pot.",
            "CO opens 2.5bb, you 3-bet to 9bb from BB, CO calls. 3-bet pot.",
        )),
        _ => None,
    };
    match (pair, hero_role) {
        (Some((ip, _)), Actor::Ip) => ip.to_string(),
        (Some((_, oop)), Actor::Oop) => oop.to_string(),
        (None, role) => format!("{} ({})", position_matchup, role.as_str()),
    }
}

// ---------------------------------------------------------------------------
// Library
// ---------------------------------------------------------------------------

pub struct SpotLibrary {
    spots: Vec<TrainerSpot>,
}

impl SpotLibrary {
    pub fn with_spots(spots: Vec<TrainerSpot>) -> SpotLibrary {
        SpotLibrary { spots }
    }

    /// Build the library from a directory: `spots.json` when present,
    /// otherwise the built-in spot set. A spot is ready when its result
    /// document exists under `<dir>/<spot_key>/result.json`.
    pub fn load(dir: &Path) -> TrainerResult<SpotLibrary> {
        let manifest = dir.join("spots.json");
        let mut spots: Vec<TrainerSpot> = if manifest.exists() {
            let data = std::fs::read(&manifest)?;
            serde_json::from_slice(&data)?
        } else {
            DEFAULT_SPOTS.clone()
        };
        for spot in &mut spots {
            let result = spot
                .result_path
                .clone()
                .unwrap_or_else(|| dir.join(&spot.spot_key).join("result.json"));
            if result.exists() {
                spot.solve_status = SolveStatus::Ready;
                spot.result_path = Some(result);
            }
        }
        info!(
            "spot library loaded: {} spots, {} ready",
            spots.len(),
            spots.iter().filter(|s| s.is_ready()).count()
        );
        Ok(SpotLibrary { spots })
    }

    pub fn spots(&self) -> &[TrainerSpot] {
        &self.spots
    }

    pub fn ready_spots(&self) -> Vec<&TrainerSpot> {
        self.spots.iter().filter(|s| s.is_ready()).collect()
    }

    pub fn find(&self, spot_key: &str) -> Option<&TrainerSpot> {
        self.spots.iter().find(|s| s.spot_key == spot_key)
    }

    /// A specific ready spot, or a uniformly random one.
    pub fn select<R: Rng>(
        &self,
        spot_key: Option<&str>,
        rng: &mut R,
    ) -> TrainerResult<&TrainerSpot> {
        match spot_key {
            Some(key) => self
                .find(key)
                .filter(|s| s.is_ready())
                .ok_or_else(|| TrainerError::SpotNotFound(key.to_string())),
            None => {
                let ready = self.ready_spots();
                if ready.is_empty() {
                    return Err(TrainerError::NoReadySpots);
                }
                Ok(ready[rng.gen_range(0..ready.len())])
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tree cache
// ---------------------------------------------------------------------------

/// Parsed result documents, loaded lazily on first use and shared read-only
/// afterwards. Unbounded by design: the library is small and trees are
/// reused across every session on the same spot.
#[derive(Default)]
pub struct TreeCache {
    trees: HashMap<String, Arc<Node>>,
}

impl TreeCache {
    pub fn new() -> TreeCache {
        TreeCache::default()
    }

    /// Pre-seed a parsed tree (tests, or callers that already hold one).
    pub fn insert(&mut self, spot_key: &str, tree: Arc<Node>) {
        self.trees.insert(spot_key.to_string(), tree);
    }

    pub fn get_or_load(&mut self, spot: &TrainerSpot) -> TrainerResult<Arc<Node>> {
        if let Some(tree) = self.trees.get(&spot.spot_key) {
            return Ok(Arc::clone(tree));
        }
        let path = spot
            .result_path
            .as_ref()
            .ok_or_else(|| TrainerError::ResultUnavailable(spot.spot_key.clone()))?;
        let tree = Node::load(path).map_err(|e| {
            warn!("result load failed for {}: {}", spot.spot_key, e);
            TrainerError::ResultUnavailable(spot.spot_key.clone())
        })?;
        info!("parsed result cached for spot {}", spot.spot_key);
        let tree = Arc::new(tree);
        self.trees.insert(spot.spot_key.clone(), Arc::clone(&tree));
        Ok(Arc::clone(&tree))
    }
}
