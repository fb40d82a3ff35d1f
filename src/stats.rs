//! Running GTO-score aggregates, keyed by (player, spot, hero role).
//!
//! Aggregates are folded in incrementally at session completion and never
//! recomputed from the raw session log.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::tree::{round4, Actor};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSpotAggregate {
    pub player: String,
    pub spot_key: String,
    pub hero_role: Actor,
    pub sessions_count: u64,
    pub avg_score: f64,
    pub best_score: f64,
    pub worst_score: f64,
    /// Unix seconds of the most recent completed session.
    pub last_played_at: u64,
}

/// Rollup across every spot a player has trained.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerSummary {
    pub total_sessions: u64,
    pub avg_score: f64,
    pub best_score: Option<f64>,
    pub worst_score: Option<f64>,
    pub last_played_at: Option<u64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ScoreBook {
    aggregates: BTreeMap<String, PlayerSpotAggregate>,
}

fn aggregate_key(player: &str, spot_key: &str, role: Actor) -> String {
    format!("{}|{}|{}", player, spot_key, role.as_str())
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl ScoreBook {
    pub fn new() -> ScoreBook {
        ScoreBook::default()
    }

    /// Fold one completed-session score into the running aggregate:
    /// `avg = (avg*n + score) / (n+1)`, best/worst clamped, timestamp
    /// refreshed.
    pub fn record(&mut self, player: &str, spot_key: &str, role: Actor, score: f64) {
        let key = aggregate_key(player, spot_key, role);
        let now = now_secs();
        let entry = self
            .aggregates
            .entry(key)
            .or_insert_with(|| PlayerSpotAggregate {
                player: player.to_string(),
                spot_key: spot_key.to_string(),
                hero_role: role,
                sessions_count: 0,
                avg_score: 0.0,
                best_score: score,
                worst_score: score,
                last_played_at: now,
            });
        let n = entry.sessions_count as f64;
        entry.avg_score = round4((entry.avg_score * n + score) / (n + 1.0));
        entry.sessions_count += 1;
        entry.best_score = entry.best_score.max(score);
        entry.worst_score = entry.worst_score.min(score);
        entry.last_played_at = now;
    }

    pub fn for_player(&self, player: &str) -> Vec<&PlayerSpotAggregate> {
        let mut rows: Vec<&PlayerSpotAggregate> = self
            .aggregates
            .values()
            .filter(|a| a.player == player)
            .collect();
        rows.sort_by(|a, b| a.avg_score.partial_cmp(&b.avg_score).unwrap_or(std::cmp::Ordering::Equal));
        rows
    }

    /// Session-count-weighted rollup for one player.
    pub fn summary(&self, player: &str) -> PlayerSummary {
        let rows = self.for_player(player);
        let total: u64 = rows.iter().map(|r| r.sessions_count).sum();
        if total == 0 {
            return PlayerSummary {
                total_sessions: 0,
                avg_score: 0.0,
                best_score: None,
                worst_score: None,
                last_played_at: None,
            };
        }
        let weighted: f64 = rows
            .iter()
            .map(|r| r.avg_score * r.sessions_count as f64)
            .sum();
        PlayerSummary {
            total_sessions: total,
            avg_score: round4(weighted / total as f64),
            best_score: rows.iter().map(|r| r.best_score).fold(None, |acc, s| {
                Some(acc.map_or(s, |a: f64| a.max(s)))
            }),
            worst_score: rows.iter().map(|r| r.worst_score).fold(None, |acc, s| {
                Some(acc.map_or(s, |a: f64| a.min(s)))
            }),
            last_played_at: rows.iter().map(|r| r.last_played_at).max(),
        }
    }

    // -- Persistence (JSON file in the trainer's home directory) --

    pub fn default_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let dir = Path::new(&home).join(".gto-trainer");
        std::fs::create_dir_all(&dir).ok();
        dir.join("stats.json")
    }

    pub fn save(&self, path: &Path) {
        if let Ok(data) = serde_json::to_vec_pretty(self) {
            std::fs::write(path, data).ok();
        }
    }

    pub fn load(path: &Path) -> ScoreBook {
        std::fs::read(path)
            .ok()
            .and_then(|data| serde_json::from_slice(&data).ok())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_incremental_average() {
        let mut book = ScoreBook::new();
        book.record("sam", "btn_bb_srp_dry", Actor::Ip, 0.8);
        book.record("sam", "btn_bb_srp_dry", Actor::Ip, 0.4);
        book.record("sam", "btn_bb_srp_dry", Actor::Ip, 0.6);
        let rows = book.for_player("sam");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sessions_count, 3);
        assert!((rows[0].avg_score - 0.6).abs() < 1e-9);
        assert!((rows[0].best_score - 0.8).abs() < 1e-9);
        assert!((rows[0].worst_score - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_roles_tracked_separately() {
        let mut book = ScoreBook::new();
        book.record("sam", "btn_bb_srp_dry", Actor::Ip, 0.9);
        book.record("sam", "btn_bb_srp_dry", Actor::Oop, 0.1);
        assert_eq!(book.for_player("sam").len(), 2);
    }

    #[test]
    fn test_summary_weighted_by_sessions() {
        let mut book = ScoreBook::new();
        book.record("sam", "a", Actor::Ip, 1.0);
        book.record("sam", "a", Actor::Ip, 1.0);
        book.record("sam", "b", Actor::Ip, 0.4);
        let summary = book.summary("sam");
        assert_eq!(summary.total_sessions, 3);
        assert!((summary.avg_score - 0.8).abs() < 1e-9);
        assert_eq!(summary.best_score, Some(1.0));
        assert_eq!(summary.worst_score, Some(0.4));
    }

    #[test]
    fn test_summary_empty_player() {
        let book = ScoreBook::new();
        let summary = book.summary("nobody");
        assert_eq!(summary.total_sessions, 0);
        assert_eq!(summary.best_score, None);
    }
}
