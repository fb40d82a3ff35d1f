//! Interactive training loop: deal a spot, walk hero to each decision,
//! grade every answer and score the hand.
//!
//! All terminal I/O goes through injected reader/writer handles so the
//! whole loop is testable with in-memory buffers.

use std::io::{BufRead, Write};

use colored::Colorize;
use rand::Rng;

use crate::cards::is_card_code;
use crate::display::{freq_bar, pretty_board, pretty_combo, print_error, styled_action, styled_grade};
use crate::error::TrainerResult;
use crate::grader::grade;
use crate::session::{GameState, SessionEngine};

fn prompt(
    message: &str,
    default: Option<&str>,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> String {
    if let Some(d) = default {
        write!(writer, "{} [{}]: ", message, d).ok();
    } else {
        write!(writer, "{}: ", message).ok();
    }
    writer.flush().ok();

    let mut line = String::new();
    match reader.read_line(&mut line) {
        Ok(0) => "q".to_string(),
        Ok(_) => {
            let trimmed = line.trim().to_string();
            if trimmed.is_empty() {
                default.unwrap_or("").to_string()
            } else {
                trimmed
            }
        }
        Err(_) => "q".to_string(),
    }
}

/// Pick one of the hero's available actions by number, name or prefix.
/// Returns `None` on quit.
fn prompt_action(
    state: &GameState,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Option<String> {
    writeln!(writer, "\n  {}", "Your action:".bold()).ok();
    for (i, action) in state.available_actions.iter().enumerate() {
        writeln!(
            writer,
            "    {}  {}",
            format!("{}.", i + 1).bold(),
            styled_action(&action.name)
        )
        .ok();
    }

    loop {
        let answer = prompt("  Enter a number", None, reader, writer);
        let lower = answer.to_lowercase();
        if lower == "q" || lower == "quit" {
            return None;
        }
        if let Ok(n) = answer.parse::<usize>() {
            if n >= 1 && n <= state.available_actions.len() {
                return Some(state.available_actions[n - 1].name.clone());
            }
        }
        if let Some(action) = state
            .available_actions
            .iter()
            .find(|a| a.name.to_lowercase().starts_with(&lower) && !lower.is_empty())
        {
            return Some(action.name.clone());
        }
        writeln!(writer, "  Pick one of the listed actions (or q to quit).").ok();
    }
}

/// Running pot implied by a node path. `BET n`/`RAISE n` put `n` chips in
/// and leave `n` outstanding; `CALL` matches the outstanding amount.
/// A raise label is counted as a full fresh contribution, so re-raise
/// lines overstate the pot by the caller's earlier chips.
fn pot_after(initial_pot: u32, path: &[String]) -> u32 {
    let mut pot = initial_pot;
    let mut outstanding = 0u32;
    for step in path {
        if is_card_code(step) {
            continue;
        }
        let mut parts = step.split_whitespace();
        let verb = parts.next().unwrap_or("");
        let amount: u32 = parts.next().and_then(|a| a.parse().ok()).unwrap_or(0);
        match verb {
            "BET" | "RAISE" => {
                pot += amount;
                outstanding = amount;
            }
            "CALL" => {
                pot += outstanding;
                outstanding = 0;
            }
            _ => {}
        }
    }
    pot
}

fn show_state(state: &GameState, pot: u32, writer: &mut dyn Write) {
    writeln!(writer).ok();
    writeln!(writer, "  {}", state.scenario_context.bold()).ok();
    writeln!(
        writer,
        "  Board: {}   Pot: {}   Stack: {}",
        pretty_board(&state.board),
        format!("{}", pot).bold(),
        state.effective_stack
    )
    .ok();
    writeln!(
        writer,
        "  Your hand: {}  ({}, {})",
        pretty_combo(&state.hero_combo).bold(),
        state.hero_role,
        state.street
    )
    .ok();
    if let Some(villain) = &state.villain_action {
        writeln!(writer, "  Villain: {}", styled_action(villain)).ok();
    }
}

/// One full hand: start, decisions until terminal, then the score recap.
/// Returns `false` when the player quit mid-hand.
fn play_hand<R: Rng>(
    engine: &mut SessionEngine,
    spot_key: Option<&str>,
    player: &str,
    rng: &mut R,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> TrainerResult<bool> {
    let mut state = engine.start(spot_key, player, rng)?;
    let session_id = state.session_id.clone();
    let initial_pot = state.pot;

    while !state.is_terminal {
        let pot = pot_after(initial_pot, &state.node_path);
        show_state(&state, pot, writer);
        let chosen = match prompt_action(&state, reader, writer) {
            Some(action) => action,
            None => {
                engine.complete(&session_id).ok();
                return Ok(false);
            }
        };

        state = engine.submit_action(&session_id, &chosen, pot, rng)?;
    }

    let result = engine.complete(&session_id)?;
    writeln!(writer).ok();
    writeln!(
        writer,
        "  {} GTO score: {}",
        "Hand over.".bold(),
        format!("{:.1}%", result.gto_score * 100.0).bold()
    )
    .ok();
    for decision in &result.decisions {
        writeln!(
            writer,
            "    {}  {} {}  {}",
            decision.street,
            styled_action(&decision.chosen_action),
            freq_bar(decision.gto_freq, 20),
            styled_grade(grade(decision.gto_freq))
        )
        .ok();
    }
    Ok(true)
}

pub fn play_loop(
    engine: &mut SessionEngine,
    spot_key: Option<&str>,
    player: &str,
    hands: usize,
    rng: &mut impl Rng,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) {
    writeln!(writer, "\n  {}", "GTO Trainer".bold()).ok();
    writeln!(writer, "  Answer with the action number; q quits.").ok();

    for hand_no in 1..=hands {
        writeln!(writer, "\n  {}", format!("--- Hand {} ---", hand_no).dimmed()).ok();
        match play_hand(engine, spot_key, player, rng, reader, writer) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                print_error(&e.to_string());
                break;
            }
        }
    }

    let summary = engine.scores().summary(player);
    if summary.total_sessions > 0 {
        writeln!(
            writer,
            "\n  {} {} hands, average score {}",
            "Session totals:".bold(),
            summary.total_sessions,
            format!("{:.1}%", summary.avg_score * 100.0).bold()
        )
        .ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Arc;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::spots::{SolveStatus, SpotLibrary, TrainerSpot, TreeCache};
    use crate::tree::Node;

    // IP acts at the root, OOP responds, then the hand ends. Both roles
    // get exactly one decision whichever side the hero draws.
    fn tiny_tree() -> Arc<Node> {
        Arc::new(
            serde_json::from_value(serde_json::json!({
                "node_type": "action_node",
                "player": 1,
                "childrens": {
                    "CHECK": {
                        "node_type": "action_node",
                        "player": 0,
                        "childrens": {
                            "CHECK": {"node_type": "action_node", "childrens": {}}
                        },
                        "strategy": {"strategy": {"AsAh": [1.0]}}
                    },
                    "BET 50": {
                        "node_type": "action_node",
                        "player": 0,
                        "childrens": {
                            "CALL": {"node_type": "action_node", "childrens": {}},
                            "FOLD": {"node_type": "action_node", "childrens": {}}
                        },
                        "strategy": {"strategy": {"AsAh": [0.6, 0.4]}}
                    }
                },
                "strategy": {"strategy": {"AsAh": [0.5, 0.5]}}
            }))
            .unwrap(),
        )
    }

    fn test_engine() -> SessionEngine {
        let spot = TrainerSpot {
            spot_key: "test_spot".to_string(),
            label: "test".to_string(),
            position_matchup: "BTN_vs_BB".to_string(),
            board_texture: "dry".to_string(),
            board: "Ks,7d,2c".to_string(),
            range_ip: "AA".to_string(),
            range_oop: "AA".to_string(),
            pot: 70,
            effective_stack: 930,
            solve_status: SolveStatus::Ready,
            result_path: None,
        };
        let mut cache = TreeCache::new();
        cache.insert("test_spot", tiny_tree());
        SessionEngine::new(SpotLibrary::with_spots(vec![spot]), cache)
    }

    fn path(steps: &[&str]) -> Vec<String> {
        steps.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pot_after_checks_leave_the_pot_alone() {
        assert_eq!(pot_after(70, &path(&["CHECK", "CHECK"])), 70);
    }

    #[test]
    fn test_pot_after_bet_and_call_both_add_chips() {
        assert_eq!(pot_after(70, &path(&["CHECK", "BET 50", "CALL", "7h"])), 170);
    }

    #[test]
    fn test_pot_after_outstanding_bet_counts_before_the_call() {
        assert_eq!(pot_after(70, &path(&["CHECK", "CHECK", "BET 70"])), 140);
    }

    #[test]
    fn test_pot_after_fold_adds_nothing() {
        assert_eq!(pot_after(70, &path(&["BET 30", "FOLD"])), 100);
    }

    #[test]
    fn test_play_loop_quits_on_q() {
        let mut engine = test_engine();
        let mut rng = StdRng::seed_from_u64(9);
        let mut input = Cursor::new(b"q\n".to_vec());
        let mut output = Vec::new();
        play_loop(
            &mut engine,
            Some("test_spot"),
            "sam",
            5,
            &mut rng,
            &mut input,
            &mut output,
        );
        assert_eq!(engine.open_sessions(), 0);
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("GTO Trainer"));
    }

    #[test]
    fn test_play_loop_plays_one_hand() {
        let mut engine = test_engine();
        let mut rng = StdRng::seed_from_u64(9);
        // Answer "1" for every decision; plenty of lines for any runout.
        let mut input = Cursor::new(b"1\n1\n1\n1\n1\n1\n".to_vec());
        let mut output = Vec::new();
        play_loop(
            &mut engine,
            Some("test_spot"),
            "sam",
            1,
            &mut rng,
            &mut input,
            &mut output,
        );
        assert_eq!(engine.open_sessions(), 0);
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Hand over."));
        assert_eq!(engine.scores().summary("sam").total_sessions, 1);
    }

    #[test]
    fn test_displayed_pot_grows_after_a_villain_bet() {
        // Scan seeds until the hero draws the OOP seat and the villain opens
        // with BET 50: the prompt must then show the 120-chip pot, not the
        // starting 70.
        for seed in 0..128 {
            let mut engine = test_engine();
            let mut rng = StdRng::seed_from_u64(seed);
            let mut input = Cursor::new(b"1\n1\n1\n".to_vec());
            let mut output = Vec::new();
            play_loop(
                &mut engine,
                Some("test_spot"),
                "sam",
                1,
                &mut rng,
                &mut input,
                &mut output,
            );
            let text = String::from_utf8(output).unwrap();
            if text.contains("Villain:") && text.contains("120") {
                return;
            }
        }
        panic!("no seed produced a hero decision facing a villain bet");
    }
}
