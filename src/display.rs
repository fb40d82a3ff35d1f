use colored::Colorize;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};

use crate::cards::{parse_board, parse_card, Card, Suit};
use crate::grader::Grade;
use crate::tree::ActionFreq;

pub fn card_display(card: &Card) -> String {
    let text = card.pretty();
    match card.suit {
        Suit::Spades => text.white().to_string(),
        Suit::Hearts => text.red().to_string(),
        Suit::Diamonds => text.blue().to_string(),
        Suit::Clubs => text.green().to_string(),
    }
}

pub fn board_display(cards: &[Card]) -> String {
    cards
        .iter()
        .map(card_display)
        .collect::<Vec<_>>()
        .join(" ")
}

/// "Ks,7d,2c" with suit symbols and colors; falls back to the raw string
/// when it does not parse as a board.
pub fn pretty_board(board: &str) -> String {
    match parse_board(board) {
        Ok(cards) => board_display(&cards),
        Err(_) => board.to_string(),
    }
}

/// "AhKs" with suit symbols and colors.
pub fn pretty_combo(combo: &str) -> String {
    if combo.len() != 4 {
        return combo.to_string();
    }
    match (parse_card(&combo[..2]), parse_card(&combo[2..])) {
        (Ok(c1), Ok(c2)) => format!("{} {}", card_display(&c1), card_display(&c2)),
        _ => combo.to_string(),
    }
}

pub fn styled_action(action: &str) -> String {
    let upper = action.to_uppercase();
    if upper.starts_with("BET") || upper.starts_with("RAISE") {
        action.red().bold().to_string()
    } else if upper == "CALL" {
        action.green().bold().to_string()
    } else if upper == "FOLD" {
        action.dimmed().bold().to_string()
    } else if upper.starts_with("CHECK") {
        action.yellow().bold().to_string()
    } else {
        action.bold().to_string()
    }
}

pub fn styled_grade(grade: Grade) -> String {
    let text = grade.to_string().to_uppercase();
    match grade {
        Grade::Best => text.green().bold().to_string(),
        Grade::Correct => text.green().to_string(),
        Grade::Inaccuracy => text.yellow().to_string(),
        Grade::Wrong => text.red().to_string(),
        Grade::Blunder => text.red().bold().to_string(),
    }
}

pub fn freq_bar(freq: f64, width: usize) -> String {
    let filled = (freq * width as f64) as usize;
    let filled = filled.min(width);
    let bar: String = "\u{2588}".repeat(filled) + &"\u{2591}".repeat(width - filled);
    let pct = format!("{:.0}%", freq * 100.0);

    if freq >= 0.75 {
        format!("{} {}", bar.green(), pct)
    } else if freq >= 0.40 {
        format!("{} {}", bar.yellow(), pct)
    } else {
        format!("{} {}", bar.red(), pct)
    }
}

/// Frequencies for every action at a node, one bar per row.
pub fn action_table(actions: &[ActionFreq]) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Action"),
        Cell::new("GTO Frequency").set_alignment(CellAlignment::Left),
    ]);
    for action in actions {
        table.add_row(vec![
            Cell::new(styled_action(&action.name)),
            Cell::new(freq_bar(action.gto_freq, 20)),
        ]);
    }
    table.to_string()
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "Error:".red().bold(), msg);
}
