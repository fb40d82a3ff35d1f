use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::display::{action_table, pretty_board, pretty_combo, print_error, styled_grade};
use crate::error::{TrainerError, TrainerResult};
use crate::grader::{analyze_hand, hero_iso_combo, resolve_matchup, HandActions};
use crate::play::play_loop;
use crate::session::SessionEngine;
use crate::spots::{SpotLibrary, TrainerSpot, TreeCache};
use crate::stats::ScoreBook;

#[derive(Parser)]
#[command(
    name = "gto-trainer",
    version = "1.0.0",
    about = "GTO trainer — drill solved postflop spots and grade your decisions."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train interactively against the solved strategy
    Play {
        /// Spot to drill (default: random ready spot each hand)
        #[arg(short, long)]
        spot: Option<String>,
        /// Player name for score tracking
        #[arg(short, long, default_value = "hero")]
        player: String,
        /// Number of hands to play
        #[arg(short = 'n', long, default_value = "5")]
        hands: usize,
        /// Spot library directory
        #[arg(short, long)]
        dir: Option<PathBuf>,
        /// RNG seed for reproducible deals
        #[arg(long)]
        seed: Option<u64>,
    },
    /// List the spot library and solve status
    Spots {
        /// Spot library directory
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// Show training scores for a player
    Stats {
        /// Player name
        #[arg(default_value = "hero")]
        player: String,
    },
    /// Grade a played hand against the solved strategy
    Analyze {
        /// JSON file with per-street actions (flop/turn/river lists)
        file: PathBuf,
        /// Hero's hole cards (e.g. AhKs)
        #[arg(short, long)]
        combo: String,
        /// Spot key to grade against
        #[arg(short, long)]
        spot: Option<String>,
        /// Hero position (picks the nearest solved matchup when --spot is omitted)
        #[arg(long)]
        position: Option<String>,
        /// Actual turn card (e.g. 7h)
        #[arg(long)]
        turn: Option<String>,
        /// Actual river card (e.g. 2s)
        #[arg(long)]
        river: Option<String>,
        /// Spot library directory
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

fn library_dir(dir: Option<PathBuf>) -> PathBuf {
    dir.unwrap_or_else(|| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        Path::new(&home).join(".gto-trainer").join("library")
    })
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

pub fn run() {
    let cli = Cli::parse();
    if let Err(e) = dispatch(cli) {
        print_error(&e.to_string());
        std::process::exit(1);
    }
}

fn dispatch(cli: Cli) -> TrainerResult<()> {
    match cli.command {
        Commands::Play {
            spot,
            player,
            hands,
            dir,
            seed,
        } => cmd_play(spot.as_deref(), &player, hands, dir, seed),
        Commands::Spots { dir } => cmd_spots(dir),
        Commands::Stats { player } => {
            cmd_stats(&player);
            Ok(())
        }
        Commands::Analyze {
            file,
            combo,
            spot,
            position,
            turn,
            river,
            dir,
        } => cmd_analyze(
            &file,
            &combo,
            spot.as_deref(),
            position.as_deref(),
            turn.as_deref(),
            river.as_deref(),
            dir,
        ),
    }
}

fn cmd_play(
    spot: Option<&str>,
    player: &str,
    hands: usize,
    dir: Option<PathBuf>,
    seed: Option<u64>,
) -> TrainerResult<()> {
    let library = SpotLibrary::load(&library_dir(dir))?;
    let mut engine = SessionEngine::new(library, TreeCache::new());

    let stats_path = ScoreBook::default_path();
    *engine.scores_mut() = ScoreBook::load(&stats_path);

    let mut rng = make_rng(seed);
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut writer = io::stdout();
    play_loop(
        &mut engine,
        spot,
        player,
        hands,
        &mut rng,
        &mut reader,
        &mut writer,
    );

    engine.scores().save(&stats_path);
    Ok(())
}

fn cmd_spots(dir: Option<PathBuf>) -> TrainerResult<()> {
    let library = SpotLibrary::load(&library_dir(dir))?;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Spot"),
        Cell::new("Label"),
        Cell::new("Board"),
        Cell::new("Pot").set_alignment(CellAlignment::Right),
        Cell::new("Status"),
    ]);
    for spot in library.spots() {
        let status = if spot.is_ready() {
            "ready".green().to_string()
        } else {
            "pending".dimmed().to_string()
        };
        table.add_row(vec![
            Cell::new(spot.spot_key.bold().to_string()),
            Cell::new(&spot.label),
            Cell::new(pretty_board(&spot.board)),
            Cell::new(format!("{}", spot.pot)),
            Cell::new(status),
        ]);
    }

    println!();
    println!("{}", table);
    println!(
        "\n  {} of {} spots ready",
        library.ready_spots().len().to_string().bold(),
        library.spots().len()
    );
    println!();
    Ok(())
}

fn cmd_stats(player: &str) {
    let book = ScoreBook::load(&ScoreBook::default_path());
    let rows = book.for_player(player);

    if rows.is_empty() {
        println!("\n  No sessions recorded for {} yet.\n", player.bold());
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Spot"),
        Cell::new("Role"),
        Cell::new("Hands").set_alignment(CellAlignment::Right),
        Cell::new("Avg").set_alignment(CellAlignment::Right),
        Cell::new("Best").set_alignment(CellAlignment::Right),
        Cell::new("Worst").set_alignment(CellAlignment::Right),
    ]);
    for row in &rows {
        table.add_row(vec![
            Cell::new(&row.spot_key),
            Cell::new(row.hero_role.as_str()),
            Cell::new(format!("{}", row.sessions_count)),
            Cell::new(format!("{:.1}%", row.avg_score * 100.0)),
            Cell::new(format!("{:.1}%", row.best_score * 100.0)),
            Cell::new(format!("{:.1}%", row.worst_score * 100.0)),
        ]);
    }

    let summary = book.summary(player);
    println!();
    println!("  {} {}", "Training stats for".bold(), player.bold());
    println!("{}", table);
    println!(
        "\n  {} hands, {} average (weakest spots listed first)",
        summary.total_sessions.to_string().bold(),
        format!("{:.1}%", summary.avg_score * 100.0).bold()
    );
    println!();
}

fn resolve_analysis_spot<'a>(
    library: &'a SpotLibrary,
    spot: Option<&str>,
    position: Option<&str>,
) -> TrainerResult<&'a TrainerSpot> {
    if let Some(key) = spot {
        return library
            .find(key)
            .filter(|s| s.is_ready())
            .ok_or_else(|| TrainerError::SpotNotFound(key.to_string()));
    }
    let position = position.ok_or(TrainerError::NoReadySpots)?;
    let (matchup, _role) =
        resolve_matchup(position).ok_or_else(|| TrainerError::SpotNotFound(position.to_string()))?;
    library
        .spots()
        .iter()
        .find(|s| s.position_matchup == matchup && s.is_ready())
        .ok_or_else(|| TrainerError::SpotNotFound(matchup.to_string()))
}

fn cmd_analyze(
    file: &Path,
    combo: &str,
    spot: Option<&str>,
    position: Option<&str>,
    turn: Option<&str>,
    river: Option<&str>,
    dir: Option<PathBuf>,
) -> TrainerResult<()> {
    let library = SpotLibrary::load(&library_dir(dir))?;
    let spot = resolve_analysis_spot(&library, spot, position)?.clone();

    let data = std::fs::read(file)?;
    let actions: HandActions = serde_json::from_slice(&data)?;

    let mut cache = TreeCache::new();
    let tree = cache.get_or_load(&spot)?;
    let decisions = analyze_hand(&tree, combo, &actions, turn, river)?;

    println!();
    println!(
        "  {} {} on {}  ({})",
        "Analyzing".bold(),
        pretty_combo(combo).bold(),
        pretty_board(&spot.board),
        spot.label
    );
    if let Some(iso) = hero_iso_combo(&decisions, combo) {
        if iso != combo {
            println!("  Graded as {} (suit-equivalent)", iso.bold());
        }
    }

    if decisions.is_empty() {
        println!("\n  No hero decisions found in the solved tree for this line.\n");
        return Ok(());
    }

    for decision in &decisions {
        println!();
        println!(
            "  {} you {}  {}  ({:.0}% GTO)",
            format!("{}:", decision.street).bold(),
            decision.hero_verb,
            styled_grade(decision.grade),
            decision.hero_freq * 100.0
        );
        println!("{}", action_table(&decision.gto_actions));
    }
    println!();
    Ok(())
}
