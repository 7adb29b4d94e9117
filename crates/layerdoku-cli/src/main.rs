//! Command-line front end for the Layerdoku engine: inspect levels, print
//! progress statistics, sanity-check pack files and reset saved progress.

use clap::{Parser, Subcommand};
use layerdoku_core::{
    parse_classic_pack, parse_combined_pack, Difficulty, DirAssets, GridSize, LevelLibrary, Mode,
    StatsManager,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "layerdoku", about = "Layered sudoku level and progress tool")]
struct Cli {
    /// Root directory the level assets are resolved against.
    #[arg(long, default_value = ".", global = true)]
    assets: PathBuf,

    /// Progress file; defaults to layerdoku_progress.json in the platform
    /// data directory.
    #[arg(long, global = true)]
    progress_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print one level's clue board (and each layer in crazy mode).
    Show {
        mode: Mode,
        difficulty: Difficulty,
        /// Classic: 1-based level number. Crazy: 0-based index, wraps.
        level: usize,
    },
    /// Print per-tier statistics for a mode.
    Stats { mode: Mode },
    /// Parse a pack file and report the first problem, if any.
    Check {
        path: PathBuf,
        /// Treat the file as a combined (multi-layer) pack.
        #[arg(long)]
        combined: bool,
        /// Board side length for classic packs.
        #[arg(long, default_value_t = 9)]
        size: usize,
    },
    /// Delete all level progress and saved sessions.
    Reset {
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> ExitCode {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "layerdoku=info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let store = Arc::new(layerdoku_core::FileStore::new(progress_path(
        cli.progress_file.clone(),
    )?));

    match cli.command {
        Command::Show {
            mode,
            difficulty,
            level,
        } => {
            let library = LevelLibrary::new(DirAssets::new(&cli.assets));
            show_level(&library, mode, difficulty, level)
        }
        Command::Stats { mode } => print_stats(&StatsManager::new(store), mode),
        Command::Check {
            path,
            combined,
            size,
        } => check_pack(&path, combined, size),
        Command::Reset { yes } => reset(&StatsManager::new(store), yes),
    }
}

fn progress_path(explicit: Option<PathBuf>) -> Result<PathBuf, String> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    Ok(dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("layerdoku_progress.json"))
}

fn show_level(
    library: &LevelLibrary,
    mode: Mode,
    difficulty: Difficulty,
    level: usize,
) -> Result<(), String> {
    match mode {
        Mode::Classic => {
            let puzzle = library
                .classic_level(difficulty, level)
                .map_err(|e| e.to_string())?;
            println!(
                "classic {difficulty} level {level} ({}, {} clues)",
                puzzle.size(),
                puzzle.clue_count()
            );
            print!("{}", puzzle.initial());
        }
        Mode::Crazy => {
            let puzzle = library
                .combined_level(difficulty, level)
                .map_err(|e| e.to_string())?;
            println!(
                "crazy {difficulty} level {level} ({}, {} layers, {} clues)",
                puzzle.size(),
                puzzle.layer_set().len(),
                puzzle.clue_count()
            );
            for (layer, boards) in puzzle.layer_set().layers().iter().zip(puzzle.layers()) {
                println!("[{layer}]");
                print!("{}", boards.initial);
            }
        }
    }
    Ok(())
}

fn print_stats(stats: &StatsManager, mode: Mode) -> Result<(), String> {
    println!("{mode} progress");
    for &difficulty in Difficulty::all() {
        let summary = stats
            .category_stats(mode, difficulty)
            .map_err(|e| e.to_string())?;
        let gate = if summary.unlocked { "" } else { "  [locked]" };
        let name = difficulty.to_string();
        println!(
            "  {name:<7} {:>2}/{} ({:>5.1}%)  avg {}  best {}  mistakes {:.1}{gate}",
            summary.levels_completed,
            summary.levels.len(),
            summary.completion_pct,
            layerdoku_core::format_time(summary.avg_time_secs),
            layerdoku_core::format_time(summary.best_time_secs),
            summary.avg_mistakes,
        );
    }
    let total = stats.total_completed(mode).map_err(|e| e.to_string())?;
    println!("  total completed: {total}");
    Ok(())
}

fn check_pack(path: &PathBuf, combined: bool, size: usize) -> Result<(), String> {
    let bytes = std::fs::read(path).map_err(|e| format!("{}: {e}", path.display()))?;
    let name = path.display().to_string();
    if combined {
        let pack = parse_combined_pack(&name, &bytes).map_err(|e| e.to_string())?;
        println!("ok: {} combined levels", pack.len());
    } else {
        let grid_size =
            GridSize::new(size).ok_or_else(|| format!("unsupported board size {size}"))?;
        let pack = parse_classic_pack(&name, &bytes, grid_size).map_err(|e| e.to_string())?;
        println!("ok: {} classic levels", pack.len());
    }
    Ok(())
}

fn reset(stats: &StatsManager, yes: bool) -> Result<(), String> {
    if !yes {
        return Err("refusing to delete progress without --yes".into());
    }
    stats.clear_all_progress().map_err(|e| e.to_string())?;
    println!("all progress cleared");
    Ok(())
}
