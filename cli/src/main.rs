//! Command-line harness for the sweeper engine.
mod config;
mod render;
mod script;

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{GridArgs, LevelArgs};
use script::Action;
use sweeper_core::{Board, Grid, LifeBoard, RowCol, create_game};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Play a game from a command script
    Play(PlayArgs),
    /// Run the Game of Life on the same grids
    Life(LifeArgs),
}

#[derive(clap::Args, Debug)]
struct PlayArgs {
    #[command(flatten)]
    level: LevelArgs,

    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u64>,

    /// Read commands from this file instead of stdin
    #[arg(long)]
    script: Option<PathBuf>,

    /// Print the final board as JSON
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args, Debug)]
struct LifeArgs {
    #[command(flatten)]
    grid: GridArgs,

    /// Number of generations to run
    #[arg(short, long, default_value_t = 10)]
    generations: u32,

    /// Plain-text starting pattern, `O` for live cells; a glider when omitted
    #[arg(long)]
    pattern: Option<PathBuf>,

    /// Print every generation instead of only the last one
    #[arg(long)]
    every: bool,
}

const GLIDER: &str = ".O.\n..O\nOOO";

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.verbose.tracing_level_filter())
        .with_writer(io::stderr)
        .init();

    match args.mode {
        Mode::Play(play_args) => play(play_args),
        Mode::Life(life_args) => life(life_args),
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default()
}

fn play(args: PlayArgs) -> Result<()> {
    let level = args.level.resolve()?;
    let seed = args.seed.unwrap_or_else(clock_seed);
    log::debug!("seed: {}", seed);

    let (mut board, mut game) = create_game(level, seed, |board: &Board| {
        log::info!("Mine hit after {} moves", board.version());
        Ok(())
    });

    let input: Box<dyn BufRead> = match &args.script {
        Some(path) => Box::new(BufReader::new(File::open(path).with_context(|| {
            format!("Could not open script {}", path.display())
        })?)),
        None => Box::new(io::stdin().lock()),
    };
    let mut out = io::stdout().lock();

    for (line_no, line) in input.lines().enumerate() {
        let line = line?;
        let action = script::parse_line(&line)
            .with_context(|| format!("Script line {}", line_no + 1))?;
        match action {
            None => continue,
            Some(Action::Show) => render::write_board(&mut out, &board)?,
            Some(Action::Quit) => break,
            Some(Action::Step(command, coords)) => {
                board = game.next_state(command, coords, &board);
                if board.is_final() {
                    log::debug!("Game finished in state {:?}", board.state());
                    break;
                }
            }
        }
    }

    render::write_board(&mut out, &board)?;
    if args.json {
        serde_json::to_writer_pretty(&mut out, &board)?;
        writeln!(out)?;
    }

    match board.error() {
        Some(err) => Err(anyhow::Error::new(err.clone()).context("Game ended in error")),
        None => Ok(()),
    }
}

fn life(args: LifeArgs) -> Result<()> {
    let grid = args.grid.apply(Grid::new(20, 20));
    let pattern = match &args.pattern {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Could not read pattern {}", path.display()))?,
        None => GLIDER.to_owned(),
    };

    let mut board = LifeBoard::from_pattern(grid, RowCol::new(0, 0), &pattern);
    let mut out = io::stdout().lock();
    for _ in 0..args.generations {
        if args.every {
            render::write_life(&mut out, &board)?;
        }
        board = board.step();
    }
    render::write_life(&mut out, &board)?;
    Ok(())
}
