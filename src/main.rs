//! N×N×N Twisty Puzzle
//!
//! Keeps a puzzle session on disk, turns its layers and searches for moves
//! that make the faces more uniform.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use rubix::error::PuzzleError;
use rubix::evaluator::{self, MoveEvaluator, SearchConfig};
use rubix::grid::format_net;
use rubix::persistence;
use rubix::puzzle::{Direction, Puzzle};

/// Turns layers of an N×N×N puzzle and searches for solving moves.
#[derive(Parser)]
#[command(name = "rubix")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Worker threads for the move search (defaults to one per core).
    #[arg(long, global = true)]
    threads: Option<usize>,

    /// Memory ceiling for one search generation, in MiB.
    #[arg(long, global = true)]
    memory_limit_mb: Option<usize>,

    /// Session file; a text net is written next to it.
    #[arg(long, global = true, default_value = persistence::STATE_BIN)]
    state: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start a solved puzzle.
    New {
        #[arg(default_value_t = 3)]
        dim: usize,
    },
    /// Start a puzzle and apply random moves.
    Scramble {
        #[arg(long, default_value_t = 3)]
        dim: usize,
        #[arg(long, default_value_t = 20)]
        moves: usize,
        /// Seed for a reproducible scramble.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print the saved puzzle.
    Show,
    /// Turn one layer of the saved puzzle.
    Rotate {
        face: usize,
        #[arg(default_value_t = 0)]
        depth: usize,
        /// cw or ccw, seen from outside the face.
        #[arg(default_value = "cw")]
        direction: Direction,
        #[arg(default_value_t = 1)]
        count: usize,
    },
    /// Undo the last move of the saved puzzle.
    Undo,
    /// Show the number of saved moves.
    Count,
    /// Search for the best move sequence from the saved puzzle.
    Evaluate {
        #[arg(long)]
        generations: Option<usize>,
    },
    /// Greedily apply searched moves until the puzzle is solved.
    Solve {
        #[arg(long)]
        generations: Option<usize>,
        #[arg(long, default_value_t = 20)]
        max_steps: usize,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), PuzzleError> {
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .map_err(|e| PuzzleError::InvalidArgument(e.to_string()))?;
    }

    let mut config = SearchConfig::default();
    if let Some(megabytes) = cli.memory_limit_mb {
        config.memory_limit_bytes = megabytes.saturating_mul(1024 * 1024);
    }

    let path = cli.state.as_path();
    match cli.command {
        Command::New { dim } => {
            let puzzle = Puzzle::new(dim)?;
            save(&puzzle, path)?;
        }
        Command::Scramble { dim, moves, seed } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let mut puzzle = Puzzle::new(dim)?;
            puzzle.scramble(moves, &mut rng)?;
            save(&puzzle, path)?;
            print!("{}", describe(&puzzle)?);
        }
        Command::Show => {
            print!("{}", describe(&persistence::load(path)?)?);
        }
        Command::Rotate {
            face,
            depth,
            direction,
            count,
        } => {
            let mut puzzle = persistence::load(path)?;
            puzzle.rotate(face, depth, direction, count, true)?;
            save(&puzzle, path)?;
            print!("{}", describe(&puzzle)?);
        }
        Command::Undo => {
            let mut puzzle = persistence::load(path)?;
            match puzzle.undo()? {
                Some(mv) => info!("undid {}", mv.inverse()),
                None => info!("no moves to undo"),
            }
            save(&puzzle, path)?;
            print!("{}", describe(&puzzle)?);
        }
        Command::Count => {
            println!("{} moves", persistence::count(path)?);
        }
        Command::Evaluate { generations } => {
            let puzzle = persistence::load(path)?;
            let evaluator = MoveEvaluator::new(puzzle.dim(), config)?;
            let generations = generations.unwrap_or(config.generations);
            let evaluation = evaluator.evaluate(generations, &puzzle.to_face_colorings()?)?;

            println!(
                "Best path over {} generations (score {:.4}):",
                evaluation.generation, evaluation.max
            );
            for mv in &evaluation.moves {
                println!("  {mv}");
            }
            match evaluation.best_move() {
                Some(mv) => println!("Next move: {mv}"),
                None => println!("Next move: none"),
            }
        }
        Command::Solve {
            generations,
            max_steps,
        } => {
            let mut puzzle = persistence::load(path)?;
            let evaluator = MoveEvaluator::new(puzzle.dim(), config)?;
            let generations = generations.unwrap_or(config.generations);
            let applied = evaluator::solve(&evaluator, &mut puzzle, generations, max_steps)?;

            println!("Applied {} moves:", applied.len());
            for mv in &applied {
                println!("  {mv}");
            }
            save(&puzzle, path)?;
            print!("{}", describe(&puzzle)?);
        }
    }

    Ok(())
}

fn save(puzzle: &Puzzle, path: &Path) -> Result<(), PuzzleError> {
    persistence::save(puzzle, path)?;
    info!(
        "wrote {} and {}",
        path.display(),
        path.with_extension("txt").display()
    );
    Ok(())
}

/// Move count, face net and per-face scores.
fn describe(puzzle: &Puzzle) -> Result<String, PuzzleError> {
    let scores = puzzle.scores()?;
    let listed: Vec<String> = scores.iter().map(|s| format!("{s:.4}")).collect();
    let total: f64 = scores.iter().sum();

    let mut output = format!("{} moves\n", puzzle.history().len());
    output.push_str(&format_net(&puzzle.to_state()?, puzzle.dim()));
    output.push_str(&format!("scores: {} (total {total:.4})\n", listed.join(" ")));
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_snapshot() {
        let mut puzzle = Puzzle::new(3).unwrap();
        puzzle.rotate(0, 0, Direction::Clockwise, 1, true).unwrap();

        insta::assert_snapshot!(describe(&puzzle).unwrap(), @r"
        1 moves
        F0  F1  F2  F3  F4  F5
        000 333 111 433 244 555
        000 111 222 433 244 555
        000 111 222 433 244 555
        scores: 1.0000 0.5000 0.5000 0.5000 0.5000 1.0000 (total 4.0000)
        ");
    }

    #[test]
    fn test_cli_parses_rotate() {
        let cli = Cli::parse_from(["rubix", "--threads", "2", "rotate", "4", "1", "ccw", "2"]);
        assert_eq!(cli.threads, Some(2));
        match cli.command {
            Command::Rotate {
                face,
                depth,
                direction,
                count,
            } => {
                assert_eq!((face, depth, count), (4, 1, 2));
                assert_eq!(direction, Direction::CounterClockwise);
            }
            _ => panic!("expected rotate"),
        }
    }
}
