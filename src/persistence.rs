//! File I/O for saving and loading a puzzle session.
//!
//! Binary format for `puzzle.bin` (little endian u32 throughout):
//! - dimension
//! - move count
//! - repeat per move: face, depth, direction (0 = cw, 1 = ccw), count
//! - packed word count
//! - repeat per word: the coloring packed as 3-bit fields
//!
//! Loading rebuilds a solved puzzle, replays the moves and checks the result
//! against the stored coloring.

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

use log::debug;

use crate::error::PuzzleError;
use crate::grid::format_net;
use crate::puzzle::{Direction, Move, Puzzle, MAX_DIM};

pub const STATE_BIN: &str = "puzzle.bin";
pub const STATE_TXT: &str = "puzzle.txt";

/// Saves the puzzle to `path` and a readable net next to it.
pub fn save(puzzle: &Puzzle, path: &Path) -> Result<(), PuzzleError> {
    save_text(puzzle, &path.with_extension("txt"))?;
    save_binary(puzzle, path)?;
    debug!(
        "saved {} moves to {}",
        puzzle.history().len(),
        path.display()
    );
    Ok(())
}

/// Saves the puzzle in human-readable text format.
fn save_text(puzzle: &Puzzle, path: &Path) -> Result<(), PuzzleError> {
    let mut file = BufWriter::new(File::create(path)?);
    let dim = puzzle.dim();
    writeln!(
        file,
        "Puzzle {dim}x{dim}x{dim}, {} moves:",
        puzzle.history().len()
    )?;
    for mv in puzzle.history() {
        writeln!(file, "{mv}")?;
    }
    writeln!(file)?;
    write!(file, "{}", format_net(&puzzle.to_state()?, dim))?;
    file.flush()?;
    Ok(())
}

fn write_u32(file: &mut impl Write, value: usize) -> Result<(), PuzzleError> {
    let value = u32::try_from(value)
        .map_err(|_| PuzzleError::InvalidArgument(format!("{value} does not fit in 32 bits")))?;
    file.write_all(&value.to_le_bytes())?;
    Ok(())
}

/// Saves the puzzle in compact binary format.
fn save_binary(puzzle: &Puzzle, path: &Path) -> Result<(), PuzzleError> {
    let mut file = BufWriter::new(File::create(path)?);

    write_u32(&mut file, puzzle.dim())?;
    write_u32(&mut file, puzzle.history().len())?;
    for mv in puzzle.history() {
        let direction = match mv.direction {
            Direction::Clockwise => 0,
            Direction::CounterClockwise => 1,
        };
        for field in [mv.face, mv.depth, direction, mv.count] {
            write_u32(&mut file, field)?;
        }
    }

    let words = puzzle.to_binary()?;
    write_u32(&mut file, words.len())?;
    for word in words {
        file.write_all(&word.to_le_bytes())?;
    }

    file.flush()?;
    Ok(())
}

fn read_u32(file: &mut impl Read) -> Result<u32, PuzzleError> {
    let mut buffer = [0u8; 4];
    file.read_exact(&mut buffer).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => PuzzleError::CorruptFile("file is truncated".to_string()),
        _ => PuzzleError::Io(e),
    })?;
    Ok(u32::from_le_bytes(buffer))
}

fn read_usize(file: &mut impl Read) -> Result<usize, PuzzleError> {
    Ok(read_u32(file)? as usize)
}

/// Loads a puzzle saved by [`save`].
pub fn load(path: &Path) -> Result<Puzzle, PuzzleError> {
    let mut file = BufReader::new(File::open(path)?);

    let dim = read_usize(&mut file)?;
    if dim == 0 || dim > MAX_DIM {
        return Err(PuzzleError::CorruptFile(format!("dimension {dim}")));
    }
    let mut puzzle = Puzzle::new(dim)?;

    let move_count = read_usize(&mut file)?;
    for index in 0..move_count {
        let face = read_usize(&mut file)?;
        let depth = read_usize(&mut file)?;
        let direction = match read_u32(&mut file)? {
            0 => Direction::Clockwise,
            1 => Direction::CounterClockwise,
            other => {
                return Err(PuzzleError::CorruptFile(format!(
                    "move {index} has direction {other}"
                )))
            }
        };
        let count = read_usize(&mut file)?;
        let mv = Move::new(face, depth, direction, count);
        puzzle
            .apply(mv, true)
            .map_err(|e| PuzzleError::CorruptFile(format!("move {index} {mv}: {e}")))?;
    }

    let word_count = read_usize(&mut file)?;
    let expected = puzzle.to_binary()?;
    if word_count != expected.len() {
        return Err(PuzzleError::CorruptFile(format!(
            "expected {} packed words, found {word_count}",
            expected.len()
        )));
    }
    for (index, &word) in expected.iter().enumerate() {
        if read_u32(&mut file)? != word {
            return Err(PuzzleError::CorruptFile(format!(
                "coloring differs from replayed moves at word {index}"
            )));
        }
    }

    debug!("loaded {move_count} moves from {}", path.display());
    Ok(puzzle)
}

/// Returns the number of saved moves without replaying them.
pub fn count(path: &Path) -> Result<usize, PuzzleError> {
    let mut file = BufReader::new(File::open(path)?);
    read_u32(&mut file)?;
    read_usize(&mut file)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("rubix-{}-{name}.bin", std::process::id()))
    }

    #[test]
    fn test_round_trip() {
        let path = temp_path("round-trip");
        let mut puzzle = Puzzle::new(4).unwrap();
        puzzle.scramble(12, &mut StdRng::seed_from_u64(1)).unwrap();

        save(&puzzle, &path).unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(loaded.dim(), 4);
        assert_eq!(loaded.history(), puzzle.history());
        assert_eq!(loaded.to_state().unwrap(), puzzle.to_state().unwrap());
        assert_eq!(count(&path).unwrap(), 12);

        let text = std::fs::read_to_string(path.with_extension("txt")).unwrap();
        assert!(text.starts_with("Puzzle 4x4x4, 12 moves:"));

        std::fs::remove_file(&path).unwrap();
        std::fs::remove_file(path.with_extension("txt")).unwrap();
    }

    #[test]
    fn test_detects_tampered_coloring() {
        let path = temp_path("tampered");
        let mut puzzle = Puzzle::new(3).unwrap();
        puzzle.rotate(0, 0, Direction::Clockwise, 1, true).unwrap();
        save(&puzzle, &path).unwrap();

        let mut bytes = std::fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        std::fs::write(&path, &bytes).unwrap();
        assert!(matches!(load(&path), Err(PuzzleError::CorruptFile(_))));

        bytes.truncate(10);
        std::fs::write(&path, &bytes).unwrap();
        assert!(matches!(load(&path), Err(PuzzleError::CorruptFile(_))));

        std::fs::remove_file(&path).unwrap();
        std::fs::remove_file(path.with_extension("txt")).unwrap();
    }

    #[test]
    fn test_largest_puzzle_round_trips() {
        let path = temp_path("largest");
        let mut puzzle = Puzzle::new(MAX_DIM).unwrap();
        puzzle.rotate(2, MAX_DIM / 2, Direction::Clockwise, 1, true).unwrap();

        save(&puzzle, &path).unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(loaded.dim(), MAX_DIM);
        assert_eq!(loaded.to_state().unwrap(), puzzle.to_state().unwrap());

        std::fs::remove_file(&path).unwrap();
        std::fs::remove_file(path.with_extension("txt")).unwrap();
    }

    #[test]
    fn test_oversized_dimension_is_corrupt() {
        let path = temp_path("oversized");
        let mut bytes = Vec::new();
        for field in [MAX_DIM as u32 + 1, 0, 0] {
            bytes.extend_from_slice(&field.to_le_bytes());
        }
        std::fs::write(&path, &bytes).unwrap();
        assert!(matches!(load(&path), Err(PuzzleError::CorruptFile(_))));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            load(&temp_path("missing")),
            Err(PuzzleError::Io(_))
        ));
    }
}
