//! Error taxonomy shared by the piece graph, the move search and persistence.

use thiserror::Error;

use crate::piece::PieceId;

#[derive(Error, Debug)]
pub enum PuzzleError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("{what} out of range, expected a value below {max} but got {value}")]
    OutOfRange {
        what: &'static str,
        value: usize,
        max: usize,
    },
    #[error("Dimension mismatch in {context}, expected {expected} but got {found}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Piece {piece:?} has no link on face {face}")]
    BrokenLink { piece: PieceId, face: usize },
    #[error("Piece {to:?} cannot take on the stickers of piece {from:?}")]
    Misaligned { from: PieceId, to: PieceId },
    #[error("Corrupt state file: {0}")]
    CorruptFile(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
