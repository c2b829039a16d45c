//! N×N×N Twisty Puzzle Library
//!
//! Models the puzzle as a linked graph of pieces, turns layers at any depth
//! and searches for good move sequences by scoring face homogeneity.

pub mod error;
pub mod evaluator;
pub mod face;
pub mod geometry;
pub mod grid;
pub mod persistence;
pub mod piece;
pub mod puzzle;
pub mod scoring;

use error::PuzzleError;
use evaluator::{Evaluation, MoveEvaluator};

/// Anything that can rank move sequences from a flattened coloring.
///
/// The CPU search implements it; an accelerator-backed search would slot in
/// behind the same calls.
pub trait StateEvaluator {
    fn dim(&self) -> usize;
    fn evaluate(
        &self,
        generations: usize,
        colorings: &[Vec<Vec<u8>>],
    ) -> Result<Evaluation, PuzzleError>;
    fn evaluate_packed(&self, generations: usize, words: &[u32]) -> Result<Evaluation, PuzzleError>;
}

impl StateEvaluator for MoveEvaluator {
    fn dim(&self) -> usize {
        MoveEvaluator::dim(self)
    }

    fn evaluate(
        &self,
        generations: usize,
        colorings: &[Vec<Vec<u8>>],
    ) -> Result<Evaluation, PuzzleError> {
        MoveEvaluator::evaluate(self, generations, colorings)
    }

    fn evaluate_packed(&self, generations: usize, words: &[u32]) -> Result<Evaluation, PuzzleError> {
        MoveEvaluator::evaluate_packed(self, generations, words)
    }
}
