//! Breadth-limited move search over flattened puzzle states.
//!
//! Each generation applies every move in the move set to every state of the
//! previous generation, so generation `g` holds `moves^g` states laid out
//! back to back. Child `i` of a generation is move `i % moves` applied to
//! parent `i / moves`, which makes a leaf's index the mixed-radix encoding of
//! its move path. Only the final generation is scored.

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::error::PuzzleError;
use crate::geometry::FACE_COUNT;
use crate::grid::{apply_permutation, flatten, layer_permutation, unflatten, unpack, FaceColorings};
use crate::puzzle::{Direction, Move, Puzzle};
use crate::scoring::score_state;
use crate::StateEvaluator;

/// Face used as the turning axis for each of the three axes.
const AXIS_FACES: [usize; 3] = [0, 1, 2];

/// Score of a state whose six faces are each a single color.
pub const SOLVED_SCORE: f64 = FACE_COUNT as f64;

/// One entry of the move set: `turns` clockwise quarter turns of the layer
/// `depth` steps in from `face`. `turns == 0` is the identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchMove {
    pub face: usize,
    pub depth: usize,
    pub turns: usize,
}

impl SearchMove {
    pub fn is_identity(&self) -> bool {
        self.turns == 0
    }

    pub fn to_move(self) -> Move {
        Move::new(self.face, self.depth, Direction::Clockwise, self.turns)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchConfig {
    /// Search depth used when none is given explicitly.
    pub generations: usize,
    /// Peak bytes one generation step may hold: the parent and child state
    /// buffers plus the per-leaf score vectors. The first generation is
    /// always expanded.
    pub memory_limit_bytes: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            generations: 2,
            memory_limit_bytes: 256 * 1024 * 1024,
        }
    }
}

/// Result of a search: the best leaf and the path that reaches it.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    /// Leaf index within the final generation.
    pub max_index: usize,
    /// Total score of the best leaf.
    pub max: f64,
    /// Per-face scores of the best leaf.
    pub val: [f64; FACE_COUNT],
    /// Move-set indices along the best path, first move first.
    pub move_indices: Vec<usize>,
    pub moves: Vec<Move>,
    /// Generations actually expanded.
    pub generation: usize,
    /// Colorings of the best leaf.
    pub puzzle_state: FaceColorings,
}

impl Evaluation {
    /// The first move of the best path that actually turns something.
    pub fn best_move(&self) -> Option<Move> {
        self.moves.iter().copied().find(|mv| !mv.is_identity())
    }

    pub fn is_solved(&self) -> bool {
        self.max >= SOLVED_SCORE
    }
}

#[derive(Clone, Debug)]
pub struct MoveEvaluator {
    dim: usize,
    config: SearchConfig,
    moves: Vec<SearchMove>,
    tables: Vec<Vec<u32>>,
}

impl MoveEvaluator {
    pub fn new(dim: usize, config: SearchConfig) -> Result<Self, PuzzleError> {
        if dim == 0 {
            return Err(PuzzleError::InvalidArgument(
                "puzzle side length must be at least 1".to_string(),
            ));
        }

        let mut moves = vec![SearchMove {
            face: 0,
            depth: 0,
            turns: 0,
        }];
        for face in AXIS_FACES {
            for depth in 0..dim {
                for turns in 1..4 {
                    moves.push(SearchMove { face, depth, turns });
                }
            }
        }

        let tables = moves
            .iter()
            .map(|mv| layer_permutation(dim, mv.face, mv.depth, mv.turns))
            .collect();

        debug!("move evaluator for dim {dim}: {} moves", moves.len());
        Ok(Self {
            dim,
            config,
            moves,
            tables,
        })
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// The move set, identity first.
    pub fn moves(&self) -> &[SearchMove] {
        &self.moves
    }

    fn stride(&self) -> usize {
        FACE_COUNT * self.dim * self.dim
    }

    /// Searches `generations` moves deep from the given colorings.
    pub fn evaluate(
        &self,
        generations: usize,
        colorings: &[Vec<Vec<u8>>],
    ) -> Result<Evaluation, PuzzleError> {
        let state = flatten(colorings, self.dim)?;
        self.evaluate_state(generations, state)
    }

    /// Searches with the configured number of generations.
    pub fn evaluate_default(&self, colorings: &[Vec<Vec<u8>>]) -> Result<Evaluation, PuzzleError> {
        self.evaluate(self.config.generations, colorings)
    }

    /// Searches from a state packed as 3-bit fields.
    pub fn evaluate_packed(&self, generations: usize, words: &[u32]) -> Result<Evaluation, PuzzleError> {
        let state = unpack(words, self.stride())?;
        self.evaluate(generations, &unflatten(&state, self.dim))
    }

    fn evaluate_state(&self, generations: usize, state: Vec<u8>) -> Result<Evaluation, PuzzleError> {
        if generations == 0 {
            return Err(PuzzleError::InvalidArgument(
                "search needs at least one generation".to_string(),
            ));
        }

        let stride = self.stride();
        let move_count = self.moves.len();
        let mut current = state;
        let mut next = Vec::new();
        let mut states = 1usize;
        let mut generation = 0;

        while generation < generations {
            let children = states.checked_mul(move_count);
            let bytes = children.and_then(|c| c.checked_mul(stride));
            let footprint = children.and_then(|c| generation_footprint(states, c, stride));
            let (children, bytes) = match (children, bytes, footprint) {
                (Some(children), Some(bytes), Some(footprint))
                    if generation == 0 || footprint <= self.config.memory_limit_bytes =>
                {
                    (children, bytes)
                }
                _ => {
                    warn!(
                        "stopping at generation {generation} of {generations}: next generation exceeds {} bytes",
                        self.config.memory_limit_bytes
                    );
                    break;
                }
            };

            next.clear();
            next.resize(bytes, 0);
            next.par_chunks_mut(stride)
                .enumerate()
                .for_each(|(child, output)| {
                    let parent = child / move_count;
                    let input = &current[parent * stride..(parent + 1) * stride];
                    apply_permutation(&self.tables[child % move_count], input, output);
                });
            std::mem::swap(&mut current, &mut next);

            states = children;
            generation += 1;
            debug!("generation {generation}: {states} states, {bytes} bytes");
        }

        let scores: Vec<[f64; FACE_COUNT]> = current
            .par_chunks(stride)
            .map(|leaf| score_state(leaf, self.dim))
            .collect();

        let (max_index, max) = best_leaf(&scores);
        let move_indices = decode_path(max_index, move_count, generation);
        let moves = move_indices
            .iter()
            .map(|&index| self.moves[index].to_move())
            .collect();

        let leaf = &current[max_index * stride..(max_index + 1) * stride];
        let evaluation = Evaluation {
            max_index,
            max,
            val: scores[max_index],
            move_indices,
            moves,
            generation,
            puzzle_state: unflatten(leaf, self.dim),
        };

        info!(
            "best of {} leaves after {} generations: score {:.4}, path {:?}",
            scores.len(),
            generation,
            evaluation.max,
            evaluation.move_indices
        );
        Ok(evaluation)
    }
}

/// Bytes held while expanding `parents` states into `children`: both state
/// buffers and, should this be the last generation, the children's scores.
fn generation_footprint(parents: usize, children: usize, stride: usize) -> Option<usize> {
    let buffers = parents.checked_add(children)?.checked_mul(stride)?;
    let scores = children.checked_mul(std::mem::size_of::<[f64; FACE_COUNT]>())?;
    buffers.checked_add(scores)
}

/// Index and total of the highest-scoring leaf; the lowest index wins ties.
fn best_leaf(scores: &[[f64; FACE_COUNT]]) -> (usize, f64) {
    let mut best = (0, f64::NEG_INFINITY);
    for (index, faces) in scores.iter().enumerate() {
        let total: f64 = faces.iter().sum();
        if total > best.1 {
            best = (index, total);
        }
    }
    best
}

/// Splits a leaf index into its per-generation move indices, first move first.
fn decode_path(mut index: usize, move_count: usize, generations: usize) -> Vec<usize> {
    let mut path = vec![0; generations];
    for slot in path.iter_mut().rev() {
        *slot = index % move_count;
        index /= move_count;
    }
    path
}

/// Greedily solves `puzzle` by repeatedly applying the first real move of the
/// best path found `generations` deep.
///
/// Stops when the puzzle is solved, when no move improves on standing still,
/// or after `max_steps` moves. Returns the applied moves.
pub fn solve(
    evaluator: &dyn StateEvaluator,
    puzzle: &mut Puzzle,
    generations: usize,
    max_steps: usize,
) -> Result<Vec<Move>, PuzzleError> {
    if evaluator.dim() != puzzle.dim() {
        return Err(PuzzleError::DimensionMismatch {
            context: "evaluator dimension",
            expected: puzzle.dim(),
            found: evaluator.dim(),
        });
    }

    let mut applied = Vec::new();
    while applied.len() < max_steps {
        if puzzle.is_solved()? {
            break;
        }

        let evaluation = evaluator.evaluate(generations, &puzzle.to_face_colorings()?)?;
        let Some(mv) = evaluation.best_move() else {
            info!("no move improves the current state, stopping");
            break;
        };

        puzzle.apply(mv, true)?;
        applied.push(mv);
        info!(
            "step {}: applied {mv}, best path score {:.4}",
            applied.len(),
            evaluation.max
        );
    }

    Ok(applied)
}
