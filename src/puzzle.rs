//! The puzzle: an arena of pieces, six faces and the move history.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use log::debug;
use rand::Rng;
use rustc_hash::FxHashMap;

use crate::error::PuzzleError;
use crate::face::Face;
use crate::geometry::{add, Vec3, FACE_COUNT, FACE_NORMALS};
use crate::grid::{flatten, pack, FaceColorings};
use crate::piece::{join, Piece, PieceId, PieceKind};
use crate::scoring::score_face;

/// The eight corners, each listed by the three faces it shows.
pub const CORNER_CYCLES: [[usize; 3]; 8] = [
    [0, 3, 1],
    [0, 1, 2],
    [0, 2, 4],
    [0, 4, 3],
    [5, 3, 4],
    [5, 4, 2],
    [5, 2, 1],
    [5, 1, 3],
];

/// Turn direction as seen from outside the turned face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Clockwise,
    CounterClockwise,
}

impl Direction {
    pub fn inverse(self) -> Self {
        match self {
            Direction::Clockwise => Direction::CounterClockwise,
            Direction::CounterClockwise => Direction::Clockwise,
        }
    }

    /// Clockwise quarter turns equivalent to `count` turns this way, mod 4.
    pub fn clockwise_turns(self, count: usize) -> usize {
        match self {
            Direction::Clockwise => count % 4,
            Direction::CounterClockwise => (4 - count % 4) % 4,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Clockwise => "cw",
            Direction::CounterClockwise => "ccw",
        })
    }
}

impl FromStr for Direction {
    type Err = PuzzleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cw" => Ok(Direction::Clockwise),
            "ccw" => Ok(Direction::CounterClockwise),
            other => Err(PuzzleError::InvalidArgument(format!(
                "direction must be cw or ccw, got {other}"
            ))),
        }
    }
}

/// A layer turn: `count` quarter turns of the layer `depth` steps in from
/// `face`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub face: usize,
    pub depth: usize,
    pub direction: Direction,
    pub count: usize,
}

impl Move {
    pub fn new(face: usize, depth: usize, direction: Direction, count: usize) -> Self {
        Self {
            face,
            depth,
            direction,
            count,
        }
    }

    pub fn inverse(self) -> Self {
        Self {
            direction: self.direction.inverse(),
            ..self
        }
    }

    /// True for moves that leave every layer in place.
    pub fn is_identity(&self) -> bool {
        self.direction.clockwise_turns(self.count) == 0
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.face, self.depth, self.direction, self.count
        )
    }
}

/// A piece as handed to a renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PieceView {
    pub id: PieceId,
    pub serial: u64,
    /// Offset from the first visited piece, in piece widths.
    pub position: Vec3,
    pub coloring: [u8; FACE_COUNT],
}

#[derive(Clone, Debug)]
pub struct Puzzle {
    dim: usize,
    pub pieces: Vec<Piece>,
    pub faces: Vec<Face>,
    history: Vec<Move>,
}

/// Largest side length a puzzle can be built with.
pub const MAX_DIM: usize = 128;

/// Number of pieces on a puzzle of side `dim`: the cube minus its hidden core.
pub const fn piece_count_for(dim: usize) -> usize {
    let core = dim.saturating_sub(2);
    let cube = dim.saturating_mul(dim).saturating_mul(dim);
    cube.saturating_sub(core.saturating_mul(core).saturating_mul(core))
}

impl Puzzle {
    /// Builds a solved puzzle of side `dim`.
    pub fn new(dim: usize) -> Result<Self, PuzzleError> {
        if dim == 0 {
            return Err(PuzzleError::InvalidArgument(
                "puzzle side length must be at least 1".to_string(),
            ));
        }
        if dim > MAX_DIM {
            return Err(PuzzleError::OutOfRange {
                what: "dimension",
                value: dim,
                max: MAX_DIM + 1,
            });
        }

        let mut puzzle = Self {
            dim,
            pieces: Vec::with_capacity(piece_count_for(dim)),
            faces: (0..FACE_COUNT).map(|id| Face::new(id, dim)).collect(),
            history: Vec::new(),
        };

        if dim == 1 {
            puzzle
                .pieces
                .push(Piece::new(PieceKind::Center, &[0, 1, 2, 3, 4, 5]));
            for face in &mut puzzle.faces {
                face.add_center(PieceId(0));
            }
            return Ok(puzzle);
        }

        let corners = puzzle.build_corners();
        puzzle.build_edges(&corners);
        puzzle.build_faces()?;

        debug!(
            "built {}x{}x{} puzzle with {} pieces",
            dim,
            dim,
            dim,
            puzzle.pieces.len()
        );
        Ok(puzzle)
    }

    fn build_corners(&mut self) -> Vec<PieceId> {
        CORNER_CYCLES
            .iter()
            .map(|cycle| {
                let corner = PieceId(self.pieces.len());
                self.pieces.push(Piece::new(PieceKind::Corner, cycle));
                for &face in cycle {
                    self.faces[face].add_corner(corner);
                }
                corner
            })
            .collect()
    }

    /// Links every pair of corners that share an edge through a chain of
    /// `dim - 2` edge pieces.
    ///
    /// The two faces the corners share become the chain's stickers; the
    /// faces each corner shows alone give the direction of travel.
    fn build_edges(&mut self, corners: &[PieceId]) {
        for i in 0..CORNER_CYCLES.len() {
            for k in i + 1..CORNER_CYCLES.len() {
                let shared: Vec<usize> = CORNER_CYCLES[i]
                    .iter()
                    .copied()
                    .filter(|face| CORNER_CYCLES[k].contains(face))
                    .collect();
                if shared.len() != 2 {
                    continue;
                }

                let Some(&toward_i) = CORNER_CYCLES[i].iter().find(|f| !shared.contains(f))
                else {
                    continue;
                };
                let Some(&toward_k) = CORNER_CYCLES[k].iter().find(|f| !shared.contains(f))
                else {
                    continue;
                };

                let mut previous = corners[i];
                for _ in 0..self.dim - 2 {
                    let edge = PieceId(self.pieces.len());
                    self.pieces.push(Piece::new(PieceKind::Edge, &shared));
                    for &face in &shared {
                        self.faces[face].add_edge(edge);
                    }
                    join(&mut self.pieces, edge, previous, toward_i, toward_k);
                    previous = edge;
                }
                join(&mut self.pieces, corners[k], previous, toward_i, toward_k);
            }
        }
    }

    fn build_faces(&mut self) -> Result<(), PuzzleError> {
        for face in &mut self.faces {
            face.fill(&mut self.pieces)?;
        }
        Ok(())
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn piece_count(&self) -> usize {
        piece_count_for(self.dim)
    }

    /// Applied moves, oldest first.
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Turns a layer and, when `store` is set, records the move.
    pub fn rotate(
        &mut self,
        face: usize,
        depth: usize,
        direction: Direction,
        count: usize,
        store: bool,
    ) -> Result<(), PuzzleError> {
        if face >= FACE_COUNT {
            return Err(PuzzleError::OutOfRange {
                what: "face",
                value: face,
                max: FACE_COUNT,
            });
        }

        self.faces[face].rotate(&mut self.pieces, depth, direction, count)?;
        if store {
            self.history.push(Move::new(face, depth, direction, count));
        }
        Ok(())
    }

    pub fn apply(&mut self, mv: Move, store: bool) -> Result<(), PuzzleError> {
        self.rotate(mv.face, mv.depth, mv.direction, mv.count, store)
    }

    /// Pops the last recorded move and returns its inverse, unapplied.
    pub fn reverse_last_move(&mut self) -> Option<Move> {
        self.history.pop().map(Move::inverse)
    }

    /// Undoes the last recorded move.
    pub fn undo(&mut self) -> Result<Option<Move>, PuzzleError> {
        match self.reverse_last_move() {
            Some(mv) => {
                self.apply(mv, false)?;
                Ok(Some(mv))
            }
            None => Ok(None),
        }
    }

    /// Applies `count` random moves and records them.
    pub fn scramble<R: Rng>(&mut self, count: usize, rng: &mut R) -> Result<Vec<Move>, PuzzleError> {
        let depth_limit = self.dim.saturating_sub(1).max(1);
        let moves: Vec<Move> = (0..count)
            .map(|_| {
                let direction = if rng.gen_bool(0.5) {
                    Direction::Clockwise
                } else {
                    Direction::CounterClockwise
                };
                Move::new(
                    rng.gen_range(0..FACE_COUNT),
                    rng.gen_range(0..depth_limit),
                    direction,
                    rng.gen_range(1..4),
                )
            })
            .collect();

        for &mv in &moves {
            self.apply(mv, true)?;
        }
        Ok(moves)
    }

    /// Restores the solved state and clears the history.
    pub fn reset(&mut self) -> Result<(), PuzzleError> {
        *self = Self::new(self.dim)?;
        Ok(())
    }

    /// Per-face N×N color grids.
    pub fn to_face_colorings(&self) -> Result<FaceColorings, PuzzleError> {
        self.faces
            .iter()
            .map(|face| face.to_2d_array(&self.pieces))
            .collect()
    }

    /// Flat `6 × N × N` state, one face after another.
    pub fn to_state(&self) -> Result<Vec<u8>, PuzzleError> {
        flatten(&self.to_face_colorings()?, self.dim)
    }

    /// The flat state packed as 3-bit fields.
    pub fn to_binary(&self) -> Result<Vec<u32>, PuzzleError> {
        Ok(pack(&self.to_state()?))
    }

    /// Repaints every sticker from per-face grids.
    pub fn set_colorings(&mut self, colorings: &[Vec<Vec<u8>>]) -> Result<(), PuzzleError> {
        flatten(colorings, self.dim)?;
        for (face, colors) in self.faces.iter().zip(colorings) {
            face.set_colors(&mut self.pieces, colors)?;
        }
        Ok(())
    }

    /// Homogeneity score of every face.
    pub fn scores(&self) -> Result<[f64; FACE_COUNT], PuzzleError> {
        let colorings = self.to_face_colorings()?;
        let mut scores = [0.0; FACE_COUNT];
        for (score, face) in scores.iter_mut().zip(&colorings) {
            *score = score_face(&face.concat(), self.dim);
        }
        Ok(scores)
    }

    pub fn is_solved(&self) -> Result<bool, PuzzleError> {
        Ok(self.scores()?.iter().all(|&score| score == 1.0))
    }

    /// Per-piece colorings in arena order.
    pub fn piece_colorings(&self) -> Vec<[u8; FACE_COUNT]> {
        self.pieces.iter().map(Piece::coloring).collect()
    }

    /// Breadth-first walk over every piece, for renderers.
    ///
    /// Starts at the corner listed last on face 5 (or the only piece) and
    /// steps one face normal per link.
    pub fn visit_sequence(&self) -> Vec<PieceView> {
        let Some(start) = self.faces[5]
            .corners
            .get(3)
            .copied()
            .or(self.faces[5].center)
        else {
            return Vec::new();
        };

        let mut positions: FxHashMap<PieceId, Vec3> = FxHashMap::default();
        positions.insert(start, (0, 0, 0));
        let mut queue = VecDeque::from([start]);
        let mut sequence = Vec::with_capacity(self.pieces.len());

        while let Some(current) = queue.pop_front() {
            let piece = &self.pieces[current.0];
            let position = positions[&current];
            sequence.push(PieceView {
                id: current,
                serial: piece.serial,
                position,
                coloring: piece.coloring(),
            });

            for face in 0..FACE_COUNT {
                if let Some(next) = piece.link(face) {
                    if !positions.contains_key(&next) {
                        positions.insert(next, add(position, FACE_NORMALS[face]));
                        queue.push_back(next);
                    }
                }
            }
        }

        sequence
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rustc_hash::FxHashSet;

    use super::*;
    use crate::geometry::opposite;
    use crate::grid::{apply_permutation, layer_permutation, solved_state};
    use crate::piece::FaceSlot;

    #[test]
    fn test_piece_count_formula() {
        let expected = [1, 8, 26, 56, 98, 152, 218, 296, 386, 488];
        for (dim, &count) in (1..=10).zip(expected.iter()) {
            assert_eq!(piece_count_for(dim), count);
            let puzzle = Puzzle::new(dim).unwrap();
            assert_eq!(puzzle.pieces.len(), count, "dim {dim}");
        }
    }

    #[test]
    fn test_dimension_limits() {
        assert!(matches!(Puzzle::new(0), Err(PuzzleError::InvalidArgument(_))));
        assert!(matches!(
            Puzzle::new(MAX_DIM + 1),
            Err(PuzzleError::OutOfRange { what: "dimension", .. })
        ));
        assert!(Puzzle::new(usize::MAX).is_err());
        assert_eq!(piece_count_for(usize::MAX), usize::MAX);
    }

    #[test]
    fn test_links_are_symmetric() {
        for dim in 1..=6 {
            let puzzle = Puzzle::new(dim).unwrap();
            for (index, piece) in puzzle.pieces.iter().enumerate() {
                for face in 0..FACE_COUNT {
                    if let FaceSlot::Link(other) = piece.face(face) {
                        assert_eq!(
                            puzzle.pieces[other.0].face(opposite(face)),
                            FaceSlot::Link(PieceId(index)),
                            "dim {dim}, piece {index}, face {face}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_piece_kinds_show_expected_stickers() {
        let puzzle = Puzzle::new(5).unwrap();
        let mut kinds = FxHashMap::default();
        for piece in &puzzle.pieces {
            let expected = match piece.kind {
                PieceKind::Corner => 3,
                PieceKind::Edge => 2,
                PieceKind::Center | PieceKind::Interior => 1,
            };
            assert_eq!(piece.color_count(), expected);
            *kinds.entry(piece.kind).or_insert(0) += 1;
        }
        assert_eq!(kinds[&PieceKind::Corner], 8);
        assert_eq!(kinds[&PieceKind::Edge], 36);
        assert_eq!(kinds[&PieceKind::Center], 6);
        assert_eq!(kinds[&PieceKind::Interior], 48);
    }

    #[test]
    fn test_solved_export() {
        for dim in 1..=5 {
            let puzzle = Puzzle::new(dim).unwrap();
            assert_eq!(puzzle.to_state().unwrap(), solved_state(dim));
            assert!(puzzle.is_solved().unwrap());
        }
    }

    #[test]
    fn test_rotation_is_reversible() {
        for dim in 1..=5 {
            let mut puzzle = Puzzle::new(dim).unwrap();
            puzzle.scramble(8, &mut StdRng::seed_from_u64(dim as u64)).unwrap();
            let before = puzzle.piece_colorings();
            for face in 0..FACE_COUNT {
                for depth in 0..dim {
                    for count in 1..4 {
                        puzzle
                            .rotate(face, depth, Direction::Clockwise, count, false)
                            .unwrap();
                        puzzle
                            .rotate(face, depth, Direction::CounterClockwise, count, false)
                            .unwrap();
                        assert_eq!(
                            puzzle.piece_colorings(),
                            before,
                            "dim {dim}, face {face}, depth {depth}, count {count}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_four_quarter_turns_are_identity() {
        for dim in 2..=4 {
            let mut puzzle = Puzzle::new(dim).unwrap();
            puzzle.scramble(5, &mut StdRng::seed_from_u64(7)).unwrap();
            let before = puzzle.piece_colorings();
            for face in 0..FACE_COUNT {
                for depth in 0..dim {
                    puzzle.rotate(face, depth, Direction::Clockwise, 4, false).unwrap();
                    assert_eq!(puzzle.piece_colorings(), before);
                    for _ in 0..4 {
                        puzzle
                            .rotate(face, depth, Direction::CounterClockwise, 1, false)
                            .unwrap();
                    }
                    assert_eq!(puzzle.piece_colorings(), before);
                }
            }
        }
    }

    #[test]
    fn test_turn_breaks_and_restores_solved_state() {
        let mut puzzle = Puzzle::new(3).unwrap();
        puzzle.rotate(2, 1, Direction::Clockwise, 1, true).unwrap();
        assert!(!puzzle.is_solved().unwrap());
        assert_eq!(puzzle.history().len(), 1);
        puzzle.undo().unwrap();
        assert!(puzzle.is_solved().unwrap());
        assert!(puzzle.history().is_empty());
    }

    #[test]
    fn test_reverse_last_move_round_trip() {
        let mut puzzle = Puzzle::new(4).unwrap();
        let before = puzzle.piece_colorings();
        let moves = puzzle.scramble(20, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(puzzle.history(), moves.as_slice());
        assert_ne!(puzzle.piece_colorings(), before);

        while let Some(mv) = puzzle.reverse_last_move() {
            puzzle.apply(mv, false).unwrap();
        }
        assert_eq!(puzzle.piece_colorings(), before);
    }

    #[test]
    fn test_reverse_last_move_inverts_direction() {
        let mut puzzle = Puzzle::new(3).unwrap();
        puzzle.rotate(1, 0, Direction::Clockwise, 2, true).unwrap();
        assert_eq!(
            puzzle.reverse_last_move(),
            Some(Move::new(1, 0, Direction::CounterClockwise, 2))
        );
        assert_eq!(puzzle.reverse_last_move(), None);
    }

    #[test]
    fn test_invalid_rotations_are_errors() {
        let mut puzzle = Puzzle::new(3).unwrap();
        assert!(matches!(
            puzzle.rotate(6, 0, Direction::Clockwise, 1, true),
            Err(PuzzleError::OutOfRange { what: "face", .. })
        ));
        assert!(matches!(
            puzzle.rotate(0, 3, Direction::Clockwise, 1, true),
            Err(PuzzleError::OutOfRange { what: "depth", .. })
        ));
        assert!(puzzle.history().is_empty());
    }

    #[test]
    fn test_graph_rotation_matches_sticker_permutation() {
        for dim in 1..=5 {
            let mut puzzle = Puzzle::new(dim).unwrap();
            puzzle.scramble(4, &mut StdRng::seed_from_u64(11)).unwrap();
            for face in 0..FACE_COUNT {
                for depth in 0..dim {
                    for count in 1..4 {
                        let before = puzzle.to_state().unwrap();
                        let mut expected = vec![0; before.len()];
                        apply_permutation(
                            &layer_permutation(dim, face, depth, count),
                            &before,
                            &mut expected,
                        );

                        puzzle
                            .rotate(face, depth, Direction::Clockwise, count, false)
                            .unwrap();
                        assert_eq!(
                            puzzle.to_state().unwrap(),
                            expected,
                            "dim {dim}, face {face}, depth {depth}, count {count}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_far_layer_turn_matches_opposite_face() {
        let mut far = Puzzle::new(4).unwrap();
        far.rotate(0, 3, Direction::Clockwise, 1, false).unwrap();
        let mut near = Puzzle::new(4).unwrap();
        near.rotate(5, 0, Direction::CounterClockwise, 1, false).unwrap();
        assert_eq!(far.to_state().unwrap(), near.to_state().unwrap());
    }

    #[test]
    fn test_set_colorings_round_trip() {
        let mut source = Puzzle::new(3).unwrap();
        source.scramble(10, &mut StdRng::seed_from_u64(3)).unwrap();
        let colorings = source.to_face_colorings().unwrap();

        let mut target = Puzzle::new(3).unwrap();
        target.set_colorings(&colorings).unwrap();
        assert_eq!(target.to_face_colorings().unwrap(), colorings);
        assert_eq!(target.piece_colorings(), source.piece_colorings());
        assert!(target.set_colorings(&colorings[..3]).is_err());
    }

    #[test]
    fn test_reset_restores_solved_state() {
        let mut puzzle = Puzzle::new(3).unwrap();
        puzzle.scramble(6, &mut StdRng::seed_from_u64(9)).unwrap();
        puzzle.reset().unwrap();
        assert!(puzzle.is_solved().unwrap());
        assert!(puzzle.history().is_empty());
    }

    #[test]
    fn test_visit_sequence_places_every_piece_once() {
        for dim in 1..=5 {
            let puzzle = Puzzle::new(dim).unwrap();
            let sequence = puzzle.visit_sequence();
            assert_eq!(sequence.len(), puzzle.piece_count());

            let positions: FxHashSet<Vec3> = sequence.iter().map(|view| view.position).collect();
            assert_eq!(positions.len(), sequence.len(), "dim {dim} overlaps pieces");

            let span = dim as i32 - 1;
            for axis in 0..3 {
                let coord = |v: &Vec3| [v.0, v.1, v.2][axis];
                let min = positions.iter().map(coord).min().unwrap();
                let max = positions.iter().map(coord).max().unwrap();
                assert_eq!(max - min, span);
            }
        }
    }

    #[test]
    fn test_move_display() {
        let mv = Move::new(2, 1, Direction::CounterClockwise, 3);
        assert_eq!(mv.to_string(), "[2, 1, ccw, 3]");
        assert_eq!("cw".parse::<Direction>().unwrap(), Direction::Clockwise);
        assert!("up".parse::<Direction>().is_err());
    }
}
