//! One side of the puzzle and the layer rotations driven from it.
//!
//! A face arranges its pieces in concentric square rings. The outer ring is
//! the corner/edge skeleton shared with the neighbouring faces; inner rings
//! are interior pieces owned by this face, down to a single center piece on
//! odd-sized puzzles. Ring positions are listed clockwise from the top-left
//! corner, side `k` running along `joint_path[k]` toward `joint_path[k + 1]`.

use rustc_hash::FxHashSet;

use crate::error::PuzzleError;
use crate::geometry::{opposite, COLOR_COUNT, JOINT_PATHS};
use crate::grid::pack;
use crate::piece::{deep_piece, join, FaceSlot, Piece, PieceId, PieceKind};
use crate::puzzle::Direction;

/// Grid step for each joint direction: up, right, down, left.
const MARCH_STEPS: [(isize, isize); 4] = [(-1, 0), (0, 1), (1, 0), (0, -1)];

#[derive(Clone, Debug)]
pub struct Face {
    pub id: usize,
    dim: usize,
    joint_path: [usize; 4],
    /// Clockwise from the top-left corner once the face is filled.
    pub corners: Vec<PieceId>,
    pub edges: Vec<PieceId>,
    pub interiors: Vec<PieceId>,
    pub center: Option<PieceId>,
}

impl Face {
    pub fn new(id: usize, dim: usize) -> Self {
        Self {
            id,
            dim,
            joint_path: JOINT_PATHS[id],
            corners: Vec::with_capacity(4),
            edges: Vec::new(),
            interiors: Vec::new(),
            center: None,
        }
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn joint_path(&self) -> [usize; 4] {
        self.joint_path
    }

    pub fn add_corner(&mut self, corner: PieceId) {
        self.corners.push(corner);
    }

    pub fn add_edge(&mut self, edge: PieceId) {
        self.edges.push(edge);
    }

    pub fn add_center(&mut self, center: PieceId) {
        self.center = Some(center);
    }

    /// Builds the interior rings of this face and stitches every ring to its
    /// neighbours. Expects the corner/edge skeleton to be linked already.
    pub fn fill(&mut self, pieces: &mut Vec<Piece>) -> Result<(), PuzzleError> {
        let mut rings = vec![self.build_corner_ring(pieces)?];

        let mut side = self.dim;
        while side > 2 {
            side -= 2;
            rings.push(self.build_ring(pieces, side));
        }

        for pair in rings.windows(2) {
            self.merge(pieces, &pair[0], &pair[1]);
        }

        Ok(())
    }

    /// Walks the shared skeleton around this face's border, starting from the
    /// corner at the top-left of the grid.
    fn build_corner_ring(&mut self, pieces: &[Piece]) -> Result<Vec<PieceId>, PuzzleError> {
        let [top, _, _, left] = self.joint_path;
        let wanted = [self.id, top, left];
        let start = self
            .corners
            .iter()
            .copied()
            .find(|&corner| wanted.iter().all(|&face| pieces[corner.0].color(face).is_some()))
            .ok_or_else(|| {
                PuzzleError::InvalidArgument(format!(
                    "face {} has no top-left corner among {} corners",
                    self.id,
                    self.corners.len()
                ))
            })?;

        let chain = self.dim - 1;
        let mut cycle = Vec::with_capacity(4 * chain);
        let mut current = start;
        for side in 0..4 {
            let joint = self.joint_path[(side + 1) % 4];
            for _ in 0..chain {
                cycle.push(current);
                current = pieces[current.0].link(joint).ok_or(PuzzleError::BrokenLink {
                    piece: current,
                    face: joint,
                })?;
            }
        }

        self.corners = (0..4).map(|side| cycle[side * chain]).collect();
        Ok(cycle)
    }

    /// Creates a ring of fresh pieces with the given side length, linked head
    /// to tail.
    fn build_ring(&mut self, pieces: &mut Vec<Piece>, side: usize) -> Vec<PieceId> {
        if side == 1 {
            let center = PieceId(pieces.len());
            pieces.push(Piece::new(PieceKind::Center, &[self.id]));
            self.center = Some(center);
            return vec![center];
        }

        let chain = side - 1;
        let cycle: Vec<PieceId> = (0..4 * chain)
            .map(|_| {
                let id = PieceId(pieces.len());
                pieces.push(Piece::new(PieceKind::Interior, &[self.id]));
                id
            })
            .collect();
        self.interiors.extend_from_slice(&cycle);

        for (i, &piece) in cycle.iter().enumerate() {
            let joint = self.joint_path[(i / chain + 1) % 4];
            let next = cycle[(i + 1) % cycle.len()];
            join(pieces, piece, next, joint, opposite(joint));
        }

        cycle
    }

    /// Links every non-corner piece of `outer` to the piece of `inner` lying
    /// one step toward the middle of the face.
    ///
    /// Position `j` (1..side-1) on outer side `k` faces inner position
    /// `j - 1` on inner side `k`, which wraps onto the next inner corner for the
    /// last piece of the side.
    fn merge(&self, pieces: &mut [Piece], outer: &[PieceId], inner: &[PieceId]) {
        let outer_chain = outer.len() / 4;
        for (side, &joint) in self.joint_path.iter().enumerate() {
            for j in 1..outer_chain {
                let outer_piece = outer[side * outer_chain + j];
                let inner_piece = if inner.len() == 1 {
                    inner[0]
                } else {
                    let inner_chain = inner.len() / 4;
                    inner[(side * inner_chain + j - 1) % inner.len()]
                };
                join(pieces, outer_piece, inner_piece, opposite(joint), joint);
            }
        }
    }

    /// Spirals through the pieces reachable from `seed` in this face's plane.
    ///
    /// Moves along `joint_path[start]` until the next slot is a sticker, empty
    /// or already visited, then turns clockwise and retries. When every
    /// direction is closed, resumes from the latest visited piece that still
    /// has an open neighbour. Stops after `dim²` pieces or when nothing is
    /// left to reach. Each step carries the grid offset from the seed.
    fn walk(&self, pieces: &[Piece], seed: PieceId, start: usize) -> Vec<(PieceId, isize, isize)> {
        let limit = self.dim * self.dim;
        let mut visited = FxHashSet::default();
        visited.insert(seed);

        let mut path = Vec::with_capacity(limit);
        path.push((seed, 0, 0));

        let mut cursor = 0;
        let mut heading = start % 4;

        'march: while path.len() < limit {
            let (current, row, col) = path[cursor];
            for _ in 0..4 {
                if let Some(next) = pieces[current.0].link(self.joint_path[heading]) {
                    if visited.insert(next) {
                        let (dr, dc) = MARCH_STEPS[heading];
                        path.push((next, row + dr, col + dc));
                        cursor = path.len() - 1;
                        continue 'march;
                    }
                }
                heading = (heading + 1) % 4;
            }

            // a spiral begun mid-side closes its ring early
            let resume = (0..cursor)
                .rev()
                .find(|&i| self.has_open_neighbour(pieces, path[i].0, &visited));
            match resume {
                Some(i) => cursor = i,
                None => break,
            }
        }

        path
    }

    fn has_open_neighbour(
        &self,
        pieces: &[Piece],
        piece: PieceId,
        visited: &FxHashSet<PieceId>,
    ) -> bool {
        self.joint_path.iter().any(|&joint| {
            pieces[piece.0]
                .link(joint)
                .is_some_and(|next| !visited.contains(&next))
        })
    }

    /// Visiting order of the pieces in the layer that contains `seed`.
    pub fn march(&self, pieces: &[Piece], seed: PieceId, start: usize) -> Vec<PieceId> {
        self.walk(pieces, seed, start)
            .into_iter()
            .map(|(piece, _, _)| piece)
            .collect()
    }

    /// Pieces of this face in row-major grid order.
    pub fn grid_pieces(&self, pieces: &[Piece]) -> Result<Vec<PieceId>, PuzzleError> {
        if self.dim == 1 {
            let center = self.center.ok_or(PuzzleError::InvalidArgument(
                "single-piece face has no center".to_string(),
            ))?;
            return Ok(vec![center]);
        }

        let steps = self.walk(pieces, self.corners[0], 1);
        if steps.len() != self.dim * self.dim {
            return Err(PuzzleError::DimensionMismatch {
                context: "face march",
                expected: self.dim * self.dim,
                found: steps.len(),
            });
        }

        let mut grid = vec![self.corners[0]; self.dim * self.dim];
        for (piece, row, col) in steps {
            grid[row as usize * self.dim + col as usize] = piece;
        }
        Ok(grid)
    }

    /// Sticker colors of this face as an N×N grid.
    pub fn to_2d_array(&self, pieces: &[Piece]) -> Result<Vec<Vec<u8>>, PuzzleError> {
        let grid = self.grid_pieces(pieces)?;
        grid.chunks(self.dim)
            .map(|row| {
                row.iter()
                    .map(|&piece| {
                        pieces[piece.0].color(self.id).ok_or(PuzzleError::BrokenLink {
                            piece,
                            face: self.id,
                        })
                    })
                    .collect::<Result<Vec<u8>, _>>()
            })
            .collect()
    }

    /// Row-major colors packed as 3-bit fields.
    pub fn to_binary(&self, pieces: &[Piece]) -> Result<Vec<u32>, PuzzleError> {
        let colors: Vec<u8> = self.to_2d_array(pieces)?.concat();
        Ok(pack(&colors))
    }

    /// Writes an N×N grid of colors onto this face's stickers.
    ///
    /// The whole grid is checked before any sticker changes.
    pub fn set_colors(&self, pieces: &mut [Piece], colors: &[Vec<u8>]) -> Result<(), PuzzleError> {
        if colors.len() != self.dim {
            return Err(PuzzleError::DimensionMismatch {
                context: "face rows",
                expected: self.dim,
                found: colors.len(),
            });
        }
        for row in colors {
            if row.len() != self.dim {
                return Err(PuzzleError::DimensionMismatch {
                    context: "face columns",
                    expected: self.dim,
                    found: row.len(),
                });
            }
            if let Some(&color) = row.iter().find(|&&c| usize::from(c) >= COLOR_COUNT) {
                return Err(PuzzleError::InvalidArgument(format!(
                    "color {color} on face {}",
                    self.id
                )));
            }
        }

        let grid = self.grid_pieces(pieces)?;
        for (&piece, &color) in grid.iter().zip(colors.iter().flatten()) {
            pieces[piece.0].set_face(self.id, FaceSlot::Color(color));
        }
        Ok(())
    }

    /// Turns the layer `depth` steps in from this face.
    ///
    /// The layer is marched twice: once from the top-left corner's column and
    /// once from the corner the turn carries it to. Position `i` of the second
    /// march receives the stickers of position `i` of the first. All new data
    /// is computed before any piece is written.
    pub fn rotate(
        &self,
        pieces: &mut [Piece],
        depth: usize,
        direction: Direction,
        count: usize,
    ) -> Result<(), PuzzleError> {
        if depth >= self.dim {
            return Err(PuzzleError::OutOfRange {
                what: "depth",
                value: depth,
                max: self.dim,
            });
        }

        let turns = direction.clockwise_turns(count);
        if turns == 0 {
            return Ok(());
        }

        // stickers keep to the layer plane; the far face turns the other way
        let (const_face, const_turns) = if depth + 1 < self.dim {
            (self.id, turns)
        } else {
            (opposite(self.id), (4 - turns) % 4)
        };

        let (start, finish) = if self.dim == 1 {
            let piece = self.center.ok_or(PuzzleError::InvalidArgument(
                "single-piece face has no center".to_string(),
            ))?;
            (vec![piece], vec![piece])
        } else {
            let inward = opposite(self.id);
            let from = deep_piece(pieces, self.corners[0], inward, depth).ok_or(
                PuzzleError::BrokenLink {
                    piece: self.corners[0],
                    face: inward,
                },
            )?;
            let to = deep_piece(pieces, self.corners[turns], inward, depth).ok_or(
                PuzzleError::BrokenLink {
                    piece: self.corners[turns],
                    face: inward,
                },
            )?;
            (self.march(pieces, from, 1), self.march(pieces, to, 1 + turns))
        };

        if start.len() != finish.len() {
            return Err(PuzzleError::DimensionMismatch {
                context: "layer march",
                expected: start.len(),
                found: finish.len(),
            });
        }

        let next_data = start
            .iter()
            .zip(&finish)
            .map(|(&from, &to)| {
                pieces[to.0]
                    .generate_next_data(&pieces[from.0], const_face, const_turns)
                    .ok_or(PuzzleError::Misaligned { from, to })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (to, data) in finish.into_iter().zip(next_data) {
            pieces[to.0].face_data = data;
        }

        Ok(())
    }
}
