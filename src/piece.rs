//! Puzzle pieces and the links between them.
//!
//! Pieces live in an arena owned by the puzzle and refer to each other by
//! [`PieceId`]. Each piece has six face slots indexed by face id; a slot either
//! shows a sticker color, links to the neighbouring piece in that direction,
//! or is empty (an inward slot with no piece behind it).

use std::sync::atomic::{AtomicU64, Ordering};

use crate::geometry::{turn_face, FACE_COUNT, UNCOLORED};

static NEXT_SERIAL: AtomicU64 = AtomicU64::new(0);

/// Index of a piece inside the puzzle's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PieceId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Center,
    Edge,
    Corner,
    Interior,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FaceSlot {
    Color(u8),
    Link(PieceId),
    Empty,
}

#[derive(Clone, Debug)]
pub struct Piece {
    /// Process-wide creation order; never reused.
    pub serial: u64,
    pub kind: PieceKind,
    pub face_data: [FaceSlot; FACE_COUNT],
}

impl Piece {
    /// Creates a piece showing `faces`, each painted with its own face's color.
    pub fn new(kind: PieceKind, faces: &[usize]) -> Self {
        let mut face_data = [FaceSlot::Empty; FACE_COUNT];
        for &face in faces {
            face_data[face] = FaceSlot::Color(face as u8);
        }
        Self {
            serial: NEXT_SERIAL.fetch_add(1, Ordering::Relaxed),
            kind,
            face_data,
        }
    }

    #[inline(always)]
    pub fn face(&self, index: usize) -> FaceSlot {
        self.face_data[index]
    }

    #[inline(always)]
    pub fn set_face(&mut self, index: usize, value: FaceSlot) {
        self.face_data[index] = value;
    }

    /// The neighbour linked through `face`, if any.
    #[inline]
    pub fn link(&self, face: usize) -> Option<PieceId> {
        match self.face_data[face] {
            FaceSlot::Link(id) => Some(id),
            _ => None,
        }
    }

    /// The sticker color on `face`, if that slot faces outward.
    #[inline]
    pub fn color(&self, face: usize) -> Option<u8> {
        match self.face_data[face] {
            FaceSlot::Color(color) => Some(color),
            _ => None,
        }
    }

    /// Number of slots that show a sticker.
    pub fn color_count(&self) -> usize {
        self.face_data
            .iter()
            .filter(|slot| matches!(slot, FaceSlot::Color(_)))
            .count()
    }

    /// Six-slot coloring with non-sticker slots reported as [`UNCOLORED`].
    pub fn coloring(&self) -> [u8; FACE_COUNT] {
        self.face_data.map(|slot| match slot {
            FaceSlot::Color(color) => color,
            _ => UNCOLORED,
        })
    }

    /// Computes the face data this piece takes on when `mimic`'s stickers are
    /// carried onto it by `turns` clockwise quarter turns about `const_face`.
    ///
    /// Only sticker slots move; this piece keeps its own links. Every sticker
    /// must land on a slot that already shows one; `None` means the two pieces
    /// do not occupy matching positions.
    pub fn generate_next_data(
        &self,
        mimic: &Piece,
        const_face: usize,
        turns: usize,
    ) -> Option<[FaceSlot; FACE_COUNT]> {
        let mut next = self.face_data;
        for (face, slot) in mimic.face_data.iter().enumerate() {
            if let FaceSlot::Color(color) = *slot {
                let target = turn_face(face, const_face, turns);
                if !matches!(self.face_data[target], FaceSlot::Color(_)) {
                    return None;
                }
                next[target] = FaceSlot::Color(color);
            }
        }
        Some(next)
    }
}

/// Links two pieces symmetrically: `a` sees `b` through `face_a` and `b`
/// sees `a` through `face_b`.
pub fn join(pieces: &mut [Piece], a: PieceId, b: PieceId, face_a: usize, face_b: usize) {
    pieces[a.0].set_face(face_a, FaceSlot::Link(b));
    pieces[b.0].set_face(face_b, FaceSlot::Link(a));
}

/// Follows `depth` links through `face` starting at `start`.
///
/// Returns `None` if a hop lands on a slot that is not a link.
pub fn deep_piece(pieces: &[Piece], start: PieceId, face: usize, depth: usize) -> Option<PieceId> {
    let mut current = start;
    for _ in 0..depth {
        current = pieces[current.0].link(face)?;
    }
    Some(current)
}
