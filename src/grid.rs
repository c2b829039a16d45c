//! Flattened sticker grids and closed-form layer permutations.
//!
//! A puzzle state is a flat array of `6 * dim * dim` colors, one face after
//! another, each face row-major as seen from outside. Layer turns act on
//! this array through precomputed permutation tables, so the move search
//! never touches the piece graph.

use crate::error::PuzzleError;
use crate::geometry::{
    dot, face_of_normal, turn_vector, Vec3, COLOR_COUNT, FACE_COUNT, FACE_NORMALS, JOINT_PATHS,
};

/// Per-face N×N color grids, indexed `[face][row][col]`.
pub type FaceColorings = Vec<Vec<Vec<u8>>>;

/// Bits used by one packed color.
pub const COLOR_BITS: usize = 3;

/// Converts (face, row, col) to a flat sticker index.
#[inline(always)]
pub const fn sticker_index(dim: usize, face: usize, row: usize, col: usize) -> usize {
    (face * dim + row) * dim + col
}

/// Converts a flat sticker index back to (face, row, col).
#[inline(always)]
pub const fn sticker_coord(dim: usize, index: usize) -> (usize, usize, usize) {
    (index / (dim * dim), (index / dim) % dim, index % dim)
}

/// Doubled, centered position of the piece carrying a sticker.
///
/// Doubling keeps even-sized puzzles on integer coordinates: a cell `c`
/// becomes `2c - (dim - 1)`.
fn sticker_position(dim: usize, face: usize, row: usize, col: usize) -> Vec3 {
    let span = dim as i32 - 1;
    let normal = FACE_NORMALS[face];
    let up = FACE_NORMALS[JOINT_PATHS[face][0]];
    let right = FACE_NORMALS[JOINT_PATHS[face][1]];
    let down_offset = 2 * row as i32 - span;
    let right_offset = 2 * col as i32 - span;
    (
        normal.0 * span + right.0 * right_offset - up.0 * down_offset,
        normal.1 * span + right.1 * right_offset - up.1 * down_offset,
        normal.2 * span + right.2 * right_offset - up.2 * down_offset,
    )
}

/// Builds the sticker permutation for `turns` clockwise quarter turns of the
/// layer `depth` steps in from `face`.
///
/// `table[src]` is the index the sticker at `src` moves to.
pub fn layer_permutation(dim: usize, face: usize, depth: usize, turns: usize) -> Vec<u32> {
    let span = dim as i32 - 1;
    let layer = span - 2 * depth as i32;
    let axis = FACE_NORMALS[face];
    let sticker_count = FACE_COUNT * dim * dim;

    (0..sticker_count)
        .map(|src| {
            let (g, row, col) = sticker_coord(dim, src);
            let position = sticker_position(dim, g, row, col);
            if dot(position, axis) != layer || turns % 4 == 0 {
                return src as u32;
            }

            let moved = turn_vector(position, face, turns);
            let normal = turn_vector(FACE_NORMALS[g], face, turns);
            // a quarter turn always maps a face normal onto another face normal
            let target = face_of_normal(normal).unwrap_or(g);
            let up = FACE_NORMALS[JOINT_PATHS[target][0]];
            let right = FACE_NORMALS[JOINT_PATHS[target][1]];
            let new_row = ((span - dot(moved, up)) / 2) as usize;
            let new_col = ((dot(moved, right) + span) / 2) as usize;
            sticker_index(dim, target, new_row, new_col) as u32
        })
        .collect()
}

/// Moves every sticker of `input` to its destination in `output`.
#[inline]
pub fn apply_permutation(table: &[u32], input: &[u8], output: &mut [u8]) {
    for (&dest, &color) in table.iter().zip(input) {
        output[dest as usize] = color;
    }
}

/// Flattens per-face grids, checking them against `dim`.
pub fn flatten(colorings: &[Vec<Vec<u8>>], dim: usize) -> Result<Vec<u8>, PuzzleError> {
    if colorings.len() != FACE_COUNT {
        return Err(PuzzleError::DimensionMismatch {
            context: "face count",
            expected: FACE_COUNT,
            found: colorings.len(),
        });
    }

    let mut flat = Vec::with_capacity(FACE_COUNT * dim * dim);
    for face in colorings {
        if face.len() != dim {
            return Err(PuzzleError::DimensionMismatch {
                context: "face rows",
                expected: dim,
                found: face.len(),
            });
        }
        for row in face {
            if row.len() != dim {
                return Err(PuzzleError::DimensionMismatch {
                    context: "face columns",
                    expected: dim,
                    found: row.len(),
                });
            }
            if let Some(&color) = row.iter().find(|&&c| usize::from(c) >= COLOR_COUNT) {
                return Err(PuzzleError::InvalidArgument(format!(
                    "color {color} is not a face color"
                )));
            }
            flat.extend_from_slice(row);
        }
    }
    Ok(flat)
}

/// Splits a flat state back into per-face grids.
pub fn unflatten(state: &[u8], dim: usize) -> FaceColorings {
    state
        .chunks(dim * dim)
        .map(|face| face.chunks(dim).map(<[u8]>::to_vec).collect())
        .collect()
}

/// Packs colors as consecutive 3-bit fields, least significant bits first.
/// Fields may straddle two words.
pub fn pack(colors: &[u8]) -> Vec<u32> {
    let mut words = vec![0u32; (colors.len() * COLOR_BITS).div_ceil(32)];
    for (i, &color) in colors.iter().enumerate() {
        let bit = i * COLOR_BITS;
        let (word, shift) = (bit / 32, bit % 32);
        let value = u64::from(color & 0b111) << shift;
        words[word] |= value as u32;
        if shift + COLOR_BITS > 32 {
            words[word + 1] |= (value >> 32) as u32;
        }
    }
    words
}

/// Reads `len` 3-bit fields written by [`pack`].
pub fn unpack(words: &[u32], len: usize) -> Result<Vec<u8>, PuzzleError> {
    let needed = (len * COLOR_BITS).div_ceil(32);
    if words.len() < needed {
        return Err(PuzzleError::DimensionMismatch {
            context: "packed words",
            expected: needed,
            found: words.len(),
        });
    }

    Ok((0..len)
        .map(|i| {
            let bit = i * COLOR_BITS;
            let (word, shift) = (bit / 32, bit % 32);
            let mut value = u64::from(words[word]);
            if shift + COLOR_BITS > 32 {
                value |= u64::from(words[word + 1]) << 32;
            }
            ((value >> shift) & 0b111) as u8
        })
        .collect())
}

/// Formats a flat state with the six faces side by side.
///
/// Each face shows its grid as seen from outside, under an `F<id>` header.
pub fn format_net(state: &[u8], dim: usize) -> String {
    let width = dim.max(2);
    let mut output = String::new();

    let header: Vec<String> = (0..FACE_COUNT)
        .map(|face| format!("{:<width$}", format!("F{face}")))
        .collect();
    output.push_str(header.join(" ").trim_end());
    output.push('\n');

    for row in 0..dim {
        let cells: Vec<String> = (0..FACE_COUNT)
            .map(|face| {
                let line: String = (0..dim)
                    .map(|col| char::from(b'0' + state[sticker_index(dim, face, row, col)]))
                    .collect();
                format!("{line:<width$}")
            })
            .collect();
        output.push_str(cells.join(" ").trim_end());
        output.push('\n');
    }

    output
}

/// A solved state: every sticker shows its own face's color.
pub fn solved_state(dim: usize) -> Vec<u8> {
    (0..FACE_COUNT * dim * dim)
        .map(|i| (i / (dim * dim)) as u8)
        .collect()
}
