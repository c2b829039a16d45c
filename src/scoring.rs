//! Face homogeneity scoring.
//!
//! A face scores `Σ r_c² / (Σ r_c)²`, where `r_c` is the number of connected
//! same-color regions of color `c`. A single-colored face scores 1.0; every
//! extra fragment pulls the score down.

use crate::geometry::{COLOR_COUNT, FACE_COUNT};

/// Counts connected regions per color in a row-major `dim × dim` grid.
///
/// Scans row by row, keeping only the ids of the previous and current row.
/// A cell inherits the id of a matching upper or left neighbour; when it
/// matches both and their ids differ, the two regions merge, the color loses
/// one region and the stale id is rewritten across both rows.
pub fn region_counts(grid: &[u8], dim: usize) -> [i64; COLOR_COUNT] {
    let mut id_cache = vec![0u32; dim];
    let mut id_curr = vec![0u32; dim];
    let mut regions = [0i64; COLOR_COUNT];
    let mut next_id = 1u32;

    for i in 0..dim {
        for j in 0..dim {
            let value = grid[i * dim + j];
            let up = i > 0 && grid[(i - 1) * dim + j] == value;
            let left = j > 0 && grid[i * dim + j - 1] == value;

            if up && left && id_cache[j] != id_curr[j - 1] {
                let keep = id_curr[j - 1];
                let stale = id_cache[j];
                for id in id_cache.iter_mut().chain(id_curr[..j].iter_mut()) {
                    if *id == stale {
                        *id = keep;
                    }
                }
                id_curr[j] = keep;
                regions[usize::from(value)] -= 1;
            } else if up {
                id_curr[j] = id_cache[j];
            } else if left {
                id_curr[j] = id_curr[j - 1];
            } else {
                id_curr[j] = next_id;
                next_id += 1;
                regions[usize::from(value)] += 1;
            }
        }
        std::mem::swap(&mut id_cache, &mut id_curr);
    }

    regions
}

/// Homogeneity score of one face grid, in `(0, 1]`.
pub fn score_face(grid: &[u8], dim: usize) -> f64 {
    let regions = region_counts(grid, dim);
    let total: i64 = regions.iter().sum();
    if total <= 0 {
        return 0.0;
    }
    let squares: i64 = regions.iter().map(|r| r * r).sum();
    squares as f64 / (total * total) as f64
}

/// Scores all six faces of a flat state.
pub fn score_state(state: &[u8], dim: usize) -> [f64; FACE_COUNT] {
    let face_len = dim * dim;
    std::array::from_fn(|face| score_face(&state[face * face_len..(face + 1) * face_len], dim))
}
