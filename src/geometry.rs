//! Face adjacency and quarter-turn algebra.
//!
//! The six faces are numbered so that `5 - face` is always the opposite face:
//! - 0: +Y
//! - 1: -Z
//! - 2: +X
//! - 3: -X
//! - 4: +Z
//! - 5: -Y
//!
//! Every face has a joint path: its four neighbouring faces listed clockwise as
//! seen from outside the puzzle, starting with the neighbour at the top of the
//! face's grid. A face grid's rows run toward `joint_path[2]` and its columns
//! toward `joint_path[1]`.

/// Integer 3D vector used for piece positions and face normals.
pub type Vec3 = (i32, i32, i32);

/// Number of puzzle faces.
pub const FACE_COUNT: usize = 6;

/// Number of distinct sticker colors (one per face).
pub const COLOR_COUNT: usize = 6;

/// Coloring value reported for slots that do not face outward.
pub const UNCOLORED: u8 = 6;

/// Joint paths for every face, clockwise as seen from outside.
///
/// Faces 3..=5 reverse the path of their opposite face so that the
/// orientation stays clockwise from their own side.
pub const JOINT_PATHS: [[usize; 4]; FACE_COUNT] = [
    [1, 2, 4, 3],
    [0, 3, 5, 2],
    [0, 1, 5, 4],
    [4, 5, 1, 0],
    [2, 5, 3, 0],
    [3, 4, 2, 1],
];

/// Outward unit normal of every face, also the renderer's step between
/// neighbouring pieces linked through that face slot.
pub const FACE_NORMALS: [Vec3; FACE_COUNT] = [
    (0, 1, 0),
    (0, 0, -1),
    (1, 0, 0),
    (-1, 0, 0),
    (0, 0, 1),
    (0, -1, 0),
];

/// The face on the other side of the puzzle.
#[inline(always)]
pub const fn opposite(face: usize) -> usize {
    5 - face
}

/// Position of `face` inside `axis`'s joint path, if it borders `axis`.
#[inline]
pub fn joint_index(axis: usize, face: usize) -> Option<usize> {
    JOINT_PATHS[axis].iter().position(|&joint| joint == face)
}

/// Maps a face slot through `turns` clockwise quarter turns about `axis`.
///
/// The axis face and its opposite stay fixed; the four side faces advance
/// along the axis' joint path.
#[inline]
pub fn turn_face(face: usize, axis: usize, turns: usize) -> usize {
    match joint_index(axis, face) {
        Some(index) => JOINT_PATHS[axis][(index + turns) % 4],
        None => face,
    }
}

#[inline(always)]
pub const fn dot(a: Vec3, b: Vec3) -> i32 {
    a.0 * b.0 + a.1 * b.1 + a.2 * b.2
}

#[inline(always)]
pub const fn add(a: Vec3, b: Vec3) -> Vec3 {
    (a.0 + b.0, a.1 + b.1, a.2 + b.2)
}

#[inline(always)]
pub const fn scale(v: Vec3, k: i32) -> Vec3 {
    (v.0 * k, v.1 * k, v.2 * k)
}

/// Rotates a vector by one clockwise quarter turn about `axis`.
///
/// Writing `v = a*up + b*right + c*normal`, the turn sends up to right and
/// right to down, giving `a*right - b*up + c*normal`.
pub const fn quarter_turn(v: Vec3, axis: usize) -> Vec3 {
    let up = FACE_NORMALS[JOINT_PATHS[axis][0]];
    let right = FACE_NORMALS[JOINT_PATHS[axis][1]];
    let normal = FACE_NORMALS[axis];
    let a = dot(v, up);
    let b = dot(v, right);
    let c = dot(v, normal);
    add(add(scale(right, a), scale(up, -b)), scale(normal, c))
}

/// Rotates a vector by `turns` clockwise quarter turns about `axis`.
pub const fn turn_vector(mut v: Vec3, axis: usize, turns: usize) -> Vec3 {
    let mut i = 0;
    while i < turns % 4 {
        v = quarter_turn(v, axis);
        i += 1;
    }
    v
}

/// The face whose outward normal equals `normal`.
pub fn face_of_normal(normal: Vec3) -> Option<usize> {
    FACE_NORMALS.iter().position(|&n| n == normal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cross(a: Vec3, b: Vec3) -> Vec3 {
        (
            a.1 * b.2 - a.2 * b.1,
            a.2 * b.0 - a.0 * b.2,
            a.0 * b.1 - a.1 * b.0,
        )
    }

    #[test]
    fn test_joint_paths_are_clockwise_from_outside() {
        for face in 0..FACE_COUNT {
            let up = FACE_NORMALS[JOINT_PATHS[face][0]];
            let right = FACE_NORMALS[JOINT_PATHS[face][1]];
            assert_eq!(
                cross(right, up),
                FACE_NORMALS[face],
                "Face {face} grid is not viewed from outside"
            );
        }
    }

    #[test]
    fn test_joint_paths_pair_opposites() {
        for face in 0..FACE_COUNT {
            let path = JOINT_PATHS[face];
            assert_eq!(path[2], opposite(path[0]));
            assert_eq!(path[3], opposite(path[1]));
            assert!(!path.contains(&face) && !path.contains(&opposite(face)));

            let mut reversed = JOINT_PATHS[opposite(face)];
            reversed.reverse();
            assert_eq!(path, reversed, "Face {face} is not the mirror of its opposite");
        }
    }

    #[test]
    fn test_turn_face_matches_vector_rotation() {
        for axis in 0..FACE_COUNT {
            for face in 0..FACE_COUNT {
                for turns in 0..4 {
                    let rotated = turn_vector(FACE_NORMALS[face], axis, turns);
                    assert_eq!(
                        face_of_normal(rotated),
                        Some(turn_face(face, axis, turns)),
                        "axis {axis}, face {face}, turns {turns}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_opposite_axis_turns_the_other_way() {
        for axis in 0..FACE_COUNT {
            for face in 0..FACE_COUNT {
                assert_eq!(
                    turn_face(face, axis, 1),
                    turn_face(face, opposite(axis), 3)
                );
            }
        }
    }
}
