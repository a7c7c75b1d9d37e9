//! Layout remapping from RTM source conventions to target conventions.
//!
//! RTM stores a 3x4 transform as 12 floats whose row/column assignment does
//! not match the standard homogeneous layout: the permutation applied here
//! corrects both a basis-axis swap (source axes 1 and 2 are exchanged) and a
//! row/column transposition. The global motion offset carries the same axis
//! swap. Both permutations are authoritative for behavioral parity with the
//! game's own playback and must not be simplified.

use glam::{Mat4, Vec3, Vec4};

use crate::rtm::RtmMatrix;

/// Remap a source-layout bone matrix into a homogeneous 4x4 transform.
///
/// With `m` the 12 file-order floats, the resulting rows are:
///
/// ```text
/// row0 = (m0, m6, m3, m9)
/// row1 = (m2, m8, m5, m11)
/// row2 = (m1, m7, m4, m10)
/// row3 = (0, 0, 0, 1)
/// ```
pub fn remap_bone_matrix(matrix: &RtmMatrix) -> Mat4 {
    let m = &matrix.0;
    Mat4::from_cols(
        Vec4::new(m[0], m[2], m[1], 0.0),
        Vec4::new(m[6], m[8], m[7], 0.0),
        Vec4::new(m[3], m[5], m[4], 0.0),
        Vec4::new(m[9], m[11], m[10], 1.0),
    )
}

/// Remap the global motion offset: target receives `(x, z, y)`.
pub fn remap_motion_vector(offset: Vec3) -> Vec3 {
    Vec3::new(offset.x, offset.z, offset.y)
}
