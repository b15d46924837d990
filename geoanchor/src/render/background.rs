//! Camera background quad.

use crate::sdk::DisplayRotation;

/// Full-screen triangle strip in normalized device coordinates.
pub const BACKGROUND_POSITIONS: [f32; 8] = [-1.0, -1.0, 1.0, -1.0, -1.0, 1.0, 1.0, 1.0];

/// Pass-through texture coordinates for [`BACKGROUND_POSITIONS`] with the
/// display in its natural orientation.
pub const BASE_TEXCOORDS: [f32; 8] = [0.0, 1.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0];

/// Texture coordinates that keep the camera image upright for `rotation`.
///
/// Each quarter turn maps `(u, v)` to `(1 - v, u)`.
pub fn background_texcoords(rotation: DisplayRotation) -> [f32; 8] {
    let mut uv = BASE_TEXCOORDS;
    for _ in 0..rotation.quarter_turns() {
        for pair in uv.chunks_exact_mut(2) {
            let (u, v) = (pair[0], pair[1]);
            pair[0] = 1.0 - v;
            pair[1] = u;
        }
    }
    uv
}
