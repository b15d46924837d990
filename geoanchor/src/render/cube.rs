//! Placeholder cube drawn at each anchor.

/// Half the cube edge length in meters.
pub const CUBE_HALF_EXTENT: f32 = 0.5;

/// Vertices in the cube triangle list (6 faces, 2 triangles each).
pub const CUBE_VERTEX_COUNT: usize = 36;

/// Corner indices for each face, counter-clockwise seen from outside.
const FACES: [[usize; 4]; 6] = [
    [4, 5, 6, 7], // +z
    [1, 0, 3, 2], // -z
    [5, 1, 2, 6], // +x
    [0, 4, 7, 3], // -x
    [7, 6, 2, 3], // +y
    [0, 1, 5, 4], // -y
];

/// Triangle-list positions (xyz) of an axis-aligned cube centered at the
/// origin.
pub fn cube_vertices(half_extent: f32) -> Vec<f32> {
    let h = half_extent;
    let corners = [
        [-h, -h, -h],
        [h, -h, -h],
        [h, h, -h],
        [-h, h, -h],
        [-h, -h, h],
        [h, -h, h],
        [h, h, h],
        [-h, h, h],
    ];

    let mut out = Vec::with_capacity(CUBE_VERTEX_COUNT * 3);
    for [a, b, c, d] in FACES {
        for i in [a, b, c, a, c, d] {
            out.extend_from_slice(&corners[i]);
        }
    }
    out
}
