//! Per-frame drawing of the camera background and anchored geometry.
//!
//! The GPU is reached through [`GpuBackend`]; the renderer itself only owns
//! the handles it created at setup and computes transforms.
//!
//! # Frame
//!
//! ```text
//! background quad (UVs rotated for the display)
//! for each ACTIVE anchor (camera TRACKING only):
//!     MVP = perspective(fov, aspect, 0.1, 500) * view * model(pose, scale)
//!     draw cube
//! ```

mod backend;
mod background;
mod cube;
mod display;
mod headless;
mod renderer;

pub use backend::{GpuBackend, GpuHandle, RenderError};
pub use background::{background_texcoords, BACKGROUND_POSITIONS, BASE_TEXCOORDS};
pub use cube::{cube_vertices, CUBE_HALF_EXTENT, CUBE_VERTEX_COUNT};
pub use display::DisplayGeometry;
pub use headless::{DrawCall, HeadlessBackend, RenderLog};
pub use renderer::{FrameStats, GeometryRenderer, Projection, PLACEHOLDER_COLOR};
