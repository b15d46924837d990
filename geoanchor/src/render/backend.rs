//! GPU seam.

use glam::Mat4;
use thiserror::Error;

/// Opaque handle to a GPU resource owned by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GpuHandle(pub u32);

/// GPU resource failures.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create {what}: {reason}")]
    ResourceCreation { what: &'static str, reason: String },

    #[error("renderer used before setup")]
    NotSetUp,
}

/// Minimal drawing surface the renderer needs.
pub trait GpuBackend: Send {
    /// Program that draws the camera image as a full-screen quad.
    fn create_background_program(&mut self) -> Result<GpuHandle, RenderError>;

    /// Upload a triangle list of xyz positions.
    fn create_mesh(&mut self, positions: &[f32]) -> Result<GpuHandle, RenderError>;

    /// Draw the camera image with the given quad texture coordinates.
    fn draw_background(&mut self, program: GpuHandle, texcoords: &[f32; 8]);

    /// Draw `mesh` transformed by `mvp` in a flat RGBA color.
    fn draw_mesh(&mut self, mesh: GpuHandle, mvp: &Mat4, color: [f32; 4]);

    /// Free a resource. Each handle is released at most once.
    fn release(&mut self, handle: GpuHandle);
}
