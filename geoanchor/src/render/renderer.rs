//! Geometry renderer.

use glam::Mat4;
use tracing::{debug, trace};

use super::background::background_texcoords;
use super::backend::{GpuBackend, GpuHandle, RenderError};
use super::cube::{cube_vertices, CUBE_HALF_EXTENT};
use super::display::DisplayGeometry;
use crate::anchors::{AnchorRecord, AnchorState};
use crate::sdk::{Frame, TrackingState};

/// Flat color of the placeholder cube (RGBA).
pub const PLACEHOLDER_COLOR: [f32; 4] = [0.1, 0.6, 1.0, 0.85];

/// Clip planes wide enough for outdoor distances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub near: f32,
    pub far: f32,
}

impl Projection {
    /// Right-handed GL projection for a vertical field of view in radians.
    pub fn matrix(&self, vertical_fov: f32, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(vertical_fov, aspect, self.near, self.far)
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            near: 0.1,
            far: 500.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Resources {
    background: GpuHandle,
    cube: GpuHandle,
}

/// What one `draw_frame` call drew.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub anchors_drawn: usize,
}

/// Draws the camera background and one placeholder per ACTIVE anchor.
///
/// Holds nothing across frames except the GPU handles created in
/// [`setup`](Self::setup).
pub struct GeometryRenderer<B: GpuBackend> {
    backend: B,
    projection: Projection,
    resources: Option<Resources>,
}

impl<B: GpuBackend> GeometryRenderer<B> {
    pub fn new(backend: B, projection: Projection) -> Self {
        Self {
            backend,
            projection,
            resources: None,
        }
    }

    pub fn is_set_up(&self) -> bool {
        self.resources.is_some()
    }

    /// Create GPU resources. Calling again after success is a no-op.
    ///
    /// # Errors
    ///
    /// Propagates backend creation failures. A half-created set is released.
    pub fn setup(&mut self) -> Result<(), RenderError> {
        if self.resources.is_some() {
            return Ok(());
        }
        let background = self.backend.create_background_program()?;
        let cube = match self.backend.create_mesh(&cube_vertices(CUBE_HALF_EXTENT)) {
            Ok(cube) => cube,
            Err(e) => {
                self.backend.release(background);
                return Err(e);
            }
        };
        self.resources = Some(Resources { background, cube });
        debug!("Renderer GPU resources created");
        Ok(())
    }

    /// Draw one frame.
    ///
    /// The background is always drawn. Anchors are drawn only while the
    /// camera is tracking, and only for ACTIVE records.
    ///
    /// # Errors
    ///
    /// [`RenderError::NotSetUp`] before [`setup`](Self::setup).
    pub fn draw_frame<'a>(
        &mut self,
        frame: &Frame,
        geometry: &DisplayGeometry,
        records: impl IntoIterator<Item = &'a AnchorRecord>,
    ) -> Result<FrameStats, RenderError> {
        let resources = self.resources.ok_or(RenderError::NotSetUp)?;
        let mut stats = FrameStats::default();

        self.backend
            .draw_background(resources.background, &background_texcoords(geometry.rotation));

        if frame.camera.tracking != TrackingState::Tracking {
            trace!("Camera not tracking, background only");
            return Ok(stats);
        }

        let view_projection = self
            .projection
            .matrix(frame.camera.vertical_fov, geometry.aspect())
            * frame.camera.view_matrix;

        for record in records {
            if record.state() != AnchorState::Active {
                continue;
            }
            let Some(model) = record.model_matrix() else {
                continue;
            };
            let mvp = view_projection * model;
            self.backend
                .draw_mesh(resources.cube, &mvp, PLACEHOLDER_COLOR);
            stats.anchors_drawn += 1;
        }
        Ok(stats)
    }

    /// Free GPU resources.
    ///
    /// Returns `false` when there was nothing to release.
    pub fn release(&mut self) -> bool {
        match self.resources.take() {
            Some(resources) => {
                self.backend.release(resources.cube);
                self.backend.release(resources.background);
                debug!("Renderer GPU resources released");
                true
            }
            None => false,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}
