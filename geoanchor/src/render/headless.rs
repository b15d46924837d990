//! Backend that records draw calls instead of touching a GPU.

use std::sync::Arc;

use glam::Mat4;
use parking_lot::Mutex;

use super::backend::{GpuBackend, GpuHandle, RenderError};

/// One recorded draw.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Background {
        texcoords: [f32; 8],
    },
    Mesh {
        mesh: GpuHandle,
        mvp: Mat4,
        color: [f32; 4],
    },
}

/// Everything a [`HeadlessBackend`] was asked to do.
#[derive(Debug, Default)]
pub struct RenderLog {
    pub programs_created: u32,
    pub meshes_created: u32,
    pub mesh_vertices: usize,
    pub released: Vec<GpuHandle>,
    pub calls: Vec<DrawCall>,
}

impl RenderLog {
    /// Mesh draws recorded so far.
    pub fn mesh_draws(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, DrawCall::Mesh { .. }))
            .count()
    }

    /// Texture coordinates of the most recent background draw.
    pub fn last_background(&self) -> Option<[f32; 8]> {
        self.calls.iter().rev().find_map(|c| match c {
            DrawCall::Background { texcoords } => Some(*texcoords),
            DrawCall::Mesh { .. } => None,
        })
    }
}

/// Recording GPU backend.
///
/// The log is shared, so a clone of [`HeadlessBackend::log`] taken before
/// the backend moves into a renderer keeps observing it.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    log: Arc<Mutex<RenderLog>>,
    next_handle: u32,
    fail_creation: bool,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend whose resource creation always fails.
    pub fn failing() -> Self {
        Self {
            fail_creation: true,
            ..Self::default()
        }
    }

    pub fn log(&self) -> Arc<Mutex<RenderLog>> {
        Arc::clone(&self.log)
    }

    fn allocate(&mut self, what: &'static str) -> Result<GpuHandle, RenderError> {
        if self.fail_creation {
            return Err(RenderError::ResourceCreation {
                what,
                reason: "headless backend configured to fail".to_string(),
            });
        }
        self.next_handle += 1;
        Ok(GpuHandle(self.next_handle))
    }
}

impl GpuBackend for HeadlessBackend {
    fn create_background_program(&mut self) -> Result<GpuHandle, RenderError> {
        let handle = self.allocate("background program")?;
        self.log.lock().programs_created += 1;
        Ok(handle)
    }

    fn create_mesh(&mut self, positions: &[f32]) -> Result<GpuHandle, RenderError> {
        let handle = self.allocate("mesh")?;
        let mut log = self.log.lock();
        log.meshes_created += 1;
        log.mesh_vertices += positions.len() / 3;
        Ok(handle)
    }

    fn draw_background(&mut self, _program: GpuHandle, texcoords: &[f32; 8]) {
        self.log.lock().calls.push(DrawCall::Background {
            texcoords: *texcoords,
        });
    }

    fn draw_mesh(&mut self, mesh: GpuHandle, mvp: &Mat4, color: [f32; 4]) {
        self.log.lock().calls.push(DrawCall::Mesh {
            mesh,
            mvp: *mvp,
            color,
        });
    }

    fn release(&mut self, handle: GpuHandle) {
        self.log.lock().released.push(handle);
    }
}
