//! Display geometry reconciliation.

use crate::sdk::DisplayRotation;

/// Rotation and size pushed to the session so the camera image matches the
/// device's physical orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayGeometry {
    pub rotation: DisplayRotation,
    pub width: u32,
    pub height: u32,
}

impl DisplayGeometry {
    /// Geometry for a surface of `width` x `height` measured in the
    /// display's natural orientation.
    ///
    /// Width and height are swapped for 90° and 270°.
    pub fn for_surface(rotation: DisplayRotation, width: u32, height: u32) -> Self {
        let (width, height) = if rotation.is_sideways() {
            (height, width)
        } else {
            (width, height)
        };
        Self {
            rotation,
            width,
            height,
        }
    }

    /// Both dimensions non-zero.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Width over height, 1.0 for degenerate geometry.
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}
