//! Runtime configuration for the AR view.
//!
//! [`ArConfig`] carries the tunables of the tracking state machine and the
//! renderer. Values come from `~/.geoanchor/config.ini` when present
//! (see [`file`]), otherwise from the defaults below.
//!
//! ```ini
//! [tracking]
//! accuracy_threshold = 10.0
//! init_timeout_ticks = 120
//! tick_interval_ms = 1000
//! status_log_interval_ms = 2000
//!
//! [render]
//! frame_interval_ms = 33
//! near_plane = 0.1
//! far_plane = 500.0
//!
//! [camera]
//! facing = back
//!
//! [placement]
//! auto_place_on_ready = false
//! ```

pub mod file;
mod parser;
mod writer;

use std::time::Duration;

use crate::render::Projection;
use crate::sdk::CameraFacing;

pub use file::{config_directory, config_file_path, ConfigFileError};

// =============================================================================
// Defaults
// =============================================================================

/// Horizontal and vertical accuracy (meters) both must be under this for
/// the VPS to count as ready.
pub const DEFAULT_ACCURACY_THRESHOLD_M: f64 = 10.0;

/// Ticks the bounded initialization poll waits before timing out.
pub const DEFAULT_INIT_TIMEOUT_TICKS: u32 = 120;

/// Period of the bounded initialization poll.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Render loop period (~30 fps).
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// Near clip plane in meters.
pub const DEFAULT_NEAR_PLANE: f32 = 0.1;

/// Far clip plane in meters.
pub const DEFAULT_FAR_PLANE: f32 = 500.0;

/// Minimum time between tracking status log lines.
pub const DEFAULT_STATUS_LOG_INTERVAL: Duration = Duration::from_secs(2);

// =============================================================================
// ArConfig
// =============================================================================

/// Tunables for one AR view.
#[derive(Debug, Clone, PartialEq)]
pub struct ArConfig {
    pub accuracy_threshold: f64,
    pub init_timeout_ticks: u32,
    pub tick_interval: Duration,
    pub frame_interval: Duration,
    pub near_plane: f32,
    pub far_plane: f32,
    pub status_log_interval: Duration,
    /// Only `Back` is accepted from config files.
    pub camera_facing: CameraFacing,
    /// Flush queued placements automatically when the VPS becomes ready.
    ///
    /// Off by default: batch placements wait for an explicit `place_models`.
    pub auto_place_on_ready: bool,
}

impl Default for ArConfig {
    fn default() -> Self {
        Self {
            accuracy_threshold: DEFAULT_ACCURACY_THRESHOLD_M,
            init_timeout_ticks: DEFAULT_INIT_TIMEOUT_TICKS,
            tick_interval: DEFAULT_TICK_INTERVAL,
            frame_interval: DEFAULT_FRAME_INTERVAL,
            near_plane: DEFAULT_NEAR_PLANE,
            far_plane: DEFAULT_FAR_PLANE,
            status_log_interval: DEFAULT_STATUS_LOG_INTERVAL,
            camera_facing: CameraFacing::Back,
            auto_place_on_ready: false,
        }
    }
}

impl ArConfig {
    pub fn with_accuracy_threshold(mut self, meters: f64) -> Self {
        self.accuracy_threshold = meters;
        self
    }

    pub fn with_init_timeout_ticks(mut self, ticks: u32) -> Self {
        self.init_timeout_ticks = ticks;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    pub fn with_auto_place_on_ready(mut self, enabled: bool) -> Self {
        self.auto_place_on_ready = enabled;
        self
    }

    /// Projection clip planes.
    pub fn projection(&self) -> Projection {
        Projection {
            near: self.near_plane,
            far: self.far_plane,
        }
    }
}
