//! Per-tick tracking snapshot and VPS readiness classification.
//!
//! # Readiness
//!
//! ```text
//! ready = camera TRACKING AND earth ENABLED AND earth TRACKING
//!         AND horizontal_accuracy < threshold
//!         AND vertical_accuracy   < threshold
//! ```
//!
//! [`ReadinessLatch`] reports the false -> true edge of this predicate once
//! per continuous ready interval.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::sdk::{EarthObservation, EarthState, GeospatialPose, TrackingState};

/// Latest snapshot, readable from any thread.
pub type SnapshotCell = Arc<RwLock<Option<TrackingSnapshot>>>;

/// Tracking state observed on one tick. Superseded by the next tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingSnapshot {
    /// Sequence number of the tick that produced this snapshot.
    pub tick: u64,
    /// Local camera tracking.
    pub camera_tracking: TrackingState,
    /// Earth tracker state (`Disabled` when no earth tracker exists).
    pub earth_state: EarthState,
    /// Earth tracker's own tracking state.
    pub earth_tracking: TrackingState,
    /// Global pose, present only while the earth tracker is localized.
    pub pose: Option<GeospatialPose>,
}

impl TrackingSnapshot {
    /// Build a snapshot from what the SDK reported this tick.
    pub fn observe(tick: u64, camera: TrackingState, earth: Option<EarthObservation>) -> Self {
        let (earth_state, earth_tracking, pose) = match earth {
            Some(obs) => (obs.state, obs.tracking, Some(obs.pose)),
            None => (EarthState::Disabled, TrackingState::NotTracking, None),
        };
        let localized = camera == TrackingState::Tracking
            && earth_state == EarthState::Enabled
            && earth_tracking == TrackingState::Tracking;

        Self {
            tick,
            camera_tracking: camera,
            earth_state,
            earth_tracking,
            pose: if localized { pose } else { None },
        }
    }

    /// Camera and earth tracker are both tracking with earth ENABLED.
    pub fn is_tracking(&self) -> bool {
        self.pose.is_some()
    }

    /// Tracking and both accuracies strictly under `threshold` meters.
    pub fn is_ready(&self, threshold: f64) -> bool {
        self.pose.is_some_and(|p| {
            p.horizontal_accuracy < threshold && p.vertical_accuracy < threshold
        })
    }

    /// Coarse phase for status notifications.
    pub fn phase(&self, threshold: f64) -> VpsPhase {
        if self.is_ready(threshold) {
            VpsPhase::Ready
        } else if self.is_tracking() {
            VpsPhase::Tracking
        } else if self.earth_state == EarthState::Enabled {
            VpsPhase::Searching
        } else {
            VpsPhase::Unavailable
        }
    }
}

/// Coarse VPS phase reported to the UI shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VpsPhase {
    /// No earth tracker or it is in an error state.
    #[default]
    Unavailable,
    /// Earth tracker enabled, not yet localized.
    Searching,
    /// Localized, accuracy above threshold.
    Tracking,
    /// Localized under the accuracy threshold.
    Ready,
}

impl VpsPhase {
    /// Status string sent with `onVpsStatusChanged`.
    pub fn as_str(&self) -> &'static str {
        match self {
            VpsPhase::Unavailable => "UNAVAILABLE",
            VpsPhase::Searching => "SEARCHING",
            VpsPhase::Tracking => "TRACKING",
            VpsPhase::Ready => "READY",
        }
    }
}

impl std::fmt::Display for VpsPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Edge-triggered readiness detector.
#[derive(Debug, Clone)]
pub struct ReadinessLatch {
    threshold: f64,
    ready: bool,
}

impl ReadinessLatch {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            ready: false,
        }
    }

    /// Feed a snapshot.
    ///
    /// # Returns
    ///
    /// `true` only on the tick where readiness goes from false to true.
    pub fn update(&mut self, snapshot: &TrackingSnapshot) -> bool {
        let now = snapshot.is_ready(self.threshold);
        let edge = now && !self.ready;
        self.ready = now;
        edge
    }

    /// Level state after the last update.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}
