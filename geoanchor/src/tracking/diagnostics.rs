//! Human-oriented tracking diagnostics.

use std::time::{Duration, Instant};

use tracing::info;

use super::snapshot::TrackingSnapshot;
use crate::sdk::{EarthState, TrackingState};

/// Horizontal accuracy under which placement is considered excellent.
pub const EXCELLENT_ACCURACY_M: f64 = 5.0;

/// Qualitative bucket for a horizontal accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccuracyQuality {
    Excellent,
    Good,
    Low,
}

impl AccuracyQuality {
    /// Bucket `horizontal_m` against the placement threshold.
    pub fn classify(horizontal_m: f64, threshold_m: f64) -> Self {
        if horizontal_m < EXCELLENT_ACCURACY_M {
            AccuracyQuality::Excellent
        } else if horizontal_m < threshold_m {
            AccuracyQuality::Good
        } else {
            AccuracyQuality::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccuracyQuality::Excellent => "excellent",
            AccuracyQuality::Good => "good",
            AccuracyQuality::Low => "low",
        }
    }
}

impl std::fmt::Display for AccuracyQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explanation for a snapshot that is not localized.
pub fn explain(snapshot: &TrackingSnapshot) -> &'static str {
    match (snapshot.camera_tracking, snapshot.earth_state) {
        (TrackingState::NotTracking, _) => {
            "camera tracking lost, hold the device steady and keep the lens uncovered"
        }
        (_, EarthState::Disabled) => "geospatial mode is not enabled on this session",
        (_, EarthState::ErrorNotAuthorized) => "API key missing or not authorized",
        (_, EarthState::ErrorResourceExhausted) => "geospatial API quota exceeded",
        (_, EarthState::ErrorInternal) => "internal geospatial error",
        (_, EarthState::Enabled) if snapshot.pose.is_none() => {
            "earth tracker paused, move outdoors and point the camera at nearby buildings"
        }
        _ => "localized",
    }
}

/// Rate-limited tracking status log.
#[derive(Debug)]
pub struct StatusLogger {
    interval: Duration,
    threshold: f64,
    last: Option<Instant>,
}

impl StatusLogger {
    pub fn new(interval: Duration, threshold: f64) -> Self {
        Self {
            interval,
            threshold,
            last: None,
        }
    }

    /// Log `snapshot` if at least `interval` passed since the last line.
    ///
    /// # Returns
    ///
    /// Whether a line was written.
    pub fn maybe_log(&mut self, now: Instant, snapshot: &TrackingSnapshot, anchors: usize) -> bool {
        if self
            .last
            .is_some_and(|last| now.saturating_duration_since(last) < self.interval)
        {
            return false;
        }
        self.last = Some(now);

        match snapshot.pose {
            Some(pose) => info!(
                latitude = pose.latitude,
                longitude = pose.longitude,
                altitude = pose.altitude,
                h_acc = pose.horizontal_accuracy,
                v_acc = pose.vertical_accuracy,
                heading = pose.heading,
                quality = %AccuracyQuality::classify(pose.horizontal_accuracy, self.threshold),
                anchors,
                "VPS status"
            ),
            None => info!(
                earth_state = %snapshot.earth_state,
                camera = %snapshot.camera_tracking,
                anchors,
                "VPS not localized: {}",
                explain(snapshot)
            ),
        }
        true
    }
}
