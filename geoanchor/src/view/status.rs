//! Status payloads returned to the UI shell.

use serde::Serialize;

use crate::sdk::CameraConfig;
use crate::tracking::TrackingSnapshot;

/// Accuracy reported when no pose is known.
pub const UNKNOWN_ACCURACY: f64 = 999.0;

/// State string reported when no snapshot exists yet.
pub const UNKNOWN_STATE: &str = "UNKNOWN";

/// Complete VPS status. Every field is always present; unknown values use
/// sentinels.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VpsStatus {
    pub available: bool,
    pub tracking: bool,
    pub tracking_state: String,
    pub earth_state: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub horizontal_accuracy: f64,
    pub vertical_accuracy: f64,
    pub heading: f64,
    pub heading_accuracy: f64,
    pub object_count: usize,
}

impl VpsStatus {
    /// Status before any tracking data exists.
    pub fn unknown(object_count: usize) -> Self {
        Self {
            available: false,
            tracking: false,
            tracking_state: UNKNOWN_STATE.to_string(),
            earth_state: UNKNOWN_STATE.to_string(),
            latitude: 0.0,
            longitude: 0.0,
            altitude: 0.0,
            horizontal_accuracy: UNKNOWN_ACCURACY,
            vertical_accuracy: UNKNOWN_ACCURACY,
            heading: 0.0,
            heading_accuracy: UNKNOWN_ACCURACY,
            object_count,
        }
    }

    /// Status for the latest snapshot, or [`unknown`](Self::unknown).
    pub fn from_snapshot(snapshot: Option<&TrackingSnapshot>, object_count: usize) -> Self {
        let Some(snapshot) = snapshot else {
            return Self::unknown(object_count);
        };
        let tracking = snapshot.is_tracking();
        let mut status = Self {
            available: tracking,
            tracking,
            tracking_state: snapshot.earth_tracking.as_str().to_string(),
            earth_state: snapshot.earth_state.as_str().to_string(),
            ..Self::unknown(object_count)
        };
        if let Some(pose) = snapshot.pose {
            status.latitude = pose.latitude;
            status.longitude = pose.longitude;
            status.altitude = pose.altitude;
            status.horizontal_accuracy = pose.horizontal_accuracy;
            status.vertical_accuracy = pose.vertical_accuracy;
            status.heading = pose.heading;
            status.heading_accuracy = pose.heading_accuracy;
        }
        status
    }
}

/// Selected camera image size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraInfo {
    pub width: u32,
    pub height: u32,
    /// `"WxH"` or `"not configured"`.
    pub resolution: String,
    pub configured: bool,
}

impl CameraInfo {
    pub fn from_config(config: Option<CameraConfig>) -> Self {
        match config {
            Some(c) => Self {
                width: c.width,
                height: c.height,
                resolution: format!("{}x{}", c.width, c.height),
                configured: true,
            },
            None => Self {
                width: 0,
                height: 0,
                resolution: "not configured".to_string(),
                configured: false,
            },
        }
    }
}

/// Result of an explicit `place_models` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementSummary {
    pub placed: usize,
    pub failed: usize,
    pub pending: usize,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::sdk::{
        CameraFacing, EarthObservation, EarthState, GeospatialPose, TrackingState,
    };

    #[test]
    fn test_unknown_uses_sentinels() {
        let value = serde_json::to_value(VpsStatus::unknown(0)).unwrap();
        assert_eq!(value["available"], json!(false));
        assert_eq!(value["trackingState"], json!("UNKNOWN"));
        assert_eq!(value["earthState"], json!("UNKNOWN"));
        assert_eq!(value["horizontalAccuracy"], json!(999.0));
        assert_eq!(value["verticalAccuracy"], json!(999.0));
        assert_eq!(value["objectCount"], json!(0));
        assert_eq!(value.as_object().unwrap().len(), 12);
    }

    #[test]
    fn test_localized_snapshot() {
        let snapshot = TrackingSnapshot::observe(
            45,
            TrackingState::Tracking,
            Some(EarthObservation {
                state: EarthState::Enabled,
                tracking: TrackingState::Tracking,
                pose: GeospatialPose {
                    latitude: 38.75,
                    longitude: -9.27,
                    altitude: 170.0,
                    horizontal_accuracy: 8.0,
                    vertical_accuracy: 7.0,
                    heading: 90.0,
                    heading_accuracy: 3.0,
                },
            }),
        );
        let status = VpsStatus::from_snapshot(Some(&snapshot), 2);
        assert!(status.available);
        assert!(status.tracking);
        assert_eq!(status.earth_state, "ENABLED");
        assert_eq!(status.tracking_state, "TRACKING");
        assert_eq!(status.horizontal_accuracy, 8.0);
        assert_eq!(status.object_count, 2);
    }

    #[test]
    fn test_searching_snapshot_keeps_sentinels() {
        let snapshot = TrackingSnapshot::observe(
            3,
            TrackingState::Tracking,
            Some(EarthObservation {
                state: EarthState::Enabled,
                tracking: TrackingState::NotTracking,
                pose: GeospatialPose::default(),
            }),
        );
        let status = VpsStatus::from_snapshot(Some(&snapshot), 0);
        assert!(!status.available);
        assert_eq!(status.earth_state, "ENABLED");
        assert_eq!(status.tracking_state, "NOT_TRACKING");
        assert_eq!(status.vertical_accuracy, UNKNOWN_ACCURACY);
    }

    #[test]
    fn test_camera_info() {
        let info = CameraInfo::from_config(Some(CameraConfig::new(CameraFacing::Back, 1920, 1080)));
        assert_eq!(info.resolution, "1920x1080");
        assert!(info.configured);
        let none = CameraInfo::from_config(None);
        assert_eq!(none.resolution, "not configured");
        assert!(!none.configured);
    }
}
