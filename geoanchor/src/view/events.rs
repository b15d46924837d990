//! Notifications sent from the view to the UI shell.

use serde::Serialize;

use super::status::UNKNOWN_ACCURACY;
use crate::anchors::PlacementRequest;
use crate::tracking::{TrackingSnapshot, VpsPhase};

/// Outbound notification, serialized with the shell's method names.
///
/// ```json
/// {"method":"onModelPlaced","arguments":{"model":"...","latitude":38.75,"longitude":-9.27}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "method", content = "arguments")]
pub enum ViewEvent {
    #[serde(rename = "onVpsStatusChanged", rename_all = "camelCase")]
    VpsStatusChanged {
        status: String,
        latitude: f64,
        longitude: f64,
        altitude: f64,
        horizontal_accuracy: f64,
        vertical_accuracy: f64,
        heading: f64,
    },

    #[serde(rename = "onModelPlaced")]
    ModelPlaced {
        model: String,
        latitude: f64,
        longitude: f64,
    },
}

impl ViewEvent {
    /// Status change for `phase` using the pose from `snapshot` if any.
    pub fn status_changed(phase: VpsPhase, snapshot: &TrackingSnapshot) -> Self {
        match snapshot.pose {
            Some(pose) => ViewEvent::VpsStatusChanged {
                status: phase.as_str().to_string(),
                latitude: pose.latitude,
                longitude: pose.longitude,
                altitude: pose.altitude,
                horizontal_accuracy: pose.horizontal_accuracy,
                vertical_accuracy: pose.vertical_accuracy,
                heading: pose.heading,
            },
            None => ViewEvent::VpsStatusChanged {
                status: phase.as_str().to_string(),
                latitude: 0.0,
                longitude: 0.0,
                altitude: 0.0,
                horizontal_accuracy: UNKNOWN_ACCURACY,
                vertical_accuracy: UNKNOWN_ACCURACY,
                heading: 0.0,
            },
        }
    }

    pub fn model_placed(request: &PlacementRequest) -> Self {
        ViewEvent::ModelPlaced {
            model: request.model.clone(),
            latitude: request.coordinate.latitude,
            longitude: request.coordinate.longitude,
        }
    }

    /// Method-channel name.
    pub fn method(&self) -> &'static str {
        match self {
            ViewEvent::VpsStatusChanged { .. } => "onVpsStatusChanged",
            ViewEvent::ModelPlaced { .. } => "onModelPlaced",
        }
    }
}
