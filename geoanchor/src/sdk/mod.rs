//! Boundary to the underlying AR SDK.
//!
//! The SDK is an opaque capability provider. This module only describes
//! what the view needs from it:
//!
//! - [`ArProvider`]: availability check and session construction
//! - [`ArSession`]: configuration, resume/pause/close, per-frame update,
//!   earth (geospatial) observation, and anchor creation
//! - [`ArAnchor`]: a handle the SDK keeps spatially stable
//!
//! [`SimulatedSdk`] is a scripted implementation used by the CLI driver and
//! by tests. It counts every call so lifecycle properties can be asserted.

mod sim;
mod types;

pub use sim::{SimPhase, SimScript, SimStats, SimulatedSdk};
pub use types::{
    AnchorTrackingState, Availability, CameraConfig, CameraFacing, CameraFrame,
    DeviceCapabilities, DisplayRotation, EarthObservation, EarthState, FocusMode, Frame,
    GeospatialMode, GeospatialPose, PlaneFindingMode, Pose, SessionConfig, TrackingState,
};

use glam::Quat;
use thiserror::Error;

use crate::coord::GeoCoordinate;

/// Failures reported by the SDK.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SdkError {
    /// No camera image this frame (camera busy or not yet started).
    #[error("camera frame unavailable")]
    FrameUnavailable,

    /// Operation needs a tracking session.
    #[error("session is not tracking")]
    NotTracking,

    /// Operation needs a resumed session.
    #[error("session is paused")]
    SessionPaused,

    /// SDK-side limit reached (too many anchors, quota).
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Missing runtime permission.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Feature or device not supported.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Anything else.
    #[error("internal SDK error: {0}")]
    Internal(String),
}

impl SdkError {
    /// Whether retrying the same call on a later frame can succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SdkError::FrameUnavailable | SdkError::NotTracking | SdkError::SessionPaused
        )
    }
}

/// Entry point into the AR SDK.
pub trait ArProvider: Send + Sync {
    /// Install/support state of the AR services.
    fn availability(&self) -> Availability;

    /// Construct a new, unconfigured, paused session.
    fn create_session(&self) -> Result<Box<dyn ArSession>, SdkError>;
}

/// A live AR tracking session.
///
/// Sessions are not assumed to be thread-safe; callers serialize access
/// through the session pool's lock.
pub trait ArSession: Send {
    /// Supported camera configurations facing `facing`.
    fn supported_camera_configs(&self, facing: CameraFacing) -> Vec<CameraConfig>;

    /// Select a camera configuration. Must be called before `resume`.
    fn set_camera_config(&mut self, config: &CameraConfig) -> Result<(), SdkError>;

    /// Apply a session configuration.
    fn configure(&mut self, config: &SessionConfig) -> Result<(), SdkError>;

    /// Start the camera and sensors.
    fn resume(&mut self) -> Result<(), SdkError>;

    /// Stop the camera and sensors.
    fn pause(&mut self);

    /// Release all SDK resources. The session is unusable afterwards.
    fn close(&mut self);

    /// Tell the SDK how the display is rotated and sized.
    fn set_display_geometry(&mut self, rotation: DisplayRotation, width: u32, height: u32);

    /// Advance to the latest camera frame.
    fn update(&mut self) -> Result<Frame, SdkError>;

    /// Current earth tracker observation, `None` when geospatial is off.
    fn earth(&self) -> Option<EarthObservation>;

    /// Create an anchor fixed at a geographic position.
    fn create_anchor(
        &mut self,
        coordinate: &GeoCoordinate,
        orientation: Quat,
    ) -> Result<Box<dyn ArAnchor>, SdkError>;
}

/// A point in the tracked world the SDK keeps stable.
pub trait ArAnchor: Send {
    fn tracking_state(&self) -> AnchorTrackingState;

    /// Current pose in the local tracked world.
    fn pose(&self) -> Pose;

    /// Stop tracking and release the anchor.
    fn detach(&mut self);
}
