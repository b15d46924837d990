//! Value types exchanged with the AR SDK.

use glam::{Mat4, Quat, Vec3};
use serde::Serialize;

/// Whether a pose is currently being estimated with confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackingState {
    #[default]
    NotTracking,
    Tracking,
}

impl TrackingState {
    /// Literal string used in status payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingState::NotTracking => "NOT_TRACKING",
            TrackingState::Tracking => "TRACKING",
        }
    }
}

impl std::fmt::Display for TrackingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operational state of the geospatial (earth) tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EarthState {
    #[default]
    Disabled,
    Enabled,
    ErrorNotAuthorized,
    ErrorResourceExhausted,
    ErrorInternal,
}

impl EarthState {
    /// Literal string used in status payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            EarthState::Disabled => "DISABLED",
            EarthState::Enabled => "ENABLED",
            EarthState::ErrorNotAuthorized => "ERROR_NOT_AUTHORIZED",
            EarthState::ErrorResourceExhausted => "ERROR_RESOURCE_EXHAUSTED",
            EarthState::ErrorInternal => "ERROR_INTERNAL",
        }
    }

    /// True for the states that end an initialization attempt immediately.
    pub fn is_hard_error(&self) -> bool {
        matches!(
            self,
            EarthState::ErrorInternal
                | EarthState::ErrorResourceExhausted
                | EarthState::ErrorNotAuthorized
        )
    }
}

impl std::fmt::Display for EarthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracking health of an individual anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorTrackingState {
    Tracking,
    Paused,
    /// The SDK will never track this anchor again.
    Stopped,
}

/// Global pose of the device camera reported by the earth tracker.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeospatialPose {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    /// Horizontal accuracy, meters (68% confidence radius).
    pub horizontal_accuracy: f64,
    /// Vertical accuracy, meters.
    pub vertical_accuracy: f64,
    /// Heading in degrees clockwise from north.
    pub heading: f64,
    pub heading_accuracy: f64,
}

/// What the earth tracker reports at one point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EarthObservation {
    pub state: EarthState,
    pub tracking: TrackingState,
    pub pose: GeospatialPose,
}

/// A rigid transform in the tracked local world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    /// Model matrix for this pose with a uniform scale.
    pub fn to_matrix(&self, scale: f32) -> Mat4 {
        Mat4::from_scale_rotation_translation(Vec3::splat(scale), self.rotation, self.translation)
    }
}

/// Camera state for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFrame {
    pub tracking: TrackingState,
    /// World-to-camera transform.
    pub view_matrix: Mat4,
    /// Vertical field of view in radians.
    pub vertical_fov: f32,
}

/// Result of advancing the session by one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub timestamp_ns: i64,
    pub camera: CameraFrame,
}

/// Which way a camera faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraFacing {
    Back,
    Front,
}

impl std::fmt::Display for CameraFacing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraFacing::Back => write!(f, "back"),
            CameraFacing::Front => write!(f, "front"),
        }
    }
}

/// One supported camera configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CameraConfig {
    pub facing: CameraFacing,
    pub width: u32,
    pub height: u32,
}

impl CameraConfig {
    pub fn new(facing: CameraFacing, width: u32, height: u32) -> Self {
        Self {
            facing,
            width,
            height,
        }
    }

    /// Image area in pixels.
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeospatialMode {
    Disabled,
    Enabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneFindingMode {
    Disabled,
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusMode {
    Fixed,
    Auto,
}

/// Session configuration pushed once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub geospatial: GeospatialMode,
    pub plane_finding: PlaneFindingMode,
    pub focus: FocusMode,
}

impl SessionConfig {
    /// Outdoor geospatial configuration: earth tracking on, planes off,
    /// autofocus on.
    pub fn geospatial() -> Self {
        Self {
            geospatial: GeospatialMode::Enabled,
            plane_finding: PlaneFindingMode::Disabled,
            focus: FocusMode::Auto,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::geospatial()
    }
}

/// Physical rotation of the display relative to its natural orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DisplayRotation {
    #[default]
    Rotation0,
    Rotation90,
    Rotation180,
    Rotation270,
}

impl DisplayRotation {
    /// Build from degrees; anything other than 0/90/180/270 is rejected.
    pub fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees % 360 {
            0 => Some(DisplayRotation::Rotation0),
            90 => Some(DisplayRotation::Rotation90),
            180 => Some(DisplayRotation::Rotation180),
            270 => Some(DisplayRotation::Rotation270),
            _ => None,
        }
    }

    pub fn degrees(&self) -> u32 {
        self.quarter_turns() * 90
    }

    /// Number of 90° counter-clockwise turns.
    pub fn quarter_turns(&self) -> u32 {
        match self {
            DisplayRotation::Rotation0 => 0,
            DisplayRotation::Rotation90 => 1,
            DisplayRotation::Rotation180 => 2,
            DisplayRotation::Rotation270 => 3,
        }
    }

    /// True when the long and short display axes are exchanged.
    pub fn is_sideways(&self) -> bool {
        matches!(
            self,
            DisplayRotation::Rotation90 | DisplayRotation::Rotation270
        )
    }
}

impl std::fmt::Display for DisplayRotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Install state of the AR services on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    SupportedInstalled,
    SupportedApkTooOld,
    SupportedNotInstalled,
    Unsupported,
}

/// Permissions and capabilities granted to the host app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCapabilities {
    pub camera_permission: bool,
    pub fine_location_permission: bool,
    /// Whether the device supports outdoor geospatial positioning.
    pub geospatial_supported: bool,
    /// A GPS or network location provider is switched on.
    pub location_provider_enabled: bool,
    /// A validated internet connection is up. VPS fetches its mapping data
    /// over the network.
    pub network_available: bool,
}

impl DeviceCapabilities {
    /// Everything granted and supported.
    pub fn all_granted() -> Self {
        Self {
            camera_permission: true,
            fine_location_permission: true,
            geospatial_supported: true,
            location_provider_enabled: true,
            network_available: true,
        }
    }
}
