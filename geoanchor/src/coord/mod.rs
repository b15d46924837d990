//! Geographic coordinate handling.
//!
//! Provides validated WGS84 coordinates for placement requests, the
//! heading-to-orientation conversion used when a caller supplies a yaw
//! angle instead of a quaternion, and a local tangent-plane offset used to
//! express a geographic target relative to a tracked origin.

use std::f64::consts::PI;

use glam::{Quat, Vec3};
use thiserror::Error;

/// Minimum valid latitude in degrees.
pub const MIN_LAT: f64 = -90.0;
/// Maximum valid latitude in degrees.
pub const MAX_LAT: f64 = 90.0;
/// Minimum valid longitude in degrees.
pub const MIN_LON: f64 = -180.0;
/// Maximum valid longitude in degrees.
pub const MAX_LON: f64 = 180.0;

/// Meters per degree of latitude (mean value).
const METERS_PER_DEG_LAT: f64 = 110_540.0;
/// Meters per degree of longitude at the equator.
const METERS_PER_DEG_LON_EQUATOR: f64 = 111_320.0;

/// Errors from coordinate validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Latitude outside [-90, 90] or not finite.
    #[error("invalid latitude: {0}")]
    InvalidLatitude(f64),
    /// Longitude outside [-180, 180] or not finite.
    #[error("invalid longitude: {0}")]
    InvalidLongitude(f64),
    /// Altitude not finite.
    #[error("invalid altitude: {0}")]
    InvalidAltitude(f64),
}

/// A validated WGS84 position with altitude in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoCoordinate {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Altitude above the WGS84 ellipsoid in meters.
    pub altitude: f64,
}

impl GeoCoordinate {
    /// Create a coordinate, validating ranges.
    ///
    /// # Errors
    ///
    /// Returns a [`CoordError`] when latitude or longitude is out of range,
    /// or when any component is NaN or infinite.
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Result<Self, CoordError> {
        if !latitude.is_finite() || !(MIN_LAT..=MAX_LAT).contains(&latitude) {
            return Err(CoordError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || !(MIN_LON..=MAX_LON).contains(&longitude) {
            return Err(CoordError::InvalidLongitude(longitude));
        }
        if !altitude.is_finite() {
            return Err(CoordError::InvalidAltitude(altitude));
        }
        Ok(Self {
            latitude,
            longitude,
            altitude,
        })
    }

    /// Offset of `target` from `self` in a local east-up-south frame.
    ///
    /// The returned vector uses the AR world convention: +X east, +Y up,
    /// -Z north. Uses an equirectangular approximation, which is accurate
    /// to well under a meter for the few-hundred-meter ranges an outdoor
    /// AR scene renders.
    pub fn local_offset_to(&self, target: &GeoCoordinate) -> Vec3 {
        let lat_rad = self.latitude * PI / 180.0;
        let east = (target.longitude - self.longitude) * METERS_PER_DEG_LON_EQUATOR * lat_rad.cos();
        let north = (target.latitude - self.latitude) * METERS_PER_DEG_LAT;
        let up = target.altitude - self.altitude;
        Vec3::new(east as f32, up as f32, -north as f32)
    }
}

impl std::fmt::Display for GeoCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({:.6}, {:.6}, {:.1}m)",
            self.latitude, self.longitude, self.altitude
        )
    }
}

/// Orientation for a model rotated `heading_deg` degrees about the up axis.
///
/// Zero yields the identity quaternion.
pub fn orientation_from_heading(heading_deg: f32) -> Quat {
    if heading_deg == 0.0 {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_y(heading_deg.to_radians())
}
