//! Placement requests and batch model input.

use glam::Quat;
use serde::Deserialize;

use crate::coord::{orientation_from_heading, GeoCoordinate};
use crate::error::{ViewError, ViewResult};

/// Model drawn for ad hoc placements with no model reference.
pub const DEFAULT_MODEL: &str = "cube";

/// Base URI for bundled model assets.
pub const MODEL_ASSET_ROOT: &str = "file:///android_asset/models/";

/// A caller's request to anchor content at a geographic position.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementRequest {
    pub id: String,
    pub coordinate: GeoCoordinate,
    pub orientation: Quat,
    /// Uniform scale applied to the model.
    pub scale: f32,
    /// Model reference as the caller gave it.
    pub model: String,
    /// Loadable URI resolved from `model`.
    pub model_uri: String,
}

impl PlacementRequest {
    /// Request with identity orientation and unit scale.
    pub fn new(id: impl Into<String>, coordinate: GeoCoordinate, model: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            id: id.into(),
            coordinate,
            orientation: Quat::IDENTITY,
            scale: 1.0,
            model_uri: resolve_model_uri(&model),
            model,
        }
    }

    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.orientation = orientation;
        self
    }

    /// Orientation from a yaw angle in degrees.
    pub fn with_heading(self, heading_deg: f32) -> Self {
        self.with_orientation(orientation_from_heading(heading_deg))
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }
}

fn default_scale() -> f32 {
    1.0
}

/// One entry of the batch model JSON.
///
/// ```json
/// {"model": "Duck.glb", "latitude": 38.75, "longitude": -9.27, "altitude": 170.0, "scale": 1.0}
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelPlacement {
    pub model: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    #[serde(default = "default_scale")]
    pub scale: f32,
    /// Yaw in degrees.
    #[serde(default)]
    pub heading: f32,
}

impl ModelPlacement {
    /// Validate and turn into a request named `id`.
    ///
    /// # Errors
    ///
    /// [`ViewError::InvalidCoordinate`] for out-of-range coordinates and
    /// [`ViewError::InvalidModelConfig`] for a non-positive scale.
    pub fn into_request(self, id: impl Into<String>) -> ViewResult<PlacementRequest> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(ViewError::InvalidModelConfig(format!(
                "scale must be positive, got {}",
                self.scale
            )));
        }
        let coordinate = GeoCoordinate::new(self.latitude, self.longitude, self.altitude)?;
        Ok(PlacementRequest::new(id, coordinate, self.model)
            .with_heading(self.heading)
            .with_scale(self.scale))
    }
}

/// Parse the batch model JSON array.
///
/// # Errors
///
/// [`ViewError::InvalidModelConfig`] when the input is not an array of
/// placement objects.
pub fn parse_model_batch(json: &str) -> ViewResult<Vec<ModelPlacement>> {
    serde_json::from_str(json).map_err(|e| ViewError::InvalidModelConfig(e.to_string()))
}

/// Resolve a model reference to a loadable URI.
///
/// Remote references are kept as-is, bare names point into the bundled
/// model assets.
pub fn resolve_model_uri(model: &str) -> String {
    if model.starts_with("http") {
        model.to_string()
    } else {
        format!("{MODEL_ASSET_ROOT}{model}")
    }
}
