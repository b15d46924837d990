//! Error taxonomy for the geospatial AR view.
//!
//! Every failure the view can surface to its caller is a [`ViewError`].
//! Each variant maps to a stable string code (see [`ViewError::code`]) that
//! the UI shell forwards over its method channel, so the shell can show a
//! platform-specific prompt without parsing messages.
//!
//! # Recovery Classes
//!
//! ```text
//! Transient  : Unavailable                   -> skip the tick, no user effect
//! Retryable  : VpsTimeout, NotReady          -> caller may try again
//! Fatal      : PermissionDenied, NotSupported, NeedsUpdate, EarthError,
//!              LocationDisabled, NetworkUnavailable,
//!              Initialization                 -> caller must fix and re-create
//! Local      : AnchorCreationFailed, InvalidModelConfig, InvalidCoordinate,
//!              NotFound                       -> only that request fails
//! ```

use thiserror::Error;

use crate::config::ConfigFileError;
use crate::coord::CoordError;
use crate::render::RenderError;
use crate::sdk::{EarthState, SdkError};

/// Guidance shown when the VPS fails to localize before the timeout.
pub const VPS_TIMEOUT_GUIDANCE: &str = "Move outdoors with an open view of the sky, \
point the camera at buildings or landmarks more than 20 m away, and pan slowly. \
Avoid empty sky, plain walls and dense vegetation.";

/// Result type for view operations.
pub type ViewResult<T> = Result<T, ViewError>;

/// Errors surfaced by the geospatial AR view.
#[derive(Debug, Error)]
pub enum ViewError {
    /// Camera frame not available this tick.
    #[error("camera not available: {0}")]
    Unavailable(String),

    /// Camera or location permission missing.
    #[error("missing permissions: {}", missing.join(", "))]
    PermissionDenied { missing: Vec<&'static str> },

    /// The device cannot run the AR subsystem.
    #[error("AR not supported on this device: {0}")]
    NotSupported(String),

    /// Every location provider is switched off.
    #[error("location services are disabled")]
    LocationDisabled,

    /// No internet connection for downloading VPS mapping data.
    #[error("no internet connection, VPS needs network access")]
    NetworkUnavailable,

    /// The AR subsystem must be installed or updated first.
    #[error("AR services must be installed or updated: {0}")]
    NeedsUpdate(String),

    /// The geospatial tracker reported a hard error.
    #[error("earth tracker error ({state}): {message}")]
    EarthError { state: EarthState, message: String },

    /// VPS did not localize within the bounded initialization window.
    #[error("VPS could not localize after {ticks} ticks. {guidance}")]
    VpsTimeout { ticks: u32, guidance: &'static str },

    /// Placement requested before tracking and accuracy were good enough.
    #[error("not ready for placement: {0}")]
    NotReady(String),

    /// The SDK refused to create an anchor for one request.
    #[error("anchor creation failed for '{id}': {source}")]
    AnchorCreationFailed {
        id: String,
        #[source]
        source: SdkError,
    },

    /// Session construction or first configuration failed.
    #[error("session initialization failed: {0}")]
    Initialization(#[source] SdkError),

    /// Batch model JSON could not be parsed.
    #[error("invalid model configuration: {0}")]
    InvalidModelConfig(String),

    /// A coordinate was outside the valid WGS84 range.
    #[error(transparent)]
    InvalidCoordinate(#[from] CoordError),

    /// No placed model with the given id.
    #[error("model '{0}' not found")]
    NotFound(String),

    /// The initialization poll was cancelled because the view went away.
    #[error("operation cancelled")]
    Cancelled,

    /// The view has been disposed.
    #[error("view has been disposed")]
    Disposed,

    /// GPU resource creation failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigFileError),
}

impl ViewError {
    /// Stable code sent to the UI shell alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            ViewError::Unavailable(_) => "CAMERA_NOT_AVAILABLE",
            ViewError::PermissionDenied { .. } => "PERMISSION_REQUIRED",
            ViewError::NotSupported(_) => "ARCORE_NOT_SUPPORTED",
            ViewError::NeedsUpdate(_) => "ARCORE_NOT_INSTALLED",
            ViewError::LocationDisabled => "LOCATION_DISABLED",
            ViewError::NetworkUnavailable => "NETWORK_UNAVAILABLE",
            ViewError::EarthError { state, .. } => match state {
                EarthState::ErrorResourceExhausted => "QUOTA_EXCEEDED",
                EarthState::ErrorNotAuthorized => "NOT_AUTHORIZED",
                _ => "EARTH_ERROR",
            },
            ViewError::VpsTimeout { .. } => "TIMEOUT",
            ViewError::NotReady(_) => "NOT_TRACKING",
            ViewError::AnchorCreationFailed { .. } => "ANCHOR_CREATION_FAILED",
            ViewError::Initialization(_) => "INIT_ERROR",
            ViewError::InvalidModelConfig(_) => "INVALID_ARGUMENT",
            ViewError::InvalidCoordinate(_) => "INVALID_ARGUMENT",
            ViewError::NotFound(_) => "NOT_FOUND",
            ViewError::Cancelled => "CANCELLED",
            ViewError::Disposed => "DISPOSED",
            ViewError::Render(_) => "RENDER_ERROR",
            ViewError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Whether the caller can simply try the same operation again later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ViewError::Unavailable(_) | ViewError::VpsTimeout { .. } | ViewError::NotReady(_)
        )
    }

    /// Build the error for a hard earth-tracker state.
    pub(crate) fn earth(state: EarthState) -> Self {
        let message = match state {
            EarthState::ErrorInternal => {
                "internal geospatial error, check the API key configuration"
            }
            EarthState::ErrorResourceExhausted => "geospatial API quota exceeded",
            EarthState::ErrorNotAuthorized => "geospatial API key missing or not authorized",
            _ => "geospatial tracker unavailable",
        };
        ViewError::EarthError {
            state,
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_distinguish_earth_errors() {
        assert_eq!(
            ViewError::earth(EarthState::ErrorInternal).code(),
            "EARTH_ERROR"
        );
        assert_eq!(
            ViewError::earth(EarthState::ErrorResourceExhausted).code(),
            "QUOTA_EXCEEDED"
        );
        assert_eq!(
            ViewError::earth(EarthState::ErrorNotAuthorized).code(),
            "NOT_AUTHORIZED"
        );
    }

    #[test]
    fn test_timeout_message_carries_guidance() {
        let err = ViewError::VpsTimeout {
            ticks: 120,
            guidance: VPS_TIMEOUT_GUIDANCE,
        };
        let msg = err.to_string();
        assert!(msg.contains("120 ticks"));
        assert!(msg.contains("open view of the sky"));
        assert_eq!(err.code(), "TIMEOUT");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_permission_denied_lists_missing() {
        let err = ViewError::PermissionDenied {
            missing: vec!["CAMERA", "ACCESS_FINE_LOCATION"],
        };
        assert_eq!(
            err.to_string(),
            "missing permissions: CAMERA, ACCESS_FINE_LOCATION"
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_fatal_errors_not_retryable() {
        assert!(!ViewError::earth(EarthState::ErrorInternal).is_retryable());
        assert!(!ViewError::NotSupported("x".into()).is_retryable());
        assert!(!ViewError::NeedsUpdate("x".into()).is_retryable());
        assert!(ViewError::NotReady("x".into()).is_retryable());
    }
}
