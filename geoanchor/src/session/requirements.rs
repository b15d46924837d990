//! Device capability checks run before a session is requested.

use crate::error::{ViewError, ViewResult};
use crate::sdk::{Availability, DeviceCapabilities};

/// Name reported when the camera permission is missing.
pub const CAMERA_PERMISSION: &str = "CAMERA";
/// Name reported when the fine location permission is missing.
pub const FINE_LOCATION_PERMISSION: &str = "ACCESS_FINE_LOCATION";

/// Verify permissions, AR support, location services and connectivity.
///
/// Permissions are checked first so the caller can prompt for them before
/// an install/update prompt.
///
/// # Errors
///
/// - [`ViewError::PermissionDenied`] listing every missing permission
/// - [`ViewError::NeedsUpdate`] when AR services are missing or too old
/// - [`ViewError::NotSupported`] when the device cannot run AR or
///   geospatial tracking
/// - [`ViewError::LocationDisabled`] when no location provider is on
/// - [`ViewError::NetworkUnavailable`] when the device is offline
pub fn check_requirements(
    capabilities: &DeviceCapabilities,
    availability: Availability,
) -> ViewResult<()> {
    let mut missing = Vec::new();
    if !capabilities.camera_permission {
        missing.push(CAMERA_PERMISSION);
    }
    if !capabilities.fine_location_permission {
        missing.push(FINE_LOCATION_PERMISSION);
    }
    if !missing.is_empty() {
        return Err(ViewError::PermissionDenied { missing });
    }

    match availability {
        Availability::SupportedInstalled => {}
        Availability::SupportedApkTooOld => {
            return Err(ViewError::NeedsUpdate(
                "installed AR services are too old".to_string(),
            ))
        }
        Availability::SupportedNotInstalled => {
            return Err(ViewError::NeedsUpdate(
                "AR services are not installed".to_string(),
            ))
        }
        Availability::Unsupported => {
            return Err(ViewError::NotSupported(
                "device does not support AR".to_string(),
            ))
        }
    }

    if !capabilities.geospatial_supported {
        return Err(ViewError::NotSupported(
            "device does not support geospatial positioning".to_string(),
        ));
    }
    if !capabilities.location_provider_enabled {
        return Err(ViewError::LocationDisabled);
    }
    if !capabilities.network_available {
        return Err(ViewError::NetworkUnavailable);
    }
    Ok(())
}
