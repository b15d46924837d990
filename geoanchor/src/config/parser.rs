//! INI parsing: `Ini` -> `ArConfig`.
//!
//! Starts from `ArConfig::default()` and overlays any values found.

use std::str::FromStr;
use std::time::Duration;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::ArConfig;
use crate::sdk::CameraFacing;

pub(super) fn parse_ini(ini: &Ini) -> Result<ArConfig, ConfigFileError> {
    let mut config = ArConfig::default();

    // [tracking] section
    if let Some(section) = ini.section(Some("tracking")) {
        if let Some(v) = get::<f64>(section, "tracking", "accuracy_threshold", "a number of meters")? {
            if !(v.is_finite() && v > 0.0) {
                return Err(invalid("tracking", "accuracy_threshold", v, "must be positive"));
            }
            config.accuracy_threshold = v;
        }
        if let Some(v) = get::<u32>(section, "tracking", "init_timeout_ticks", "a tick count")? {
            if v == 0 {
                return Err(invalid("tracking", "init_timeout_ticks", v, "must be at least 1"));
            }
            config.init_timeout_ticks = v;
        }
        if let Some(v) = millis(section, "tracking", "tick_interval_ms")? {
            config.tick_interval = v;
        }
        if let Some(v) = millis(section, "tracking", "status_log_interval_ms")? {
            config.status_log_interval = v;
        }
    }

    // [render] section
    if let Some(section) = ini.section(Some("render")) {
        if let Some(v) = millis(section, "render", "frame_interval_ms")? {
            config.frame_interval = v;
        }
        if let Some(v) = get::<f32>(section, "render", "near_plane", "a distance in meters")? {
            config.near_plane = v;
        }
        if let Some(v) = get::<f32>(section, "render", "far_plane", "a distance in meters")? {
            config.far_plane = v;
        }
        if !(config.near_plane > 0.0 && config.far_plane > config.near_plane) {
            return Err(invalid(
                "render",
                "far_plane",
                config.far_plane,
                "need 0 < near_plane < far_plane",
            ));
        }
    }

    // [camera] section
    if let Some(section) = ini.section(Some("camera")) {
        if let Some(v) = section.get("facing") {
            let v = v.trim().to_lowercase();
            if v != "back" {
                return Err(invalid(
                    "camera",
                    "facing",
                    v,
                    "only the back-facing camera supports geospatial tracking",
                ));
            }
            config.camera_facing = CameraFacing::Back;
        }
    }

    // [placement] section
    if let Some(section) = ini.section(Some("placement")) {
        if let Some(v) = get::<bool>(section, "placement", "auto_place_on_ready", "true or false")? {
            config.auto_place_on_ready = v;
        }
    }

    Ok(config)
}

fn get<T: FromStr>(
    section: &Properties,
    section_name: &str,
    key: &str,
    expected: &str,
) -> Result<Option<T>, ConfigFileError> {
    let Some(raw) = section.get(key) else {
        return Ok(None);
    };
    let raw = raw.trim();
    raw.parse::<T>()
        .map(Some)
        .map_err(|_| invalid(section_name, key, raw, &format!("expected {expected}")))
}

fn millis(
    section: &Properties,
    section_name: &str,
    key: &str,
) -> Result<Option<Duration>, ConfigFileError> {
    match get::<u64>(section, section_name, key, "milliseconds")? {
        Some(0) => Err(invalid(section_name, key, 0, "must be at least 1 ms")),
        Some(ms) => Ok(Some(Duration::from_millis(ms))),
        None => Ok(None),
    }
}

fn invalid(
    section: &str,
    key: &str,
    value: impl ToString,
    reason: &str,
) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
