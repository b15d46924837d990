//! INI serialization: `ArConfig` -> commented INI string.

use super::ArConfig;

pub(super) fn to_config_string(config: &ArConfig) -> String {
    format!(
        r#"[tracking]
; Horizontal and vertical accuracy (meters) required before placement
accuracy_threshold = {}
; Ticks to wait for VPS localization during initialization
init_timeout_ticks = {}
; Initialization poll period in milliseconds
tick_interval_ms = {}
; Minimum milliseconds between tracking status log lines
status_log_interval_ms = {}

[render]
; Render loop period in milliseconds
frame_interval_ms = {}
; Clip planes in meters
near_plane = {}
far_plane = {}

[camera]
; Only the back-facing camera supports geospatial tracking
facing = back

[placement]
; Place loaded models automatically once the VPS is ready
auto_place_on_ready = {}
"#,
        config.accuracy_threshold,
        config.init_timeout_ticks,
        config.tick_interval.as_millis(),
        config.status_log_interval.as_millis(),
        config.frame_interval.as_millis(),
        config.near_plane,
        config.far_plane,
        config.auto_place_on_ready,
    )
}
