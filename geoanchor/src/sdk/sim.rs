//! Scripted, deterministic AR SDK.
//!
//! The simulation advances one step per `ArSession::update` call. A
//! [`SimScript`] lists the [`SimPhase`] the device is in from a given update
//! number onwards, so a test can say "camera busy for 2 frames, searching
//! until frame 45, then localized at 8 m / 7 m".
//!
//! ```text
//! update:  1    2    3 ... 44   45 ........
//! phase :  Unav Unav Searching  Localized{8, 7}
//! ```
//!
//! Every SDK call is counted in [`SimStats`] so lifecycle properties
//! (constructed once, closed once, no anchor calls when idle) can be
//! asserted from outside.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use glam::{Mat4, Quat};
use parking_lot::Mutex;

use super::{
    AnchorTrackingState, ArAnchor, ArProvider, ArSession, Availability, CameraConfig,
    CameraFacing, CameraFrame, DisplayRotation, EarthObservation, EarthState, Frame,
    GeospatialMode, GeospatialPose, Pose, SdkError, SessionConfig, TrackingState,
};
use crate::coord::GeoCoordinate;

/// Simulated frame period (30 fps).
const FRAME_PERIOD_NS: i64 = 33_333_333;

/// Accuracy reported while the VPS has not localized yet.
const SEARCHING_ACCURACY_M: f64 = 45.0;

/// What the simulated device is experiencing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimPhase {
    /// The camera produces no frame.
    CameraUnavailable,
    /// Camera pose lost (covered lens, fast motion).
    NotTracking,
    /// Camera tracking, earth tracker enabled but not localized.
    Searching,
    /// Earth tracker localized with the given accuracies in meters.
    Localized { horizontal: f64, vertical: f64 },
    /// Earth tracker in a non-enabled state.
    Earth(EarthState),
}

/// Timeline of phases keyed by update number (1-based).
#[derive(Debug, Clone)]
pub struct SimScript {
    steps: Vec<(u64, SimPhase)>,
}

impl SimScript {
    /// Start in `phase` from the first update.
    pub fn starting(phase: SimPhase) -> Self {
        Self {
            steps: vec![(1, phase)],
        }
    }

    /// Searching until `update`, then localized at the given accuracies.
    pub fn converges_at(update: u64, horizontal: f64, vertical: f64) -> Self {
        Self::starting(SimPhase::Searching).then(
            update,
            SimPhase::Localized {
                horizontal,
                vertical,
            },
        )
    }

    /// Never localizes.
    pub fn never_converges() -> Self {
        Self::starting(SimPhase::Searching)
    }

    /// Switch to `phase` at `update` and stay there until the next step.
    pub fn then(mut self, update: u64, phase: SimPhase) -> Self {
        self.steps.push((update, phase));
        self.steps.sort_by_key(|(at, _)| *at);
        self
    }

    /// Phase in effect at `update`.
    pub fn phase_at(&self, update: u64) -> SimPhase {
        self.steps
            .iter()
            .rev()
            .find(|(at, _)| *at <= update)
            .map(|(_, phase)| *phase)
            .unwrap_or(SimPhase::NotTracking)
    }
}

impl Default for SimScript {
    fn default() -> Self {
        Self::converges_at(3, 4.0, 3.0)
    }
}

/// Counters for every SDK call made against the simulation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimStats {
    pub sessions_created: u32,
    pub sessions_closed: u32,
    pub configures: u32,
    pub resumes: u32,
    pub pauses: u32,
    pub updates: u64,
    pub selected_camera: Option<CameraConfig>,
    pub display_geometry: Vec<(DisplayRotation, u32, u32)>,
    pub anchor_attempts: u32,
    pub anchors_created: u32,
    pub anchors_detached: u32,
}

#[derive(Debug)]
struct SimState {
    script: SimScript,
    origin: GeoCoordinate,
    availability: Availability,
    camera_configs: Vec<CameraConfig>,
    fail_construction: Option<SdkError>,
    anchor_failures: VecDeque<SdkError>,
    stopped_anchors: HashSet<u32>,
    phase: SimPhase,
    stats: SimStats,
}

/// In-process AR SDK driven by a [`SimScript`].
///
/// Cloning yields another handle to the same simulated device.
#[derive(Debug, Clone)]
pub struct SimulatedSdk {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedSdk {
    /// Device at `origin` following `script`.
    pub fn new(script: SimScript, origin: GeoCoordinate) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                script,
                origin,
                availability: Availability::SupportedInstalled,
                camera_configs: vec![
                    CameraConfig::new(CameraFacing::Back, 640, 480),
                    CameraConfig::new(CameraFacing::Back, 1920, 1080),
                    CameraConfig::new(CameraFacing::Back, 1280, 720),
                    CameraConfig::new(CameraFacing::Front, 2560, 1440),
                ],
                fail_construction: None,
                anchor_failures: VecDeque::new(),
                stopped_anchors: HashSet::new(),
                phase: SimPhase::NotTracking,
                stats: SimStats::default(),
            })),
        }
    }

    /// Override the reported install state.
    pub fn with_availability(self, availability: Availability) -> Self {
        self.state.lock().availability = availability;
        self
    }

    /// Replace the supported camera configurations.
    pub fn with_camera_configs(self, configs: Vec<CameraConfig>) -> Self {
        self.state.lock().camera_configs = configs;
        self
    }

    /// Make session construction fail with `error` until cleared.
    pub fn fail_construction(&self, error: Option<SdkError>) {
        self.state.lock().fail_construction = error;
    }

    /// Make the next anchor creation fail with `error`.
    pub fn fail_next_anchor(&self, error: SdkError) {
        self.state.lock().anchor_failures.push_back(error);
    }

    /// Report the anchor created `index`-th (0-based) as permanently stopped.
    pub fn stop_anchor(&self, index: u32) {
        self.state.lock().stopped_anchors.insert(index);
    }

    /// Snapshot of the call counters.
    pub fn stats(&self) -> SimStats {
        self.state.lock().stats.clone()
    }
}

impl ArProvider for SimulatedSdk {
    fn availability(&self) -> Availability {
        self.state.lock().availability
    }

    fn create_session(&self) -> Result<Box<dyn ArSession>, SdkError> {
        let mut state = self.state.lock();
        if let Some(err) = state.fail_construction.clone() {
            return Err(err);
        }
        state.stats.sessions_created += 1;
        Ok(Box::new(SimSession {
            state: Arc::clone(&self.state),
            geospatial: false,
            resumed: false,
            closed: false,
        }))
    }
}

struct SimSession {
    state: Arc<Mutex<SimState>>,
    geospatial: bool,
    resumed: bool,
    closed: bool,
}

impl ArSession for SimSession {
    fn supported_camera_configs(&self, facing: CameraFacing) -> Vec<CameraConfig> {
        self.state
            .lock()
            .camera_configs
            .iter()
            .filter(|c| c.facing == facing)
            .copied()
            .collect()
    }

    fn set_camera_config(&mut self, config: &CameraConfig) -> Result<(), SdkError> {
        if self.resumed {
            return Err(SdkError::Internal(
                "camera config must be set while paused".to_string(),
            ));
        }
        self.state.lock().stats.selected_camera = Some(*config);
        Ok(())
    }

    fn configure(&mut self, config: &SessionConfig) -> Result<(), SdkError> {
        self.geospatial = config.geospatial == GeospatialMode::Enabled;
        self.state.lock().stats.configures += 1;
        Ok(())
    }

    fn resume(&mut self) -> Result<(), SdkError> {
        if self.closed {
            return Err(SdkError::Internal("session closed".to_string()));
        }
        self.resumed = true;
        self.state.lock().stats.resumes += 1;
        Ok(())
    }

    fn pause(&mut self) {
        if self.resumed {
            self.resumed = false;
            self.state.lock().stats.pauses += 1;
        }
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.resumed = false;
            self.state.lock().stats.sessions_closed += 1;
        }
    }

    fn set_display_geometry(&mut self, rotation: DisplayRotation, width: u32, height: u32) {
        self.state
            .lock()
            .stats
            .display_geometry
            .push((rotation, width, height));
    }

    fn update(&mut self) -> Result<Frame, SdkError> {
        if !self.resumed {
            return Err(SdkError::SessionPaused);
        }
        let mut state = self.state.lock();
        state.stats.updates += 1;
        let n = state.stats.updates;
        state.phase = state.script.phase_at(n);

        let tracking = match state.phase {
            SimPhase::CameraUnavailable => return Err(SdkError::FrameUnavailable),
            SimPhase::NotTracking => TrackingState::NotTracking,
            _ => TrackingState::Tracking,
        };
        Ok(Frame {
            timestamp_ns: n as i64 * FRAME_PERIOD_NS,
            camera: CameraFrame {
                tracking,
                view_matrix: Mat4::IDENTITY,
                vertical_fov: 60f32.to_radians(),
            },
        })
    }

    fn earth(&self) -> Option<EarthObservation> {
        if !self.geospatial {
            return None;
        }
        let state = self.state.lock();
        let origin = state.origin;
        let located = |horizontal, vertical| GeospatialPose {
            latitude: origin.latitude,
            longitude: origin.longitude,
            altitude: origin.altitude,
            horizontal_accuracy: horizontal,
            vertical_accuracy: vertical,
            heading: 0.0,
            heading_accuracy: 5.0,
        };
        let observation = match state.phase {
            SimPhase::CameraUnavailable | SimPhase::NotTracking | SimPhase::Searching => {
                EarthObservation {
                    state: EarthState::Enabled,
                    tracking: TrackingState::NotTracking,
                    pose: located(SEARCHING_ACCURACY_M, SEARCHING_ACCURACY_M),
                }
            }
            SimPhase::Localized {
                horizontal,
                vertical,
            } => EarthObservation {
                state: EarthState::Enabled,
                tracking: TrackingState::Tracking,
                pose: located(horizontal, vertical),
            },
            SimPhase::Earth(earth_state) => EarthObservation {
                state: earth_state,
                tracking: TrackingState::NotTracking,
                pose: GeospatialPose::default(),
            },
        };
        Some(observation)
    }

    fn create_anchor(
        &mut self,
        coordinate: &GeoCoordinate,
        orientation: Quat,
    ) -> Result<Box<dyn ArAnchor>, SdkError> {
        if !self.resumed {
            return Err(SdkError::SessionPaused);
        }
        let mut state = self.state.lock();
        state.stats.anchor_attempts += 1;
        if let Some(err) = state.anchor_failures.pop_front() {
            return Err(err);
        }
        if !matches!(state.phase, SimPhase::Localized { .. }) {
            return Err(SdkError::NotTracking);
        }
        let index = state.stats.anchors_created;
        state.stats.anchors_created += 1;
        let pose = Pose {
            translation: state.origin.local_offset_to(coordinate),
            rotation: orientation,
        };
        Ok(Box::new(SimAnchor {
            state: Arc::clone(&self.state),
            index,
            pose,
            detached: false,
        }))
    }
}

struct SimAnchor {
    state: Arc<Mutex<SimState>>,
    index: u32,
    pose: Pose,
    detached: bool,
}

impl ArAnchor for SimAnchor {
    fn tracking_state(&self) -> AnchorTrackingState {
        if self.detached || self.state.lock().stopped_anchors.contains(&self.index) {
            AnchorTrackingState::Stopped
        } else {
            AnchorTrackingState::Tracking
        }
    }

    fn pose(&self) -> Pose {
        self.pose
    }

    fn detach(&mut self) {
        if !self.detached {
            self.detached = true;
            self.state.lock().stats.anchors_detached += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> GeoCoordinate {
        GeoCoordinate::new(38.75, -9.27, 170.0).unwrap()
    }

    fn resumed_session(sdk: &SimulatedSdk) -> Box<dyn ArSession> {
        let mut session = sdk.create_session().unwrap();
        session.configure(&SessionConfig::geospatial()).unwrap();
        session.resume().unwrap();
        session
    }

    #[test]
    fn test_phase_lookup() {
        let script = SimScript::starting(SimPhase::CameraUnavailable)
            .then(3, SimPhase::Searching)
            .then(
                10,
                SimPhase::Localized {
                    horizontal: 8.0,
                    vertical: 7.0,
                },
            );
        assert_eq!(script.phase_at(0), SimPhase::NotTracking);
        assert_eq!(script.phase_at(1), SimPhase::CameraUnavailable);
        assert_eq!(script.phase_at(2), SimPhase::CameraUnavailable);
        assert_eq!(script.phase_at(9), SimPhase::Searching);
        assert!(matches!(
            script.phase_at(50),
            SimPhase::Localized { .. }
        ));
    }

    #[test]
    fn test_update_requires_resume() {
        let sdk = SimulatedSdk::new(SimScript::default(), origin());
        let mut session = sdk.create_session().unwrap();
        assert_eq!(session.update(), Err(SdkError::SessionPaused));
    }

    #[test]
    fn test_earth_absent_without_geospatial() {
        let sdk = SimulatedSdk::new(SimScript::default(), origin());
        let mut session = sdk.create_session().unwrap();
        session.resume().unwrap();
        session.update().unwrap();
        assert!(session.earth().is_none());
    }

    #[test]
    fn test_convergence_follows_script() {
        let sdk = SimulatedSdk::new(SimScript::converges_at(3, 8.0, 7.0), origin());
        let mut session = resumed_session(&sdk);

        session.update().unwrap();
        let earth = session.earth().unwrap();
        assert_eq!(earth.tracking, TrackingState::NotTracking);

        session.update().unwrap();
        session.update().unwrap();
        let earth = session.earth().unwrap();
        assert_eq!(earth.state, EarthState::Enabled);
        assert_eq!(earth.tracking, TrackingState::Tracking);
        assert_eq!(earth.pose.horizontal_accuracy, 8.0);
        assert_eq!(sdk.stats().updates, 3);
    }

    #[test]
    fn test_anchor_pose_is_local_offset() {
        let sdk = SimulatedSdk::new(SimScript::converges_at(1, 3.0, 3.0), origin());
        let mut session = resumed_session(&sdk);
        session.update().unwrap();

        let target = GeoCoordinate::new(38.7509, -9.27, 170.0).unwrap();
        let anchor = session.create_anchor(&target, Quat::IDENTITY).unwrap();
        assert!(anchor.pose().translation.z < -99.0);
        assert_eq!(anchor.tracking_state(), AnchorTrackingState::Tracking);
    }

    #[test]
    fn test_stop_and_detach_anchor() {
        let sdk = SimulatedSdk::new(SimScript::converges_at(1, 3.0, 3.0), origin());
        let mut session = resumed_session(&sdk);
        session.update().unwrap();

        let mut anchor = session.create_anchor(&origin(), Quat::IDENTITY).unwrap();
        sdk.stop_anchor(0);
        assert_eq!(anchor.tracking_state(), AnchorTrackingState::Stopped);

        anchor.detach();
        anchor.detach();
        assert_eq!(sdk.stats().anchors_detached, 1);
    }

    #[test]
    fn test_queued_anchor_failure() {
        let sdk = SimulatedSdk::new(SimScript::converges_at(1, 3.0, 3.0), origin());
        let mut session = resumed_session(&sdk);
        session.update().unwrap();

        sdk.fail_next_anchor(SdkError::ResourceExhausted("anchor limit".into()));
        assert!(session.create_anchor(&origin(), Quat::IDENTITY).is_err());
        assert!(session.create_anchor(&origin(), Quat::IDENTITY).is_ok());
        assert_eq!(sdk.stats().anchor_attempts, 2);
        assert_eq!(sdk.stats().anchors_created, 1);
    }

    #[test]
    fn test_close_counts_once() {
        let sdk = SimulatedSdk::new(SimScript::default(), origin());
        let mut session = resumed_session(&sdk);
        session.pause();
        session.close();
        session.close();
        let stats = sdk.stats();
        assert_eq!(stats.sessions_created, 1);
        assert_eq!(stats.sessions_closed, 1);
        assert_eq!(stats.pauses, 1);
    }
}
