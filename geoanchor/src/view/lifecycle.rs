//! View state machine and render loop.
//!
//! ```text
//!  create()          surface_changed()         dispose()
//! ─────────► CONFIGURING ─────────────► ACTIVE ──────────► DISPOSED
//!  acquire      first valid size:        tick:              detach anchors
//!  session      push geometry,           poll, prune,       release lease
//!               set up GPU               auto-place, draw   release GPU
//! ```
//!
//! The lifecycle owns the anchor registry and the renderer. Everything from
//! the UI side reaches it as a [`ViewCommand`] drained on the loop.

use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::command::{ViewCommand, ViewHandle};
use super::events::ViewEvent;
use super::status::{CameraInfo, PlacementSummary, VpsStatus};
use crate::anchors::{parse_model_batch, AnchorRegistry, PlacementRequest, DEFAULT_MODEL};
use crate::config::ArConfig;
use crate::coord::GeoCoordinate;
use crate::error::{ViewError, ViewResult};
use crate::render::{DisplayGeometry, GeometryRenderer, GpuBackend};
use crate::sdk::{DeviceCapabilities, DisplayRotation, Frame};
use crate::session::{check_requirements, SessionLease, SessionPool};
use crate::tracking::{InitializationPoll, StatusLogger, TrackingFeed};

/// Where a view is in its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// Constructed, not yet holding a session.
    Created,
    /// Session acquired, waiting for real surface dimensions.
    Configuring,
    /// Rendering and accepting placement.
    Active,
    /// Torn down. Terminal.
    Disposed,
}

impl ViewState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewState::Created => "created",
            ViewState::Configuring => "configuring",
            ViewState::Active => "active",
            ViewState::Disposed => "disposed",
        }
    }
}

impl std::fmt::Display for ViewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

enum Wake {
    Shutdown,
    Command(ViewCommand),
    Closed,
    Frame,
}

/// One mounted geospatial AR view.
pub struct ViewLifecycle<B: GpuBackend> {
    state: ViewState,
    config: ArConfig,
    lease: Option<SessionLease>,
    feed: TrackingFeed,
    registry: AnchorRegistry,
    renderer: GeometryRenderer<B>,
    geometry: Option<DisplayGeometry>,
    last_frame: Option<Frame>,
    commands: mpsc::UnboundedReceiver<ViewCommand>,
    events: mpsc::UnboundedSender<ViewEvent>,
    liveness: CancellationToken,
    status_log: StatusLogger,
    next_id: u64,
}

impl<B: GpuBackend> ViewLifecycle<B> {
    /// Check the device, acquire the shared session and enter CONFIGURING.
    ///
    /// # Arguments
    ///
    /// * `pool` - Session pool shared by every view in the process
    /// * `backend` - GPU backend; resources are created on the first valid
    ///   surface size
    /// * `capabilities` - Granted permissions and device support
    /// * `config` - Tracking, render and placement settings
    /// * `events` - Sink for outbound notifications
    ///
    /// # Errors
    ///
    /// - [`ViewError::PermissionDenied`], [`ViewError::NotSupported`],
    ///   [`ViewError::NeedsUpdate`], [`ViewError::LocationDisabled`] or
    ///   [`ViewError::NetworkUnavailable`] from the capability check
    /// - [`ViewError::Initialization`] if the session cannot be created
    pub fn create(
        pool: &Arc<SessionPool>,
        backend: B,
        capabilities: &DeviceCapabilities,
        config: ArConfig,
        events: mpsc::UnboundedSender<ViewEvent>,
    ) -> ViewResult<(Self, ViewHandle)> {
        check_requirements(capabilities, pool.availability())?;
        let lease = pool.acquire()?;
        let feed = TrackingFeed::new(Arc::clone(lease.session()), config.accuracy_threshold);

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let liveness = CancellationToken::new();

        let handle = ViewHandle::new(
            commands_tx,
            feed.clone(),
            liveness.clone(),
            InitializationPoll::from_config(&config),
        );

        let view = Self {
            state: ViewState::Configuring,
            feed,
            registry: AnchorRegistry::new(),
            renderer: GeometryRenderer::new(backend, config.projection()),
            status_log: StatusLogger::new(config.status_log_interval, config.accuracy_threshold),
            config,
            lease: Some(lease),
            geometry: None,
            last_frame: None,
            commands: commands_rx,
            events,
            liveness,
            next_id: 0,
        };
        info!(state = %view.state, "AR view created");
        Ok((view, handle))
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn registry(&self) -> &AnchorRegistry {
        &self.registry
    }

    pub fn renderer(&self) -> &GeometryRenderer<B> {
        &self.renderer
    }

    pub fn geometry(&self) -> Option<DisplayGeometry> {
        self.geometry
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Place [`DEFAULT_MODEL`] at a coordinate immediately.
    ///
    /// Only accepted while ACTIVE.
    pub fn place_model(&mut self, latitude: f64, longitude: f64, altitude: f64) -> ViewResult<String> {
        self.ensure_active()?;
        let coordinate = GeoCoordinate::new(latitude, longitude, altitude)?;
        let snapshot = self
            .feed
            .latest()
            .ok_or_else(|| ViewError::NotReady("no tracking data yet".to_string()))?;

        let request = PlacementRequest::new(self.allocate_id(), coordinate, DEFAULT_MODEL);
        let record = {
            let mut session = self.feed.session().lock();
            self.registry.place_immediate(
                request,
                &snapshot,
                self.config.accuracy_threshold,
                &mut session,
            )?
        };
        let id = record.request().id.clone();
        let event = ViewEvent::model_placed(record.request());
        self.emit(event);
        Ok(id)
    }

    pub fn status(&self) -> VpsStatus {
        VpsStatus::from_snapshot(self.feed.latest().as_ref(), self.registry.active_count())
    }

    pub fn camera_info(&self) -> CameraInfo {
        CameraInfo::from_config(self.feed.session().lock().camera_config())
    }

    /// Parse a batch and make it the pending set.
    ///
    /// ACTIVE anchors are kept. Returns the number of queued requests.
    ///
    /// # Errors
    ///
    /// [`ViewError::InvalidModelConfig`] or [`ViewError::InvalidCoordinate`];
    /// the pending set is left unchanged.
    pub fn load_models(&mut self, json: &str) -> ViewResult<usize> {
        self.ensure_live()?;
        let requests = parse_model_batch(json)?
            .into_iter()
            .map(|model| {
                let id = self.allocate_id();
                model.into_request(id)
            })
            .collect::<ViewResult<Vec<_>>>()?;

        let queued = requests.len();
        let dropped = self.registry.replace_pending(requests);
        info!(queued, dropped, "Model batch loaded");
        Ok(queued)
    }

    /// Create anchors for every pending request.
    ///
    /// # Errors
    ///
    /// [`ViewError::NotReady`] before the view is ACTIVE, or unless the
    /// latest snapshot is tracking with both accuracies under the threshold.
    /// Per-request failures are counted in the summary, not returned.
    pub fn place_models(&mut self) -> ViewResult<PlacementSummary> {
        self.ensure_active()?;
        let threshold = self.config.accuracy_threshold;
        let snapshot = self
            .feed
            .latest()
            .filter(|s| s.is_ready(threshold))
            .ok_or_else(|| {
                ViewError::NotReady(format!(
                    "VPS accuracy must be under {threshold:.1} m before placing models"
                ))
            })?;

        let report = {
            let mut session = self.feed.session().lock();
            self.registry.flush_pending(&snapshot, &mut session)
        };
        for error in &report.failed {
            warn!(code = error.code(), error = %error, "Model placement failed");
        }
        for request in &report.placed {
            self.emit(ViewEvent::model_placed(request));
        }

        let summary = PlacementSummary {
            placed: report.placed.len(),
            failed: report.failed.len(),
            pending: self.registry.pending_count(),
        };
        info!(
            placed = summary.placed,
            failed = summary.failed,
            pending = summary.pending,
            "Placed models"
        );
        Ok(summary)
    }

    /// Detach and forget the anchor `id`.
    pub fn remove_model(&mut self, id: &str) -> ViewResult<()> {
        self.ensure_live()?;
        self.registry.remove(id).map(|_| ())
    }

    /// Reconcile display geometry with the surface.
    ///
    /// `width` and `height` are in the display's natural orientation.
    /// Zero-sized surfaces are ignored. The geometry is pushed to the session
    /// only when it changed. The first valid size sets up GPU resources and
    /// moves the view to ACTIVE.
    ///
    /// # Errors
    ///
    /// [`ViewError::Render`] if GPU setup fails; the view stays CONFIGURING.
    pub fn surface_changed(&mut self, width: u32, height: u32, rotation: DisplayRotation) -> ViewResult<()> {
        self.ensure_live()?;
        let geometry = DisplayGeometry::for_surface(rotation, width, height);
        if !geometry.is_valid() {
            debug!(width, height, "Ignoring empty surface");
            return Ok(());
        }

        if self.geometry != Some(geometry) {
            self.feed
                .session()
                .lock()
                .set_display_geometry(geometry.rotation, geometry.width, geometry.height);
            debug!(
                rotation = geometry.rotation.degrees(),
                width = geometry.width,
                height = geometry.height,
                "Display geometry updated"
            );
            self.geometry = Some(geometry);
        }

        if self.state == ViewState::Configuring {
            self.renderer.setup()?;
            self.state = ViewState::Active;
            self.feed.set_rendering(true);
            info!(state = %self.state, "AR view active");
            // Phase reached during initialization, before the loop polled.
            if let Some(snapshot) = self.feed.latest() {
                let phase = snapshot.phase(self.config.accuracy_threshold);
                self.emit(ViewEvent::status_changed(phase, &snapshot));
            }
        }
        Ok(())
    }

    /// Tear the view down. Safe to call repeatedly.
    ///
    /// Returns `false` if the view was already disposed.
    pub fn dispose(&mut self) -> bool {
        if self.state == ViewState::Disposed {
            return false;
        }
        self.liveness.cancel();
        self.feed.set_rendering(false);
        let detached = self.registry.detach_all();
        if let Some(lease) = self.lease.take() {
            lease.release();
        }
        self.renderer.release();
        self.last_frame = None;
        self.state = ViewState::Disposed;
        info!(detached, "AR view disposed");
        true
    }

    // =========================================================================
    // Render loop
    // =========================================================================

    /// One render tick.
    ///
    /// Drains posted commands, then while ACTIVE polls tracking, emits phase
    /// changes, optionally auto-places on the readiness edge, prunes stopped
    /// anchors and draws.
    pub fn tick(&mut self) {
        loop {
            match self.commands.try_recv() {
                Ok(command) => self.handle(command),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        if self.state != ViewState::Active {
            return;
        }

        match self.feed.advance() {
            Ok(Some(outcome)) => {
                self.last_frame = Some(outcome.frame);

                if outcome.phase_changed {
                    self.emit(ViewEvent::status_changed(outcome.phase, &outcome.snapshot));
                }
                if outcome.became_ready && self.config.auto_place_on_ready {
                    let report = {
                        let mut session = self.feed.session().lock();
                        self.registry.flush_pending(&outcome.snapshot, &mut session)
                    };
                    for request in &report.placed {
                        self.emit(ViewEvent::model_placed(request));
                    }
                }
                self.status_log.maybe_log(
                    std::time::Instant::now(),
                    &outcome.snapshot,
                    self.registry.active_count(),
                );
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Tracking update failed"),
        }

        self.registry.prune_stopped();

        let (Some(frame), Some(geometry)) = (self.last_frame, self.geometry) else {
            return;
        };
        match self.renderer.draw_frame(&frame, &geometry, self.registry.all()) {
            Ok(stats) => trace!(anchors = stats.anchors_drawn, "Frame drawn"),
            Err(e) => warn!(error = %e, "Frame draw failed"),
        }
    }

    /// Drive the view until `shutdown` fires or it is disposed.
    ///
    /// Commands are handled as they arrive; frames tick at the configured
    /// interval. The view is disposed on exit.
    pub async fn run(mut self, shutdown: CancellationToken) {
        let mut frames = tokio::time::interval(self.config.frame_interval);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut commands_open = true;

        info!(frame_ms = self.config.frame_interval.as_millis() as u64, "Render loop started");
        while self.state != ViewState::Disposed {
            let wake = tokio::select! {
                biased;
                _ = shutdown.cancelled() => Wake::Shutdown,
                command = self.commands.recv(), if commands_open => match command {
                    Some(command) => Wake::Command(command),
                    None => Wake::Closed,
                },
                _ = frames.tick() => Wake::Frame,
            };

            match wake {
                Wake::Shutdown => {
                    info!("Render loop shutting down");
                    break;
                }
                Wake::Command(command) => self.handle(command),
                Wake::Closed => {
                    debug!("All view handles dropped");
                    commands_open = false;
                }
                Wake::Frame => self.tick(),
            }
        }
        self.dispose();
        info!("Render loop stopped");
    }

    fn handle(&mut self, command: ViewCommand) {
        // A dropped receiver means the caller stopped waiting.
        match command {
            ViewCommand::PlaceModel {
                latitude,
                longitude,
                altitude,
                reply,
            } => {
                let _ = reply.send(self.place_model(latitude, longitude, altitude));
            }
            ViewCommand::GetStatus { reply } => {
                let _ = reply.send(self.ensure_live().map(|_| self.status()));
            }
            ViewCommand::GetCameraInfo { reply } => {
                let _ = reply.send(self.ensure_live().map(|_| self.camera_info()));
            }
            ViewCommand::LoadModels { json, reply } => {
                let _ = reply.send(self.load_models(&json));
            }
            ViewCommand::PlaceModels { reply } => {
                let _ = reply.send(self.place_models());
            }
            ViewCommand::RemoveModel { id, reply } => {
                let _ = reply.send(self.remove_model(&id));
            }
            ViewCommand::SurfaceChanged {
                width,
                height,
                rotation,
                reply,
            } => {
                let _ = reply.send(self.surface_changed(width, height, rotation));
            }
            ViewCommand::Dispose { reply } => {
                let _ = reply.send(Ok(self.dispose()));
            }
        }
    }

    fn ensure_live(&self) -> ViewResult<()> {
        if self.state == ViewState::Disposed {
            Err(ViewError::Disposed)
        } else {
            Ok(())
        }
    }

    fn ensure_active(&self) -> ViewResult<()> {
        match self.state {
            ViewState::Active => Ok(()),
            ViewState::Disposed => Err(ViewError::Disposed),
            ViewState::Created | ViewState::Configuring => Err(ViewError::NotReady(
                "view has no surface yet".to_string(),
            )),
        }
    }

    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        format!("model-{}", self.next_id)
    }

    fn emit(&self, event: ViewEvent) {
        if self.events.send(event).is_err() {
            trace!("Event receiver dropped");
        }
    }
}

impl<B: GpuBackend> Drop for ViewLifecycle<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<B: GpuBackend> std::fmt::Debug for ViewLifecycle<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewLifecycle")
            .field("state", &self.state)
            .field("geometry", &self.geometry)
            .field("pending", &self.registry.pending_count())
            .field("active", &self.registry.active_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::render::HeadlessBackend;
    use crate::sdk::{
        Availability, EarthState, SimPhase, SimScript, SimulatedSdk,
    };
    use crate::tracking::VpsPhase;

    fn origin() -> GeoCoordinate {
        GeoCoordinate::new(38.75, -9.27, 170.0).unwrap()
    }

    struct Fixture {
        sdk: SimulatedSdk,
        pool: Arc<SessionPool>,
        view: ViewLifecycle<HeadlessBackend>,
        handle: ViewHandle,
        events: mpsc::UnboundedReceiver<ViewEvent>,
    }

    fn fixture_with(script: SimScript, config: ArConfig) -> Fixture {
        let sdk = SimulatedSdk::new(script, origin());
        let pool = Arc::new(SessionPool::new(Arc::new(sdk.clone())));
        let (tx, events) = mpsc::unbounded_channel();
        let (view, handle) = ViewLifecycle::create(
            &pool,
            HeadlessBackend::new(),
            &DeviceCapabilities::all_granted(),
            config,
            tx,
        )
        .unwrap();
        Fixture {
            sdk,
            pool,
            view,
            handle,
            events,
        }
    }

    fn fixture(script: SimScript) -> Fixture {
        fixture_with(script, ArConfig::default())
    }

    fn drain(events: &mut mpsc::UnboundedReceiver<ViewEvent>) -> Vec<ViewEvent> {
        let mut out = Vec::new();
        while let Ok(event) = events.try_recv() {
            out.push(event);
        }
        out
    }

    const BATCH: &str = r#"[{"model":"Duck.glb","latitude":38.75,"longitude":-9.27,"altitude":170.0,"scale":1.0}]"#;

    mod create {
        use super::*;

        #[test]
        fn test_create_enters_configuring_with_one_session() {
            let f = fixture(SimScript::default());
            assert_eq!(f.view.state(), ViewState::Configuring);
            assert_eq!(f.pool.ref_count(), 1);
            assert_eq!(f.sdk.stats().resumes, 1);
            assert!(!f.handle.is_disposed());
        }

        #[test]
        fn test_missing_permission_acquires_nothing() {
            let sdk = SimulatedSdk::new(SimScript::default(), origin());
            let pool = Arc::new(SessionPool::new(Arc::new(sdk.clone())));
            let (tx, _rx) = mpsc::unbounded_channel();
            let capabilities = DeviceCapabilities {
                camera_permission: false,
                ..DeviceCapabilities::all_granted()
            };
            let result = ViewLifecycle::create(
                &pool,
                HeadlessBackend::new(),
                &capabilities,
                ArConfig::default(),
                tx,
            );
            assert!(matches!(result, Err(ViewError::PermissionDenied { .. })));
            assert_eq!(sdk.stats().sessions_created, 0);
        }

        #[test]
        fn test_offline_device_acquires_nothing() {
            let sdk = SimulatedSdk::new(SimScript::default(), origin());
            let pool = Arc::new(SessionPool::new(Arc::new(sdk.clone())));
            let (tx, _rx) = mpsc::unbounded_channel();
            let capabilities = DeviceCapabilities {
                network_available: false,
                ..DeviceCapabilities::all_granted()
            };
            let result = ViewLifecycle::create(
                &pool,
                HeadlessBackend::new(),
                &capabilities,
                ArConfig::default(),
                tx,
            );
            assert!(matches!(result, Err(ViewError::NetworkUnavailable)));
            assert_eq!(sdk.stats().sessions_created, 0);
            assert!(!pool.is_live());
        }

        #[test]
        fn test_outdated_services_need_update() {
            let sdk = SimulatedSdk::new(SimScript::default(), origin())
                .with_availability(Availability::SupportedApkTooOld);
            let pool = Arc::new(SessionPool::new(Arc::new(sdk)));
            let (tx, _rx) = mpsc::unbounded_channel();
            let err = ViewLifecycle::create(
                &pool,
                HeadlessBackend::new(),
                &DeviceCapabilities::all_granted(),
                ArConfig::default(),
                tx,
            )
            .unwrap_err();
            assert_eq!(err.code(), "ARCORE_NOT_INSTALLED");
        }
    }

    mod surface {
        use super::*;

        #[test]
        fn test_first_valid_surface_activates() {
            let mut f = fixture(SimScript::default());
            f.view.surface_changed(0, 0, DisplayRotation::Rotation0).unwrap();
            assert_eq!(f.view.state(), ViewState::Configuring);

            f.view.surface_changed(1080, 1920, DisplayRotation::Rotation0).unwrap();
            assert_eq!(f.view.state(), ViewState::Active);
            assert!(f.view.renderer().is_set_up());
            assert_eq!(
                f.sdk.stats().display_geometry,
                vec![(DisplayRotation::Rotation0, 1080, 1920)]
            );
        }

        #[test]
        fn test_rotation_swaps_and_pushes_once() {
            let mut f = fixture(SimScript::default());
            f.view.surface_changed(1080, 1920, DisplayRotation::Rotation0).unwrap();
            f.view.surface_changed(1080, 1920, DisplayRotation::Rotation90).unwrap();
            f.view.surface_changed(1080, 1920, DisplayRotation::Rotation90).unwrap();

            let pushed = f.sdk.stats().display_geometry;
            assert_eq!(pushed.len(), 2);
            assert_eq!(pushed[1], (DisplayRotation::Rotation90, 1920, 1080));
        }

        #[test]
        fn test_gpu_failure_stays_configuring() {
            let sdk = SimulatedSdk::new(SimScript::default(), origin());
            let pool = Arc::new(SessionPool::new(Arc::new(sdk)));
            let (tx, _rx) = mpsc::unbounded_channel();
            let (mut view, _handle) = ViewLifecycle::create(
                &pool,
                HeadlessBackend::failing(),
                &DeviceCapabilities::all_granted(),
                ArConfig::default(),
                tx,
            )
            .unwrap();
            let err = view
                .surface_changed(1080, 1920, DisplayRotation::Rotation0)
                .unwrap_err();
            assert_eq!(err.code(), "RENDER_ERROR");
            assert_eq!(view.state(), ViewState::Configuring);
        }
    }

    mod ticking {
        use super::*;

        #[test]
        fn test_tick_before_active_does_not_poll() {
            let mut f = fixture(SimScript::default());
            f.view.tick();
            assert_eq!(f.sdk.stats().updates, 0);
        }

        #[test]
        fn test_phase_changes_emit_status_events() {
            let mut f = fixture(SimScript::converges_at(3, 4.0, 3.0));
            f.view.surface_changed(1080, 1920, DisplayRotation::Rotation0).unwrap();
            for _ in 0..5 {
                f.view.tick();
            }
            let statuses: Vec<String> = drain(&mut f.events)
                .into_iter()
                .filter_map(|e| match e {
                    ViewEvent::VpsStatusChanged { status, .. } => Some(status),
                    _ => None,
                })
                .collect();
            assert_eq!(statuses.last().map(String::as_str), Some(VpsPhase::Ready.as_str()));
            assert!(f.view.status().available);
        }

        #[test]
        fn test_activation_reports_phase_reached_during_initialization() {
            let mut f = fixture(SimScript::converges_at(1, 4.0, 3.0));
            f.view.feed.advance().unwrap();
            assert!(drain(&mut f.events).is_empty());

            f.view.surface_changed(1080, 1920, DisplayRotation::Rotation0).unwrap();
            match drain(&mut f.events).as_slice() {
                [ViewEvent::VpsStatusChanged { status, .. }] => {
                    assert_eq!(status, VpsPhase::Ready.as_str())
                }
                other => panic!("expected one status event, got {other:?}"),
            }
            assert!(f.view.feed.is_rendering());
        }

        #[test]
        fn test_render_loop_continues_initialization_sequence() {
            let mut f = fixture(SimScript::never_converges());
            f.view.feed.advance().unwrap();
            f.view.feed.advance().unwrap();
            f.view.surface_changed(1080, 1920, DisplayRotation::Rotation0).unwrap();
            f.view.tick();

            assert_eq!(f.view.feed.latest().map(|s| s.tick), Some(3));
            assert_eq!(f.sdk.stats().updates, 3);
        }

        #[test]
        fn test_loaded_models_wait_for_explicit_placement() {
            let mut f = fixture(SimScript::converges_at(1, 4.0, 3.0));
            f.view.surface_changed(1080, 1920, DisplayRotation::Rotation0).unwrap();
            f.view.load_models(BATCH).unwrap();
            for _ in 0..3 {
                f.view.tick();
            }
            assert_eq!(f.view.registry().pending_count(), 1);
            assert_eq!(f.sdk.stats().anchor_attempts, 0);
        }

        #[test]
        fn test_auto_place_on_readiness_edge() {
            let mut f = fixture_with(
                SimScript::converges_at(2, 4.0, 3.0),
                ArConfig::default().with_auto_place_on_ready(true),
            );
            f.view.surface_changed(1080, 1920, DisplayRotation::Rotation0).unwrap();
            f.view.load_models(BATCH).unwrap();
            for _ in 0..4 {
                f.view.tick();
            }
            assert_eq!(f.view.registry().active_count(), 1);
            let placed = drain(&mut f.events)
                .into_iter()
                .filter(|e| e.method() == "onModelPlaced")
                .count();
            assert_eq!(placed, 1);
        }

        #[test]
        fn test_stopped_anchor_is_pruned() {
            let mut f = fixture(SimScript::converges_at(1, 4.0, 3.0));
            f.view.surface_changed(1080, 1920, DisplayRotation::Rotation0).unwrap();
            f.view.tick();
            f.view.place_model(38.7501, -9.27, 170.0).unwrap();
            assert_eq!(f.view.registry().active_count(), 1);

            f.sdk.stop_anchor(0);
            f.view.tick();
            assert_eq!(f.view.registry().active_count(), 0);
            assert_eq!(f.sdk.stats().anchors_detached, 1);
        }
    }

    mod placement {
        use super::*;

        #[test]
        fn test_place_model_before_tracking_is_not_ready() {
            let mut f = fixture(SimScript::never_converges());
            f.view.surface_changed(1080, 1920, DisplayRotation::Rotation0).unwrap();
            let err = f.view.place_model(38.75, -9.27, 170.0).unwrap_err();
            assert_eq!(err.code(), "NOT_TRACKING");
            assert_eq!(f.sdk.stats().anchor_attempts, 0);
        }

        #[test]
        fn test_place_model_rejects_bad_coordinate() {
            let mut f = fixture(SimScript::default());
            f.view.surface_changed(1080, 1920, DisplayRotation::Rotation0).unwrap();
            let err = f.view.place_model(120.0, 0.0, 0.0).unwrap_err();
            assert_eq!(err.code(), "INVALID_ARGUMENT");
        }

        #[test]
        fn test_place_models_not_ready_keeps_pending() {
            let mut f = fixture(SimScript::never_converges());
            f.view.surface_changed(1080, 1920, DisplayRotation::Rotation0).unwrap();
            f.view.load_models(BATCH).unwrap();
            assert!(matches!(f.view.place_models(), Err(ViewError::NotReady(_))));
            assert_eq!(f.view.registry().pending_count(), 1);
        }

        #[test]
        fn test_placement_waits_for_active_view() {
            let mut f = fixture(SimScript::converges_at(1, 4.0, 3.0));
            f.view.feed.advance().unwrap();
            assert!(f.view.status().available);
            assert_eq!(f.view.state(), ViewState::Configuring);

            let err = f.view.place_model(38.7501, -9.27, 170.0).unwrap_err();
            assert_eq!(err.code(), "NOT_TRACKING");
            f.view.load_models(BATCH).unwrap();
            assert!(matches!(f.view.place_models(), Err(ViewError::NotReady(_))));
            assert_eq!(f.sdk.stats().anchor_attempts, 0);

            f.view.surface_changed(1080, 1920, DisplayRotation::Rotation0).unwrap();
            assert_eq!(f.view.place_models().unwrap().placed, 1);
        }

        #[test]
        fn test_invalid_batch_keeps_previous_pending() {
            let mut f = fixture(SimScript::default());
            f.view.load_models(BATCH).unwrap();
            let bad = r#"[{"model":"a.glb","latitude":95.0,"longitude":0.0,"altitude":0.0}]"#;
            assert!(f.view.load_models(bad).is_err());
            assert_eq!(f.view.registry().pending_count(), 1);
        }

        #[test]
        fn test_remove_unknown_model() {
            let mut f = fixture(SimScript::default());
            assert_eq!(f.view.remove_model("nope").unwrap_err().code(), "NOT_FOUND");
        }
    }

    mod dispose {
        use super::*;

        #[test]
        fn test_dispose_releases_everything_once() {
            let mut f = fixture(SimScript::converges_at(1, 4.0, 3.0));
            f.view.surface_changed(1080, 1920, DisplayRotation::Rotation0).unwrap();
            f.view.tick();
            f.view.place_model(38.7501, -9.27, 170.0).unwrap();

            assert!(f.view.dispose());
            assert!(!f.view.dispose());

            let stats = f.sdk.stats();
            assert_eq!(stats.anchors_detached, 1);
            assert_eq!(stats.sessions_closed, 1);
            assert!(!f.pool.is_live());
            assert!(!f.view.renderer().is_set_up());
            assert!(f.handle.is_disposed());
        }

        #[test]
        fn test_operations_after_dispose() {
            let mut f = fixture(SimScript::default());
            f.view.dispose();
            assert!(matches!(f.view.load_models(BATCH), Err(ViewError::Disposed)));
            assert!(matches!(
                f.view.surface_changed(10, 10, DisplayRotation::Rotation0),
                Err(ViewError::Disposed)
            ));
        }

        #[test]
        fn test_drop_disposes() {
            let f = fixture(SimScript::default());
            let sdk = f.sdk.clone();
            drop(f);
            assert_eq!(sdk.stats().sessions_closed, 1);
        }
    }

    mod run_loop {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_handle_commands_reach_loop() {
            let f = fixture(SimScript::converges_at(2, 4.0, 3.0));
            let shutdown = CancellationToken::new();
            let task = tokio::spawn(f.view.run(shutdown.clone()));

            f.handle
                .surface_changed(1080, 1920, DisplayRotation::Rotation0)
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_millis(500)).await;

            let status = f.handle.get_status().await.unwrap();
            assert!(status.tracking);
            let camera = f.handle.get_camera_info().await.unwrap();
            assert_eq!(camera.resolution, "1920x1080");

            shutdown.cancel();
            task.await.unwrap();
            assert!(f.handle.is_disposed());
            assert!(matches!(f.handle.get_status().await, Err(ViewError::Disposed)));
        }

        #[tokio::test(start_paused = true)]
        async fn test_dispose_through_handle_stops_loop() {
            let f = fixture(SimScript::default());
            let task = tokio::spawn(f.view.run(CancellationToken::new()));

            assert!(f.handle.dispose().await.unwrap());
            task.await.unwrap();
            assert!(!f.handle.dispose().await.unwrap());
            assert_eq!(f.sdk.stats().sessions_closed, 1);
        }

        #[tokio::test(start_paused = true)]
        async fn test_initialize_fails_fast_on_hard_earth_error() {
            let f = fixture(
                SimScript::starting(SimPhase::Searching)
                    .then(3, SimPhase::Earth(EarthState::ErrorNotAuthorized)),
            );
            let err = f.handle.initialize().await.unwrap_err();
            assert_eq!(err.code(), "NOT_AUTHORIZED");
            assert!(!err.is_retryable());
            assert_eq!(f.sdk.stats().updates, 3);
        }
    }
}
