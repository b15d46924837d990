//! Reference-counted singleton session.

use std::sync::Arc;

use glam::Quat;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::coord::GeoCoordinate;
use crate::error::{ViewError, ViewResult};
use crate::sdk::{
    ArAnchor, ArProvider, ArSession, Availability, CameraConfig, CameraFacing, DisplayRotation,
    EarthObservation, Frame, SdkError, SessionConfig,
};

/// Session shared between the pool, its leases and the init poll.
pub type SharedSession = Arc<Mutex<PooledSession>>;

/// A live SDK session plus the state the pool tracks for it.
pub struct PooledSession {
    inner: Box<dyn ArSession>,
    resumed: bool,
    camera: Option<CameraConfig>,
}

impl std::fmt::Debug for PooledSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledSession")
            .field("resumed", &self.resumed)
            .field("camera", &self.camera)
            .finish()
    }
}

impl PooledSession {
    fn new(inner: Box<dyn ArSession>) -> Self {
        Self {
            inner,
            resumed: false,
            camera: None,
        }
    }

    /// Whether the session is currently resumed.
    pub fn is_resumed(&self) -> bool {
        self.resumed
    }

    /// Camera configuration picked at construction, if any.
    pub fn camera_config(&self) -> Option<CameraConfig> {
        self.camera
    }

    /// Advance to the next camera frame.
    pub fn update(&mut self) -> Result<Frame, SdkError> {
        if !self.resumed {
            return Err(SdkError::SessionPaused);
        }
        self.inner.update()
    }

    /// Latest earth tracker observation.
    pub fn earth(&self) -> Option<EarthObservation> {
        self.inner.earth()
    }

    pub fn set_display_geometry(&mut self, rotation: DisplayRotation, width: u32, height: u32) {
        self.inner.set_display_geometry(rotation, width, height);
    }

    /// Create a geospatial anchor. Refused while paused.
    pub fn create_anchor(
        &mut self,
        coordinate: &GeoCoordinate,
        orientation: Quat,
    ) -> Result<Box<dyn ArAnchor>, SdkError> {
        if !self.resumed {
            return Err(SdkError::SessionPaused);
        }
        self.inner.create_anchor(coordinate, orientation)
    }

    /// Camera selection, configuration and resume.
    fn prepare(&mut self, config: &SessionConfig, facing: CameraFacing) -> Result<(), SdkError> {
        let best = self
            .inner
            .supported_camera_configs(facing)
            .into_iter()
            .max_by_key(CameraConfig::pixel_count);
        match best {
            Some(camera) => {
                self.inner.set_camera_config(&camera)?;
                debug!(
                    width = camera.width,
                    height = camera.height,
                    "Selected camera configuration"
                );
                self.camera = Some(camera);
            }
            None => warn!(%facing, "No camera configuration for facing, keeping SDK default"),
        }

        self.inner.configure(config)?;
        self.inner.resume()?;
        self.resumed = true;
        Ok(())
    }

    fn shutdown(&mut self) {
        if self.resumed {
            self.inner.pause();
            self.resumed = false;
        }
        self.inner.close();
    }
}

struct Slot {
    session: SharedSession,
    refs: usize,
}

/// Owns at most one live AR session, shared across views by reference count.
pub struct SessionPool {
    provider: Arc<dyn ArProvider>,
    session_config: SessionConfig,
    facing: CameraFacing,
    slot: Mutex<Option<Slot>>,
}

impl SessionPool {
    /// Pool over `provider` with the geospatial session configuration and
    /// the back-facing camera.
    pub fn new(provider: Arc<dyn ArProvider>) -> Self {
        Self {
            provider,
            session_config: SessionConfig::geospatial(),
            facing: CameraFacing::Back,
            slot: Mutex::new(None),
        }
    }

    pub fn with_session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    pub fn with_camera_facing(mut self, facing: CameraFacing) -> Self {
        self.facing = facing;
        self
    }

    /// Install/support state reported by the provider.
    pub fn availability(&self) -> Availability {
        self.provider.availability()
    }

    /// Borrow the live session, constructing it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::Initialization`] (or [`ViewError::NotSupported`]
    /// when the SDK says so) if the session cannot be constructed, configured
    /// or resumed. The pool stays empty so a later call can retry.
    pub fn acquire(self: &Arc<Self>) -> ViewResult<SessionLease> {
        let mut slot = self.slot.lock();

        if let Some(live) = slot.as_mut() {
            live.refs += 1;
            debug!(refs = live.refs, "Reusing live AR session");
            return Ok(SessionLease {
                pool: Arc::clone(self),
                session: Arc::clone(&live.session),
            });
        }

        let inner = self.provider.create_session().map_err(init_error)?;
        let mut pooled = PooledSession::new(inner);
        if let Err(e) = pooled.prepare(&self.session_config, self.facing) {
            warn!(error = %e, "Session setup failed, closing");
            pooled.shutdown();
            return Err(init_error(e));
        }

        let session = Arc::new(Mutex::new(pooled));
        *slot = Some(Slot {
            session: Arc::clone(&session),
            refs: 1,
        });
        info!("AR session created and resumed");

        Ok(SessionLease {
            pool: Arc::clone(self),
            session,
        })
    }

    /// Outstanding leases on the live session (0 when none).
    pub fn ref_count(&self) -> usize {
        self.slot.lock().as_ref().map_or(0, |s| s.refs)
    }

    /// Whether a session currently exists.
    pub fn is_live(&self) -> bool {
        self.slot.lock().is_some()
    }

    fn release_one(&self) {
        let mut slot = self.slot.lock();
        let Some(live) = slot.as_mut() else {
            warn!("Session release with no live session");
            return;
        };

        live.refs -= 1;
        if live.refs > 0 {
            debug!(refs = live.refs, "Released AR session reference");
            return;
        }

        if let Some(last) = slot.take() {
            last.session.lock().shutdown();
            info!("AR session paused and closed");
        }
    }
}

fn init_error(e: SdkError) -> ViewError {
    match e {
        SdkError::Unsupported(msg) => ViewError::NotSupported(msg),
        other => ViewError::Initialization(other),
    }
}

/// A counted borrow of the pool's session.
///
/// Dropping the lease releases it.
pub struct SessionLease {
    pool: Arc<SessionPool>,
    session: SharedSession,
}

impl SessionLease {
    /// The shared session behind this lease.
    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    /// Return the reference to the pool.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        self.pool.release_one();
    }
}

impl std::fmt::Debug for SessionLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLease")
            .field("refs", &self.pool.ref_count())
            .finish()
    }
}
