//! Commands posted from the UI side onto the render loop.
//!
//! ```text
//!   UI task                         render loop
//!  ┌────────────┐  ViewCommand     ┌────────────────┐
//!  │ ViewHandle │ ───────────────► │ ViewLifecycle  │
//!  │  (Clone)   │ ◄─────────────── │  (owns state)  │
//!  └────────────┘  oneshot reply   └────────────────┘
//! ```
//!
//! Anchor and renderer state is only touched on the loop. The one
//! exception is [`ViewHandle::initialize`], which runs the bounded VPS poll
//! off the loop against the view's tracking feed and is stopped by the
//! view's liveness token. Once the loop is rendering, the poll only samples
//! what the loop publishes.

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use super::status::{CameraInfo, PlacementSummary, VpsStatus};
use crate::error::{ViewError, ViewResult};
use crate::sdk::DisplayRotation;
use crate::tracking::{InitializationPoll, TrackingFeed, TrackingSnapshot};

pub(crate) type Reply<T> = oneshot::Sender<ViewResult<T>>;

/// Work marshaled onto the render loop.
#[derive(Debug)]
pub(crate) enum ViewCommand {
    PlaceModel {
        latitude: f64,
        longitude: f64,
        altitude: f64,
        reply: Reply<String>,
    },
    GetStatus {
        reply: Reply<VpsStatus>,
    },
    GetCameraInfo {
        reply: Reply<CameraInfo>,
    },
    LoadModels {
        json: String,
        reply: Reply<usize>,
    },
    PlaceModels {
        reply: Reply<PlacementSummary>,
    },
    RemoveModel {
        id: String,
        reply: Reply<()>,
    },
    SurfaceChanged {
        width: u32,
        height: u32,
        rotation: DisplayRotation,
        reply: Reply<()>,
    },
    Dispose {
        reply: Reply<bool>,
    },
}

/// Cloneable, `Send` handle to a running view.
///
/// Every method fails with [`ViewError::Disposed`] once the view is gone,
/// except [`dispose`](Self::dispose) which is always safe.
#[derive(Debug, Clone)]
pub struct ViewHandle {
    commands: mpsc::UnboundedSender<ViewCommand>,
    feed: TrackingFeed,
    liveness: CancellationToken,
    init: InitializationPoll,
}

impl ViewHandle {
    pub(crate) fn new(
        commands: mpsc::UnboundedSender<ViewCommand>,
        feed: TrackingFeed,
        liveness: CancellationToken,
        init: InitializationPoll,
    ) -> Self {
        Self {
            commands,
            feed,
            liveness,
            init,
        }
    }

    /// Place the default model at a coordinate right now.
    ///
    /// Returns the id of the new anchor.
    ///
    /// # Errors
    ///
    /// - [`ViewError::NotReady`] before the view is ACTIVE, or unless
    ///   tracking with accuracy under threshold
    /// - [`ViewError::InvalidCoordinate`] for out-of-range input
    /// - [`ViewError::AnchorCreationFailed`] when the SDK refuses
    pub async fn place_model(
        &self,
        latitude: f64,
        longitude: f64,
        altitude: f64,
    ) -> ViewResult<String> {
        self.request(|reply| ViewCommand::PlaceModel {
            latitude,
            longitude,
            altitude,
            reply,
        })
        .await
    }

    pub async fn get_status(&self) -> ViewResult<VpsStatus> {
        self.request(|reply| ViewCommand::GetStatus { reply }).await
    }

    pub async fn get_camera_info(&self) -> ViewResult<CameraInfo> {
        self.request(|reply| ViewCommand::GetCameraInfo { reply })
            .await
    }

    /// Replace the pending batch with the models in `json`.
    ///
    /// Returns how many requests were queued. The batch is rejected as a
    /// whole if any entry is invalid.
    pub async fn load_models(&self, json: impl Into<String>) -> ViewResult<usize> {
        let json = json.into();
        self.request(|reply| ViewCommand::LoadModels { json, reply })
            .await
    }

    /// Flush the pending batch.
    ///
    /// # Errors
    ///
    /// [`ViewError::NotReady`] before the view is ACTIVE, or unless the
    /// latest snapshot is tracking with accuracy under threshold.
    pub async fn place_models(&self) -> ViewResult<PlacementSummary> {
        self.request(|reply| ViewCommand::PlaceModels { reply })
            .await
    }

    pub async fn remove_model(&self, id: impl Into<String>) -> ViewResult<()> {
        let id = id.into();
        self.request(|reply| ViewCommand::RemoveModel { id, reply })
            .await
    }

    /// Report the surface size in the display's natural orientation.
    pub async fn surface_changed(
        &self,
        width: u32,
        height: u32,
        rotation: DisplayRotation,
    ) -> ViewResult<()> {
        self.request(|reply| ViewCommand::SurfaceChanged {
            width,
            height,
            rotation,
            reply,
        })
        .await
    }

    /// Dispose the view.
    ///
    /// Returns `false` when it was already disposed.
    pub async fn dispose(&self) -> ViewResult<bool> {
        if self.liveness.is_cancelled() {
            return Ok(false);
        }
        match self.request(|reply| ViewCommand::Dispose { reply }).await {
            Err(ViewError::Disposed) => Ok(false),
            other => other,
        }
    }

    /// Wait for VPS localization, bounded by the configured tick budget.
    ///
    /// Runs concurrently with the render loop. Before the first surface it
    /// advances the session itself and publishes each snapshot so
    /// [`get_status`](Self::get_status) shows progress; after that it reads
    /// the snapshots the render loop publishes.
    ///
    /// # Errors
    ///
    /// - [`ViewError::EarthError`] on a hard earth-tracker error, immediately
    /// - [`ViewError::VpsTimeout`] when the budget runs out; the session is
    ///   kept so the caller may retry
    /// - [`ViewError::Cancelled`] when the view is disposed meanwhile
    pub async fn initialize(&self) -> ViewResult<TrackingSnapshot> {
        if self.liveness.is_cancelled() {
            return Err(ViewError::Disposed);
        }
        self.init.run(&self.feed, &self.liveness).await
    }

    /// Whether the view behind this handle has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.liveness.is_cancelled()
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> ViewCommand,
    ) -> ViewResult<T> {
        if self.liveness.is_cancelled() {
            return Err(ViewError::Disposed);
        }
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(command(tx))
            .map_err(|_| ViewError::Disposed)?;
        rx.await.map_err(|_| ViewError::Disposed)?
    }
}
