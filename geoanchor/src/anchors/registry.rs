//! Anchor lifecycle bookkeeping.

use glam::Mat4;
use tracing::{debug, info, trace, warn};

use super::request::PlacementRequest;
use crate::error::{ViewError, ViewResult};
use crate::sdk::{AnchorTrackingState, ArAnchor, Pose};
use crate::session::PooledSession;
use crate::tracking::TrackingSnapshot;

/// Where an [`AnchorRecord`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorState {
    /// Queued, no anchor yet.
    Pending,
    /// Anchor created and trackable.
    Active,
    /// The SDK lost the anchor for good.
    Stopped,
}

/// A placement request and, once placed, its live anchor.
pub struct AnchorRecord {
    request: PlacementRequest,
    state: AnchorState,
    anchor: Option<Box<dyn ArAnchor>>,
}

impl AnchorRecord {
    fn pending(request: PlacementRequest) -> Self {
        Self {
            request,
            state: AnchorState::Pending,
            anchor: None,
        }
    }

    pub fn request(&self) -> &PlacementRequest {
        &self.request
    }

    pub fn state(&self) -> AnchorState {
        self.state
    }

    /// Current anchor pose, `None` until placed.
    pub fn pose(&self) -> Option<Pose> {
        self.anchor.as_ref().map(|a| a.pose())
    }

    /// Model matrix from the anchor pose and the requested scale.
    pub fn model_matrix(&self) -> Option<Mat4> {
        self.pose().map(|p| p.to_matrix(self.request.scale))
    }

    fn detach(&mut self) -> bool {
        match self.anchor.take() {
            Some(mut anchor) => {
                anchor.detach();
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for AnchorRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnchorRecord")
            .field("id", &self.request.id)
            .field("state", &self.state)
            .field("has_anchor", &self.anchor.is_some())
            .finish()
    }
}

/// Outcome of [`AnchorRegistry::flush_pending`].
#[derive(Debug, Default)]
pub struct FlushReport {
    /// Requests that became ACTIVE, in insertion order.
    pub placed: Vec<PlacementRequest>,
    /// Requests dropped after a non-recoverable SDK error.
    pub failed: Vec<ViewError>,
}

impl FlushReport {
    pub fn is_empty(&self) -> bool {
        self.placed.is_empty() && self.failed.is_empty()
    }
}

/// Placement requests and their anchors for one view, in insertion order.
#[derive(Debug, Default)]
pub struct AnchorRegistry {
    records: Vec<AnchorRecord>,
}

impl AnchorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a request. No anchor is created until the next flush.
    pub fn enqueue(&mut self, request: PlacementRequest) {
        debug!(id = %request.id, coordinate = %request.coordinate, "Queued placement");
        self.records.push(AnchorRecord::pending(request));
    }

    /// Drop every PENDING record and queue `requests` instead.
    ///
    /// ACTIVE records are kept. Returns the number of pending records dropped.
    pub fn replace_pending(&mut self, requests: impl IntoIterator<Item = PlacementRequest>) -> usize {
        let before = self.records.len();
        self.records.retain(|r| r.state != AnchorState::Pending);
        let dropped = before - self.records.len();
        for request in requests {
            self.enqueue(request);
        }
        dropped
    }

    /// Try to create anchors for every PENDING record.
    ///
    /// Nothing is attempted unless `snapshot` is tracking and the session
    /// is resumed. Recoverable SDK errors leave the record PENDING for the
    /// next flush. Any other error drops that request only.
    pub fn flush_pending(
        &mut self,
        snapshot: &TrackingSnapshot,
        session: &mut PooledSession,
    ) -> FlushReport {
        let mut report = FlushReport::default();
        if self.pending_count() == 0 {
            return report;
        }
        if !snapshot.is_tracking() || !session.is_resumed() {
            trace!(pending = self.pending_count(), "Flush deferred, not tracking");
            return report;
        }

        let mut kept = Vec::with_capacity(self.records.len());
        for mut record in self.records.drain(..) {
            if record.state != AnchorState::Pending {
                kept.push(record);
                continue;
            }

            let request = &record.request;
            match session.create_anchor(&request.coordinate, request.orientation) {
                Ok(anchor) => {
                    info!(
                        id = %request.id,
                        model = %request.model,
                        uri = %request.model_uri,
                        coordinate = %request.coordinate,
                        "Anchor placed"
                    );
                    report.placed.push(request.clone());
                    record.anchor = Some(anchor);
                    record.state = AnchorState::Active;
                }
                Err(e) if e.is_recoverable() => {
                    debug!(id = %request.id, reason = %e, "Anchor creation deferred");
                }
                Err(e) => {
                    warn!(id = %request.id, error = %e, "Anchor creation failed, dropping request");
                    report.failed.push(ViewError::AnchorCreationFailed {
                        id: request.id.clone(),
                        source: e,
                    });
                    continue;
                }
            }
            kept.push(record);
        }
        self.records = kept;
        report
    }

    /// Detach and remove ACTIVE records whose anchor reports STOPPED.
    ///
    /// Returns the number of records removed.
    pub fn prune_stopped(&mut self) -> usize {
        let mut pruned = 0;
        self.records.retain_mut(|record| {
            let stopped = record.state == AnchorState::Active
                && record
                    .anchor
                    .as_ref()
                    .is_some_and(|a| a.tracking_state() == AnchorTrackingState::Stopped);
            if stopped {
                record.state = AnchorState::Stopped;
                record.detach();
                info!(id = %record.request.id, "Anchor stopped tracking, removed");
                pruned += 1;
            }
            !stopped
        });
        pruned
    }

    /// Place one request right now.
    ///
    /// # Errors
    ///
    /// - [`ViewError::NotReady`] when `snapshot` is not tracking under
    ///   `threshold` meters or the session is paused; no anchor call is made
    /// - [`ViewError::AnchorCreationFailed`] when the SDK refuses
    pub fn place_immediate(
        &mut self,
        request: PlacementRequest,
        snapshot: &TrackingSnapshot,
        threshold: f64,
        session: &mut PooledSession,
    ) -> ViewResult<&AnchorRecord> {
        if !snapshot.is_ready(threshold) {
            let detail = match snapshot.pose {
                Some(pose) => format!(
                    "accuracy {:.1} m / {:.1} m, need under {threshold:.1} m",
                    pose.horizontal_accuracy, pose.vertical_accuracy
                ),
                None => format!(
                    "earth {} / camera {}",
                    snapshot.earth_state, snapshot.camera_tracking
                ),
            };
            return Err(ViewError::NotReady(detail));
        }
        if !session.is_resumed() {
            return Err(ViewError::NotReady("session is paused".to_string()));
        }

        let anchor = session
            .create_anchor(&request.coordinate, request.orientation)
            .map_err(|source| ViewError::AnchorCreationFailed {
                id: request.id.clone(),
                source,
            })?;
        info!(id = %request.id, coordinate = %request.coordinate, "Anchor placed immediately");

        self.records.push(AnchorRecord {
            request,
            state: AnchorState::Active,
            anchor: Some(anchor),
        });
        let last = self.records.len() - 1;
        Ok(&self.records[last])
    }

    /// ACTIVE records in insertion order.
    pub fn all(&self) -> impl Iterator<Item = &AnchorRecord> {
        self.records
            .iter()
            .filter(|r| r.state == AnchorState::Active)
    }

    /// Every record, any state, in insertion order.
    pub fn records(&self) -> &[AnchorRecord] {
        &self.records
    }

    /// Detach and drop the record named `id`.
    ///
    /// # Errors
    ///
    /// [`ViewError::NotFound`] for an unknown id.
    pub fn remove(&mut self, id: &str) -> ViewResult<PlacementRequest> {
        let index = self
            .records
            .iter()
            .position(|r| r.request.id == id)
            .ok_or_else(|| ViewError::NotFound(id.to_string()))?;
        let mut record = self.records.remove(index);
        record.detach();
        debug!(id, "Anchor removed");
        Ok(record.request)
    }

    /// Detach every anchor and clear the registry.
    ///
    /// Returns the number of anchors detached; a second call returns 0.
    pub fn detach_all(&mut self) -> usize {
        let detached = self
            .records
            .iter_mut()
            .map(AnchorRecord::detach)
            .filter(|d| *d)
            .count();
        self.records.clear();
        if detached > 0 {
            info!(detached, "Detached all anchors");
        }
        detached
    }

    pub fn pending_count(&self) -> usize {
        self.count(AnchorState::Pending)
    }

    pub fn active_count(&self) -> usize {
        self.count(AnchorState::Active)
    }

    fn count(&self, state: AnchorState) -> usize {
        self.records.iter().filter(|r| r.state == state).count()
    }
}
