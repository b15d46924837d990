//! Single source of tracking snapshots for one view.
//!
//! ```text
//!  CONFIGURING                     ACTIVE
//!  InitializationPoll ─advance─►   render loop ─advance─► session.update()
//!                                  InitializationPoll ─latest─► (sample only)
//! ```
//!
//! Exactly one side advances the session per tick. Both go through the same
//! [`TrackingPoller`], so snapshot sequence numbers stay continuous when the
//! render loop takes over.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::poller::{PollOutcome, TrackingPoller};
use super::snapshot::{SnapshotCell, TrackingSnapshot};
use crate::error::ViewResult;
use crate::session::SharedSession;

/// Shared tracking state handed to the render loop and its handles.
#[derive(Debug, Clone)]
pub struct TrackingFeed {
    session: SharedSession,
    poller: Arc<Mutex<TrackingPoller>>,
    latest: SnapshotCell,
    rendering: Arc<AtomicBool>,
}

impl TrackingFeed {
    pub fn new(session: SharedSession, accuracy_threshold: f64) -> Self {
        Self {
            session,
            poller: Arc::new(Mutex::new(TrackingPoller::new(accuracy_threshold))),
            latest: Arc::new(RwLock::new(None)),
            rendering: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    /// Most recent published snapshot.
    pub fn latest(&self) -> Option<TrackingSnapshot> {
        *self.latest.read()
    }

    /// Advance the session one frame and publish the snapshot.
    ///
    /// Lock order is session, then poller.
    ///
    /// # Errors
    ///
    /// Non-recoverable update failures from [`TrackingPoller::poll`].
    pub fn advance(&self) -> ViewResult<Option<PollOutcome>> {
        let outcome = {
            let mut session = self.session.lock();
            self.poller.lock().poll(&mut session)?
        };
        if let Some(outcome) = &outcome {
            *self.latest.write() = Some(outcome.snapshot);
        }
        Ok(outcome)
    }

    /// Whether the render loop is the one advancing the session.
    pub fn is_rendering(&self) -> bool {
        self.rendering.load(Ordering::Acquire)
    }

    pub(crate) fn set_rendering(&self, rendering: bool) {
        self.rendering.store(rendering, Ordering::Release);
    }
}
