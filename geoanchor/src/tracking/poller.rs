//! Per-tick session advancement.

use tracing::{debug, trace};

use super::snapshot::{ReadinessLatch, TrackingSnapshot, VpsPhase};
use crate::error::{ViewError, ViewResult};
use crate::sdk::Frame;
use crate::session::PooledSession;

/// Result of one successful poll.
#[derive(Debug, Clone, Copy)]
pub struct PollOutcome {
    pub snapshot: TrackingSnapshot,
    pub frame: Frame,
    /// Readiness went from false to true on this tick.
    pub became_ready: bool,
    pub phase: VpsPhase,
    /// `phase` differs from the previous tick's.
    pub phase_changed: bool,
}

/// Advances the session once per tick and classifies tracking.
#[derive(Debug)]
pub struct TrackingPoller {
    latch: ReadinessLatch,
    tick: u64,
    phase: VpsPhase,
}

impl TrackingPoller {
    /// Poller with the given accuracy threshold in meters.
    pub fn new(accuracy_threshold: f64) -> Self {
        Self {
            latch: ReadinessLatch::new(accuracy_threshold),
            tick: 0,
            phase: VpsPhase::Unavailable,
        }
    }

    /// Advance the session by one frame.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when no frame was available this tick; the caller skips
    /// the tick. Recoverable SDK conditions are treated the same way.
    ///
    /// # Errors
    ///
    /// [`ViewError::Unavailable`] for non-recoverable update failures.
    pub fn poll(&mut self, session: &mut PooledSession) -> ViewResult<Option<PollOutcome>> {
        let frame = match session.update() {
            Ok(frame) => frame,
            Err(e) if e.is_recoverable() => {
                trace!(reason = %e, "Skipping tick");
                return Ok(None);
            }
            Err(e) => return Err(ViewError::Unavailable(e.to_string())),
        };

        self.tick += 1;
        let snapshot = TrackingSnapshot::observe(self.tick, frame.camera.tracking, session.earth());
        let became_ready = self.latch.update(&snapshot);
        let phase = snapshot.phase(self.latch.threshold());
        let phase_changed = phase != self.phase;
        if phase_changed {
            debug!(from = %self.phase, to = %phase, tick = self.tick, "VPS phase changed");
        }
        self.phase = phase;

        Ok(Some(PollOutcome {
            snapshot,
            frame,
            became_ready,
            phase,
            phase_changed,
        }))
    }

    /// Phase after the last successful poll.
    pub fn phase(&self) -> VpsPhase {
        self.phase
    }

    /// Whether the latch is currently in the ready state.
    pub fn is_ready(&self) -> bool {
        self.latch.is_ready()
    }

    pub fn threshold(&self) -> f64 {
        self.latch.threshold()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::coord::GeoCoordinate;
    use crate::sdk::{SimPhase, SimScript, SimulatedSdk};
    use crate::session::{SessionLease, SessionPool};

    fn lease(script: SimScript) -> (SimulatedSdk, SessionLease) {
        let sdk = SimulatedSdk::new(script, GeoCoordinate::new(38.75, -9.27, 170.0).unwrap());
        let pool = Arc::new(SessionPool::new(Arc::new(sdk.clone())));
        let lease = pool.acquire().unwrap();
        (sdk, lease)
    }

    #[test]
    fn test_unavailable_frame_is_skipped() {
        let script = SimScript::starting(SimPhase::CameraUnavailable).then(2, SimPhase::Searching);
        let (_sdk, lease) = lease(script);
        let mut poller = TrackingPoller::new(10.0);
        let mut session = lease.session().lock();

        assert!(poller.poll(&mut session).unwrap().is_none());
        let outcome = poller.poll(&mut session).unwrap().unwrap();
        assert_eq!(outcome.snapshot.tick, 1);
        assert_eq!(outcome.phase, VpsPhase::Searching);
        assert!(outcome.phase_changed);
    }

    #[test]
    fn test_ready_edge_and_phase_changes() {
        let (_sdk, lease) = lease(SimScript::converges_at(3, 8.0, 7.0));
        let mut poller = TrackingPoller::new(10.0);
        let mut session = lease.session().lock();

        let first = poller.poll(&mut session).unwrap().unwrap();
        assert!(!first.became_ready);
        let second = poller.poll(&mut session).unwrap().unwrap();
        assert!(!second.phase_changed);
        let third = poller.poll(&mut session).unwrap().unwrap();
        assert!(third.became_ready);
        assert!(third.phase_changed);
        assert_eq!(third.phase, VpsPhase::Ready);
        let fourth = poller.poll(&mut session).unwrap().unwrap();
        assert!(!fourth.became_ready);
        assert!(!fourth.phase_changed);
        assert!(poller.is_ready());
    }

    #[test]
    fn test_degraded_accuracy_refires() {
        let script = SimScript::converges_at(1, 5.0, 5.0)
            .then(
                2,
                SimPhase::Localized {
                    horizontal: 25.0,
                    vertical: 5.0,
                },
            )
            .then(
                3,
                SimPhase::Localized {
                    horizontal: 6.0,
                    vertical: 5.0,
                },
            );
        let (_sdk, lease) = lease(script);
        let mut poller = TrackingPoller::new(10.0);
        let mut session = lease.session().lock();

        let fired: Vec<bool> = (0..3)
            .map(|_| poller.poll(&mut session).unwrap().unwrap().became_ready)
            .collect();
        assert_eq!(fired, vec![true, false, true]);
    }
}
