//! Bounded VPS acquisition used by explicit initialization.
//!
//! # Per-Tick Decision
//!
//! ```text
//! cancelled                      -> Err(Cancelled)
//! frame unavailable / SDK hiccup -> skip
//! earth ERROR_*                  -> Err(EarthError)   (no retry)
//! ready (tracking, acc < 10 m)   -> Ok(snapshot)
//! tick == max_ticks              -> Err(VpsTimeout)   (session kept)
//! ```
//!
//! Before the view renders, the poll advances the session itself. Once the
//! render loop is driving the session, the poll only samples the snapshot
//! the loop published, so the session is never advanced twice per tick.
//! Cancelling the poll releases no resources.

use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::feed::TrackingFeed;
use super::snapshot::TrackingSnapshot;
use crate::config::ArConfig;
use crate::error::{ViewError, ViewResult, VPS_TIMEOUT_GUIDANCE};

/// Ticks between progress log lines.
const PROGRESS_LOG_EVERY: u32 = 10;

/// Bounded, cancellable wait for VPS localization.
#[derive(Debug, Clone)]
pub struct InitializationPoll {
    tick_interval: Duration,
    max_ticks: u32,
    accuracy_threshold: f64,
}

impl InitializationPoll {
    pub fn new(tick_interval: Duration, max_ticks: u32, accuracy_threshold: f64) -> Self {
        Self {
            tick_interval,
            max_ticks,
            accuracy_threshold,
        }
    }

    pub fn from_config(config: &ArConfig) -> Self {
        Self::new(
            config.tick_interval,
            config.init_timeout_ticks,
            config.accuracy_threshold,
        )
    }

    pub fn max_ticks(&self) -> u32 {
        self.max_ticks
    }

    /// Check tracking once per tick until ready, failed, timed out or
    /// cancelled.
    ///
    /// Snapshots the poll produces itself are published through `feed` so
    /// status queries made during initialization see live values.
    ///
    /// # Errors
    ///
    /// - [`ViewError::Cancelled`] when `cancel` fires
    /// - [`ViewError::EarthError`] on ERROR_INTERNAL, ERROR_RESOURCE_EXHAUSTED
    ///   or ERROR_NOT_AUTHORIZED
    /// - [`ViewError::VpsTimeout`] after `max_ticks` ticks without readiness
    pub async fn run(
        &self,
        feed: &TrackingFeed,
        cancel: &CancellationToken,
    ) -> ViewResult<TrackingSnapshot> {
        let mut interval = interval_at(Instant::now() + self.tick_interval, self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            max_ticks = self.max_ticks,
            threshold_m = self.accuracy_threshold,
            "Waiting for VPS localization"
        );

        for tick in 1..=self.max_ticks {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(tick, "VPS initialization cancelled");
                    return Err(ViewError::Cancelled);
                }
                _ = interval.tick() => {}
            }

            let snapshot = if feed.is_rendering() {
                match feed.latest() {
                    Some(snapshot) => snapshot,
                    None => continue,
                }
            } else {
                match feed.advance() {
                    Ok(Some(outcome)) => outcome.snapshot,
                    Ok(None) => continue,
                    Err(e) => {
                        warn!(tick, error = %e, "Tracking update failed, retrying next tick");
                        continue;
                    }
                }
            };
            let phase = snapshot.phase(self.accuracy_threshold);

            if snapshot.earth_state.is_hard_error() {
                warn!(tick, earth_state = %snapshot.earth_state, "Earth tracker failed");
                return Err(ViewError::earth(snapshot.earth_state));
            }

            if snapshot.is_ready(self.accuracy_threshold) {
                if let Some(pose) = snapshot.pose {
                    info!(
                        tick,
                        latitude = pose.latitude,
                        longitude = pose.longitude,
                        h_acc = pose.horizontal_accuracy,
                        v_acc = pose.vertical_accuracy,
                        "VPS localized"
                    );
                }
                return Ok(snapshot);
            }

            if tick % PROGRESS_LOG_EVERY == 0 {
                info!(
                    tick,
                    max_ticks = self.max_ticks,
                    phase = %phase,
                    "Still waiting for VPS"
                );
            } else {
                debug!(tick, phase = %phase, "VPS not ready");
            }
        }

        warn!(ticks = self.max_ticks, "VPS initialization timed out");
        Err(ViewError::VpsTimeout {
            ticks: self.max_ticks,
            guidance: VPS_TIMEOUT_GUIDANCE,
        })
    }
}
