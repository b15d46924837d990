//! Geospatial tracking state machine.
//!
//! Two ways to drive the session:
//!
//! - **Continuous**: the render loop calls [`TrackingPoller::poll`] every
//!   frame. Unavailable frames are skipped, readiness is edge-triggered.
//! - **Bounded**: [`InitializationPoll::run`] ticks once per second for at
//!   most 120 ticks, failing fast on earth tracker errors and with guidance
//!   on timeout. It is cancelled through a `CancellationToken`.
//!
//! Both share one [`TrackingFeed`]; only one of them advances the session
//! at a time.
//!
//! # Phases
//!
//! ```text
//! Unavailable --enable--> Searching --localize--> Tracking --acc < 10m--> Ready
//!      ^                      ^                       |                    |
//!      +------ error ---------+------ lost -----------+-------- degrade ---+
//! ```

mod diagnostics;
mod feed;
mod init;
mod poller;
mod snapshot;

pub use diagnostics::{explain, AccuracyQuality, StatusLogger, EXCELLENT_ACCURACY_M};
pub use feed::TrackingFeed;
pub use init::InitializationPoll;
pub use poller::{PollOutcome, TrackingPoller};
pub use snapshot::{ReadinessLatch, SnapshotCell, TrackingSnapshot, VpsPhase};
