//! The geospatial AR view.
//!
//! [`ViewLifecycle`] owns one view's anchors and renderer and runs its
//! render loop. [`ViewHandle`] is the cloneable UI-side handle that posts
//! commands onto that loop. Outbound notifications are [`ViewEvent`]s.

mod command;
mod events;
mod lifecycle;
mod status;

pub use command::ViewHandle;
pub use events::ViewEvent;
pub use lifecycle::{ViewLifecycle, ViewState};
pub use status::{CameraInfo, PlacementSummary, VpsStatus, UNKNOWN_ACCURACY, UNKNOWN_STATE};
