//! Geospatial anchors.
//!
//! Requests flow through an [`AnchorRegistry`]:
//!
//! ```text
//! enqueue ---------> PENDING --flush_pending (tracking)--> ACTIVE
//!                       |                                    |
//!                       +--fatal SDK error--> dropped         +--anchor STOPPED--> pruned
//! place_immediate (ready) ---------------------------------> ACTIVE
//! ```
//!
//! Batch loading queues requests that wait silently for VPS readiness;
//! ad hoc placement fails fast with `NotReady`.

mod registry;
mod request;

pub use registry::{AnchorRecord, AnchorRegistry, AnchorState, FlushReport};
pub use request::{
    parse_model_batch, resolve_model_uri, ModelPlacement, PlacementRequest, DEFAULT_MODEL,
    MODEL_ASSET_ROOT,
};
