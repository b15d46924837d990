//! AR session ownership.
//!
//! The [`SessionPool`] is the only owner of the live AR session. Views hold
//! a [`SessionLease`], a counted borrow that returns the session to the pool
//! when released or dropped.
//!
//! # Lifecycle
//!
//! ```text
//! acquire (refs 0)  --> construct -> select camera -> configure -> resume
//! acquire (refs n)  --> reuse, refs n+1
//! release (refs 1)  --> pause -> close -> slot empty
//! release (refs n)  --> refs n-1
//! ```

mod pool;
mod requirements;

pub use pool::{PooledSession, SessionLease, SessionPool, SharedSession};
pub use requirements::{check_requirements, CAMERA_PERMISSION, FINE_LOCATION_PERMISSION};
