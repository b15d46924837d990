//! GeoAnchor - Geospatial AR view core
//!
//! Places 3D content at real-world latitude/longitude/altitude once the
//! device has localized against the visual positioning system (VPS).
//!
//! # High-Level API
//!
//! ```ignore
//! use std::sync::Arc;
//! use geoanchor::render::HeadlessBackend;
//! use geoanchor::sdk::DeviceCapabilities;
//! use geoanchor::{ArConfig, SessionPool, ViewLifecycle};
//!
//! let pool = Arc::new(SessionPool::new(provider));
//! let (events_tx, events_rx) = tokio::sync::mpsc::unbounded_channel();
//! let (view, handle) = ViewLifecycle::create(
//!     &pool,
//!     HeadlessBackend::new(),
//!     &DeviceCapabilities::all_granted(),
//!     ArConfig::default(),
//!     events_tx,
//! )?;
//! tokio::spawn(view.run(shutdown.clone()));
//!
//! handle.surface_changed(1080, 1920, DisplayRotation::Rotation0).await?;
//! handle.initialize().await?;
//! handle.load_models(json).await?;
//! handle.place_models().await?;
//! ```

pub mod anchors;
pub mod config;
pub mod coord;
pub mod error;
pub mod logging;
pub mod render;
pub mod sdk;
pub mod session;
pub mod tracking;
pub mod view;

pub use config::ArConfig;
pub use error::{ViewError, ViewResult};
pub use session::SessionPool;
pub use view::{ViewEvent, ViewHandle, ViewLifecycle, ViewState, VpsStatus};
